//! CLI command implementations
//!
//! Commands are thin: they load configuration, wire the capabilities and
//! hand off to the library. Storage is local, persistence is in-memory for
//! the lifetime of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AeroDocConfig;
use crate::derivative::{OptionsCodec, TransformOptions};
use crate::document::{Document, Folder, InMemorySession, PersistenceSession};
use crate::imaging::RustImageProcessor;
use crate::ingest::{DocumentIngestFactory, FileSource};
use crate::storage::LocalBlobStore;

use super::args::{Command, EncodeArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_json_line, write_line};

/// Parse arguments and run
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Encode(args) => write_line(&encode(&args)),
        Command::Ingest {
            config,
            folder,
            files,
        } => ingest(&config, folder.as_deref(), &files, |doc| write_json_line(doc)).map(|_| ()),
    }
}

/// Token for the given options
pub fn encode(args: &EncodeArgs) -> String {
    OptionsCodec::encode(&TransformOptions::from(args).normalize())
}

/// Ingest `files` in order, calling `emit` for each stored document.
///
/// Files the transport cannot read as a regular file are skipped. Staged
/// records are flushed once at the end. Returns the number of documents
/// stored.
pub fn ingest<F>(
    config_path: &Path,
    folder_name: Option<&str>,
    files: &[PathBuf],
    mut emit: F,
) -> CliResult<usize>
where
    F: FnMut(&Document) -> CliResult<()>,
{
    let config = AeroDocConfig::load(config_path)?;

    let store = Arc::new(LocalBlobStore::new(
        config.public_root.clone(),
        config.private_root.clone(),
    ));
    let session = Arc::new(InMemorySession::new());
    let factory = DocumentIngestFactory::from_config(
        &config,
        store,
        Arc::new(RustImageProcessor::new()),
        session.clone(),
    );

    let mut folder = folder_name.map(Folder::new);
    let mut stored = 0;
    for path in files {
        let source = FileSource::new(path);
        if let Some(document) = factory.ingest(&source, folder.as_mut())? {
            emit(&document)?;
            stored += 1;
        }
    }

    session
        .flush()
        .map_err(|e| CliError::ingest_failed(e.to_string()))?;
    Ok(stored)
}
