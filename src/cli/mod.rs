//! CLI module for aerodoc
//!
//! Provides command-line interface for:
//! - encode: Print the token for a set of transform options
//! - ingest: Store files and print the resulting documents

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, EncodeArgs};
pub use commands::{encode, ingest, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json_line, write_line};
