//! CLI argument definitions using clap
//!
//! Commands:
//! - aerodoc encode [--width N] [--fit WxH] ...
//! - aerodoc ingest --config <path> <files...>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::derivative::TransformOptions;

/// aerodoc - document derivatives and storage consistency
#[derive(Parser, Debug)]
#[command(name = "aerodoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the derivative token for a set of transform options
    Encode(EncodeArgs),

    /// Ingest files into storage and print each document as a JSON line
    Ingest {
        /// Path to configuration file
        #[arg(long, default_value = "./aerodoc.json")]
        config: PathBuf,

        /// Link every ingested document to a folder with this name
        #[arg(long)]
        folder: Option<String>,

        /// Files to ingest, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Transform options as flags
#[derive(Args, Debug, Default)]
pub struct EncodeArgs {
    #[arg(long, default_value_t = 0)]
    pub width: u32,
    #[arg(long, default_value_t = 0)]
    pub height: u32,
    /// Ratio or size, e.g. 16:9 or 600x400
    #[arg(long)]
    pub crop: Option<String>,
    /// Exact fill size, e.g. 600x400
    #[arg(long)]
    pub fit: Option<String>,
    /// h, v or hv
    #[arg(long)]
    pub flip: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub rotate: u32,
    #[arg(long, default_value_t = 0)]
    pub sharpen: u32,
    #[arg(long, default_value_t = 0)]
    pub contrast: u32,
    #[arg(long)]
    pub grayscale: bool,
    #[arg(long, default_value_t = 0)]
    pub quality: u8,
    #[arg(long)]
    pub background: Option<String>,
    #[arg(long)]
    pub progressive: bool,
    #[arg(long)]
    pub interlace: bool,
    #[arg(long, default_value_t = 0)]
    pub blur: u32,
    #[arg(long)]
    pub align: Option<String>,
}

impl From<&EncodeArgs> for TransformOptions {
    fn from(args: &EncodeArgs) -> Self {
        TransformOptions {
            width: args.width,
            height: args.height,
            crop: args.crop.clone(),
            fit: args.fit.clone(),
            flip: args.flip.clone(),
            rotate: args.rotate,
            sharpen: args.sharpen,
            contrast: args.contrast,
            grayscale: args.grayscale,
            quality: args.quality,
            background: args.background.clone(),
            progressive: args.progressive,
            interlace: args.interlace,
            blur: args.blur,
            align: args.align.clone(),
            no_process: false,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encode() {
        let cli = Cli::try_parse_from(["aerodoc", "encode", "--fit", "600x400", "--quality", "70"])
            .unwrap();
        let Command::Encode(args) = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(args.fit.as_deref(), Some("600x400"));
        assert_eq!(TransformOptions::from(&args).quality, 70);
    }

    #[test]
    fn test_parse_ingest_requires_files() {
        assert!(Cli::try_parse_from(["aerodoc", "ingest"]).is_err());
        let cli = Cli::try_parse_from(["aerodoc", "ingest", "--config", "c.json", "a.jpg", "b.png"])
            .unwrap();
        match cli.command {
            Command::Ingest { config, files, folder } => {
                assert_eq!(config, PathBuf::from("c.json"));
                assert_eq!(files.len(), 2);
                assert!(folder.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
