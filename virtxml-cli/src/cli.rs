//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::DocumentKind;

/// virtxml - check and normalize libvirt XML documents
#[derive(Parser, Debug)]
#[command(name = "virtxml")]
#[command(about = "Check, normalize and export libvirt domain and node device XML")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON objects
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a document against its grammar
    Check {
        /// Document to read
        file: PathBuf,

        /// Grammar to apply; `auto` picks it from the root element
        #[arg(short, long, value_enum)]
        kind: Option<DocumentKind>,
    },

    /// Re-emit a document in canonical element order
    Normalize {
        /// Document to read
        file: PathBuf,

        #[arg(short, long, value_enum)]
        kind: Option<DocumentKind>,

        /// Spaces per nesting level, 0 for compact output
        #[arg(long)]
        indent: Option<usize>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the typed model as JSON
    Dump {
        /// Document to read
        file: PathBuf,

        #[arg(short, long, value_enum)]
        kind: Option<DocumentKind>,
    },
}

impl Command {
    pub fn file(&self) -> &PathBuf {
        match self {
            Command::Check { file, .. } | Command::Normalize { file, .. } | Command::Dump { file, .. } => file,
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        match self {
            Command::Check { kind, .. } | Command::Normalize { kind, .. } | Command::Dump { kind, .. } => *kind,
        }
    }
}
