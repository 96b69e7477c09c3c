//! # virtxml CLI
//!
//! Library half of the `virtxml` binary: argument parsing, configuration
//! and the command implementations, split out so they can be tested
//! without spawning the binary.

pub mod cli;
pub mod commands;
pub mod config;

pub use commands::{Document, DocumentKind};
pub use config::Config;
