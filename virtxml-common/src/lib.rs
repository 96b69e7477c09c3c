//! # virtxml Common
//!
//! Shared utilities for the virtxml crates.
//!
//! ## Logging
//!
//! ```rust,ignore
//! use virtxml_common::{init_logging, LogFormat};
//!
//! init_logging("info", LogFormat::Pretty).unwrap();
//! tracing::info!(file = "vm.xml", "Document accepted");
//! ```

pub mod logging;

pub use logging::{init_logging, init_logging_json, init_logging_pretty, LogFormat};
