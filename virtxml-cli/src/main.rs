//! # virtxml
//!
//! Checks libvirt domain and node device XML against their grammars,
//! rewrites them in canonical form and exports the typed model as JSON.
//!
//! ## Usage
//! ```bash
//! virtxml check /etc/libvirt/qemu/vm.xml
//! virtxml normalize vm.xml --indent 4 -o vm.normalized.xml
//! virtxml dump --kind nodedev pci_0000_03_00_0.xml
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use virtxml_cli::cli::Args;
use virtxml_cli::config::Config;
use virtxml_cli::commands;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so the file can set the level
    let (config, source) = Config::resolve(&args)?;

    // Initialize logging
    virtxml_common::init_logging(&config.logging.level, config.logging.log_format()?)?;

    match source {
        Some(path) => info!(config_path = %path.display(), "Configuration loaded"),
        None => debug!("No configuration file, using defaults"),
    }

    if let Err(e) = commands::run(&args.command, &config) {
        error!(error = %e, file = %args.command.file().display(), "Command failed");
        return Err(e);
    }

    Ok(())
}
