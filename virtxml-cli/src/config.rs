//! Configuration management for the virtxml tool.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use virtxml_common::LogFormat;

use crate::cli::{Args, Command};
use crate::commands::DocumentKind;

/// Default configuration location, used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/virtxml/config.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `--config`, or the default file when it exists,
    /// then apply the CLI overrides and check the result. Also returns the
    /// file that was read.
    pub fn resolve(args: &Args) -> Result<(Self, Option<PathBuf>)> {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        let (config, source) = match &args.config {
            Some(path) => (Self::load(path)?, Some(path.clone())),
            None if default_path.exists() => (Self::load(default_path)?, Some(default_path.to_path_buf())),
            None => (Self::default(), None),
        };

        let config = config.with_cli_overrides(args);
        config.validate().context("Invalid command-line options")?;
        Ok((config, source))
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }

        if args.json_logs {
            self.logging.format = LogFormat::Json.as_str().to_string();
        }

        if let Some(kind) = args.command.kind() {
            self.output.default_kind = kind;
        }

        if let Command::Normalize { indent: Some(indent), .. } = args.command {
            self.output.indent = indent;
        }

        self
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        self.logging.log_format()?;
        if self.output.indent > MAX_INDENT {
            anyhow::bail!("Indent of {} exceeds the maximum of {}", self.output.indent, MAX_INDENT);
        }
        Ok(())
    }
}

const MAX_INDENT: usize = 16;

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (pretty, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn log_format(&self) -> Result<LogFormat> {
        self.format.parse()
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Spaces per nesting level when normalizing, 0 for compact output
    pub indent: usize,
    /// Grammar used when a command does not name one
    pub default_kind: DocumentKind,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            default_kind: DocumentKind::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.log_format().unwrap(), LogFormat::Pretty);
        assert_eq!(config.output.indent, 2);
        assert_eq!(config.output.default_kind, DocumentKind::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  default_kind: nodedev\nlogging:\n  format: json").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output.default_kind, DocumentKind::Nodedev);
        assert_eq!(config.output.indent, 2);
        assert_eq!(config.logging.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  format: xml").unwrap();
        assert!(Config::load(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  default_kind: network").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "virtxml",
            "-l",
            "debug",
            "--json-logs",
            "normalize",
            "vm.xml",
            "--kind",
            "domain",
            "--indent",
            "0",
        ]);
        let config = Config::default().with_cli_overrides(&args);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.output.default_kind, DocumentKind::Domain);
        assert_eq!(config.output.indent, 0);
    }

    #[test]
    fn test_resolve_checks_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  indent: 2").unwrap();
        let config_path = file.path().to_str().unwrap();

        let args = Args::parse_from(["virtxml", "-c", config_path, "normalize", "vm.xml", "--indent", "4"]);
        let (config, source) = Config::resolve(&args).unwrap();
        assert_eq!(config.output.indent, 4);
        assert_eq!(source.as_deref(), Some(file.path()));

        let args = Args::parse_from(["virtxml", "-c", config_path, "normalize", "vm.xml", "--indent", "40"]);
        let err = Config::resolve(&args).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds the maximum"));
    }
}
