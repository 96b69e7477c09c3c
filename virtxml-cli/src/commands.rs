//! Command implementations.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use virtxml_marshal::Document as XmlDocument;
use virtxml_schema::{Domain, NodeDevice, Root};

use crate::cli::Command;
use crate::config::Config;

/// Grammar a document is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Domain,
    Nodedev,
    /// Pick the grammar from the root element name.
    #[default]
    Auto,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Domain => "domain",
            DocumentKind::Nodedev => "nodedev",
            DocumentKind::Auto => "auto",
        }
    }

    /// Grammar for a root element name.
    pub fn detect(root: &str) -> Option<Self> {
        match root {
            r if r == Domain::TAG => Some(DocumentKind::Domain),
            r if r == NodeDevice::TAG => Some(DocumentKind::Nodedev),
            _ => None,
        }
    }
}

/// A document accepted by one of the grammars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Domain(Box<Domain>),
    NodeDevice(NodeDevice),
}

impl Document {
    /// Parse `xml` and match it against the grammar for `kind`.
    pub fn parse(xml: &str, kind: DocumentKind) -> Result<Self> {
        let tree = XmlDocument::parse(xml).context("Document is not well-formed XML")?;
        let root = tree.root();

        let kind = match kind {
            DocumentKind::Auto => DocumentKind::detect(root.name())
                .with_context(|| format!("Cannot tell the document kind from root element <{}>", root.name()))?,
            explicit => explicit,
        };
        debug!(kind = kind.as_str(), root = root.name(), "Matching document");

        let document = match kind {
            DocumentKind::Domain => Document::Domain(Box::new(Domain::from_element(root)?)),
            DocumentKind::Nodedev => Document::NodeDevice(NodeDevice::from_element(root)?),
            DocumentKind::Auto => bail!("Document kind was not resolved"),
        };
        Ok(document)
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Domain(_) => DocumentKind::Domain,
            Document::NodeDevice(_) => DocumentKind::Nodedev,
        }
    }

    /// Name of the domain or node device.
    pub fn name(&self) -> &str {
        match self {
            Document::Domain(domain) => &domain.name,
            Document::NodeDevice(device) => &device.name,
        }
    }

    /// Regenerate the document; `indent` 0 gives compact output.
    pub fn to_xml(&self, indent: usize) -> Result<String> {
        let tree = match self {
            Document::Domain(domain) => domain.to_document()?,
            Document::NodeDevice(device) => device.to_document()?,
        };
        let indent = (indent > 0).then_some(indent);
        Ok(tree.to_xml(indent)?)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize document")
    }
}

/// Read and match `path`.
pub fn load(path: &Path, kind: DocumentKind) -> Result<Document> {
    let xml = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Document::parse(&xml, kind).with_context(|| format!("{} rejected", path.display()))
}

/// One-line summary printed by `check`.
pub fn check(path: &Path, kind: DocumentKind) -> Result<String> {
    let document = load(path, kind)?;
    info!(file = %path.display(), kind = document.kind().as_str(), "Document accepted");
    Ok(format!("{}: valid {} '{}'", path.display(), document.kind().as_str(), document.name()))
}

pub fn normalize(path: &Path, kind: DocumentKind, indent: usize) -> Result<String> {
    let document = load(path, kind)?;
    let mut xml = document.to_xml(indent)?;
    xml.push('\n');
    Ok(xml)
}

pub fn dump(path: &Path, kind: DocumentKind) -> Result<String> {
    load(path, kind)?.to_json()
}

/// Run a parsed command, writing its result to stdout or the requested file.
pub fn run(command: &Command, config: &Config) -> Result<()> {
    let kind = config.output.default_kind;
    match command {
        Command::Check { file, .. } => println!("{}", check(file, kind)?),
        Command::Normalize { file, output, .. } => {
            let xml = normalize(file, kind, config.output.indent)?;
            match output {
                Some(target) => {
                    std::fs::write(target, xml).with_context(|| format!("Failed to write {}", target.display()))?;
                    info!(file = %target.display(), "Normalized document written");
                }
                None => print!("{}", xml),
            }
        }
        Command::Dump { file, .. } => println!("{}", dump(file, kind)?),
    }
    Ok(())
}
