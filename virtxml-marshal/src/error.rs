//! Error types for the marshalling engine.

use thiserror::Error;

/// Errors that can occur while reading, matching or writing XML.
#[derive(Error, Debug)]
pub enum Error {
    /// The document is not well-formed XML.
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// An attribute could not be decoded.
    #[error("Malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Names or text are not valid UTF-8.
    #[error("Invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The document contains no element at all.
    #[error("Document has no root element")]
    MissingRoot,

    /// A second top-level element follows the root.
    #[error("Document has more than one root element")]
    MultipleRoots,

    /// The input ended inside an element.
    #[error("Element <{0}> is not closed")]
    Unclosed(String),

    /// The tree is well-formed but does not match the grammar of the root type.
    #[error("Document does not match the <{element}> grammar")]
    Mismatch { element: String },

    /// A scalar value was rejected by its type.
    #[error("Invalid {kind} value: {value:?}")]
    InvalidValue { kind: &'static str, value: String },

    /// A value cannot be generated because required content is missing.
    #[error("Cannot generate {0}: required content is missing")]
    Incomplete(String),
}

impl Error {
    /// Shorthand used by the value macros.
    pub fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        Error::InvalidValue { kind, value: value.into() }
    }
}

/// Result type alias for marshalling operations.
pub type Result<T> = std::result::Result<T, Error>;
