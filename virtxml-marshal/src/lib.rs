//! # virtxml marshal
//!
//! Engine that maps XML element trees onto typed Rust values and back.
//!
//! A binding is written once as a pair of functions per type:
//!
//! - [`Fragment::consume`] describes the content model with the
//!   [`Cursor`] primitives (elements, attributes, text, optional and
//!   repeated patterns, choices and interleaves);
//! - [`Fragment::produce`] writes the same content into an [`Element`].
//!
//! Types that own a whole document also implement [`Root`], which provides
//! `from_xml` and `to_xml`.
//!
//! ## Example
//!
//! ```
//! use virtxml_marshal::{Cursor, Element, Fragment, Result, Root};
//!
//! struct Memory {
//!     unit: Option<String>,
//!     value: u64,
//! }
//!
//! impl Fragment for Memory {
//!     fn consume(c: &mut Cursor<'_>) -> Option<Self> {
//!         Some(Self {
//!             unit: c.attribute("unit"),
//!             value: c.text()?,
//!         })
//!     }
//!
//!     fn produce(&self, e: &mut Element) -> Result<()> {
//!         e.put_optional("unit", &self.unit);
//!         e.put_text(&self.value);
//!         Ok(())
//!     }
//! }
//!
//! impl Root for Memory {
//!     const TAG: &'static str = "memory";
//! }
//!
//! let memory = Memory::from_xml("<memory unit='KiB'>1048576</memory>").unwrap();
//! assert_eq!(memory.value, 1048576);
//! assert_eq!(memory.to_xml().unwrap(), r#"<memory unit="KiB">1048576</memory>"#);
//! ```

pub mod cursor;
pub mod dom;
pub mod double_option;
pub mod error;
mod macros;
mod produce;
pub mod traits;

pub use cursor::{member, Choice, Cursor, Member};
pub use dom::{Document, Element, Node};
pub use error::{Error, Result};
pub use traits::{Fragment, Root, Scalar};

/// Re-exports used by the exported macros.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
    pub use regex::Regex;
    pub use serde;
}
