//! Marshalling traits.
//!
//! [`Scalar`] converts leaf values (attribute values and text content),
//! [`Fragment`] converts element content, and [`Root`] adds the document
//! entry points for types that own a whole document.

use tracing::debug;

use crate::cursor::Cursor;
use crate::dom::{Document, Element, Node};
use crate::error::{Error, Result};

/// A value carried as attribute or text content.
pub trait Scalar: Sized {
    /// Parse and validate `text`. Returns `None` when it is not a valid value.
    fn parse_text(text: &str) -> Option<Self>;

    /// Textual form written back into the document.
    fn to_text(&self) -> String;
}

impl Scalar for String {
    fn parse_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn to_text(&self) -> String {
        self.clone()
    }
}

macro_rules! unsigned_scalar {
    ($($ty:ty),+) => {$(
        impl Scalar for $ty {
            fn parse_text(text: &str) -> Option<Self> {
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                text.parse().ok()
            }

            fn to_text(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

macro_rules! signed_scalar {
    ($($ty:ty),+) => {$(
        impl Scalar for $ty {
            fn parse_text(text: &str) -> Option<Self> {
                text.parse().ok()
            }

            fn to_text(&self) -> String {
                self.to_string()
            }
        }
    )+};
}

unsigned_scalar!(u8, u16, u32, u64);
signed_scalar!(i32, i64);

/// Element content: attributes, text and child elements of one element.
pub trait Fragment: Sized {
    /// Match this content at the cursor.
    fn consume(cursor: &mut Cursor<'_>) -> Option<Self>;

    /// Write this content into `element`, which already carries its name.
    fn produce(&self, element: &mut Element) -> Result<()>;
}

/// Raw subtrees pass through untouched.
impl Fragment for Element {
    fn consume(cursor: &mut Cursor<'_>) -> Option<Self> {
        let owner = cursor.owner()?;
        cursor.skip_remaining();
        Some(owner.clone())
    }

    fn produce(&self, element: &mut Element) -> Result<()> {
        for (name, value) in self.attributes() {
            element.set_attribute(name, value);
        }
        for child in self.children() {
            match child {
                Node::Element(child) => element.push_child(child.clone()),
                Node::Text(text) => element.push_text(text.clone()),
            }
        }
        Ok(())
    }
}

/// A type describing a whole document with root element [`Root::TAG`].
pub trait Root: Fragment {
    /// Name of the root element.
    const TAG: &'static str;

    /// Match an already parsed root element.
    fn from_element(element: &Element) -> Result<Self> {
        let mut cursor = Cursor::top(element);
        match cursor.element(Self::TAG, Self::consume) {
            Some(value) => Ok(value),
            None => {
                debug!(
                    expected = Self::TAG,
                    found = element.name(),
                    "Document rejected by grammar"
                );
                Err(Error::Mismatch {
                    element: Self::TAG.to_string(),
                })
            }
        }
    }

    /// Parse and match a document.
    fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml)?;
        Self::from_element(document.root())
    }

    fn to_element(&self) -> Result<Element> {
        let mut element = Element::new(Self::TAG);
        self.produce(&mut element)?;
        Ok(element)
    }

    fn to_document(&self) -> Result<Document> {
        Ok(Document::new(self.to_element()?))
    }

    /// Compact XML.
    fn to_xml(&self) -> Result<String> {
        self.to_document()?.to_xml(None)
    }

    /// XML indented by two spaces per level.
    fn to_xml_pretty(&self) -> Result<String> {
        self.to_document()?.to_xml(Some(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_rejects_signs_and_blanks() {
        assert_eq!(u32::parse_text("42"), Some(42));
        assert_eq!(u32::parse_text("+42"), None);
        assert_eq!(u32::parse_text("-1"), None);
        assert_eq!(u32::parse_text(" 1"), None);
        assert_eq!(u32::parse_text(""), None);
        assert_eq!(u8::parse_text("256"), None);
    }

    #[test]
    fn test_signed_accepts_negative() {
        assert_eq!(i32::parse_text("-1"), Some(-1));
        assert_eq!(i64::parse_text("x"), None);
    }

    #[test]
    fn test_string_keeps_whitespace() {
        assert_eq!(String::parse_text("  a b ").as_deref(), Some("  a b "));
        assert_eq!(7u64.to_text(), "7");
    }

    #[test]
    fn test_raw_element_passthrough() {
        let source = Element::new("metadata")
            .with_child(Element::new("app:info").with_attribute("xmlns:app", "urn:app").with_text("x"));
        let mut cursor = Cursor::top(&source);
        let raw = cursor.element("metadata", Element::consume).unwrap();
        assert_eq!(raw, source);

        let mut out = Element::new("metadata");
        raw.produce(&mut out).unwrap();
        assert_eq!(out, source);
    }
}
