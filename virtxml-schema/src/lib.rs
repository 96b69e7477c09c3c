//! # virtxml Schema
//!
//! Typed bindings for the libvirt `<domain>` and node device `<device>`
//! documents.
//!
//! Every type implements [`Fragment`](virtxml_marshal::Fragment); the two
//! document roots also implement [`Root`], which is all a caller needs:
//!
//! ```rust,ignore
//! use virtxml_schema::{Domain, Root};
//!
//! let domain = Domain::from_xml(&std::fs::read_to_string("vm.xml")?)?;
//! println!("{}", domain.to_xml_pretty()?);
//! ```
//!
//! Value types with lexical constraints (paths, MAC addresses, PCI
//! address parts) live in [`types`] and can only be built from valid text.

pub mod domain;
pub mod nodedev;
pub mod types;

pub use domain::Domain;
pub use nodedev::NodeDevice;
pub use virtxml_marshal::Root;

#[cfg(test)]
pub(crate) mod testing {
    use virtxml_marshal::{Cursor, Document, Fragment};

    /// Consume the root element of `xml` as `T`.
    pub fn fragment<T: Fragment>(xml: &str) -> Option<T> {
        let doc = Document::parse(xml).unwrap();
        let root = doc.root();
        let mut c = Cursor::top(root);
        c.element(root.name(), T::consume)
    }
}
