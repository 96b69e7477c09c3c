//! Generate-side helpers: writing typed values into an [`Element`].

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::traits::{Fragment, Scalar};

impl Element {
    /// Set attribute `name` from a scalar.
    pub fn put<T: Scalar>(&mut self, name: &str, value: &T) {
        self.set_attribute(name, value.to_text());
    }

    /// Set attribute `name` when a value is present.
    pub fn put_optional<T: Scalar>(&mut self, name: &str, value: &Option<T>) {
        if let Some(value) = value {
            self.put(name, value);
        }
    }

    /// Set an attribute whose value is fixed by the grammar.
    pub fn put_fixed(&mut self, name: &str, literal: &str) {
        self.set_attribute(name, literal);
    }

    /// Append a scalar as text content.
    pub fn put_text<T: Scalar>(&mut self, value: &T) {
        self.push_text(value.to_text());
    }

    /// Append a child element whose content is written by `content`.
    pub fn push_element(
        &mut self,
        name: &str,
        content: impl FnOnce(&mut Element) -> Result<()>,
    ) -> Result<()> {
        let mut child = Element::new(name);
        content(&mut child)?;
        self.push_child(child);
        Ok(())
    }

    /// Append `<name>` holding the content of `value`.
    pub fn push_fragment<F: Fragment>(&mut self, name: &str, value: &F) -> Result<()> {
        self.push_element(name, |child| value.produce(child))
    }

    pub fn push_optional<F: Fragment>(&mut self, name: &str, value: &Option<F>) -> Result<()> {
        match value {
            Some(value) => self.push_fragment(name, value),
            None => Ok(()),
        }
    }

    /// Append one `<name>` per item.
    pub fn push_all<F: Fragment>(&mut self, name: &str, values: &[F]) -> Result<()> {
        values.iter().try_for_each(|value| self.push_fragment(name, value))
    }

    /// Like [`Element::push_all`], for lists the grammar requires to be
    /// non-empty.
    pub fn push_at_least_one<F: Fragment>(&mut self, name: &str, values: &[F]) -> Result<()> {
        if values.is_empty() {
            return Err(Error::Incomplete(format!("<{}> list of <{}>", self.name(), name)));
        }
        self.push_all(name, values)
    }

    /// `<name>value</name>`
    pub fn push_text_element<T: Scalar>(&mut self, name: &str, value: &T) {
        self.push_child(Element::new(name).with_text(value.to_text()));
    }

    pub fn push_optional_text_element<T: Scalar>(&mut self, name: &str, value: &Option<T>) {
        if let Some(value) = value {
            self.push_text_element(name, value);
        }
    }

    /// Append an empty `<name/>` when `set`.
    pub fn push_flag(&mut self, name: &str, set: bool) {
        if set {
            self.push_child(Element::new(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_values_are_skipped() {
        let mut element = Element::new("vcpu");
        element.put_optional::<u32>("current", &None);
        element.put_optional("cpuset", &Some("0-3".to_string()));
        element.put_text(&4u32);
        assert_eq!(element.attribute("current"), None);
        assert_eq!(element.attribute("cpuset"), Some("0-3"));
        assert_eq!(element.text(), "4");
    }

    #[test]
    fn test_flags_and_text_elements() {
        let mut element = Element::new("features");
        element.push_flag("acpi", true);
        element.push_flag("pae", false);
        element.push_optional_text_element::<String>("title", &None);
        element.push_text_element("name", &"vm".to_string());

        let names: Vec<_> = element.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["acpi", "name"]);
    }

    #[test]
    fn test_empty_required_list_is_incomplete() {
        let mut element = Element::new("numa");
        let cells: Vec<Element> = Vec::new();
        let err = element.push_at_least_one("cell", &cells).unwrap_err();
        assert!(matches!(err, Error::Incomplete(_)));
    }
}
