//! Parse-side content-model engine.
//!
//! A [`Cursor`] is a position among the child elements of an owner element.
//! Every primitive either matches at the current position, advancing the
//! cursor and returning the bound value, or returns `None`.
//!
//! When a primitive returns `None` the cursor it was given may have been
//! partially advanced. The combinators ([`Cursor::optional`],
//! [`Cursor::zero_or_more`], [`Cursor::choice`], [`Cursor::interleave`])
//! always run their inner patterns on copies and only commit on success,
//! so a failed sequence never leaks into its caller.
//!
//! Each cursor accumulates a weight: matched elements count 1, attributes
//! and text count 0. Alternations use it to pick the alternative that
//! consumed the most structure.

use tracing::trace;

use crate::dom::{Element, Node};
use crate::traits::Scalar;

#[derive(Debug, Clone, Copy)]
enum Level<'a> {
    /// Above the document root: the only child is the root itself.
    Top(&'a Element),
    /// Inside an element: attributes and text belong to it.
    Inside(&'a Element),
}

/// Parse position within an element tree.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    level: Level<'a>,
    /// Index into the owner's child nodes of the next unconsumed node.
    next: usize,
    weight: u32,
}

impl<'a> Cursor<'a> {
    /// Cursor positioned before the document root.
    pub fn top(root: &'a Element) -> Self {
        Self {
            level: Level::Top(root),
            next: 0,
            weight: 0,
        }
    }

    /// Cursor positioned before the first child of `owner`.
    pub fn inside(owner: &'a Element) -> Self {
        Self {
            level: Level::Inside(owner),
            next: 0,
            weight: 0,
        }
    }

    /// Accumulated weight of everything matched so far.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// The element whose attributes and text are in scope.
    pub fn owner(&self) -> Option<&'a Element> {
        match self.level {
            Level::Top(_) => None,
            Level::Inside(owner) => Some(owner),
        }
    }

    /// True when every child element has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.peek().is_none()
    }

    /// Next unconsumed child element with its node index.
    fn peek(&self) -> Option<(usize, &'a Element)> {
        match self.level {
            Level::Top(root) => (self.next == 0).then_some((0, root)),
            Level::Inside(owner) => owner
                .children()
                .iter()
                .enumerate()
                .skip(self.next)
                .find_map(|(index, node)| match node {
                    Node::Element(element) => Some((index, element)),
                    Node::Text(_) => None,
                }),
        }
    }

    fn advance_past(&mut self, index: usize) {
        self.next = index + 1;
        self.weight += 1;
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Match the next child element named `name`, running `content` on its
    /// contents. Fails when the name differs or when `content` leaves child
    /// elements unconsumed.
    pub fn element<T>(
        &mut self,
        name: &str,
        content: impl FnOnce(&mut Cursor<'a>) -> Option<T>,
    ) -> Option<T> {
        let (index, child) = self.peek()?;
        if child.name() != name {
            trace!(expected = name, found = child.name(), "Element name mismatch");
            return None;
        }

        let mut inner = Cursor::inside(child);
        let value = content(&mut inner)?;
        if let Some((_, extra)) = inner.peek() {
            trace!(element = name, unexpected = extra.name(), "Unconsumed child element");
            return None;
        }

        self.advance_past(index);
        Some(value)
    }

    /// Match the next child element named `name` and keep it as a raw
    /// subtree without interpreting its contents.
    pub fn any_element(&mut self, name: &str) -> Option<Element> {
        let (index, child) = self.peek()?;
        if child.name() != name {
            return None;
        }
        self.advance_past(index);
        Some(child.clone())
    }

    /// Consume every remaining child element without interpreting it.
    pub fn skip_remaining(&mut self) {
        while let Some((index, _)) = self.peek() {
            self.advance_past(index);
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Bind attribute `name` of the owner.
    pub fn attribute<T: Scalar>(&self, name: &str) -> Option<T> {
        let raw = self.owner()?.attribute(name)?;
        let value = T::parse_text(raw);
        if value.is_none() {
            trace!(attribute = name, value = raw, "Rejected attribute value");
        }
        value
    }

    /// Attribute that may be absent. Never fails: a value that is present
    /// but invalid is dropped like an absent one.
    pub fn optional_attribute<T: Scalar>(&self, name: &str) -> Option<Option<T>> {
        let value = self.owner().and_then(|owner| owner.attribute(name)).and_then(|_| self.attribute(name));
        Some(value)
    }

    /// Require attribute `name` to carry exactly `literal`.
    pub fn fixed_attribute(&self, name: &str, literal: &str) -> Option<()> {
        (self.owner()?.attribute(name)? == literal).then_some(())
    }

    /// Bind the owner's text content.
    pub fn text<T: Scalar>(&self) -> Option<T> {
        let raw = self.owner()?.text();
        let value = T::parse_text(&raw);
        if value.is_none() {
            trace!(value = raw.as_str(), "Rejected text value");
        }
        value
    }

    /// Require the owner's text to be exactly `literal`.
    pub fn fixed_text(&self, literal: &str) -> Option<()> {
        (self.owner()?.text() == literal).then_some(())
    }

    /// Succeeds when the owner has no meaningful text.
    pub fn empty(&self) -> Option<()> {
        self.owner()?.text().trim().is_empty().then_some(())
    }

    /// `<name>value</name>`
    pub fn text_element<T: Scalar>(&mut self, name: &str) -> Option<T> {
        self.element(name, |c| c.text())
    }

    /// Optional empty element mapped to a boolean.
    pub fn flag(&mut self, name: &str) -> bool {
        self.optional(|c| c.element(name, |c| c.empty())).is_some()
    }

    // =========================================================================
    // Combinators
    // =========================================================================

    /// Zero or one occurrence. Never fails; absence yields `None`.
    pub fn optional<T>(&mut self, pattern: impl FnOnce(&mut Cursor<'a>) -> Option<T>) -> Option<T> {
        let mut trial = *self;
        let value = pattern(&mut trial)?;
        *self = trial;
        Some(value)
    }

    /// Repeat `pattern` while each iteration consumes at least one element.
    pub fn zero_or_more<T>(&mut self, mut pattern: impl FnMut(&mut Cursor<'a>) -> Option<T>) -> Vec<T> {
        let mut values = Vec::new();
        loop {
            let mut trial = *self;
            match pattern(&mut trial) {
                Some(value) if trial.weight > self.weight => {
                    *self = trial;
                    values.push(value);
                }
                _ => break,
            }
        }
        values
    }

    /// Like [`Cursor::zero_or_more`] but fails when nothing matched.
    pub fn one_or_more<T>(&mut self, pattern: impl FnMut(&mut Cursor<'a>) -> Option<T>) -> Option<Vec<T>> {
        let values = self.zero_or_more(pattern);
        (!values.is_empty()).then_some(values)
    }

    /// Start an alternation at the current position.
    ///
    /// ```ignore
    /// let source = c
    ///     .choice()
    ///     .or(|c| c.element("file", File::consume).map(Source::File))
    ///     .or(|c| c.element("dev", Dev::consume).map(Source::Dev))
    ///     .select(c)?;
    /// ```
    pub fn choice<T>(&self) -> Choice<'a, T> {
        Choice {
            start: *self,
            best: None,
        }
    }

    /// Match every member exactly once, in any order.
    ///
    /// Each round runs all pending members from the current position and
    /// commits the one with the greatest weight (the earliest on ties). The
    /// interleave fails as soon as a round has no matching member.
    ///
    /// Members report their values through captured slots. A member that
    /// matched but lost a round is run again in a later round, so the slot
    /// always holds the value of the run that was committed.
    pub fn interleave(&mut self, mut members: Vec<Member<'a, '_>>) -> Option<()> {
        let mut pending: Vec<usize> = (0..members.len()).collect();

        while !pending.is_empty() {
            let mut best: Option<(usize, Cursor<'a>)> = None;

            for (slot, &member) in pending.iter().enumerate() {
                let mut trial = *self;
                if members[member](&mut trial).is_none() {
                    continue;
                }
                let better = match &best {
                    Some((_, current)) => trial.weight > current.weight,
                    None => true,
                };
                if better {
                    best = Some((slot, trial));
                }
            }

            let Some((slot, end)) = best else {
                trace!(pending = pending.len(), "Interleave round without a match");
                return None;
            };
            *self = end;
            pending.remove(slot);
        }
        Some(())
    }
}

/// One member of an interleave; see [`Cursor::interleave`].
pub type Member<'a, 'm> = Box<dyn FnMut(&mut Cursor<'a>) -> Option<()> + 'm>;

/// Box a closure as an interleave member.
pub fn member<'a, 'm>(pattern: impl FnMut(&mut Cursor<'a>) -> Option<()> + 'm) -> Member<'a, 'm> {
    Box::new(pattern)
}

/// Alternation builder returned by [`Cursor::choice`].
#[must_use = "a choice does nothing until `select` is called"]
pub struct Choice<'a, T> {
    start: Cursor<'a>,
    best: Option<(Cursor<'a>, T)>,
}

impl<'a, T> Choice<'a, T> {
    /// Try one alternative from the starting position.
    pub fn or(mut self, alternative: impl FnOnce(&mut Cursor<'a>) -> Option<T>) -> Self {
        let mut trial = self.start;
        if let Some(value) = alternative(&mut trial) {
            let better = match &self.best {
                Some((current, _)) => trial.weight > current.weight,
                None => true,
            };
            if better {
                self.best = Some((trial, value));
            }
        }
        self
    }

    /// Commit the heaviest alternative to `cursor`.
    pub fn select(self, cursor: &mut Cursor<'a>) -> Option<T> {
        match self.best {
            Some((end, value)) => {
                trace!(weight = end.weight - self.start.weight, "Choice selected");
                *cursor = end;
                Some(value)
            }
            None => {
                trace!("No alternative matched");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn parse(xml: &str) -> Element {
        Document::parse(xml).unwrap().into_root()
    }

    #[test]
    fn test_element_consumes_and_weighs_one() {
        let root = parse("<r><a><x/><y/></a><b/></r>");
        let mut c = Cursor::inside(&root);

        let inner = c.element("a", |c| {
            c.element("x", |c| c.empty())?;
            c.element("y", |c| c.empty())?;
            Some(c.weight())
        });
        assert_eq!(inner, Some(2));
        assert_eq!(c.weight(), 1);
        assert!(!c.is_exhausted());
    }

    #[test]
    fn test_unconsumed_children_reject_element() {
        let root = parse("<r><a><x/><unknown/></a></r>");
        let mut c = Cursor::inside(&root);
        assert!(c.element("a", |c| c.element("x", |c| c.empty())).is_none());
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let root = parse("<r><a known='1' other='2'/></r>");
        let mut c = Cursor::inside(&root);
        let value: Option<u32> = c.element("a", |c| c.attribute("known"));
        assert_eq!(value, Some(1));
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let root = parse("<r><n> 5</n></r>");
        let mut c = Cursor::inside(&root);
        assert_eq!(c.text_element::<u32>("n"), None);
        let mut c = Cursor::inside(&root);
        assert_eq!(c.text_element::<String>("n").as_deref(), Some(" 5"));
    }

    #[test]
    fn test_optional_attribute_drops_invalid() {
        let root = parse("<r count='x' size='4'/>");
        let c = Cursor::inside(&root);
        assert_eq!(c.optional_attribute::<u32>("size"), Some(Some(4)));
        assert_eq!(c.optional_attribute::<u32>("missing"), Some(None));
        assert_eq!(c.optional_attribute::<u32>("count"), Some(None));
    }

    #[test]
    fn test_fixed_values() {
        let root = parse("<r type='smbios'>on</r>");
        let c = Cursor::inside(&root);
        assert!(c.fixed_attribute("type", "smbios").is_some());
        assert!(c.fixed_attribute("type", "other").is_none());
        assert!(c.fixed_text("on").is_some());
        assert!(c.empty().is_none());
    }

    #[test]
    fn test_optional_restores_on_failure() {
        let root = parse("<r><a/><b/></r>");
        let mut c = Cursor::inside(&root);
        // Matches <a>, then fails on <c>: nothing may be committed
        let value = c.optional(|c| {
            c.element("a", |c| c.empty())?;
            c.element("c", |c| c.empty())
        });
        assert!(value.is_none());
        assert_eq!(c.weight(), 0);
        assert!(c.flag("a"));
        assert!(c.flag("b"));
        assert!(c.is_exhausted());
    }

    #[test]
    fn test_repetition() {
        let root = parse("<r><i>1</i><i>2</i><i>3</i><j/></r>");
        let mut c = Cursor::inside(&root);
        let values: Vec<u32> = c.zero_or_more(|c| c.text_element("i"));
        assert_eq!(values, vec![1, 2, 3]);
        assert!(c.one_or_more(|c| c.text_element::<u32>("i")).is_none());
        assert!(c.one_or_more(|c| c.element("j", |c| c.empty())).is_some());
    }

    #[test]
    fn test_repetition_stops_on_weightless_match() {
        let root = parse("<r a='1'/>");
        let mut c = Cursor::inside(&root);
        let values: Vec<u32> = c.zero_or_more(|c| c.attribute("a"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_choice_prefers_heavier_alternative() {
        let root = parse("<r><a/><b/></r>");
        let mut c = Cursor::inside(&root);
        let picked = c
            .choice()
            .or(|c| c.element("a", |c| c.empty()).map(|_| "short"))
            .or(|c| {
                c.element("a", |c| c.empty())?;
                c.element("b", |c| c.empty())?;
                Some("long")
            })
            .select(&mut c);
        assert_eq!(picked, Some("long"));
        assert!(c.is_exhausted());
    }

    #[test]
    fn test_choice_tie_goes_to_first() {
        let root = parse("<r mode='x'/>");
        let mut c = Cursor::inside(&root);
        let picked = c
            .choice()
            .or(|c| c.fixed_attribute("mode", "x").map(|_| 1))
            .or(|c| c.attribute::<String>("mode").map(|_| 2))
            .select(&mut c);
        assert_eq!(picked, Some(1));
    }

    #[test]
    fn test_choice_without_match_fails() {
        let root = parse("<r><z/></r>");
        let mut c = Cursor::inside(&root);
        let picked: Option<()> = c
            .choice()
            .or(|c| c.element("a", |c| c.empty()))
            .or(|c| c.element("b", |c| c.empty()))
            .select(&mut c);
        assert!(picked.is_none());
    }

    #[test]
    fn test_interleave_any_order() {
        let root = parse("<r><b>2</b><c/><a>1</a></r>");
        let mut c = Cursor::inside(&root);

        let mut a: Option<u32> = None;
        let mut b: Option<u32> = None;
        let mut flag = false;
        let mut missing: Option<u32> = Some(99);
        c.interleave(vec![
            member(|c| {
                a = Some(c.text_element("a")?);
                Some(())
            }),
            member(|c| {
                missing = c.optional(|c| c.text_element("d"));
                Some(())
            }),
            member(|c| {
                b = Some(c.text_element("b")?);
                Some(())
            }),
            member(|c| {
                flag = c.flag("c");
                Some(())
            }),
        ])
        .unwrap();

        assert_eq!((a, b, flag, missing), (Some(1), Some(2), true, None));
        assert!(c.is_exhausted());
    }

    #[test]
    fn test_interleave_requires_every_member() {
        let root = parse("<r><a/></r>");
        let mut c = Cursor::inside(&root);
        let result = c.interleave(vec![
            member(|c| c.element("a", |c| c.empty())),
            member(|c| c.element("b", |c| c.empty())),
        ]);
        assert!(result.is_none());
    }

    #[test]
    fn test_top_cursor_matches_root_only() {
        let root = parse("<domain/>");
        let mut c = Cursor::top(&root);
        assert!(c.attribute::<String>("type").is_none());
        assert!(c.element("domain", |c| c.empty()).is_some());
        assert!(c.is_exhausted());
    }
}
