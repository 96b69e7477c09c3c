//! `<memory model='dimm'>`: hotpluggable memory module.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, push_alias_and_address};
use crate::domain::address::Address;
use crate::domain::memory::ScaledInteger;
use crate::types::Cpuset;

xml_enum! {
    pub enum MemoryModel {
        Dimm = "dimm",
    }
}

/// Host backing of the module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySource {
    pub pagesize: Option<ScaledInteger>,
    /// Host NUMA nodes to allocate from.
    pub nodemask: Option<Cpuset>,
}

impl Fragment for MemorySource {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut source = MemorySource::default();
        c.interleave(vec![
            member(|c| {
                source.pagesize = c.optional(|c| c.element("pagesize", ScaledInteger::consume));
                Some(())
            }),
            member(|c| {
                source.nodemask = c.optional(|c| c.text_element("nodemask"));
                Some(())
            }),
        ])?;
        Some(source)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional("pagesize", &self.pagesize)?;
        e.push_optional_text_element("nodemask", &self.nodemask);
        Ok(())
    }
}

/// Size of the module and the guest NUMA node it is plugged into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTarget {
    pub size: ScaledInteger,
    pub node: Option<u32>,
}

impl Fragment for MemoryTarget {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut size = None;
        let mut node = None;
        c.interleave(vec![
            member(|c| {
                size = Some(c.element("size", ScaledInteger::consume)?);
                Some(())
            }),
            member(|c| {
                node = c.optional(|c| c.text_element("node"));
                Some(())
            }),
        ])?;
        Some(Self { size: size?, node })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_fragment("size", &self.size)?;
        e.push_optional_text_element("node", &self.node);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDevice {
    pub model: MemoryModel,
    pub source: Option<MemorySource>,
    pub target: MemoryTarget,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl MemoryDevice {
    /// A DIMM of `size` KiB, optionally bound to guest NUMA `node`.
    pub fn dimm(size_kib: u64, node: Option<u32>) -> Self {
        Self {
            model: MemoryModel::Dimm,
            source: None,
            target: MemoryTarget {
                size: ScaledInteger::kib(size_kib),
                node,
            },
            alias: None,
            address: None,
        }
    }
}

impl Fragment for MemoryDevice {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let model = c.attribute("model")?;
        let mut source = None;
        let mut target = None;
        let mut alias_name = None;
        let mut location = None;
        c.interleave(vec![
            member(|c| {
                source = c.optional(|c| c.element("source", MemorySource::consume));
                Some(())
            }),
            member(|c| {
                target = Some(c.element("target", MemoryTarget::consume)?);
                Some(())
            }),
            member(|c| address(c, &mut location)),
            member(|c| alias(c, &mut alias_name)),
        ])?;
        Some(Self {
            model,
            source,
            target: target?,
            alias: alias_name,
            address: location,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("model", &self.model);
        e.push_optional("source", &self.source)?;
        e.push_fragment("target", &self.target)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}
