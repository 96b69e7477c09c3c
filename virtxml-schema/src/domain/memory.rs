//! Memory sizing, memory backing, vCPU count and CPU tuning.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, Cursor, Element, Fragment, Result};

use crate::types::{Cpuset, OnOff, Unit};

/// An integer with an optional size unit, e.g. `<currentMemory unit='KiB'>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledInteger {
    pub unit: Option<Unit>,
    pub value: u64,
}

impl ScaledInteger {
    /// Value in KiB, the libvirt default unit.
    pub fn kib(value: u64) -> Self {
        Self {
            unit: Unit::new("KiB").ok(),
            value,
        }
    }
}

impl Fragment for ScaledInteger {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            unit: c.optional_attribute("unit")?,
            value: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("unit", &self.unit);
        e.put_text(&self.value);
        Ok(())
    }
}

/// `<memory>`: initial memory allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    pub unit: Option<Unit>,
    pub dump_core: Option<OnOff>,
    pub value: u64,
}

impl Fragment for Memory {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            unit: c.optional_attribute("unit")?,
            dump_core: c.optional_attribute("dumpCore")?,
            value: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("unit", &self.unit);
        e.put_optional("dumpCore", &self.dump_core);
        e.put_text(&self.value);
        Ok(())
    }
}

/// `<maxMemory>`: hotplug ceiling and number of memory slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxMemory {
    pub slots: u32,
    pub unit: Option<Unit>,
    pub value: u64,
}

impl Fragment for MaxMemory {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            slots: c.attribute("slots")?,
            unit: c.optional_attribute("unit")?,
            value: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("slots", &self.slots);
        e.put_optional("unit", &self.unit);
        e.put_text(&self.value);
        Ok(())
    }
}

virtxml_marshal::xml_enum! {
    pub enum MemorySourceType {
        File = "file",
        Anonymous = "anonymous",
        Memfd = "memfd",
    }
}

virtxml_marshal::xml_enum! {
    pub enum MemoryAccessMode {
        Shared = "shared",
        Private = "private",
    }
}

virtxml_marshal::xml_enum! {
    pub enum MemoryAllocationMode {
        Immediate = "immediate",
        Ondemand = "ondemand",
    }
}

/// `<memoryBacking>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBacking {
    pub hugepages: bool,
    pub nosharepages: bool,
    pub locked: bool,
    pub source: Option<MemorySourceType>,
    pub access: Option<MemoryAccessMode>,
    pub allocation: Option<MemoryAllocationMode>,
}

impl Fragment for MemoryBacking {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut backing = MemoryBacking::default();
        c.interleave(vec![
            member(|c| {
                backing.hugepages = c.flag("hugepages");
                Some(())
            }),
            member(|c| {
                backing.nosharepages = c.flag("nosharepages");
                Some(())
            }),
            member(|c| {
                backing.locked = c.flag("locked");
                Some(())
            }),
            member(|c| {
                backing.source = c.optional(|c| c.element("source", |c| c.attribute("type")));
                Some(())
            }),
            member(|c| {
                backing.access = c.optional(|c| c.element("access", |c| c.attribute("mode")));
                Some(())
            }),
            member(|c| {
                backing.allocation =
                    c.optional(|c| c.element("allocation", |c| c.attribute("mode")));
                Some(())
            }),
        ])?;
        Some(backing)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_flag("hugepages", self.hugepages);
        e.push_flag("nosharepages", self.nosharepages);
        e.push_flag("locked", self.locked);
        if let Some(source) = &self.source {
            e.push_element("source", |s| {
                s.put("type", source);
                Ok(())
            })?;
        }
        if let Some(access) = &self.access {
            e.push_element("access", |a| {
                a.put("mode", access);
                Ok(())
            })?;
        }
        if let Some(allocation) = &self.allocation {
            e.push_element("allocation", |a| {
                a.put("mode", allocation);
                Ok(())
            })?;
        }
        Ok(())
    }
}

virtxml_marshal::xml_enum! {
    pub enum Placement {
        Static = "static",
        Auto = "auto",
    }
}

/// `<vcpu placement='static' cpuset='0-3' current='2'>4</vcpu>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vcpu {
    pub placement: Option<Placement>,
    pub cpuset: Option<Cpuset>,
    pub current: Option<u32>,
    pub count: u32,
}

impl Vcpu {
    pub fn new(count: u32) -> Self {
        Self {
            placement: None,
            cpuset: None,
            current: None,
            count,
        }
    }
}

impl Fragment for Vcpu {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            placement: c.optional_attribute("placement")?,
            cpuset: c.optional_attribute("cpuset")?,
            current: c.optional_attribute("current")?,
            count: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("placement", &self.placement);
        e.put_optional("cpuset", &self.cpuset);
        e.put_optional("current", &self.current);
        e.put_text(&self.count);
        Ok(())
    }
}

/// `<cputune>`: CFS shares and bandwidth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cputune {
    pub shares: Option<u64>,
    pub period: Option<u64>,
    pub quota: Option<i64>,
}

impl Fragment for Cputune {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut tune = Cputune::default();
        c.interleave(vec![
            member(|c| {
                tune.shares = c.optional(|c| c.text_element("shares"));
                Some(())
            }),
            member(|c| {
                tune.period = c.optional(|c| c.text_element("period"));
                Some(())
            }),
            member(|c| {
                tune.quota = c.optional(|c| c.text_element("quota"));
                Some(())
            }),
        ])?;
        Some(tune)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("shares", &self.shares);
        e.push_optional_text_element("period", &self.period);
        e.push_optional_text_element("quota", &self.quota);
        Ok(())
    }
}
