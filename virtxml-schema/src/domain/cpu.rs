//! `<cpu>`: guest CPU model, topology and NUMA layout.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use crate::domain::memory::MemoryAccessMode;
use crate::types::{Cpuset, Unit, YesNo};

xml_enum! {
    pub enum CpuMode {
        Custom = "custom",
        HostModel = "host-model",
        HostPassthrough = "host-passthrough",
        Maximum = "maximum",
    }
}

xml_enum! {
    pub enum CpuMatch {
        Minimum = "minimum",
        Exact = "exact",
        Strict = "strict",
    }
}

xml_enum! {
    pub enum CpuCheck {
        None = "none",
        Partial = "partial",
        Full = "full",
    }
}

xml_enum! {
    pub enum ModelFallback {
        Allow = "allow",
        Forbid = "forbid",
    }
}

xml_enum! {
    pub enum FeaturePolicy {
        Force = "force",
        Require = "require",
        Optional = "optional",
        Disable = "disable",
        Forbid = "forbid",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuModel {
    pub fallback: Option<ModelFallback>,
    pub vendor_id: Option<String>,
    pub name: String,
}

impl Fragment for CpuModel {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            fallback: c.optional_attribute("fallback")?,
            vendor_id: c.optional_attribute("vendor_id")?,
            name: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("fallback", &self.fallback);
        e.put_optional("vendor_id", &self.vendor_id);
        e.put_text(&self.name);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub sockets: u32,
    pub dies: Option<u32>,
    pub cores: u32,
    pub threads: u32,
}

impl Topology {
    /// Total logical CPUs described by this topology.
    pub fn vcpus(&self) -> u32 {
        self.sockets * self.dies.unwrap_or(1) * self.cores * self.threads
    }
}

impl Fragment for Topology {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            sockets: c.attribute("sockets")?,
            dies: c.optional_attribute("dies")?,
            cores: c.attribute("cores")?,
            threads: c.attribute("threads")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("sockets", &self.sockets);
        e.put_optional("dies", &self.dies);
        e.put("cores", &self.cores);
        e.put("threads", &self.threads);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuFeature {
    pub policy: Option<FeaturePolicy>,
    pub name: String,
}

impl Fragment for CpuFeature {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            policy: c.optional_attribute("policy")?,
            name: c.attribute("name")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("policy", &self.policy);
        e.put("name", &self.name);
        Ok(())
    }
}

/// One guest NUMA node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumaCell {
    pub id: Option<u32>,
    pub cpus: Cpuset,
    pub memory: u64,
    pub unit: Option<Unit>,
    pub mem_access: Option<MemoryAccessMode>,
}

impl Fragment for NumaCell {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            id: c.optional_attribute("id")?,
            cpus: c.attribute("cpus")?,
            memory: c.attribute("memory")?,
            unit: c.optional_attribute("unit")?,
            mem_access: c.optional_attribute("memAccess")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("id", &self.id);
        e.put("cpus", &self.cpus);
        e.put("memory", &self.memory);
        e.put_optional("unit", &self.unit);
        e.put_optional("memAccess", &self.mem_access);
        Ok(())
    }
}

/// `<numa>` holds at least one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numa {
    pub cells: Vec<NumaCell>,
}

impl Fragment for Numa {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let cells = c.one_or_more(|c| c.element("cell", NumaCell::consume))?;
        Some(Self { cells })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_at_least_one("cell", &self.cells)
    }
}

/// `<cpu>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    pub mode: Option<CpuMode>,
    pub match_mode: Option<CpuMatch>,
    pub check: Option<CpuCheck>,
    pub migratable: Option<YesNo>,
    pub model: Option<CpuModel>,
    pub vendor: Option<String>,
    pub topology: Option<Topology>,
    pub features: Vec<CpuFeature>,
    pub numa: Option<Numa>,
}

impl Fragment for Cpu {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut cpu = Cpu {
            mode: c.optional_attribute("mode")?,
            match_mode: c.optional_attribute("match")?,
            check: c.optional_attribute("check")?,
            migratable: c.optional_attribute("migratable")?,
            ..Cpu::default()
        };

        c.interleave(vec![
            member(|c| {
                cpu.model = c.optional(|c| c.element("model", CpuModel::consume));
                Some(())
            }),
            member(|c| {
                cpu.vendor = c.optional(|c| c.text_element("vendor"));
                Some(())
            }),
            member(|c| {
                cpu.topology = c.optional(|c| c.element("topology", Topology::consume));
                Some(())
            }),
            member(|c| {
                cpu.features = c.zero_or_more(|c| c.element("feature", CpuFeature::consume));
                Some(())
            }),
            member(|c| {
                cpu.numa = c.optional(|c| c.element("numa", Numa::consume));
                Some(())
            }),
        ])?;

        Some(cpu)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("mode", &self.mode);
        e.put_optional("match", &self.match_mode);
        e.put_optional("check", &self.check);
        e.put_optional("migratable", &self.migratable);
        e.push_optional("model", &self.model)?;
        e.push_optional_text_element("vendor", &self.vendor);
        e.push_optional("topology", &self.topology)?;
        e.push_all("feature", &self.features)?;
        e.push_optional("numa", &self.numa)?;
        Ok(())
    }
}
