//! `<capability type='pci'>`

use serde::{Deserialize, Serialize};
use virtxml_marshal::{xml_enum, Cursor, Element, Fragment, Result};

use super::IdName;
use crate::types::{HexUint, Speed};

xml_enum! {
    pub enum PciBridgeType {
        PciBridge = "pci-bridge",
        CardbusBridge = "cardbus-bridge",
    }
}

xml_enum! {
    /// Whether a PCIe link entry describes capability or current status.
    pub enum LinkValidity {
        Cap = "cap",
        Sta = "sta",
    }
}

/// `<address domain='0x0000' bus='0x02' slot='0x00' function='0x1'/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciFunctionAddress {
    pub domain: HexUint,
    pub bus: HexUint,
    pub slot: HexUint,
    pub function: HexUint,
}

impl Fragment for PciFunctionAddress {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            domain: c.attribute("domain")?,
            bus: c.attribute("bus")?,
            slot: c.attribute("slot")?,
            function: c.attribute("function")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("domain", &self.domain);
        e.put("bus", &self.bus);
        e.put("slot", &self.slot);
        e.put("function", &self.function);
        Ok(())
    }
}

/// Physical function of an SR-IOV virtual function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysFunction {
    pub address: Option<PciFunctionAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtFunctions {
    pub max_count: Option<u32>,
    pub addresses: Vec<PciFunctionAddress>,
}

/// A mediated device type the PCI device can instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdevType {
    pub id: String,
    pub name: Option<String>,
    pub available_instances: u32,
}

impl Fragment for MdevType {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            id: c.attribute("id")?,
            name: c.optional(|c| c.text_element("name")),
            available_instances: {
                c.element("deviceAPI", |c| c.fixed_text("vfio-pci"))?;
                c.text_element("availableInstances")?
            },
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("id", &self.id);
        e.push_optional_text_element("name", &self.name);
        e.push_text_element("deviceAPI", &"vfio-pci".to_string());
        e.push_text_element("availableInstances", &self.available_instances);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IommuGroup {
    pub number: u32,
    pub addresses: Vec<PciFunctionAddress>,
}

impl Fragment for IommuGroup {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            number: c.attribute("number")?,
            addresses: c.one_or_more(|c| c.element("address", PciFunctionAddress::consume))?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("number", &self.number);
        e.push_at_least_one("address", &self.addresses)
    }
}

/// `<link validity='cap' port='1' speed='8' width='16'/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciExpressLink {
    pub validity: LinkValidity,
    pub port: Option<u32>,
    pub speed: Option<Speed>,
    pub width: u32,
}

impl Fragment for PciExpressLink {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            validity: c.attribute("validity")?,
            port: c.optional_attribute("port")?,
            speed: c.optional_attribute("speed")?,
            width: c.attribute("width")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("validity", &self.validity);
        e.put_optional("port", &self.port);
        e.put_optional("speed", &self.speed);
        e.put("width", &self.width);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciCapability {
    pub domain: u64,
    pub bus: u64,
    pub slot: u64,
    pub function: u64,
    pub product: IdName,
    pub vendor: IdName,
    pub phys_function: Option<PhysFunction>,
    pub virt_functions: Option<VirtFunctions>,
    pub bridge: Option<PciBridgeType>,
    pub mdev_types: Option<Vec<MdevType>>,
    pub iommu_group: Option<IommuGroup>,
    /// `<numa node='..'/>`; the node may be omitted.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
    pub numa: Option<Option<i32>>,
    pub pci_express: Option<Vec<PciExpressLink>>,
}

fn sub_capability<'a, T>(
    c: &mut Cursor<'a>,
    kind: &str,
    content: impl FnOnce(&mut Cursor<'a>) -> Option<T>,
) -> Option<T> {
    c.optional(|c| {
        c.element("capability", |c| {
            c.fixed_attribute("type", kind)?;
            content(c)
        })
    })
}

fn push_sub_capability(e: &mut Element, kind: &str, content: impl FnOnce(&mut Element) -> Result<()>) -> Result<()> {
    e.push_element("capability", |cap| {
        cap.put_fixed("type", kind);
        content(cap)
    })
}

impl Fragment for PciCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            domain: c.text_element("domain")?,
            bus: c.text_element("bus")?,
            slot: c.text_element("slot")?,
            function: c.text_element("function")?,
            product: c.element("product", IdName::consume)?,
            vendor: c.element("vendor", IdName::consume)?,
            phys_function: sub_capability(c, "phys_function", |c| {
                Some(PhysFunction {
                    address: c.optional(|c| c.element("address", PciFunctionAddress::consume)),
                })
            }),
            virt_functions: sub_capability(c, "virt_functions", |c| {
                Some(VirtFunctions {
                    max_count: c.optional_attribute("maxCount")?,
                    addresses: c.zero_or_more(|c| c.element("address", PciFunctionAddress::consume)),
                })
            }),
            bridge: c.optional(|c| c.element("capability", |c| c.attribute("type"))),
            mdev_types: sub_capability(c, "mdev_types", |c| {
                c.one_or_more(|c| c.element("type", MdevType::consume))
            }),
            iommu_group: c.optional(|c| c.element("iommuGroup", IommuGroup::consume)),
            numa: c.optional(|c| c.element("numa", |c| c.optional_attribute("node"))),
            pci_express: c.optional(|c| {
                c.element("pci-express", |c| Some(c.zero_or_more(|c| c.element("link", PciExpressLink::consume))))
            }),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("domain", &self.domain);
        e.push_text_element("bus", &self.bus);
        e.push_text_element("slot", &self.slot);
        e.push_text_element("function", &self.function);
        e.push_fragment("product", &self.product)?;
        e.push_fragment("vendor", &self.vendor)?;
        if let Some(phys) = &self.phys_function {
            push_sub_capability(e, "phys_function", |cap| cap.push_optional("address", &phys.address))?;
        }
        if let Some(virt) = &self.virt_functions {
            push_sub_capability(e, "virt_functions", |cap| {
                cap.put_optional("maxCount", &virt.max_count);
                cap.push_all("address", &virt.addresses)
            })?;
        }
        if let Some(bridge) = &self.bridge {
            push_sub_capability(e, bridge.as_str(), |_| Ok(()))?;
        }
        if let Some(types) = &self.mdev_types {
            push_sub_capability(e, "mdev_types", |cap| cap.push_at_least_one("type", types))?;
        }
        e.push_optional("iommuGroup", &self.iommu_group)?;
        if let Some(node) = &self.numa {
            e.push_element("numa", |n| {
                n.put_optional("node", node);
                Ok(())
            })?;
        }
        if let Some(links) = &self.pci_express {
            e.push_element("pci-express", |p| p.push_all("link", links))?;
        }
        Ok(())
    }
}
