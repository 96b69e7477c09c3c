//! Host device descriptions: the node device `<device>` document.
//!
//! Unlike `<domain>`, every element of a node device document has a fixed
//! position, so the grammars here are plain sequences.

use serde::{Deserialize, Serialize};
use tracing::trace;
use virtxml_marshal::{Cursor, Element, Fragment, Result, Root};

use crate::types::{HexUint, Wwn};

mod misc;
mod net;
mod pci;
mod scsi;
mod storage;
mod system;
mod usb;

pub use misc::{CcwCapability, DrmType, MdevCapability};
pub use net::{NetCapability, NetLink, NetLinkState, NetSubcapability};
pub use pci::{
    IommuGroup, LinkValidity, MdevType, PciBridgeType, PciCapability, PciExpressLink, PciFunctionAddress,
    PhysFunction, VirtFunctions,
};
pub use scsi::{FcRemotePort, ScsiCapability, ScsiHostCapability, ScsiHostSubcapability, ScsiTargetCapability};
pub use storage::{StorageCapability, StorageMedia};
pub use system::{Firmware, Hardware, SystemCapability};
pub use usb::{UsbDeviceCapability, UsbInterfaceCapability};

/// `<vendor id='0x8086'>Intel Corporation</vendor>` and the matching
/// `<product>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdName {
    pub id: HexUint,
    pub name: String,
}

impl Fragment for IdName {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            id: c.attribute("id")?,
            name: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("id", &self.id);
        e.put_text(&self.name);
        Ok(())
    }
}

/// Parent of a device: another node device by name, or the fibre channel
/// fabric a vHBA is created on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent {
    Name(String),
    Wwn { wwnn: Wwn, wwpn: Wwn },
    FabricWwn(Wwn),
}

impl Fragment for Parent {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| {
                Some(Parent::Wwn {
                    wwnn: c.attribute("wwnn")?,
                    wwpn: c.attribute("wwpn")?,
                })
            })
            .or(|c| c.attribute("fabric_wwn").map(Parent::FabricWwn))
            .or(|c| {
                let name: String = c.text()?;
                (!name.is_empty()).then_some(Parent::Name(name))
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            Parent::Name(name) => e.put_text(name),
            Parent::Wwn { wwnn, wwpn } => {
                e.put("wwnn", wwnn);
                e.put("wwpn", wwpn);
            }
            Parent::FabricWwn(wwn) => e.put("fabric_wwn", wwn),
        }
        Ok(())
    }
}

/// One `<capability type='...'>` of a node device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    System(SystemCapability),
    Pci(PciCapability),
    UsbDevice(UsbDeviceCapability),
    Usb(UsbInterfaceCapability),
    Net(NetCapability),
    ScsiHost(ScsiHostCapability),
    ScsiTarget(ScsiTargetCapability),
    Scsi(ScsiCapability),
    Storage(StorageCapability),
    Drm(DrmType),
    Mdev(MdevCapability),
    Ccw(CcwCapability),
}

impl Capability {
    /// Value of the `type` attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            Capability::System(_) => "system",
            Capability::Pci(_) => "pci",
            Capability::UsbDevice(_) => "usb_device",
            Capability::Usb(_) => "usb",
            Capability::Net(_) => "net",
            Capability::ScsiHost(_) => "scsi_host",
            Capability::ScsiTarget(_) => "scsi_target",
            Capability::Scsi(_) => "scsi",
            Capability::Storage(_) => "storage",
            Capability::Drm(_) => "drm",
            Capability::Mdev(_) => "mdev",
            Capability::Ccw(_) => "ccw",
        }
    }
}

impl Fragment for Capability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        fn kind<'a, T>(
            name: &'static str,
            content: impl FnOnce(&mut Cursor<'a>) -> Option<T>,
            wrap: impl FnOnce(T) -> Capability,
        ) -> impl FnOnce(&mut Cursor<'a>) -> Option<Capability> {
            move |c| {
                c.fixed_attribute("type", name)?;
                let capability = content(c).map(wrap);
                if capability.is_none() {
                    trace!(capability = name, "Capability content rejected");
                }
                capability
            }
        }

        c.choice()
            .or(kind("system", SystemCapability::consume, Capability::System))
            .or(kind("pci", PciCapability::consume, Capability::Pci))
            .or(kind("usb_device", UsbDeviceCapability::consume, Capability::UsbDevice))
            .or(kind("usb", UsbInterfaceCapability::consume, Capability::Usb))
            .or(kind("net", NetCapability::consume, Capability::Net))
            .or(kind("scsi_host", ScsiHostCapability::consume, Capability::ScsiHost))
            .or(kind("scsi_target", ScsiTargetCapability::consume, Capability::ScsiTarget))
            .or(kind("scsi", ScsiCapability::consume, Capability::Scsi))
            .or(kind("storage", StorageCapability::consume, Capability::Storage))
            .or(kind("drm", |c| c.text_element("type"), Capability::Drm))
            .or(kind("mdev", MdevCapability::consume, Capability::Mdev))
            .or(kind("ccw", CcwCapability::consume, Capability::Ccw))
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_fixed("type", self.kind());
        match self {
            Capability::System(cap) => cap.produce(e),
            Capability::Pci(cap) => cap.produce(e),
            Capability::UsbDevice(cap) => cap.produce(e),
            Capability::Usb(cap) => cap.produce(e),
            Capability::Net(cap) => cap.produce(e),
            Capability::ScsiHost(cap) => cap.produce(e),
            Capability::ScsiTarget(cap) => cap.produce(e),
            Capability::Scsi(cap) => cap.produce(e),
            Capability::Storage(cap) => cap.produce(e),
            Capability::Drm(drm) => {
                e.push_text_element("type", drm);
                Ok(())
            }
            Capability::Mdev(cap) => cap.produce(e),
            Capability::Ccw(cap) => cap.produce(e),
        }
    }
}

/// A host device as reported by the node device driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDevice {
    pub name: String,
    /// sysfs path.
    pub path: Option<String>,
    /// `<devnode type='dev'>`
    pub devnode: Option<String>,
    /// `<devnode type='link'>` entries.
    pub devlinks: Vec<String>,
    pub parent: Option<Parent>,
    /// Name of the bound host driver.
    pub driver: Option<String>,
    pub capabilities: Vec<Capability>,
}

impl NodeDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            devnode: None,
            devlinks: Vec::new(),
            parent: None,
            driver: None,
            capabilities: Vec::new(),
        }
    }

    /// First capability of the given kind, such as `"pci"`.
    pub fn capability(&self, kind: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|cap| cap.kind() == kind)
    }
}

fn devnode(c: &mut Cursor<'_>, kind: &str) -> Option<String> {
    c.element("devnode", |c| {
        c.fixed_attribute("type", kind)?;
        c.text()
    })
}

impl Fragment for NodeDevice {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.text_element("name")?,
            path: c.optional(|c| c.text_element("path")),
            devnode: c.optional(|c| devnode(c, "dev")),
            devlinks: c.zero_or_more(|c| devnode(c, "link")),
            parent: c.optional(|c| c.element("parent", Parent::consume)),
            driver: c.optional(|c| c.element("driver", |c| c.text_element("name"))),
            capabilities: c.zero_or_more(|c| c.element("capability", Capability::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("name", &self.name);
        e.push_optional_text_element("path", &self.path);
        if let Some(node) = &self.devnode {
            e.push_child(Element::new("devnode").with_attribute("type", "dev").with_text(node.as_str()));
        }
        for link in &self.devlinks {
            e.push_child(Element::new("devnode").with_attribute("type", "link").with_text(link.as_str()));
        }
        e.push_optional("parent", &self.parent)?;
        if let Some(driver) = &self.driver {
            e.push_element("driver", |d| {
                d.push_text_element("name", driver);
                Ok(())
            })?;
        }
        e.push_all("capability", &self.capabilities)
    }
}

impl Root for NodeDevice {
    const TAG: &'static str = "device";
}
