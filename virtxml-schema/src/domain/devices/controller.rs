//! `<controller>` and `<lease>`.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, push_alias_and_address};
use crate::domain::address::Address;
use crate::types::{AbsFilePath, GenericName};

xml_enum! {
    pub enum ControllerType {
        Ide = "ide",
        Fdc = "fdc",
        Scsi = "scsi",
        Sata = "sata",
        Usb = "usb",
        Ccid = "ccid",
        VirtioSerial = "virtio-serial",
        Pci = "pci",
        Xenbus = "xenbus",
    }
}

/// `<driver queues='..' iothread='..'/>` of a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerDriver {
    pub queues: Option<u32>,
    pub iothread: Option<u32>,
}

impl Fragment for ControllerDriver {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            queues: c.optional_attribute("queues")?,
            iothread: c.optional_attribute("iothread")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("queues", &self.queues);
        e.put_optional("iothread", &self.iothread);
        Ok(())
    }
}

/// `<target chassis='..' port='..'/>` of a PCI controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerTarget {
    pub chassis: Option<u32>,
    pub port: Option<String>,
}

impl Fragment for ControllerTarget {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            chassis: c.optional_attribute("chassis")?,
            port: c.optional_attribute("port")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("chassis", &self.chassis);
        e.put_optional("port", &self.port);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    pub controller_type: ControllerType,
    pub index: Option<u32>,
    pub model: Option<GenericName>,
    pub ports: Option<u32>,
    pub vectors: Option<u32>,
    pub driver: Option<ControllerDriver>,
    pub target: Option<ControllerTarget>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Controller {
    pub fn new(controller_type: ControllerType, index: u32) -> Self {
        Self {
            controller_type,
            index: Some(index),
            model: None,
            ports: None,
            vectors: None,
            driver: None,
            target: None,
            alias: None,
            address: None,
        }
    }
}

impl Fragment for Controller {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut controller = Controller {
            controller_type: c.attribute("type")?,
            index: c.optional_attribute("index")?,
            model: c.optional_attribute("model")?,
            ports: c.optional_attribute("ports")?,
            vectors: c.optional_attribute("vectors")?,
            ..Controller::new(ControllerType::Pci, 0)
        };
        c.interleave(vec![
            member(|c| {
                controller.driver = c.optional(|c| c.element("driver", ControllerDriver::consume));
                Some(())
            }),
            member(|c| {
                controller.target = c.optional(|c| c.element("target", ControllerTarget::consume));
                Some(())
            }),
            member(|c| alias(c, &mut controller.alias)),
            member(|c| address(c, &mut controller.address)),
        ])?;
        Some(controller)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.controller_type);
        e.put_optional("index", &self.index);
        e.put_optional("model", &self.model);
        e.put_optional("ports", &self.ports);
        e.put_optional("vectors", &self.vectors);
        e.push_optional("driver", &self.driver)?;
        e.push_optional("target", &self.target)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

/// `<target path='..' offset='..'/>` of a lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseTarget {
    pub path: AbsFilePath,
    pub offset: Option<u64>,
}

impl Fragment for LeaseTarget {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            path: c.attribute("path")?,
            offset: c.optional_attribute("offset")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("path", &self.path);
        e.put_optional("offset", &self.offset);
        Ok(())
    }
}

/// `<lease>`: a lock manager lease held by the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub lockspace: String,
    pub key: String,
    pub target: LeaseTarget,
}

impl Fragment for Lease {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut lockspace = None;
        let mut key = None;
        let mut target = None;
        c.interleave(vec![
            member(|c| {
                lockspace = Some(c.text_element("lockspace")?);
                Some(())
            }),
            member(|c| {
                key = Some(c.text_element("key")?);
                Some(())
            }),
            member(|c| {
                target = Some(c.element("target", LeaseTarget::consume)?);
                Some(())
            }),
        ])?;
        Some(Self {
            lockspace: lockspace?,
            key: key?,
            target: target?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("lockspace", &self.lockspace);
        e.push_text_element("key", &self.key);
        e.push_fragment("target", &self.target)
    }
}
