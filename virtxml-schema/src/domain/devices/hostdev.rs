//! `<hostdev mode='subsystem'>`: host PCI and USB device passthrough.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, boot, flag, push_alias_and_address, Boot};
use crate::domain::address::{Address, PciAddress};
use crate::types::{AbsFilePath, HexUint, OnOff, YesNo};

xml_enum! {
    pub enum HostdevType {
        Pci = "pci",
        Usb = "usb",
    }
}

/// Bus and device number of a host USB device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbSourceAddress {
    pub bus: Option<u32>,
    pub device: Option<u32>,
}

impl Fragment for UsbSourceAddress {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            bus: c.optional_attribute("bus")?,
            device: c.optional_attribute("device")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("bus", &self.bus);
        e.put_optional("device", &self.device);
        Ok(())
    }
}

/// Host device to pass through, selected by the `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostdevSource {
    Pci(PciAddress),
    /// A USB device is found by vendor and product ids, by bus address,
    /// or by both.
    Usb {
        vendor: Option<HexUint>,
        product: Option<HexUint>,
        address: Option<UsbSourceAddress>,
    },
}

impl HostdevSource {
    pub fn hostdev_type(&self) -> HostdevType {
        match self {
            HostdevSource::Pci(_) => HostdevType::Pci,
            HostdevSource::Usb { .. } => HostdevType::Usb,
        }
    }

    fn consume_pci(c: &mut Cursor<'_>) -> Option<Self> {
        c.element("address", PciAddress::consume).map(HostdevSource::Pci)
    }

    fn consume_usb(c: &mut Cursor<'_>) -> Option<Self> {
        let mut ids = None;
        let mut location = None;
        c.interleave(vec![
            member(|c| {
                ids = c.optional(|c| {
                    let vendor = c.element("vendor", |c| c.attribute("id"))?;
                    let product = c.element("product", |c| c.attribute("id"))?;
                    Some((vendor, product))
                });
                Some(())
            }),
            member(|c| {
                location = c.optional(|c| c.element("address", UsbSourceAddress::consume));
                Some(())
            }),
        ])?;
        if ids.is_none() && location.is_none() {
            return None;
        }
        let (vendor, product) = ids.unzip();
        Some(HostdevSource::Usb {
            vendor,
            product,
            address: location,
        })
    }

    fn produce(&self, source: &mut Element) -> Result<()> {
        match self {
            HostdevSource::Pci(pci) => source.push_fragment("address", pci),
            HostdevSource::Usb { vendor, product, address } => {
                if let (Some(vendor), Some(product)) = (vendor, product) {
                    source.push_element("vendor", |v| {
                        v.put("id", vendor);
                        Ok(())
                    })?;
                    source.push_element("product", |p| {
                        p.put("id", product);
                        Ok(())
                    })?;
                }
                source.push_optional("address", address)
            }
        }
    }
}

/// `<rom bar='on' file='...'/>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rom {
    pub bar: Option<OnOff>,
    pub file: Option<AbsFilePath>,
}

impl Fragment for Rom {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            bar: c.optional_attribute("bar")?,
            file: c.optional_attribute("file")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("bar", &self.bar);
        e.put_optional("file", &self.file);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hostdev {
    pub source: HostdevSource,
    pub managed: Option<YesNo>,
    pub boot: Option<Boot>,
    pub rom: Option<Rom>,
    pub readonly: bool,
    pub shareable: bool,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Hostdev {
    /// Managed PCI passthrough of the host device at `pci`.
    pub fn pci(pci: PciAddress) -> Self {
        Self {
            source: HostdevSource::Pci(pci),
            managed: Some(YesNo::Yes),
            boot: None,
            rom: None,
            readonly: false,
            shareable: false,
            alias: None,
            address: None,
        }
    }
}

impl Fragment for Hostdev {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.fixed_attribute("mode", "subsystem")?;
        let kind: HostdevType = c.attribute("type")?;
        let managed = c.optional_attribute("managed")?;

        let mut source = None;
        let mut boot_order = None;
        let mut rom = None;
        let (mut readonly, mut shareable) = (false, false);
        let mut alias_name = None;
        let mut location = None;
        c.interleave(vec![
            member(|c| {
                source = Some(c.element("source", |c| match kind {
                    HostdevType::Pci => HostdevSource::consume_pci(c),
                    HostdevType::Usb => HostdevSource::consume_usb(c),
                })?);
                Some(())
            }),
            member(|c| boot(c, &mut boot_order)),
            member(|c| {
                rom = c.optional(|c| c.element("rom", Rom::consume));
                Some(())
            }),
            member(|c| flag(c, "readonly", &mut readonly)),
            member(|c| flag(c, "shareable", &mut shareable)),
            member(|c| alias(c, &mut alias_name)),
            member(|c| address(c, &mut location)),
        ])?;

        Some(Self {
            source: source?,
            managed,
            boot: boot_order,
            rom,
            readonly,
            shareable,
            alias: alias_name,
            address: location,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_fixed("mode", "subsystem");
        e.put("type", &self.source.hostdev_type());
        e.put_optional("managed", &self.managed);
        e.push_element("source", |s| self.source.produce(s))?;
        e.push_optional("boot", &self.boot)?;
        e.push_optional("rom", &self.rom)?;
        e.push_flag("readonly", self.readonly);
        e.push_flag("shareable", self.shareable);
        push_alias_and_address(e, &self.alias, &self.address)
    }
}
