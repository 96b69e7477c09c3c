//! `<address>`: where a device sits on its guest bus.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{validated_string, Cursor, Element, Fragment, Result};

use crate::types::{
    CcwCssidRange, CcwDevnoRange, CcwSsidRange, DriveNumber, Iobase, Irq, OnOff, PciBus, PciDomain,
    PciFunc, PciSlot,
};

validated_string! {
    /// USB hub port path such as `1.2`.
    pub struct UsbPort = r"((0x)?[0-9a-fA-F]{1,3}\.){0,3}(0x)?[0-9a-fA-F]{1,3}";

    /// Register of a pSeries VIO device.
    pub struct SpaprReg = r"(0x)?[0-9a-fA-F]{1,16}";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciAddress {
    pub domain: Option<PciDomain>,
    pub bus: Option<PciBus>,
    pub slot: Option<PciSlot>,
    pub function: Option<PciFunc>,
    pub multifunction: Option<OnOff>,
}

impl PciAddress {
    /// Address on domain 0 with the given bus, slot and function.
    pub fn new(bus: &str, slot: &str, function: &str) -> virtxml_marshal::Result<Self> {
        Ok(Self {
            domain: Some(PciDomain::new("0x0000")?),
            bus: Some(PciBus::new(bus)?),
            slot: Some(PciSlot::new(slot)?),
            function: Some(PciFunc::new(function)?),
            multifunction: None,
        })
    }
}

impl Fragment for PciAddress {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            domain: c.optional_attribute("domain")?,
            bus: c.optional_attribute("bus")?,
            slot: c.optional_attribute("slot")?,
            function: c.optional_attribute("function")?,
            multifunction: c.optional_attribute("multifunction")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("domain", &self.domain);
        e.put_optional("bus", &self.bus);
        e.put_optional("slot", &self.slot);
        e.put_optional("function", &self.function);
        e.put_optional("multifunction", &self.multifunction);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveAddress {
    pub controller: Option<DriveNumber>,
    pub bus: Option<DriveNumber>,
    pub target: Option<DriveNumber>,
    pub unit: Option<DriveNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcwAddress {
    pub cssid: Option<CcwCssidRange>,
    pub ssid: Option<CcwSsidRange>,
    pub devno: Option<CcwDevnoRange>,
}

impl Fragment for CcwAddress {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            cssid: c.optional_attribute("cssid")?,
            ssid: c.optional_attribute("ssid")?,
            devno: c.optional_attribute("devno")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("cssid", &self.cssid);
        e.put_optional("ssid", &self.ssid);
        e.put_optional("devno", &self.devno);
        Ok(())
    }
}

/// Device address, selected by the `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Address {
    Pci(PciAddress),
    Drive(DriveAddress),
    VirtioSerial {
        controller: Option<u32>,
        bus: Option<u32>,
        port: Option<u32>,
    },
    Ccid {
        controller: Option<u32>,
        slot: Option<u32>,
    },
    Usb {
        bus: Option<u32>,
        port: Option<UsbPort>,
    },
    SpaprVio {
        reg: Option<SpaprReg>,
    },
    Ccw(CcwAddress),
    Isa {
        iobase: Option<Iobase>,
        irq: Option<Irq>,
    },
    VirtioMmio,
    Dimm {
        slot: Option<u32>,
        base: Option<SpaprReg>,
    },
}

impl Address {
    /// Value of the `type` attribute for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Address::Pci(_) => "pci",
            Address::Drive(_) => "drive",
            Address::VirtioSerial { .. } => "virtio-serial",
            Address::Ccid { .. } => "ccid",
            Address::Usb { .. } => "usb",
            Address::SpaprVio { .. } => "spapr-vio",
            Address::Ccw(_) => "ccw",
            Address::Isa { .. } => "isa",
            Address::VirtioMmio => "virtio-mmio",
            Address::Dimm { .. } => "dimm",
        }
    }
}

impl Fragment for Address {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        c.choice()
            .or(|c| {
                c.fixed_attribute("type", "pci")?;
                PciAddress::consume(c).map(Address::Pci)
            })
            .or(|c| {
                c.fixed_attribute("type", "drive")?;
                Some(Address::Drive(DriveAddress {
                    controller: c.optional_attribute("controller")?,
                    bus: c.optional_attribute("bus")?,
                    target: c.optional_attribute("target")?,
                    unit: c.optional_attribute("unit")?,
                }))
            })
            .or(|c| {
                c.fixed_attribute("type", "virtio-serial")?;
                Some(Address::VirtioSerial {
                    controller: c.optional_attribute("controller")?,
                    bus: c.optional_attribute("bus")?,
                    port: c.optional_attribute("port")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "ccid")?;
                Some(Address::Ccid {
                    controller: c.optional_attribute("controller")?,
                    slot: c.optional_attribute("slot")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "usb")?;
                Some(Address::Usb {
                    bus: c.optional_attribute("bus")?,
                    port: c.optional_attribute("port")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "spapr-vio")?;
                Some(Address::SpaprVio {
                    reg: c.optional_attribute("reg")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "ccw")?;
                CcwAddress::consume(c).map(Address::Ccw)
            })
            .or(|c| {
                c.fixed_attribute("type", "isa")?;
                Some(Address::Isa {
                    iobase: c.optional_attribute("iobase")?,
                    irq: c.optional_attribute("irq")?,
                })
            })
            .or(|c| c.fixed_attribute("type", "virtio-mmio").map(|_| Address::VirtioMmio))
            .or(|c| {
                c.fixed_attribute("type", "dimm")?;
                Some(Address::Dimm {
                    slot: c.optional_attribute("slot")?,
                    base: c.optional_attribute("base")?,
                })
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_fixed("type", self.kind());
        match self {
            Address::Pci(pci) => pci.produce(e)?,
            Address::Drive(drive) => {
                e.put_optional("controller", &drive.controller);
                e.put_optional("bus", &drive.bus);
                e.put_optional("target", &drive.target);
                e.put_optional("unit", &drive.unit);
            }
            Address::VirtioSerial { controller, bus, port } => {
                e.put_optional("controller", controller);
                e.put_optional("bus", bus);
                e.put_optional("port", port);
            }
            Address::Ccid { controller, slot } => {
                e.put_optional("controller", controller);
                e.put_optional("slot", slot);
            }
            Address::Usb { bus, port } => {
                e.put_optional("bus", bus);
                e.put_optional("port", port);
            }
            Address::SpaprVio { reg } => e.put_optional("reg", reg),
            Address::Ccw(ccw) => ccw.produce(e)?,
            Address::Isa { iobase, irq } => {
                e.put_optional("iobase", iobase);
                e.put_optional("irq", irq);
            }
            Address::VirtioMmio => {}
            Address::Dimm { slot, base } => {
                e.put_optional("slot", slot);
                e.put_optional("base", base);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_pci_address() {
        let address: Address =
            fragment("<address type='pci' domain='0x0000' bus='0x00' slot='0x03' function='0x0'/>").unwrap();
        assert_eq!(address, Address::Pci(PciAddress::new("0x00", "0x03", "0x0").unwrap()));
    }

    #[test]
    fn test_drive_and_usb_addresses() {
        let drive: Address = fragment("<address type='drive' controller='0' bus='1' target='0' unit='0'/>").unwrap();
        assert_eq!(drive.kind(), "drive");

        let usb: Address = fragment("<address type='usb' bus='0' port='1.2'/>").unwrap();
        assert!(matches!(usb, Address::Usb { port: Some(ref p), .. } if p.as_str() == "1.2"));
    }

    #[test]
    fn test_invalid_or_unknown_type() {
        let pci: Address = fragment("<address type='pci' bus='0x01' slot='0x40'/>").unwrap();
        let Address::Pci(pci) = pci else {
            panic!("expected a pci address");
        };
        assert_eq!(pci.slot, None);
        assert_eq!(pci.bus.unwrap().as_str(), "0x01");
        assert!(fragment::<Address>("<address type='nubus'/>").is_none());
    }

    #[test]
    fn test_ccw_address() {
        let address: Address = fragment("<address type='ccw' cssid='0xfe' ssid='0x0' devno='0x0001'/>").unwrap();
        let Address::Ccw(ccw) = address else {
            panic!("expected a ccw address");
        };
        assert_eq!(ccw.devno.unwrap().as_str(), "0x0001");
    }
}
