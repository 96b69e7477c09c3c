//! Small devices: input, sound, memory balloon, watchdog, panic notifier
//! and vsock.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, push_alias_and_address};
use crate::domain::address::Address;
use crate::types::{OnOff, YesNo};

xml_enum! {
    pub enum InputType {
        Mouse = "mouse",
        Tablet = "tablet",
        Keyboard = "keyboard",
        Passthrough = "passthrough",
    }
}

xml_enum! {
    pub enum InputBus {
        Ps2 = "ps2",
        Usb = "usb",
        Xen = "xen",
        Virtio = "virtio",
    }
}

xml_enum! {
    pub enum SoundModel {
        Sb16 = "sb16",
        Es1370 = "es1370",
        Pcspk = "pcspk",
        Ac97 = "ac97",
        Ich6 = "ich6",
        Ich9 = "ich9",
        Usb = "usb",
    }
}

xml_enum! {
    pub enum MemballoonModel {
        Virtio = "virtio",
        VirtioTransitional = "virtio-transitional",
        VirtioNonTransitional = "virtio-non-transitional",
        Xen = "xen",
        None = "none",
    }
}

xml_enum! {
    pub enum WatchdogModel {
        I6300esb = "i6300esb",
        Ib700 = "ib700",
        Diag288 = "diag288",
    }
}

xml_enum! {
    pub enum WatchdogAction {
        Reset = "reset",
        Shutdown = "shutdown",
        Poweroff = "poweroff",
        Pause = "pause",
        None = "none",
        Dump = "dump",
        InjectNmi = "inject-nmi",
    }
}

xml_enum! {
    pub enum PanicModel {
        Isa = "isa",
        Pseries = "pseries",
        Hyperv = "hyperv",
        S390 = "s390",
    }
}

/// Trailing `<alias>` and `<address>` shared by the simple devices.
fn alias_and_address(c: &mut Cursor<'_>, alias_slot: &mut Option<String>, address_slot: &mut Option<Address>) -> Option<()> {
    c.interleave(vec![
        member(|c| alias(c, alias_slot)),
        member(|c| address(c, address_slot)),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub input_type: InputType,
    pub bus: Option<InputBus>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Input {
    pub fn new(input_type: InputType, bus: InputBus) -> Self {
        Self {
            input_type,
            bus: Some(bus),
            alias: None,
            address: None,
        }
    }
}

impl Fragment for Input {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut input = Input {
            input_type: c.attribute("type")?,
            bus: c.optional_attribute("bus")?,
            alias: None,
            address: None,
        };
        alias_and_address(c, &mut input.alias, &mut input.address)?;
        Some(input)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.input_type);
        e.put_optional("bus", &self.bus);
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sound {
    pub model: SoundModel,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Fragment for Sound {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut sound = Sound {
            model: c.attribute("model")?,
            alias: None,
            address: None,
        };
        alias_and_address(c, &mut sound.alias, &mut sound.address)?;
        Some(sound)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("model", &self.model);
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

/// `<memballoon>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memballoon {
    pub model: MemballoonModel,
    pub autodeflate: Option<OnOff>,
    /// Statistics polling period in seconds.
    pub stats_period: Option<u32>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Fragment for Memballoon {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut balloon = Memballoon {
            model: c.attribute("model")?,
            autodeflate: c.optional_attribute("autodeflate")?,
            stats_period: None,
            alias: None,
            address: None,
        };
        c.interleave(vec![
            member(|c| {
                balloon.stats_period = c.optional(|c| c.element("stats", |c| c.attribute("period")));
                Some(())
            }),
            member(|c| alias(c, &mut balloon.alias)),
            member(|c| address(c, &mut balloon.address)),
        ])?;
        Some(balloon)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("model", &self.model);
        e.put_optional("autodeflate", &self.autodeflate);
        if let Some(period) = &self.stats_period {
            e.push_element("stats", |s| {
                s.put("period", period);
                Ok(())
            })?;
        }
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchdog {
    pub model: WatchdogModel,
    pub action: Option<WatchdogAction>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Fragment for Watchdog {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut watchdog = Watchdog {
            model: c.attribute("model")?,
            action: c.optional_attribute("action")?,
            alias: None,
            address: None,
        };
        alias_and_address(c, &mut watchdog.alias, &mut watchdog.address)?;
        Some(watchdog)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("model", &self.model);
        e.put_optional("action", &self.action);
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

/// `<panic>`: guest panic notification device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panic {
    pub model: Option<PanicModel>,
    pub address: Option<Address>,
}

impl Fragment for Panic {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let model = c.optional_attribute("model")?;
        let mut location = None;
        address(c, &mut location)?;
        Some(Self {
            model,
            address: location,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("model", &self.model);
        e.push_optional("address", &self.address)
    }
}

/// `<vsock>`: host/guest socket device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vsock {
    pub model: Option<String>,
    /// `auto` attribute of `<cid>`.
    pub cid_auto: Option<YesNo>,
    /// `address` attribute of `<cid>`.
    pub cid: Option<u32>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Fragment for Vsock {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut vsock = Vsock {
            model: c.optional_attribute("model")?,
            ..Vsock::default()
        };
        let mut cid = None;
        c.interleave(vec![
            member(|c| {
                cid = c.optional(|c| {
                    c.element("cid", |c| {
                        Some((c.optional_attribute::<YesNo>("auto")?, c.optional_attribute::<u32>("address")?))
                    })
                });
                Some(())
            }),
            member(|c| alias(c, &mut vsock.alias)),
            member(|c| address(c, &mut vsock.address)),
        ])?;
        if let Some((auto, address)) = cid {
            vsock.cid_auto = auto;
            vsock.cid = address;
        }
        Some(vsock)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("model", &self.model);
        if self.cid_auto.is_some() || self.cid.is_some() {
            e.push_element("cid", |c| {
                c.put_optional("auto", &self.cid_auto);
                c.put_optional("address", &self.cid);
                Ok(())
            })?;
        }
        push_alias_and_address(e, &self.alias, &self.address)
    }
}
