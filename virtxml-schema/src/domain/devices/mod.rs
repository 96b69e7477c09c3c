//! `<devices>`: the guest's virtual hardware.
//!
//! Devices are kept in document order in a single list so that generating
//! a parsed document reproduces the original device order.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{Cursor, Element, Fragment, Result};

use crate::domain::address::Address;
use crate::types::AbsFilePath;

mod chardev;
mod controller;
mod disk;
mod filesystem;
mod graphics;
mod hostdev;
mod interface;
mod memory_device;
mod misc;
mod rng;

pub use chardev::{Chardev, ChardevProtocol, ChardevSource, ChardevTarget, ChardevType, ChannelState, SourceMode};
pub use controller::{Controller, ControllerDriver, ControllerTarget, ControllerType, Lease, LeaseTarget};
pub use disk::{
    CacheMode, DiscardMode, Disk, DiskBus, DiskDevice, DiskDriver, DiskSecret, DiskSource, DiskTargetSpec, DiskType,
    Encryption, EncryptionFormat, IoMode, Iotune, NetworkProtocol, SecretRef, SecretType, SnapshotMode, SourceHost,
    TrayState,
};
pub use filesystem::{AccessMode, Filesystem, FilesystemDriver, FsDriverType, FsSource, FsType};
pub use graphics::{
    Acceleration, Graphics, Listen, RemoteDisplay, SharePolicy, SpiceDefaultMode, Video, VideoModel, VideoModelType,
};
pub use hostdev::{Hostdev, HostdevSource, HostdevType, Rom, UsbSourceAddress};
pub use interface::{
    Bandwidth, BandwidthLimit, DirectMode, FilterParameter, Filterref, Interface, InterfaceDriver, InterfaceSource,
    InterfaceType, LinkState, VhostUserMode, VirtualPort, VirtualPortParameters, VirtualPortType,
};
pub use memory_device::{MemoryDevice, MemoryModel, MemorySource, MemoryTarget};
pub use misc::{
    Input, InputBus, InputType, Memballoon, MemballoonModel, Panic, PanicModel, Sound, SoundModel, Vsock,
    Watchdog, WatchdogAction, WatchdogModel,
};
pub use rng::{Rng, RngBackend, RngModel, RngRate, Tpm, TpmBackend, TpmModel};

/// One entry of `<devices>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Disk(Disk),
    Controller(Controller),
    Lease(Lease),
    Filesystem(Filesystem),
    Interface(Interface),
    Input(Input),
    Sound(Sound),
    Hostdev(Hostdev),
    Graphics(Graphics),
    Video(Video),
    Console(Chardev),
    Serial(Chardev),
    Parallel(Chardev),
    Channel(Chardev),
    Tpm(Tpm),
    Rng(Rng),
    Memballoon(Memballoon),
    Watchdog(Watchdog),
    Panic(Panic),
    Vsock(Vsock),
    Memory(MemoryDevice),
}

impl Device {
    /// Element name of this device.
    pub fn tag(&self) -> &'static str {
        match self {
            Device::Disk(_) => "disk",
            Device::Controller(_) => "controller",
            Device::Lease(_) => "lease",
            Device::Filesystem(_) => "filesystem",
            Device::Interface(_) => "interface",
            Device::Input(_) => "input",
            Device::Sound(_) => "sound",
            Device::Hostdev(_) => "hostdev",
            Device::Graphics(_) => "graphics",
            Device::Video(_) => "video",
            Device::Console(_) => "console",
            Device::Serial(_) => "serial",
            Device::Parallel(_) => "parallel",
            Device::Channel(_) => "channel",
            Device::Tpm(_) => "tpm",
            Device::Rng(_) => "rng",
            Device::Memballoon(_) => "memballoon",
            Device::Watchdog(_) => "watchdog",
            Device::Panic(_) => "panic",
            Device::Vsock(_) => "vsock",
            Device::Memory(_) => "memory",
        }
    }

    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| c.element("disk", Disk::consume).map(Device::Disk))
            .or(|c| c.element("controller", Controller::consume).map(Device::Controller))
            .or(|c| c.element("lease", Lease::consume).map(Device::Lease))
            .or(|c| c.element("filesystem", Filesystem::consume).map(Device::Filesystem))
            .or(|c| c.element("interface", Interface::consume).map(Device::Interface))
            .or(|c| c.element("input", Input::consume).map(Device::Input))
            .or(|c| c.element("sound", Sound::consume).map(Device::Sound))
            .or(|c| c.element("hostdev", Hostdev::consume).map(Device::Hostdev))
            .or(|c| c.element("graphics", Graphics::consume).map(Device::Graphics))
            .or(|c| c.element("video", Video::consume).map(Device::Video))
            .or(|c| c.element("console", Chardev::consume).map(Device::Console))
            .or(|c| c.element("serial", Chardev::consume).map(Device::Serial))
            .or(|c| c.element("parallel", Chardev::consume).map(Device::Parallel))
            .or(|c| c.element("channel", Chardev::consume).map(Device::Channel))
            .or(|c| c.element("tpm", Tpm::consume).map(Device::Tpm))
            .or(|c| c.element("rng", Rng::consume).map(Device::Rng))
            .or(|c| c.element("memballoon", Memballoon::consume).map(Device::Memballoon))
            .or(|c| c.element("watchdog", Watchdog::consume).map(Device::Watchdog))
            .or(|c| c.element("panic", Panic::consume).map(Device::Panic))
            .or(|c| c.element("vsock", Vsock::consume).map(Device::Vsock))
            .or(|c| c.element("memory", MemoryDevice::consume).map(Device::Memory))
            .select(c)
    }

    fn produce_into(&self, parent: &mut Element) -> Result<()> {
        let name = self.tag();
        match self {
            Device::Disk(d) => parent.push_fragment(name, d),
            Device::Controller(d) => parent.push_fragment(name, d),
            Device::Lease(d) => parent.push_fragment(name, d),
            Device::Filesystem(d) => parent.push_fragment(name, d),
            Device::Interface(d) => parent.push_fragment(name, d),
            Device::Input(d) => parent.push_fragment(name, d),
            Device::Sound(d) => parent.push_fragment(name, d),
            Device::Hostdev(d) => parent.push_fragment(name, d),
            Device::Graphics(d) => parent.push_fragment(name, d),
            Device::Video(d) => parent.push_fragment(name, d),
            Device::Console(d) | Device::Serial(d) | Device::Parallel(d) | Device::Channel(d) => {
                parent.push_fragment(name, d)
            }
            Device::Tpm(d) => parent.push_fragment(name, d),
            Device::Rng(d) => parent.push_fragment(name, d),
            Device::Memballoon(d) => parent.push_fragment(name, d),
            Device::Watchdog(d) => parent.push_fragment(name, d),
            Device::Panic(d) => parent.push_fragment(name, d),
            Device::Vsock(d) => parent.push_fragment(name, d),
            Device::Memory(d) => parent.push_fragment(name, d),
        }
    }
}

/// `<devices>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devices {
    pub emulator: Option<AbsFilePath>,
    pub devices: Vec<Device>,
}

impl Devices {
    /// All disks in document order.
    pub fn disks(&self) -> impl Iterator<Item = &Disk> {
        self.devices.iter().filter_map(|d| match d {
            Device::Disk(disk) => Some(disk),
            _ => None,
        })
    }

    /// All network interfaces in document order.
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.devices.iter().filter_map(|d| match d {
            Device::Interface(iface) => Some(iface),
            _ => None,
        })
    }
}

impl Fragment for Devices {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let emulator = c.optional(|c| c.text_element("emulator"));
        let devices = c.zero_or_more(Device::consume);
        Some(Self { emulator, devices })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("emulator", &self.emulator);
        for device in &self.devices {
            device.produce_into(e)?;
        }
        Ok(())
    }
}

// =============================================================================
// Shared device children
// =============================================================================

/// `<boot order='N'/>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boot {
    pub order: u32,
}

impl Fragment for Boot {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            order: c.attribute("order")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("order", &self.order);
        Ok(())
    }
}

/// Interleave member for `<alias name='...'/>`.
pub(crate) fn alias(c: &mut Cursor<'_>, slot: &mut Option<String>) -> Option<()> {
    *slot = c.optional(|c| c.element("alias", |c| c.attribute("name")));
    Some(())
}

/// Interleave member for `<address .../>`.
pub(crate) fn address(c: &mut Cursor<'_>, slot: &mut Option<Address>) -> Option<()> {
    *slot = c.optional(|c| c.element("address", Address::consume));
    Some(())
}

/// Interleave member for `<boot order='N'/>`.
pub(crate) fn boot(c: &mut Cursor<'_>, slot: &mut Option<Boot>) -> Option<()> {
    *slot = c.optional(|c| c.element("boot", Boot::consume));
    Some(())
}

/// Interleave member for an optional empty element.
pub(crate) fn flag(c: &mut Cursor<'_>, name: &str, slot: &mut bool) -> Option<()> {
    *slot = c.flag(name);
    Some(())
}

pub(crate) fn push_alias_and_address(e: &mut Element, alias: &Option<String>, address: &Option<Address>) -> Result<()> {
    if let Some(name) = alias {
        e.push_element("alias", |a| {
            a.put("name", name);
            Ok(())
        })?;
    }
    e.push_optional("address", address)
}
