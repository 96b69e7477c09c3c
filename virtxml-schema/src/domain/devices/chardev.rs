//! Character devices: `<console>`, `<serial>`, `<parallel>` and `<channel>`
//! share one grammar.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, push_alias_and_address};
use crate::domain::address::Address;

xml_enum! {
    pub enum ChardevType {
        Pty = "pty",
        Dev = "dev",
        File = "file",
        Pipe = "pipe",
        Unix = "unix",
        Tcp = "tcp",
        Udp = "udp",
        Null = "null",
        Vc = "vc",
        Stdio = "stdio",
        Spicevmc = "spicevmc",
        Spiceport = "spiceport",
        Nmdm = "nmdm",
    }
}

xml_enum! {
    pub enum SourceMode {
        Bind = "bind",
        Connect = "connect",
    }
}

xml_enum! {
    pub enum ChardevProtocol {
        Raw = "raw",
        Telnet = "telnet",
        Telnets = "telnets",
        Tls = "tls",
    }
}

xml_enum! {
    pub enum ChannelState {
        Connected = "connected",
        Disconnected = "disconnected",
    }
}

/// `<source>` of a character device. UDP devices carry two of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChardevSource {
    pub mode: Option<SourceMode>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub service: Option<String>,
}

impl ChardevSource {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

impl Fragment for ChardevSource {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        Some(Self {
            mode: c.optional_attribute("mode")?,
            path: c.optional_attribute("path")?,
            host: c.optional_attribute("host")?,
            service: c.optional_attribute("service")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("mode", &self.mode);
        e.put_optional("path", &self.path);
        e.put_optional("host", &self.host);
        e.put_optional("service", &self.service);
        Ok(())
    }
}

/// `<target>` of a character device. Consoles and serial ports use `type`
/// and `port`; channels use `type`, `name` and `state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChardevTarget {
    pub target_type: Option<String>,
    pub port: Option<u32>,
    pub name: Option<String>,
    pub state: Option<ChannelState>,
}

impl Fragment for ChardevTarget {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            target_type: c.optional_attribute("type")?,
            port: c.optional_attribute("port")?,
            name: c.optional_attribute("name")?,
            state: c.optional_attribute("state")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("type", &self.target_type);
        e.put_optional("port", &self.port);
        e.put_optional("name", &self.name);
        e.put_optional("state", &self.state);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chardev {
    pub chardev_type: ChardevType,
    pub sources: Vec<ChardevSource>,
    pub protocol: Option<ChardevProtocol>,
    pub target: Option<ChardevTarget>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Chardev {
    pub fn new(chardev_type: ChardevType) -> Self {
        Self {
            chardev_type,
            sources: Vec::new(),
            protocol: None,
            target: None,
            alias: None,
            address: None,
        }
    }

    /// Serial port or console with a target port.
    pub fn pty(port: u32) -> Self {
        Self {
            target: Some(ChardevTarget {
                port: Some(port),
                ..ChardevTarget::default()
            }),
            ..Self::new(ChardevType::Pty)
        }
    }
}

impl Fragment for Chardev {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut dev = Chardev::new(c.attribute("type")?);
        c.interleave(vec![
            member(|c| {
                dev.sources = c.zero_or_more(|c| c.element("source", ChardevSource::consume));
                Some(())
            }),
            member(|c| {
                dev.protocol = c.optional(|c| c.element("protocol", |c| c.attribute("type")));
                Some(())
            }),
            member(|c| {
                dev.target = c.optional(|c| c.element("target", ChardevTarget::consume));
                Some(())
            }),
            member(|c| alias(c, &mut dev.alias)),
            member(|c| address(c, &mut dev.address)),
        ])?;
        Some(dev)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.chardev_type);
        e.push_all("source", &self.sources)?;
        if let Some(protocol) = &self.protocol {
            e.push_element("protocol", |p| {
                p.put("type", protocol);
                Ok(())
            })?;
        }
        e.push_optional("target", &self.target)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_tcp_serial() {
        let serial: Chardev = fragment(
            "<serial type='tcp'>
               <source mode='bind' host='127.0.0.1' service='4555'/>
               <protocol type='telnet'/>
               <target port='0'/>
             </serial>",
        )
        .unwrap();
        assert_eq!(serial.chardev_type, ChardevType::Tcp);
        assert_eq!(serial.sources[0].mode, Some(SourceMode::Bind));
        assert_eq!(serial.protocol, Some(ChardevProtocol::Telnet));
        assert_eq!(serial.target.unwrap().port, Some(0));
    }

    #[test]
    fn test_guest_agent_channel() {
        let channel: Chardev = fragment(
            "<channel type='unix'>
               <target type='virtio' name='org.qemu.guest_agent.0' state='connected'/>
               <source mode='bind' path='/var/lib/libvirt/qemu/f16x86_64.agent'/>
               <address type='virtio-serial' controller='0' bus='0' port='1'/>
             </channel>",
        )
        .unwrap();
        let target = channel.target.unwrap();
        assert_eq!(target.name.as_deref(), Some("org.qemu.guest_agent.0"));
        assert_eq!(target.state, Some(ChannelState::Connected));
        assert!(matches!(channel.address, Some(Address::VirtioSerial { port: Some(1), .. })));
    }

    #[test]
    fn test_udp_has_two_sources() {
        let serial: Chardev = fragment(
            "<serial type='udp'>
               <source mode='bind' host='0.0.0.0' service='2445'/>
               <source mode='connect' host='0.0.0.0' service='2445'/>
               <target port='0'/>
             </serial>",
        )
        .unwrap();
        assert_eq!(serial.sources.len(), 2);

        let mut e = Element::new("serial");
        serial.produce(&mut e).unwrap();
        assert_eq!(e.child_elements().filter(|c| c.name() == "source").count(), 2);
    }

    #[test]
    fn test_pty_constructor() {
        let mut e = Element::new("console");
        Chardev::pty(0).produce(&mut e).unwrap();
        assert_eq!(e.attribute("type"), Some("pty"));
        assert_eq!(e.child_elements().next().unwrap().attribute("port"), Some("0"));
    }
}
