//! `<interface>`: guest network interfaces.
//!
//! The `type` attribute picks how the interface is connected and therefore
//! which attributes its `<source>` carries.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, boot, push_alias_and_address, Boot};
use crate::domain::address::Address;
use crate::types::{AbsFilePath, DeviceName, GenericName, UniMacAddr, Uuid};

xml_enum! {
    pub enum InterfaceType {
        Bridge = "bridge",
        Network = "network",
        Direct = "direct",
        User = "user",
        Ethernet = "ethernet",
        Vhostuser = "vhostuser",
    }
}

xml_enum! {
    /// macvtap mode of a direct interface.
    pub enum DirectMode {
        Vepa = "vepa",
        Bridge = "bridge",
        Private = "private",
        Passthrough = "passthrough",
    }
}

xml_enum! {
    pub enum VhostUserMode {
        Client = "client",
        Server = "server",
    }
}

xml_enum! {
    pub enum LinkState {
        Up = "up",
        Down = "down",
    }
}

xml_enum! {
    pub enum VirtualPortType {
        Qbg = "802.1Qbg",
        Qbh = "802.1Qbh",
        Openvswitch = "openvswitch",
        Midonet = "midonet",
    }
}

/// How the interface reaches the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceSource {
    Bridge {
        bridge: Option<DeviceName>,
    },
    Network {
        network: Option<String>,
        portgroup: Option<String>,
    },
    Direct {
        dev: Option<DeviceName>,
        mode: Option<DirectMode>,
    },
    User,
    Ethernet,
    Vhostuser {
        path: AbsFilePath,
        mode: VhostUserMode,
    },
}

impl InterfaceSource {
    pub fn interface_type(&self) -> InterfaceType {
        match self {
            InterfaceSource::Bridge { .. } => InterfaceType::Bridge,
            InterfaceSource::Network { .. } => InterfaceType::Network,
            InterfaceSource::Direct { .. } => InterfaceType::Direct,
            InterfaceSource::User => InterfaceType::User,
            InterfaceSource::Ethernet => InterfaceType::Ethernet,
            InterfaceSource::Vhostuser { .. } => InterfaceType::Vhostuser,
        }
    }

    /// Source of an interface of `kind` without a `<source>` element.
    /// vhost-user interfaces cannot omit it.
    fn absent(kind: InterfaceType) -> Option<Self> {
        match kind {
            InterfaceType::Bridge => Some(InterfaceSource::Bridge { bridge: None }),
            InterfaceType::Network => Some(InterfaceSource::Network {
                network: None,
                portgroup: None,
            }),
            InterfaceType::Direct => Some(InterfaceSource::Direct { dev: None, mode: None }),
            InterfaceType::User => Some(InterfaceSource::User),
            InterfaceType::Ethernet => Some(InterfaceSource::Ethernet),
            InterfaceType::Vhostuser => None,
        }
    }

    fn consume_as(kind: InterfaceType, c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        match kind {
            InterfaceType::Bridge => Some(InterfaceSource::Bridge {
                bridge: c.optional_attribute("bridge")?,
            }),
            InterfaceType::Network => Some(InterfaceSource::Network {
                network: c.optional_attribute("network")?,
                portgroup: c.optional_attribute("portgroup")?,
            }),
            InterfaceType::Direct => Some(InterfaceSource::Direct {
                dev: c.optional_attribute("dev")?,
                mode: c.optional_attribute("mode")?,
            }),
            // These carry no source
            InterfaceType::User | InterfaceType::Ethernet => None,
            InterfaceType::Vhostuser => {
                c.fixed_attribute("type", "unix")?;
                Some(InterfaceSource::Vhostuser {
                    path: c.attribute("path")?,
                    mode: c.attribute("mode")?,
                })
            }
        }
    }

    fn produce_into(&self, e: &mut Element) -> Result<()> {
        let mut source = Element::new("source");
        match self {
            InterfaceSource::Bridge { bridge } => source.put_optional("bridge", bridge),
            InterfaceSource::Network { network, portgroup } => {
                source.put_optional("network", network);
                source.put_optional("portgroup", portgroup);
            }
            InterfaceSource::Direct { dev, mode } => {
                source.put_optional("dev", dev);
                source.put_optional("mode", mode);
            }
            InterfaceSource::User | InterfaceSource::Ethernet => {}
            InterfaceSource::Vhostuser { path, mode } => {
                source.put_fixed("type", "unix");
                source.put("path", path);
                source.put("mode", mode);
            }
        }
        if source.attributes().next().is_some() {
            e.push_child(source);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDriver {
    pub name: Option<GenericName>,
    pub queues: Option<u32>,
}

impl Fragment for InterfaceDriver {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.optional_attribute("name")?,
            queues: c.optional_attribute("queues")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("name", &self.name);
        e.put_optional("queues", &self.queues);
        Ok(())
    }
}

/// `<parameters>` of a virtual port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPortParameters {
    pub interfaceid: Option<Uuid>,
    pub profileid: Option<String>,
    pub managerid: Option<u8>,
    pub typeid: Option<u32>,
}

impl Fragment for VirtualPortParameters {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            interfaceid: c.optional_attribute("interfaceid")?,
            profileid: c.optional_attribute("profileid")?,
            managerid: c.optional_attribute("managerid")?,
            typeid: c.optional_attribute("typeid")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("managerid", &self.managerid);
        e.put_optional("typeid", &self.typeid);
        e.put_optional("profileid", &self.profileid);
        e.put_optional("interfaceid", &self.interfaceid);
        Ok(())
    }
}

/// `<virtualport>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPort {
    pub port_type: Option<VirtualPortType>,
    pub parameters: Option<VirtualPortParameters>,
}

impl Fragment for VirtualPort {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            port_type: c.optional_attribute("type")?,
            parameters: c.optional(|c| c.element("parameters", VirtualPortParameters::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("type", &self.port_type);
        e.push_optional("parameters", &self.parameters)
    }
}

/// `<parameter name='IP' value='10.0.0.1'/>` of a filter reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParameter {
    pub name: String,
    pub value: String,
}

impl Fragment for FilterParameter {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.attribute("name")?,
            value: c.attribute("value")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("name", &self.name);
        e.put("value", &self.value);
        Ok(())
    }
}

/// `<filterref>`: network filter applied to the interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filterref {
    pub filter: String,
    pub parameters: Vec<FilterParameter>,
}

impl Fragment for Filterref {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            filter: c.attribute("filter")?,
            parameters: c.zero_or_more(|c| c.element("parameter", FilterParameter::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("filter", &self.filter);
        e.push_all("parameter", &self.parameters)
    }
}

/// Traffic shaping for one direction, in KiB/s and KiB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthLimit {
    pub average: Option<u64>,
    pub peak: Option<u64>,
    pub burst: Option<u64>,
}

impl Fragment for BandwidthLimit {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            average: c.optional_attribute("average")?,
            peak: c.optional_attribute("peak")?,
            burst: c.optional_attribute("burst")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("average", &self.average);
        e.put_optional("peak", &self.peak);
        e.put_optional("burst", &self.burst);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub inbound: Option<BandwidthLimit>,
    pub outbound: Option<BandwidthLimit>,
}

impl Fragment for Bandwidth {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut bandwidth = Bandwidth::default();
        c.interleave(vec![
            member(|c| {
                bandwidth.inbound = c.optional(|c| c.element("inbound", BandwidthLimit::consume));
                Some(())
            }),
            member(|c| {
                bandwidth.outbound = c.optional(|c| c.element("outbound", BandwidthLimit::consume));
                Some(())
            }),
        ])?;
        Some(bandwidth)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional("inbound", &self.inbound)?;
        e.push_optional("outbound", &self.outbound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub source: InterfaceSource,
    pub mac: Option<UniMacAddr>,
    /// Host-side device name.
    pub target: Option<DeviceName>,
    pub model: Option<GenericName>,
    pub driver: Option<InterfaceDriver>,
    pub boot: Option<Boot>,
    pub link: Option<LinkState>,
    pub mtu: Option<u32>,
    pub virtualport: Option<VirtualPort>,
    pub filterref: Option<Filterref>,
    pub bandwidth: Option<Bandwidth>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Interface {
    pub fn new(source: InterfaceSource) -> Self {
        Self {
            source,
            mac: None,
            target: None,
            model: None,
            driver: None,
            boot: None,
            link: None,
            mtu: None,
            virtualport: None,
            filterref: None,
            bandwidth: None,
            alias: None,
            address: None,
        }
    }

    /// virtio NIC attached to a libvirt network.
    pub fn network(name: impl Into<String>) -> Self {
        Self {
            model: GenericName::new("virtio").ok(),
            ..Self::new(InterfaceSource::Network {
                network: Some(name.into()),
                portgroup: None,
            })
        }
    }
}

impl Fragment for Interface {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let kind: InterfaceType = c.attribute("type")?;

        let mut source = None;
        let mut iface = Interface::new(InterfaceSource::User);

        c.interleave(vec![
            member(|c| {
                source = match c.optional(|c| c.element("source", |c| InterfaceSource::consume_as(kind, c))) {
                    Some(found) => Some(found),
                    None => InterfaceSource::absent(kind),
                };
                Some(())
            }),
            member(|c| {
                iface.mac = c.optional(|c| c.element("mac", |c| c.attribute("address")));
                Some(())
            }),
            member(|c| {
                iface.target = c.optional(|c| c.element("target", |c| c.attribute("dev")));
                Some(())
            }),
            member(|c| {
                iface.model = c.optional(|c| c.element("model", |c| c.attribute("type")));
                Some(())
            }),
            member(|c| {
                iface.driver = c.optional(|c| c.element("driver", InterfaceDriver::consume));
                Some(())
            }),
            member(|c| boot(c, &mut iface.boot)),
            member(|c| {
                iface.link = c.optional(|c| c.element("link", |c| c.attribute("state")));
                Some(())
            }),
            member(|c| {
                iface.mtu = c.optional(|c| c.element("mtu", |c| c.attribute("size")));
                Some(())
            }),
            member(|c| {
                iface.virtualport = c.optional(|c| c.element("virtualport", VirtualPort::consume));
                Some(())
            }),
            member(|c| {
                iface.filterref = c.optional(|c| c.element("filterref", Filterref::consume));
                Some(())
            }),
            member(|c| {
                iface.bandwidth = c.optional(|c| c.element("bandwidth", Bandwidth::consume));
                Some(())
            }),
            member(|c| alias(c, &mut iface.alias)),
            member(|c| address(c, &mut iface.address)),
        ])?;

        iface.source = source?;
        Some(iface)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.source.interface_type());
        if let Some(mac) = &self.mac {
            e.push_element("mac", |m| {
                m.put("address", mac);
                Ok(())
            })?;
        }
        self.source.produce_into(e)?;
        if let Some(dev) = &self.target {
            e.push_element("target", |t| {
                t.put("dev", dev);
                Ok(())
            })?;
        }
        if let Some(model) = &self.model {
            e.push_element("model", |m| {
                m.put("type", model);
                Ok(())
            })?;
        }
        e.push_optional("driver", &self.driver)?;
        e.push_optional("boot", &self.boot)?;
        if let Some(state) = &self.link {
            e.push_element("link", |l| {
                l.put("state", state);
                Ok(())
            })?;
        }
        if let Some(size) = &self.mtu {
            e.push_element("mtu", |m| {
                m.put("size", size);
                Ok(())
            })?;
        }
        e.push_optional("virtualport", &self.virtualport)?;
        e.push_optional("filterref", &self.filterref)?;
        e.push_optional("bandwidth", &self.bandwidth)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_network_interface() {
        let iface: Interface = fragment(
            "<interface type='network'>
               <mac address='52:54:00:6d:90:02'/>
               <source network='default'/>
               <model type='virtio'/>
               <link state='up'/>
               <address type='pci' domain='0x0000' bus='0x01' slot='0x00' function='0x0'/>
             </interface>",
        )
        .unwrap();
        assert_eq!(
            iface.source,
            InterfaceSource::Network {
                network: Some("default".to_string()),
                portgroup: None
            }
        );
        assert_eq!(iface.mac.unwrap().as_str(), "52:54:00:6d:90:02");
        assert_eq!(iface.link, Some(LinkState::Up));
    }

    #[test]
    fn test_multicast_mac_rejected() {
        assert!(fragment::<Interface>("<interface type='user'><mac address='01:00:5e:00:00:01'/></interface>").is_none());
    }

    #[test]
    fn test_user_interface_has_no_source() {
        let iface: Interface = fragment("<interface type='user'><model type='e1000'/></interface>").unwrap();
        assert_eq!(iface.source, InterfaceSource::User);
        assert!(fragment::<Interface>("<interface type='user'><source network='default'/></interface>").is_none());
    }

    #[test]
    fn test_vhostuser_requires_socket() {
        assert!(fragment::<Interface>("<interface type='vhostuser'><model type='virtio'/></interface>").is_none());

        let iface: Interface = fragment(
            "<interface type='vhostuser'><source type='unix' path='/tmp/vhost.sock' mode='server'/></interface>",
        )
        .unwrap();
        assert!(matches!(iface.source, InterfaceSource::Vhostuser { mode: VhostUserMode::Server, .. }));
    }

    #[test]
    fn test_openvswitch_bridge() {
        let iface: Interface = fragment(
            "<interface type='bridge'>
               <source bridge='ovsbr0'/>
               <virtualport type='openvswitch'>
                 <parameters interfaceid='09b11c53-8b5c-4eeb-8f00-d84eaa0aaa4f' profileid='menial'/>
               </virtualport>
               <bandwidth><inbound average='1000' peak='5000' burst='1024'/></bandwidth>
               <filterref filter='clean-traffic'><parameter name='IP' value='10.0.0.1'/></filterref>
             </interface>",
        )
        .unwrap();
        let port = iface.virtualport.unwrap();
        assert_eq!(port.port_type, Some(VirtualPortType::Openvswitch));
        assert_eq!(port.parameters.unwrap().profileid.as_deref(), Some("menial"));
        assert_eq!(iface.bandwidth.unwrap().inbound.unwrap().peak, Some(5000));
        assert_eq!(iface.filterref.unwrap().parameters[0].value, "10.0.0.1");
    }

    #[test]
    fn test_generate_network_interface() {
        let mut iface = Interface::network("default");
        iface.mac = Some(UniMacAddr::new("52:54:00:00:00:01").unwrap());
        let mut e = Element::new("interface");
        iface.produce(&mut e).unwrap();
        assert_eq!(e.attribute("type"), Some("network"));
        let names: Vec<_> = e.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["mac", "source", "model"]);
    }
}
