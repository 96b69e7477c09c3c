//! `<capability type='net'>`

use serde::{Deserialize, Serialize};
use virtxml_marshal::{xml_enum, Cursor, Element, Fragment, Result};

use crate::types::{MacAddr, NetFeatureName};

xml_enum! {
    /// Operational state as reported by the kernel.
    pub enum NetLinkState {
        Unknown = "unknown",
        NotPresent = "notpresent",
        Down = "down",
        LowerLayerDown = "lowerlayerdown",
        Testing = "testing",
        Dormant = "dormant",
        Up = "up",
    }
}

xml_enum! {
    /// Link layer of a network interface.
    pub enum NetSubcapability {
        Ethernet = "80203",
        Wireless = "80211",
    }
}

/// `<link speed='1000' state='up'/>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetLink {
    /// Mbit/s.
    pub speed: Option<u32>,
    pub state: Option<NetLinkState>,
}

impl Fragment for NetLink {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            speed: c.optional_attribute("speed")?,
            state: c.optional_attribute("state")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("speed", &self.speed);
        e.put_optional("state", &self.state);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetCapability {
    pub interface: String,
    pub address: Option<MacAddr>,
    pub link: Option<NetLink>,
    /// Offload features such as `rx` or `tso`.
    pub features: Vec<NetFeatureName>,
    pub subcapabilities: Vec<NetSubcapability>,
}

impl NetCapability {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            address: None,
            link: None,
            features: Vec::new(),
            subcapabilities: Vec::new(),
        }
    }
}

impl Fragment for NetCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            interface: c.text_element("interface")?,
            address: c.optional(|c| c.text_element("address")),
            link: c.optional(|c| c.element("link", NetLink::consume)),
            features: c.zero_or_more(|c| c.element("feature", |c| c.attribute("name"))),
            subcapabilities: c.zero_or_more(|c| c.element("capability", |c| c.attribute("type"))),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("interface", &self.interface);
        e.push_optional_text_element("address", &self.address);
        e.push_optional("link", &self.link)?;
        for feature in &self.features {
            e.push_element("feature", |f| {
                f.put("name", feature);
                Ok(())
            })?;
        }
        for sub in &self.subcapabilities {
            e.push_element("capability", |s| {
                s.put("type", sub);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_ethernet_interface() {
        let cap: NetCapability = fragment(
            "<capability type='net'>
               <interface>eth0</interface>
               <address>00:13:02:b9:f9:d3</address>
               <link speed='1000' state='up'/>
               <feature name='rx'/>
               <feature name='tx'/>
               <feature name='rxvlan'/>
               <capability type='80203'/>
             </capability>",
        )
        .unwrap();
        assert_eq!(cap.interface, "eth0");
        assert_eq!(
            cap.link,
            Some(NetLink {
                speed: Some(1000),
                state: Some(NetLinkState::Up)
            })
        );
        assert_eq!(cap.features.len(), 3);
        assert_eq!(cap.subcapabilities, vec![NetSubcapability::Ethernet]);
    }

    #[test]
    fn test_bad_mac_rejected() {
        assert!(fragment::<NetCapability>(
            "<capability type='net'><interface>eth0</interface><address>00:13:02</address></capability>"
        )
        .is_none());
    }

    #[test]
    fn test_unknown_link_state_dropped() {
        let link = fragment::<NetLink>("<link speed='1000' state='flapping'/>").unwrap();
        assert_eq!(link.speed, Some(1000));
        assert_eq!(link.state, None);
    }

    #[test]
    fn test_generate_features_before_subcapabilities() {
        let mut cap = NetCapability::new("wlan0");
        cap.subcapabilities.push(NetSubcapability::Wireless);
        cap.features.push(NetFeatureName::new("gso").unwrap());
        let mut e = Element::new("capability");
        cap.produce(&mut e).unwrap();
        let names: Vec<_> = e.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["interface", "feature", "capability"]);
        assert_eq!(e.child_elements().last().unwrap().attribute("type"), Some("80211"));
    }
}
