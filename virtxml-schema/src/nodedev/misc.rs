//! DRM, mediated and channel I/O device capabilities.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{xml_enum, Cursor, Element, Fragment, Result};

use crate::types::{CcwCssidRange, CcwDevnoRange, CcwSsidRange};

xml_enum! {
    /// Kind of DRM device node.
    pub enum DrmType {
        Primary = "primary",
        Control = "control",
        Render = "render",
    }
}

/// A mediated device instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdevCapability {
    /// Mediated device type it was created from.
    pub type_id: String,
    pub iommu_group: u32,
}

impl Fragment for MdevCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            type_id: c.element("type", |c| c.attribute("id"))?,
            iommu_group: c.element("iommuGroup", |c| c.attribute("number"))?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_child(Element::new("type").with_attribute("id", self.type_id.as_str()));
        e.push_element("iommuGroup", |g| {
            g.put("number", &self.iommu_group);
            Ok(())
        })
    }
}

/// s390 channel I/O device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcwCapability {
    pub cssid: CcwCssidRange,
    pub ssid: CcwSsidRange,
    pub devno: CcwDevnoRange,
}

impl Fragment for CcwCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            cssid: c.text_element("cssid")?,
            ssid: c.text_element("ssid")?,
            devno: c.text_element("devno")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("cssid", &self.cssid);
        e.push_text_element("ssid", &self.ssid);
        e.push_text_element("devno", &self.devno);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_mdev() {
        let cap: MdevCapability = fragment(
            "<capability type='mdev'><type id='i915-GVTg_V5_4'/><iommuGroup number='12'/></capability>",
        )
        .unwrap();
        assert_eq!(cap.type_id, "i915-GVTg_V5_4");
        assert_eq!(cap.iommu_group, 12);
    }

    #[test]
    fn test_ccw_ranges() {
        let cap: CcwCapability =
            fragment("<capability type='ccw'><cssid>0xfe</cssid><ssid>0x0</ssid><devno>0x0001</devno></capability>")
                .unwrap();
        assert_eq!(cap.devno.as_str(), "0x0001");

        assert!(fragment::<CcwCapability>(
            "<capability type='ccw'><cssid>0xff</cssid><ssid>0x0</ssid><devno>0x0001</devno></capability>"
        )
        .is_none());
        assert!(fragment::<CcwCapability>(
            "<capability type='ccw'><cssid>0</cssid><ssid>4</ssid><devno>1</devno></capability>"
        )
        .is_none());
    }
}
