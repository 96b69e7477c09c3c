//! `<capability type='system'>`: the host itself.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{Cursor, Element, Fragment, Result};

use crate::types::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardware {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub serial: Option<String>,
    pub uuid: Uuid,
}

impl Fragment for Hardware {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            vendor: c.optional(|c| c.text_element("vendor")),
            version: c.optional(|c| c.text_element("version")),
            serial: c.optional(|c| c.text_element("serial")),
            uuid: c.text_element("uuid")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("vendor", &self.vendor);
        e.push_optional_text_element("version", &self.version);
        e.push_optional_text_element("serial", &self.serial);
        e.push_text_element("uuid", &self.uuid);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub release_date: Option<String>,
}

impl Fragment for Firmware {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            vendor: c.optional(|c| c.text_element("vendor")),
            version: c.optional(|c| c.text_element("version")),
            release_date: c.optional(|c| c.text_element("release_date")),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("vendor", &self.vendor);
        e.push_optional_text_element("version", &self.version);
        e.push_optional_text_element("release_date", &self.release_date);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemCapability {
    pub product: Option<String>,
    pub hardware: Hardware,
    pub firmware: Firmware,
}

impl Fragment for SystemCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            product: c.optional(|c| c.text_element("product")),
            hardware: c.element("hardware", Hardware::consume)?,
            firmware: c.element("firmware", Firmware::consume)?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("product", &self.product);
        e.push_fragment("hardware", &self.hardware)?;
        e.push_fragment("firmware", &self.firmware)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_system_capability() {
        let cap: SystemCapability = fragment(
            "<capability type='system'>
               <product>2241B36</product>
               <hardware>
                 <vendor>LENOVO</vendor>
                 <version>ThinkPad T500</version>
                 <serial>R89055N</serial>
                 <uuid>c9488981-5049-11cb-9c1c-993d0230b4cd</uuid>
               </hardware>
               <firmware>
                 <vendor>LENOVO</vendor>
                 <version>6FET82WW (3.12 )</version>
                 <release_date>11/26/2009</release_date>
               </firmware>
             </capability>",
        )
        .unwrap();
        assert_eq!(cap.product.as_deref(), Some("2241B36"));
        assert_eq!(cap.hardware.uuid.as_str(), "c9488981-5049-11cb-9c1c-993d0230b4cd");
        assert_eq!(cap.firmware.release_date.as_deref(), Some("11/26/2009"));
    }

    #[test]
    fn test_hardware_needs_uuid() {
        assert!(fragment::<Hardware>("<hardware><vendor>LENOVO</vendor></hardware>").is_none());
    }

    #[test]
    fn test_empty_firmware_accepted() {
        assert_eq!(fragment::<Firmware>("<firmware/>"), Some(Firmware::default()));
    }
}
