//! `<capability type='usb_device'>` and `<capability type='usb'>`.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{Cursor, Element, Fragment, Result};

use super::IdName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbDeviceCapability {
    pub bus: u64,
    pub device: u64,
    pub product: IdName,
    pub vendor: IdName,
}

impl Fragment for UsbDeviceCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            bus: c.text_element("bus")?,
            device: c.text_element("device")?,
            product: c.element("product", IdName::consume)?,
            vendor: c.element("vendor", IdName::consume)?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("bus", &self.bus);
        e.push_text_element("device", &self.device);
        e.push_fragment("product", &self.product)?;
        e.push_fragment("vendor", &self.vendor)
    }
}

/// One interface of a USB device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbInterfaceCapability {
    pub number: u64,
    pub class: u64,
    pub subclass: u64,
    pub protocol: u64,
    pub description: Option<String>,
}

impl Fragment for UsbInterfaceCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            number: c.text_element("number")?,
            class: c.text_element("class")?,
            subclass: c.text_element("subclass")?,
            protocol: c.text_element("protocol")?,
            description: c.optional(|c| c.text_element("description")),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("number", &self.number);
        e.push_text_element("class", &self.class);
        e.push_text_element("subclass", &self.subclass);
        e.push_text_element("protocol", &self.protocol);
        e.push_optional_text_element("description", &self.description);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_usb_device() {
        let cap: UsbDeviceCapability = fragment(
            "<capability type='usb_device'>
               <bus>1</bus>
               <device>3</device>
               <product id='0x0021'>Smart Card Reader</product>
               <vendor id='0x0b97'>O2 Micro, Inc.</vendor>
             </capability>",
        )
        .unwrap();
        assert_eq!(cap.device, 3);
        assert_eq!(cap.product.id.as_str(), "0x0021");
    }

    #[test]
    fn test_usb_interface_fields_are_ordered() {
        let cap: UsbInterfaceCapability = fragment(
            "<capability type='usb'>
               <number>0</number><class>11</class><subclass>0</subclass><protocol>0</protocol>
               <description>Chip/SmartCard</description>
             </capability>",
        )
        .unwrap();
        assert_eq!(cap.class, 11);
        assert_eq!(cap.description.as_deref(), Some("Chip/SmartCard"));

        assert!(fragment::<UsbInterfaceCapability>(
            "<capability type='usb'><class>11</class><number>0</number><subclass>0</subclass><protocol>0</protocol></capability>"
        )
        .is_none());
    }

    #[test]
    fn test_negative_number_rejected() {
        assert!(fragment::<UsbDeviceCapability>(
            "<capability type='usb_device'><bus>-1</bus><device>3</device>\
             <product id='0x1'/><vendor id='0x2'/></capability>"
        )
        .is_none());
    }
}
