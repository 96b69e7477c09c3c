//! `<blkiotune>`: block I/O weights and throttles.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, Cursor, Element, Fragment, Result};

use crate::types::{AbsFilePath, BlkioWeight};

/// Per host device limits inside `<blkiotune>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlkioDevice {
    pub path: AbsFilePath,
    pub weight: Option<BlkioWeight>,
    pub read_iops_sec: Option<u32>,
    pub write_iops_sec: Option<u32>,
    pub read_bytes_sec: Option<u64>,
    pub write_bytes_sec: Option<u64>,
}

impl BlkioDevice {
    pub fn new(path: AbsFilePath) -> Self {
        Self {
            path,
            weight: None,
            read_iops_sec: None,
            write_iops_sec: None,
            read_bytes_sec: None,
            write_bytes_sec: None,
        }
    }
}

impl Fragment for BlkioDevice {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut device = BlkioDevice::new(c.text_element("path")?);
        c.interleave(vec![
            member(|c| {
                device.weight = c.optional(|c| c.text_element("weight"));
                Some(())
            }),
            member(|c| {
                device.read_iops_sec = c.optional(|c| c.text_element("read_iops_sec"));
                Some(())
            }),
            member(|c| {
                device.write_iops_sec = c.optional(|c| c.text_element("write_iops_sec"));
                Some(())
            }),
            member(|c| {
                device.read_bytes_sec = c.optional(|c| c.text_element("read_bytes_sec"));
                Some(())
            }),
            member(|c| {
                device.write_bytes_sec = c.optional(|c| c.text_element("write_bytes_sec"));
                Some(())
            }),
        ])?;
        Some(device)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("path", &self.path);
        e.push_optional_text_element("weight", &self.weight);
        e.push_optional_text_element("read_iops_sec", &self.read_iops_sec);
        e.push_optional_text_element("write_iops_sec", &self.write_iops_sec);
        e.push_optional_text_element("read_bytes_sec", &self.read_bytes_sec);
        e.push_optional_text_element("write_bytes_sec", &self.write_bytes_sec);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blkiotune {
    pub weight: Option<BlkioWeight>,
    pub devices: Vec<BlkioDevice>,
}

impl Fragment for Blkiotune {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut tune = Blkiotune::default();
        c.interleave(vec![
            member(|c| {
                tune.weight = c.optional(|c| c.text_element("weight"));
                Some(())
            }),
            member(|c| {
                tune.devices = c.zero_or_more(|c| c.element("device", BlkioDevice::consume));
                Some(())
            }),
        ])?;
        Some(tune)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("weight", &self.weight);
        e.push_all("device", &self.devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_weight_and_device_limits() {
        let tune: Blkiotune = fragment(
            "<blkiotune>
               <device>
                 <path>/dev/sda</path>
                 <write_bytes_sec>10485760</write_bytes_sec>
                 <weight>500</weight>
               </device>
               <weight>800</weight>
             </blkiotune>",
        )
        .unwrap();
        assert_eq!(tune.weight.unwrap().get(), 800);
        assert_eq!(tune.devices.len(), 1);
        assert_eq!(tune.devices[0].path.as_str(), "/dev/sda");
        assert_eq!(tune.devices[0].weight.unwrap().get(), 500);
        assert_eq!(tune.devices[0].write_bytes_sec, Some(10485760));
        assert_eq!(tune.devices[0].read_iops_sec, None);
    }

    #[test]
    fn test_weight_range() {
        assert!(fragment::<Blkiotune>("<blkiotune><weight>99</weight></blkiotune>").is_none());
        assert!(fragment::<Blkiotune>("<blkiotune><weight>1001</weight></blkiotune>").is_none());
        assert!(fragment::<Blkiotune>("<blkiotune><weight>1000</weight></blkiotune>").is_some());
    }

    #[test]
    fn test_device_path_comes_first() {
        assert!(fragment::<Blkiotune>(
            "<blkiotune><device><weight>500</weight><path>/dev/sda</path></device></blkiotune>"
        )
        .is_none());
    }

    #[test]
    fn test_generate_device_order() {
        let mut device = BlkioDevice::new(AbsFilePath::new("/dev/vg/lv").unwrap());
        device.read_iops_sec = Some(200);
        let tune = Blkiotune {
            weight: Some(BlkioWeight::new(100).unwrap()),
            devices: vec![device],
        };

        let mut e = Element::new("blkiotune");
        tune.produce(&mut e).unwrap();
        let names: Vec<_> = e.child_elements().map(Element::name).collect();
        assert_eq!(names, ["weight", "device"]);
        let device = e.child_elements().nth(1).unwrap();
        let names: Vec<_> = device.child_elements().map(Element::name).collect();
        assert_eq!(names, ["path", "read_iops_sec"]);
    }
}
