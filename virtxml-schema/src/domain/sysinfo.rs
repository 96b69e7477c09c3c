//! `<sysinfo type='smbios'>`: SMBIOS strings exposed to the guest.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{xml_enum, Cursor, Element, Fragment, Result, Scalar};

xml_enum! {
    pub enum BiosEntryName {
        Vendor = "vendor",
        Version = "version",
        Date = "date",
        Release = "release",
    }
}

xml_enum! {
    pub enum SystemEntryName {
        Manufacturer = "manufacturer",
        Product = "product",
        Version = "version",
        Serial = "serial",
        Uuid = "uuid",
        Sku = "sku",
        Family = "family",
    }
}

/// `<entry name='...'>value</entry>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<N> {
    pub name: N,
    pub value: String,
}

impl<N: Scalar> Fragment for Entry<N> {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.attribute("name")?,
            value: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("name", &self.name);
        e.put_text(&self.value);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sysinfo {
    pub bios: Option<Vec<Entry<BiosEntryName>>>,
    pub system: Option<Vec<Entry<SystemEntryName>>>,
}

impl Fragment for Sysinfo {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.fixed_attribute("type", "smbios")?;
        let bios = c.optional(|c| c.element("bios", |c| c.one_or_more(|c| c.element("entry", Entry::consume))));
        let system = c.optional(|c| c.element("system", |c| c.one_or_more(|c| c.element("entry", Entry::consume))));
        Some(Self { bios, system })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_fixed("type", "smbios");
        if let Some(entries) = &self.bios {
            e.push_element("bios", |b| b.push_at_least_one("entry", entries))?;
        }
        if let Some(entries) = &self.system {
            e.push_element("system", |s| s.push_at_least_one("entry", entries))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_smbios_sections() {
        let info: Sysinfo = fragment(
            "<sysinfo type='smbios'>
               <bios><entry name='vendor'>LENOVO</entry></bios>
               <system>
                 <entry name='manufacturer'>Fedora</entry>
                 <entry name='product'>Virt-Manager</entry>
               </system>
             </sysinfo>",
        )
        .unwrap();
        assert_eq!(info.bios.unwrap()[0].value, "LENOVO");
        let system = info.system.unwrap();
        assert_eq!(system[1].name, SystemEntryName::Product);
    }

    #[test]
    fn test_only_smbios_type() {
        assert!(fragment::<Sysinfo>("<sysinfo type='fwcfg'/>").is_none());
        assert!(fragment::<Sysinfo>("<sysinfo type='smbios'><bios><entry name='uuid'>x</entry></bios></sysinfo>").is_none());
    }
}
