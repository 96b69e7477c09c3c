//! `<filesystem>`: a host directory or image shared with the guest.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, flag, push_alias_and_address};
use crate::domain::address::Address;
use crate::domain::memory::ScaledInteger;
use crate::types::{AbsDirPath, AbsFilePath, GenericName};

xml_enum! {
    pub enum FsType {
        Mount = "mount",
        File = "file",
        Block = "block",
        Template = "template",
        Ram = "ram",
        Bind = "bind",
    }
}

xml_enum! {
    pub enum AccessMode {
        Passthrough = "passthrough",
        Mapped = "mapped",
        Squash = "squash",
    }
}

xml_enum! {
    pub enum FsDriverType {
        Path = "path",
        Handle = "handle",
        Loop = "loop",
        Nbd = "nbd",
        Ploop = "ploop",
        Virtiofs = "virtiofs",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemDriver {
    pub driver_type: Option<FsDriverType>,
    pub format: Option<GenericName>,
}

impl Fragment for FilesystemDriver {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            driver_type: c.optional_attribute("type")?,
            format: c.optional_attribute("format")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("type", &self.driver_type);
        e.put_optional("format", &self.format);
        Ok(())
    }
}

/// What backs the filesystem; one attribute of `<source>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsSource {
    Dir(AbsDirPath),
    File(AbsFilePath),
    Dev(AbsFilePath),
    Name(GenericName),
    /// RAM filesystem size.
    Usage(ScaledInteger),
}

impl Fragment for FsSource {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        c.choice()
            .or(|c| c.attribute("dir").map(FsSource::Dir))
            .or(|c| c.attribute("file").map(FsSource::File))
            .or(|c| c.attribute("dev").map(FsSource::Dev))
            .or(|c| c.attribute("name").map(FsSource::Name))
            .or(|c| {
                Some(FsSource::Usage(ScaledInteger {
                    value: c.attribute("usage")?,
                    unit: c.optional_attribute("units")?,
                }))
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            FsSource::Dir(dir) => e.put("dir", dir),
            FsSource::File(file) => e.put("file", file),
            FsSource::Dev(dev) => e.put("dev", dev),
            FsSource::Name(name) => e.put("name", name),
            FsSource::Usage(size) => {
                e.put("usage", &size.value);
                e.put_optional("units", &size.unit);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    pub fs_type: Option<FsType>,
    pub accessmode: Option<AccessMode>,
    pub driver: Option<FilesystemDriver>,
    pub source: FsSource,
    /// Mount tag or path inside the guest.
    pub target: String,
    pub readonly: bool,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Filesystem {
    /// Share a host directory under `tag`.
    pub fn mount(dir: AbsDirPath, tag: impl Into<String>) -> Self {
        Self {
            fs_type: Some(FsType::Mount),
            accessmode: None,
            driver: None,
            source: FsSource::Dir(dir),
            target: tag.into(),
            readonly: false,
            alias: None,
            address: None,
        }
    }
}

impl Fragment for Filesystem {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let fs_type = c.optional_attribute("type")?;
        let accessmode = c.optional_attribute("accessmode")?;
        let mut driver = None;
        let mut source = None;
        let mut target = None;
        let mut readonly = false;
        let mut alias_name = None;
        let mut location = None;
        c.interleave(vec![
            member(|c| {
                driver = c.optional(|c| c.element("driver", FilesystemDriver::consume));
                Some(())
            }),
            member(|c| {
                source = Some(c.element("source", FsSource::consume)?);
                Some(())
            }),
            member(|c| {
                target = Some(c.element("target", |c| c.attribute("dir"))?);
                Some(())
            }),
            member(|c| flag(c, "readonly", &mut readonly)),
            member(|c| alias(c, &mut alias_name)),
            member(|c| address(c, &mut location)),
        ])?;
        Some(Self {
            fs_type,
            accessmode,
            driver,
            source: source?,
            target: target?,
            readonly,
            alias: alias_name,
            address: location,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("type", &self.fs_type);
        e.put_optional("accessmode", &self.accessmode);
        e.push_optional("driver", &self.driver)?;
        e.push_fragment("source", &self.source)?;
        e.push_element("target", |t| {
            t.put("dir", &self.target);
            Ok(())
        })?;
        e.push_flag("readonly", self.readonly);
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_virtiofs_share() {
        let fs: Filesystem = fragment(
            "<filesystem type='mount' accessmode='passthrough'>
               <driver type='virtiofs'/>
               <source dir='/srv/share'/>
               <target dir='share'/>
               <readonly/>
             </filesystem>",
        )
        .unwrap();
        assert_eq!(fs.driver.unwrap().driver_type, Some(FsDriverType::Virtiofs));
        assert_eq!(fs.source, FsSource::Dir(AbsDirPath::new("/srv/share").unwrap()));
        assert_eq!(fs.target, "share");
        assert!(fs.readonly);
    }

    #[test]
    fn test_ram_usage() {
        let fs: Filesystem =
            fragment("<filesystem type='ram'><source usage='1024' units='KiB'/><target dir='/tmp'/></filesystem>").unwrap();
        let FsSource::Usage(size) = fs.source else {
            panic!("expected a usage source");
        };
        assert_eq!(size.value, 1024);
    }

    #[test]
    fn test_source_and_target_required() {
        assert!(fragment::<Filesystem>("<filesystem type='mount'><target dir='x'/></filesystem>").is_none());
        assert!(fragment::<Filesystem>("<filesystem type='mount'><source dir='/x'/></filesystem>").is_none());
    }

    #[test]
    fn test_generate_mount() {
        let fs = Filesystem::mount(AbsDirPath::new("/export").unwrap(), "tag0");
        let mut e = Element::new("filesystem");
        fs.produce(&mut e).unwrap();
        let names: Vec<_> = e.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["source", "target"]);
        assert_eq!(e.attribute("type"), Some("mount"));
    }
}
