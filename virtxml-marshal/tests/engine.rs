//! End-to-end tests of the engine through the public API, using a small
//! disk-like grammar declared the same way the schema crate declares its
//! bindings.

use virtxml_marshal::{member, Cursor, Element, Error, Fragment, Result, Root};

virtxml_marshal::xml_enum! {
    pub enum DiskDevice {
        Disk = "disk",
        Cdrom = "cdrom",
    }
}

virtxml_marshal::validated_string! {
    pub struct TargetDev = r"[a-z]+[0-9]*";
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    File(String),
    Block(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Disk {
    device: Option<DiskDevice>,
    source: Option<Source>,
    target: TargetDev,
    readonly: bool,
    serial: Option<String>,
    boot_order: Vec<u32>,
}

impl Fragment for Disk {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let device = c.optional_attribute("device")?;
        let source = c
            .choice()
            .or(|c| {
                c.fixed_attribute("type", "file")?;
                Some(c.optional(|c| c.element("source", |c| c.attribute("file").map(Source::File))))
            })
            .or(|c| {
                c.fixed_attribute("type", "block")?;
                Some(c.optional(|c| c.element("source", |c| c.attribute("dev").map(Source::Block))))
            })
            .select(c)?;

        let mut target = None;
        let mut readonly = false;
        let mut serial = None;
        let mut boot_order = Vec::new();
        c.interleave(vec![
            member(|c| {
                target = Some(c.element("target", |c| c.attribute("dev"))?);
                Some(())
            }),
            member(|c| {
                readonly = c.flag("readonly");
                Some(())
            }),
            member(|c| {
                serial = c.optional(|c| c.text_element("serial"));
                Some(())
            }),
            member(|c| {
                boot_order = c.zero_or_more(|c| c.element("boot", |c| c.attribute("order")));
                Some(())
            }),
        ])?;

        Some(Self {
            device,
            source,
            target: target?,
            readonly,
            serial,
            boot_order,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("device", &self.device);
        match &self.source {
            Some(Source::File(path)) => {
                e.put_fixed("type", "file");
                e.push_element("source", |s| {
                    s.put("file", path);
                    Ok(())
                })?;
            }
            Some(Source::Block(dev)) => {
                e.put_fixed("type", "block");
                e.push_element("source", |s| {
                    s.put("dev", dev);
                    Ok(())
                })?;
            }
            None => e.put_fixed("type", "file"),
        }
        e.push_element("target", |t| {
            t.put("dev", &self.target);
            Ok(())
        })?;
        e.push_flag("readonly", self.readonly);
        e.push_optional_text_element("serial", &self.serial);
        for order in &self.boot_order {
            e.push_element("boot", |b| {
                b.put("order", order);
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl Root for Disk {
    const TAG: &'static str = "disk";
}

/// Elements may appear in any order inside the interleave.
#[test]
fn test_parse_disk_in_any_order() {
    let disk = Disk::from_xml(
        r#"<disk type='block' device='cdrom'>
             <readonly/>
             <source dev='/dev/sr0'/>
             <boot order='2'/>
             <target dev='hdc'/>
           </disk>"#,
    );
    // <source> sits between interleave members, which the grammar forbids
    assert!(matches!(disk, Err(Error::Mismatch { .. })));

    let disk = Disk::from_xml(
        r#"<disk type='block' device='cdrom'>
             <source dev='/dev/sr0'/>
             <readonly/>
             <boot order='2'/>
             <target dev='hdc'/>
           </disk>"#,
    )
    .unwrap();

    assert_eq!(disk.device, Some(DiskDevice::Cdrom));
    assert_eq!(disk.source, Some(Source::Block("/dev/sr0".to_string())));
    assert_eq!(disk.target.as_str(), "hdc");
    assert!(disk.readonly);
    assert_eq!(disk.boot_order, vec![2]);
    assert_eq!(disk.serial, None);
}

/// Generated XML follows the declared order and reparses to the same value.
#[test]
fn test_generate_and_reparse() {
    let disk = Disk {
        device: Some(DiskDevice::Disk),
        source: Some(Source::File("/var/lib/images/a.qcow2".to_string())),
        target: TargetDev::new("vda").unwrap(),
        readonly: false,
        serial: Some("WD-123".to_string()),
        boot_order: vec![1],
    };

    let xml = disk.to_xml().unwrap();
    assert_eq!(
        xml,
        r#"<disk device="disk" type="file"><source file="/var/lib/images/a.qcow2"/><target dev="vda"/><serial>WD-123</serial><boot order="1"/></disk>"#
    );
    assert_eq!(Disk::from_xml(&xml).unwrap(), disk);
}

/// Invalid required values reject the whole document.
#[test]
fn test_invalid_values_are_rejected() {
    let bad_target = r#"<disk type='file'><target dev='VDA'/></disk>"#;
    assert!(Disk::from_xml(bad_target).is_err());

    let bad_type = r#"<disk type='network'><target dev='vda'/></disk>"#;
    assert!(Disk::from_xml(bad_type).is_err());
}

/// An invalid optional attribute is dropped; the element still matches.
#[test]
fn test_invalid_optional_attribute_is_dropped() {
    let bad_device = r#"<disk type='file' device='tape'><target dev='vda'/></disk>"#;
    let disk = Disk::from_xml(bad_device).unwrap();
    assert_eq!(disk.device, None);
    assert!(!disk.to_xml().unwrap().contains("tape"));
}

/// Unknown child elements are rejected, unknown attributes ignored.
#[test]
fn test_strict_children_lenient_attributes() {
    let extra_attr = r#"<disk type='file' cache='none'><target dev='vda' bus='virtio'/></disk>"#;
    assert!(Disk::from_xml(extra_attr).is_ok());

    let extra_child = r#"<disk type='file'><target dev='vda'/><iotune/></disk>"#;
    assert!(Disk::from_xml(extra_child).is_err());
}

/// The root element name must match.
#[test]
fn test_wrong_root() {
    let err = Disk::from_xml("<interface type='file'/>").unwrap_err();
    assert_eq!(err.to_string(), "Document does not match the <disk> grammar");
}

/// Syntax errors surface before matching.
#[test]
fn test_malformed_document() {
    assert!(matches!(Disk::from_xml("<disk"), Err(Error::Syntax(_)) | Err(Error::Unclosed(_))));
}
