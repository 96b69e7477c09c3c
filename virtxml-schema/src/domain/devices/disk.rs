//! `<disk>`: block storage attached to the guest.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, boot, flag, push_alias_and_address, Boot};
use crate::domain::address::Address;
use crate::types::{
    AbsDirPath, AbsFilePath, DiskProduct, DiskTarget, DiskVendor, DnsName, GenericName, OnOff, Uuid, Wwn,
};

xml_enum! {
    pub enum DiskType {
        File = "file",
        Block = "block",
        Dir = "dir",
        Network = "network",
        Volume = "volume",
    }
}

xml_enum! {
    pub enum DiskDevice {
        Floppy = "floppy",
        Disk = "disk",
        Cdrom = "cdrom",
        Lun = "lun",
    }
}

xml_enum! {
    pub enum SnapshotMode {
        Internal = "internal",
        External = "external",
        No = "no",
    }
}

xml_enum! {
    pub enum DiskBus {
        Ide = "ide",
        Scsi = "scsi",
        Virtio = "virtio",
        Xen = "xen",
        Usb = "usb",
        Uml = "uml",
        Sata = "sata",
        Sd = "sd",
        Fdc = "fdc",
    }
}

xml_enum! {
    pub enum TrayState {
        Open = "open",
        Closed = "closed",
    }
}

xml_enum! {
    pub enum CacheMode {
        Default = "default",
        None = "none",
        Writethrough = "writethrough",
        Writeback = "writeback",
        Directsync = "directsync",
        Unsafe = "unsafe",
    }
}

xml_enum! {
    pub enum IoMode {
        Threads = "threads",
        Native = "native",
        IoUring = "io_uring",
    }
}

xml_enum! {
    pub enum DiscardMode {
        Unmap = "unmap",
        Ignore = "ignore",
    }
}

xml_enum! {
    pub enum NetworkProtocol {
        Nbd = "nbd",
        Rbd = "rbd",
        Sheepdog = "sheepdog",
        Gluster = "gluster",
        Iscsi = "iscsi",
        Http = "http",
        Https = "https",
        Ftp = "ftp",
        Ftps = "ftps",
        Tftp = "tftp",
    }
}

/// `<host name='...' port='...'/>` of a network disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHost {
    pub name: Option<DnsName>,
    pub port: Option<u16>,
}

impl Fragment for SourceHost {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.optional_attribute("name")?,
            port: c.optional_attribute("port")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("name", &self.name);
        e.put_optional("port", &self.port);
        Ok(())
    }
}

/// Backing storage, one variant per disk `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskSource {
    File {
        file: Option<AbsFilePath>,
    },
    Block {
        dev: Option<AbsFilePath>,
    },
    Dir {
        dir: Option<AbsDirPath>,
    },
    Network {
        protocol: NetworkProtocol,
        name: Option<String>,
        hosts: Vec<SourceHost>,
    },
    Volume {
        pool: Option<String>,
        volume: Option<String>,
    },
}

impl DiskSource {
    pub fn file(path: AbsFilePath) -> Self {
        DiskSource::File { file: Some(path) }
    }

    pub fn disk_type(&self) -> DiskType {
        match self {
            DiskSource::File { .. } => DiskType::File,
            DiskSource::Block { .. } => DiskType::Block,
            DiskSource::Dir { .. } => DiskType::Dir,
            DiskSource::Network { .. } => DiskType::Network,
            DiskSource::Volume { .. } => DiskType::Volume,
        }
    }

    /// Source of a disk of `kind` without a `<source>` element. Network
    /// disks cannot omit it.
    fn absent(kind: DiskType) -> Option<Self> {
        match kind {
            DiskType::File => Some(DiskSource::File { file: None }),
            DiskType::Block => Some(DiskSource::Block { dev: None }),
            DiskType::Dir => Some(DiskSource::Dir { dir: None }),
            DiskType::Network => None,
            DiskType::Volume => Some(DiskSource::Volume { pool: None, volume: None }),
        }
    }

    /// Contents of `<source>` for a disk of `kind`.
    fn consume_as(kind: DiskType, c: &mut Cursor<'_>) -> Option<Self> {
        match kind {
            DiskType::File => Some(DiskSource::File {
                file: c.optional_attribute("file")?,
            }),
            DiskType::Block => Some(DiskSource::Block {
                dev: c.optional_attribute("dev")?,
            }),
            DiskType::Dir => Some(DiskSource::Dir {
                dir: c.optional_attribute("dir")?,
            }),
            DiskType::Network => Some(DiskSource::Network {
                protocol: c.attribute("protocol")?,
                name: c.optional_attribute("name")?,
                hosts: c.zero_or_more(|c| c.element("host", SourceHost::consume)),
            }),
            DiskType::Volume => Some(DiskSource::Volume {
                pool: c.optional_attribute("pool")?,
                volume: c.optional_attribute("volume")?,
            }),
        }
    }

    /// Write `<source>` unless there is nothing to say.
    fn produce_into(&self, e: &mut Element) -> Result<()> {
        let mut source = Element::new("source");
        match self {
            DiskSource::File { file } => source.put_optional("file", file),
            DiskSource::Block { dev } => source.put_optional("dev", dev),
            DiskSource::Dir { dir } => source.put_optional("dir", dir),
            DiskSource::Network { protocol, name, hosts } => {
                source.put("protocol", protocol);
                source.put_optional("name", name);
                source.push_all("host", hosts)?;
            }
            DiskSource::Volume { pool, volume } => {
                source.put_optional("pool", pool);
                source.put_optional("volume", volume);
            }
        }
        if source.attributes().next().is_some() || !source.children().is_empty() {
            e.push_child(source);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskDriver {
    pub name: Option<GenericName>,
    pub format: Option<GenericName>,
    pub cache: Option<CacheMode>,
    pub io: Option<IoMode>,
    pub discard: Option<DiscardMode>,
}

impl DiskDriver {
    /// `<driver name='qemu' type='...'/>`
    pub fn qemu(format: &str) -> virtxml_marshal::Result<Self> {
        Ok(Self {
            name: Some(GenericName::new("qemu")?),
            format: Some(GenericName::new(format)?),
            ..Self::default()
        })
    }
}

impl Fragment for DiskDriver {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.optional_attribute("name")?,
            format: c.optional_attribute("type")?,
            cache: c.optional_attribute("cache")?,
            io: c.optional_attribute("io")?,
            discard: c.optional_attribute("discard")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("name", &self.name);
        e.put_optional("type", &self.format);
        e.put_optional("cache", &self.cache);
        e.put_optional("io", &self.io);
        e.put_optional("discard", &self.discard);
        Ok(())
    }
}

/// `<target dev='vda' bus='virtio'/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskTargetSpec {
    pub dev: DiskTarget,
    pub bus: Option<DiskBus>,
    pub tray: Option<TrayState>,
    pub removable: Option<OnOff>,
}

impl DiskTargetSpec {
    pub fn new(dev: DiskTarget, bus: DiskBus) -> Self {
        Self {
            dev,
            bus: Some(bus),
            tray: None,
            removable: None,
        }
    }
}

impl Fragment for DiskTargetSpec {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            dev: c.attribute("dev")?,
            bus: c.optional_attribute("bus")?,
            tray: c.optional_attribute("tray")?,
            removable: c.optional_attribute("removable")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("dev", &self.dev);
        e.put_optional("bus", &self.bus);
        e.put_optional("tray", &self.tray);
        e.put_optional("removable", &self.removable);
        Ok(())
    }
}

/// `<iotune>`: I/O throttling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iotune {
    pub total_bytes_sec: Option<u64>,
    pub read_bytes_sec: Option<u64>,
    pub write_bytes_sec: Option<u64>,
    pub total_iops_sec: Option<u64>,
    pub read_iops_sec: Option<u64>,
    pub write_iops_sec: Option<u64>,
}

impl Fragment for Iotune {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut t = Iotune::default();
        c.interleave(vec![
            member(|c| limit(c, "total_bytes_sec", &mut t.total_bytes_sec)),
            member(|c| limit(c, "read_bytes_sec", &mut t.read_bytes_sec)),
            member(|c| limit(c, "write_bytes_sec", &mut t.write_bytes_sec)),
            member(|c| limit(c, "total_iops_sec", &mut t.total_iops_sec)),
            member(|c| limit(c, "read_iops_sec", &mut t.read_iops_sec)),
            member(|c| limit(c, "write_iops_sec", &mut t.write_iops_sec)),
        ])?;
        Some(t)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional_text_element("total_bytes_sec", &self.total_bytes_sec);
        e.push_optional_text_element("read_bytes_sec", &self.read_bytes_sec);
        e.push_optional_text_element("write_bytes_sec", &self.write_bytes_sec);
        e.push_optional_text_element("total_iops_sec", &self.total_iops_sec);
        e.push_optional_text_element("read_iops_sec", &self.read_iops_sec);
        e.push_optional_text_element("write_iops_sec", &self.write_iops_sec);
        Ok(())
    }
}

xml_enum! {
    pub enum EncryptionFormat {
        Default = "default",
        Qcow = "qcow",
    }
}

xml_enum! {
    pub enum SecretType {
        Passphrase = "passphrase",
    }
}

/// How a `<secret>` names the libvirt secret object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretRef {
    Uuid(Uuid),
    Usage(String),
}

/// `<secret type='passphrase' uuid='...'/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSecret {
    pub secret_type: SecretType,
    pub reference: SecretRef,
}

impl Fragment for DiskSecret {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let secret_type = c.attribute("type")?;
        let reference = c
            .choice()
            .or(|c| c.attribute("uuid").map(SecretRef::Uuid))
            .or(|c| c.attribute("usage").map(SecretRef::Usage))
            .select(c)?;
        Some(Self { secret_type, reference })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.secret_type);
        match &self.reference {
            SecretRef::Uuid(uuid) => e.put("uuid", uuid),
            SecretRef::Usage(usage) => e.put("usage", usage),
        }
        Ok(())
    }
}

/// `<encryption>`: disk image encryption and the secrets unlocking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encryption {
    pub format: EncryptionFormat,
    pub secrets: Vec<DiskSecret>,
}

impl Fragment for Encryption {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            format: c.attribute("format")?,
            secrets: c.zero_or_more(|c| c.element("secret", DiskSecret::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("format", &self.format);
        e.push_all("secret", &self.secrets)
    }
}

fn limit(c: &mut Cursor<'_>, name: &str, slot: &mut Option<u64>) -> Option<()> {
    *slot = c.optional(|c| c.text_element(name));
    Some(())
}

/// `<disk>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub source: DiskSource,
    pub device: Option<DiskDevice>,
    pub snapshot: Option<SnapshotMode>,
    pub driver: Option<DiskDriver>,
    pub target: DiskTargetSpec,
    pub boot: Option<Boot>,
    pub readonly: bool,
    pub shareable: bool,
    pub transient: bool,
    pub serial: Option<String>,
    pub wwn: Option<Wwn>,
    pub vendor: Option<DiskVendor>,
    pub product: Option<DiskProduct>,
    pub encryption: Option<Encryption>,
    pub alias: Option<String>,
    pub address: Option<Address>,
    pub iotune: Option<Iotune>,
}

impl Disk {
    /// A file-backed disk.
    pub fn file(path: AbsFilePath, target: DiskTargetSpec) -> Self {
        Self {
            source: DiskSource::file(path),
            device: Some(DiskDevice::Disk),
            snapshot: None,
            driver: None,
            target,
            boot: None,
            readonly: false,
            shareable: false,
            transient: false,
            serial: None,
            wwn: None,
            vendor: None,
            product: None,
            encryption: None,
            alias: None,
            address: None,
            iotune: None,
        }
    }
}

impl Fragment for Disk {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let kind: DiskType = c.attribute("type")?;
        let device = c.optional_attribute("device")?;
        let snapshot = c.optional_attribute("snapshot")?;

        let mut source = None;
        let mut driver = None;
        let mut target = None;
        let mut boot_order = None;
        let (mut readonly, mut shareable, mut transient) = (false, false, false);
        let mut serial = None;
        let mut wwn = None;
        let mut vendor = None;
        let mut product = None;
        let mut encryption = None;
        let mut alias_name = None;
        let mut location = None;
        let mut iotune = None;

        c.interleave(vec![
            member(|c| {
                source = match c.optional(|c| c.element("source", |c| DiskSource::consume_as(kind, c))) {
                    Some(found) => Some(found),
                    None => DiskSource::absent(kind),
                };
                Some(())
            }),
            member(|c| {
                driver = c.optional(|c| c.element("driver", DiskDriver::consume));
                Some(())
            }),
            member(|c| {
                target = Some(c.element("target", DiskTargetSpec::consume)?);
                Some(())
            }),
            member(|c| boot(c, &mut boot_order)),
            member(|c| flag(c, "readonly", &mut readonly)),
            member(|c| flag(c, "shareable", &mut shareable)),
            member(|c| flag(c, "transient", &mut transient)),
            member(|c| {
                serial = c.optional(|c| c.text_element("serial"));
                Some(())
            }),
            member(|c| {
                wwn = c.optional(|c| c.text_element("wwn"));
                Some(())
            }),
            member(|c| {
                vendor = c.optional(|c| c.text_element("vendor"));
                Some(())
            }),
            member(|c| {
                product = c.optional(|c| c.text_element("product"));
                Some(())
            }),
            member(|c| {
                encryption = c.optional(|c| c.element("encryption", Encryption::consume));
                Some(())
            }),
            member(|c| alias(c, &mut alias_name)),
            member(|c| address(c, &mut location)),
            member(|c| {
                iotune = c.optional(|c| c.element("iotune", Iotune::consume));
                Some(())
            }),
        ])?;

        Some(Self {
            source: source?,
            device,
            snapshot,
            driver,
            target: target?,
            boot: boot_order,
            readonly,
            shareable,
            transient,
            serial,
            wwn,
            vendor,
            product,
            encryption,
            alias: alias_name,
            address: location,
            iotune,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.source.disk_type());
        e.put_optional("device", &self.device);
        e.put_optional("snapshot", &self.snapshot);
        e.push_optional("driver", &self.driver)?;
        self.source.produce_into(e)?;
        e.push_fragment("target", &self.target)?;
        e.push_optional("boot", &self.boot)?;
        e.push_flag("readonly", self.readonly);
        e.push_flag("shareable", self.shareable);
        e.push_flag("transient", self.transient);
        e.push_optional_text_element("serial", &self.serial);
        e.push_optional_text_element("wwn", &self.wwn);
        e.push_optional_text_element("vendor", &self.vendor);
        e.push_optional_text_element("product", &self.product);
        e.push_optional("encryption", &self.encryption)?;
        e.push_optional("iotune", &self.iotune)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_file_disk() {
        let disk: Disk = fragment(
            "<disk type='file' device='disk'>
               <driver name='qemu' type='qcow2' cache='none' io='native' discard='unmap'/>
               <source file='/var/lib/libvirt/images/vm.qcow2'/>
               <target dev='vda' bus='virtio'/>
               <boot order='1'/>
               <address type='pci' domain='0x0000' bus='0x04' slot='0x00' function='0x0'/>
             </disk>",
        )
        .unwrap();

        assert_eq!(disk.source.disk_type(), DiskType::File);
        let driver = disk.driver.unwrap();
        assert_eq!(driver.format.unwrap().as_str(), "qcow2");
        assert_eq!(driver.cache, Some(CacheMode::None));
        assert_eq!(disk.target.bus, Some(DiskBus::Virtio));
        assert_eq!(disk.boot, Some(Boot { order: 1 }));
        assert!(disk.address.is_some());
    }

    #[test]
    fn test_empty_cdrom() {
        let disk: Disk = fragment(
            "<disk type='file' device='cdrom'><target dev='sda' bus='sata' tray='open'/><readonly/></disk>",
        )
        .unwrap();
        assert_eq!(disk.source, DiskSource::File { file: None });
        assert!(disk.readonly);
        assert_eq!(disk.target.tray, Some(TrayState::Open));
    }

    #[test]
    fn test_network_disk_requires_source() {
        assert!(fragment::<Disk>("<disk type='network'><target dev='vdb'/></disk>").is_none());

        let disk: Disk = fragment(
            "<disk type='network' device='disk'>
               <source protocol='rbd' name='pool/image'>
                 <host name='mon1.example.org' port='6789'/>
                 <host name='mon2.example.org' port='6789'/>
               </source>
               <target dev='vdb' bus='virtio'/>
             </disk>",
        )
        .unwrap();
        let DiskSource::Network { protocol, hosts, .. } = disk.source else {
            panic!("expected a network source");
        };
        assert_eq!(protocol, NetworkProtocol::Rbd);
        assert_eq!(hosts.len(), 2);
    }

    #[test]
    fn test_source_attribute_follows_type() {
        // Attributes of other source kinds are ignored
        assert!(fragment::<Disk>("<disk type='file'><source dev='/dev/sdb'/><target dev='vdb'/></disk>").is_some());
        let relative: Disk =
            fragment("<disk type='file'><source file='relative.img'/><target dev='vdb'/></disk>").unwrap();
        assert_eq!(relative.source, DiskSource::File { file: None });
    }

    #[test]
    fn test_encrypted_disk() {
        let disk: Disk = fragment(
            "<disk type='file' device='disk'>
               <source file='/var/lib/libvirt/images/secure.qcow2'/>
               <encryption format='qcow'>
                 <secret type='passphrase' uuid='0a81f5b2-8403-7b23-c8d6-21ccc2f80d6f'/>
               </encryption>
               <target dev='vdc' bus='virtio'/>
             </disk>",
        )
        .unwrap();
        let encryption = disk.encryption.as_ref().unwrap();
        assert_eq!(encryption.format, EncryptionFormat::Qcow);
        assert!(matches!(
            encryption.secrets[0].reference,
            SecretRef::Uuid(ref uuid) if uuid.as_str() == "0a81f5b2-8403-7b23-c8d6-21ccc2f80d6f"
        ));

        let mut e = Element::new("disk");
        disk.produce(&mut e).unwrap();
        let secret = e
            .child_elements()
            .find(|child| child.name() == "encryption")
            .and_then(|enc| enc.child_elements().next())
            .unwrap();
        assert_eq!(secret.attribute("type"), Some("passphrase"));
        assert_eq!(secret.attribute("uuid"), Some("0a81f5b2-8403-7b23-c8d6-21ccc2f80d6f"));
    }

    #[test]
    fn test_encryption_secret_needs_reference() {
        let usage: Encryption =
            fragment("<encryption format='default'><secret type='passphrase' usage='luks-vol'/></encryption>").unwrap();
        assert_eq!(usage.secrets[0].reference, SecretRef::Usage("luks-vol".to_string()));

        assert!(fragment::<Encryption>("<encryption format='qcow'><secret type='passphrase'/></encryption>").is_none());
        assert!(fragment::<Encryption>("<encryption format='luks'/>").is_none());
    }

    #[test]
    fn test_wwn_validated() {
        let disk: Disk =
            fragment("<disk type='block'><target dev='sdb'/><wwn>0x5000c50015ea71ad</wwn></disk>").unwrap();
        assert_eq!(disk.wwn.unwrap().as_str(), "0x5000c50015ea71ad");
        assert!(fragment::<Disk>("<disk type='file'><target dev='vda'/><wwn>not a wwn!</wwn></disk>").is_none());
    }

    #[test]
    fn test_target_name_validated() {
        assert!(fragment::<Disk>("<disk type='file'><target dev='disk0'/></disk>").is_none());
    }

    #[test]
    fn test_iotune() {
        let disk: Disk = fragment(
            "<disk type='block'><source dev='/dev/vg/lv'/><target dev='vdc'/><iotune><read_iops_sec>400</read_iops_sec><total_bytes_sec>10000000</total_bytes_sec></iotune></disk>",
        )
        .unwrap();
        let tune = disk.iotune.unwrap();
        assert_eq!(tune.read_iops_sec, Some(400));
        assert_eq!(tune.total_bytes_sec, Some(10_000_000));
    }

    #[test]
    fn test_generate_file_disk() {
        let disk = Disk::file(
            AbsFilePath::new("/images/a.img").unwrap(),
            DiskTargetSpec::new(DiskTarget::new("vda").unwrap(), DiskBus::Virtio),
        );
        let mut e = Element::new("disk");
        disk.produce(&mut e).unwrap();
        assert_eq!(e.attribute("type"), Some("file"));
        let names: Vec<_> = e.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["source", "target"]);
    }
}
