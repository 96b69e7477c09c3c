//! libvirt guest definitions: the `<domain>` document.
//!
//! [`Domain`] is the root type. Each child element of `<domain>` has its
//! own module; the top-level children may appear in any order.
//!
//! ```
//! use virtxml_marshal::Root;
//! use virtxml_schema::domain::{Domain, DomainType};
//!
//! let xml = r#"<domain type="kvm"><name>demo</name><os><type>hvm</type></os></domain>"#;
//! let domain = Domain::from_xml(xml).unwrap();
//! assert_eq!(domain.domain_type, DomainType::Kvm);
//! assert_eq!(domain.to_xml().unwrap(), xml);
//! ```

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result, Root};

use crate::types::{Uuid, YesNo};

pub mod address;
pub mod blkiotune;
pub mod clock;
pub mod cpu;
pub mod devices;
pub mod features;
pub mod lifecycle;
pub mod memory;
pub mod os;
pub mod qemu;
pub mod sysinfo;

pub use address::Address;
pub use blkiotune::{BlkioDevice, Blkiotune};
pub use clock::Clock;
pub use cpu::Cpu;
pub use devices::{Device, Devices};
pub use features::Features;
pub use lifecycle::{CrashAction, LifecycleAction, LockFailureAction, Pm};
pub use memory::{Cputune, MaxMemory, Memory, MemoryBacking, ScaledInteger, Vcpu};
pub use os::{BootDevice, Os};
pub use qemu::{QemuCommandline, QemuEnv, QEMU_NAMESPACE};
pub use sysinfo::Sysinfo;

xml_enum! {
    /// Hypervisor driver of a domain.
    pub enum DomainType {
        Qemu = "qemu",
        Kqemu = "kqemu",
        Kvm = "kvm",
        Xen = "xen",
        Lxc = "lxc",
        Uml = "uml",
        Openvz = "openvz",
        Test = "test",
        Vmware = "vmware",
        Hyperv = "hyperv",
        Vbox = "vbox",
        Phyp = "phyp",
        Parallels = "parallels",
        Bhyve = "bhyve",
        Vz = "vz",
    }
}

xml_enum! {
    pub enum SeclabelType {
        Dynamic = "dynamic",
        Static = "static",
        None = "none",
    }
}

/// `<seclabel>`: security driver label of the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seclabel {
    pub label_type: SeclabelType,
    pub model: Option<String>,
    pub relabel: Option<YesNo>,
    pub label: Option<String>,
    pub imagelabel: Option<String>,
    pub baselabel: Option<String>,
}

impl Seclabel {
    pub fn new(label_type: SeclabelType) -> Self {
        Self {
            label_type,
            model: None,
            relabel: None,
            label: None,
            imagelabel: None,
            baselabel: None,
        }
    }
}

impl Fragment for Seclabel {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut seclabel = Seclabel {
            model: c.optional_attribute("model")?,
            relabel: c.optional_attribute("relabel")?,
            ..Seclabel::new(c.attribute("type")?)
        };
        c.interleave(vec![
            member(|c| {
                seclabel.label = c.optional(|c| c.text_element("label"));
                Some(())
            }),
            member(|c| {
                seclabel.imagelabel = c.optional(|c| c.text_element("imagelabel"));
                Some(())
            }),
            member(|c| {
                seclabel.baselabel = c.optional(|c| c.text_element("baselabel"));
                Some(())
            }),
        ])?;
        Some(seclabel)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.label_type);
        e.put_optional("model", &self.model);
        e.put_optional("relabel", &self.relabel);
        e.push_optional_text_element("label", &self.label);
        e.push_optional_text_element("imagelabel", &self.imagelabel);
        e.push_optional_text_element("baselabel", &self.baselabel);
        Ok(())
    }
}

/// A complete guest definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub domain_type: DomainType,
    /// Runtime id; only present on running guests.
    pub id: Option<i32>,
    pub name: String,
    pub uuid: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Application metadata, kept verbatim.
    pub metadata: Option<Element>,
    pub max_memory: Option<MaxMemory>,
    pub memory: Option<Memory>,
    pub current_memory: Option<ScaledInteger>,
    pub memory_backing: Option<MemoryBacking>,
    pub vcpu: Option<Vcpu>,
    pub iothreads: Option<u32>,
    pub cputune: Option<Cputune>,
    pub blkiotune: Option<Blkiotune>,
    pub sysinfo: Option<Sysinfo>,
    pub os: Os,
    pub features: Option<Features>,
    pub cpu: Option<Cpu>,
    pub clock: Option<Clock>,
    pub on_poweroff: Option<LifecycleAction>,
    pub on_reboot: Option<LifecycleAction>,
    pub on_crash: Option<CrashAction>,
    pub on_lockfailure: Option<LockFailureAction>,
    pub pm: Option<Pm>,
    pub devices: Option<Devices>,
    pub seclabels: Vec<Seclabel>,
    /// Emulator pass-through in the qemu namespace.
    pub qemu_commandline: Option<QemuCommandline>,
}

impl Domain {
    /// Minimal guest of the given type booting `os`.
    pub fn new(domain_type: DomainType, name: impl Into<String>, os: Os) -> Self {
        Self {
            domain_type,
            id: None,
            name: name.into(),
            uuid: None,
            title: None,
            description: None,
            metadata: None,
            max_memory: None,
            memory: None,
            current_memory: None,
            memory_backing: None,
            vcpu: None,
            iothreads: None,
            cputune: None,
            blkiotune: None,
            sysinfo: None,
            os,
            features: None,
            cpu: None,
            clock: None,
            on_poweroff: None,
            on_reboot: None,
            on_crash: None,
            on_lockfailure: None,
            pm: None,
            devices: None,
            seclabels: Vec::new(),
            qemu_commandline: None,
        }
    }

    /// Devices in document order, or nothing when `<devices>` is absent.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().flat_map(|d| d.devices.iter())
    }
}

impl Fragment for Domain {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let domain_type = c.attribute("type")?;
        let id = c.optional_attribute("id")?;

        let mut name = None;
        let mut os = None;
        let mut d = Domain::new(domain_type, String::new(), Os::hvm(Vec::new()));
        d.id = id;

        c.interleave(vec![
            member(|c| {
                name = Some(c.text_element("name")?);
                Some(())
            }),
            member(|c| {
                d.uuid = c.optional(|c| c.text_element("uuid"));
                Some(())
            }),
            member(|c| {
                d.title = c.optional(|c| c.text_element("title"));
                Some(())
            }),
            member(|c| {
                d.description = c.optional(|c| c.text_element("description"));
                Some(())
            }),
            member(|c| {
                d.metadata = c.optional(|c| c.element("metadata", Element::consume));
                Some(())
            }),
            member(|c| {
                d.max_memory = c.optional(|c| c.element("maxMemory", MaxMemory::consume));
                Some(())
            }),
            member(|c| {
                d.memory = c.optional(|c| c.element("memory", Memory::consume));
                Some(())
            }),
            member(|c| {
                d.current_memory = c.optional(|c| c.element("currentMemory", ScaledInteger::consume));
                Some(())
            }),
            member(|c| {
                d.memory_backing = c.optional(|c| c.element("memoryBacking", MemoryBacking::consume));
                Some(())
            }),
            member(|c| {
                d.vcpu = c.optional(|c| c.element("vcpu", Vcpu::consume));
                Some(())
            }),
            member(|c| {
                d.iothreads = c.optional(|c| c.text_element("iothreads"));
                Some(())
            }),
            member(|c| {
                d.cputune = c.optional(|c| c.element("cputune", Cputune::consume));
                Some(())
            }),
            member(|c| {
                d.blkiotune = c.optional(|c| c.element("blkiotune", Blkiotune::consume));
                Some(())
            }),
            member(|c| {
                d.sysinfo = c.optional(|c| c.element("sysinfo", Sysinfo::consume));
                Some(())
            }),
            member(|c| {
                os = Some(c.element("os", Os::consume)?);
                Some(())
            }),
            member(|c| {
                d.features = c.optional(|c| c.element("features", Features::consume));
                Some(())
            }),
            member(|c| {
                d.cpu = c.optional(|c| c.element("cpu", Cpu::consume));
                Some(())
            }),
            member(|c| {
                d.clock = c.optional(|c| c.element("clock", Clock::consume));
                Some(())
            }),
            member(|c| {
                d.on_poweroff = c.optional(|c| c.text_element("on_poweroff"));
                Some(())
            }),
            member(|c| {
                d.on_reboot = c.optional(|c| c.text_element("on_reboot"));
                Some(())
            }),
            member(|c| {
                d.on_crash = c.optional(|c| c.text_element("on_crash"));
                Some(())
            }),
            member(|c| {
                d.on_lockfailure = c.optional(|c| c.text_element("on_lockfailure"));
                Some(())
            }),
            member(|c| {
                d.pm = c.optional(|c| c.element("pm", Pm::consume));
                Some(())
            }),
            member(|c| {
                d.devices = c.optional(|c| c.element("devices", Devices::consume));
                Some(())
            }),
            member(|c| {
                d.seclabels = c.zero_or_more(|c| c.element("seclabel", Seclabel::consume));
                Some(())
            }),
            member(|c| {
                d.qemu_commandline = c.optional(|c| c.element("qemu:commandline", QemuCommandline::consume));
                Some(())
            }),
        ])?;

        d.name = name?;
        d.os = os?;
        Some(d)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.domain_type);
        e.put_optional("id", &self.id);
        if self.qemu_commandline.is_some() {
            e.put_fixed("xmlns:qemu", QEMU_NAMESPACE);
        }
        e.push_text_element("name", &self.name);
        e.push_optional_text_element("uuid", &self.uuid);
        e.push_optional_text_element("title", &self.title);
        e.push_optional_text_element("description", &self.description);
        e.push_optional("metadata", &self.metadata)?;
        e.push_optional("maxMemory", &self.max_memory)?;
        e.push_optional("memory", &self.memory)?;
        e.push_optional("currentMemory", &self.current_memory)?;
        e.push_optional("memoryBacking", &self.memory_backing)?;
        e.push_optional("vcpu", &self.vcpu)?;
        e.push_optional_text_element("iothreads", &self.iothreads);
        e.push_optional("cputune", &self.cputune)?;
        e.push_optional("blkiotune", &self.blkiotune)?;
        e.push_optional("sysinfo", &self.sysinfo)?;
        e.push_fragment("os", &self.os)?;
        e.push_optional("features", &self.features)?;
        e.push_optional("cpu", &self.cpu)?;
        e.push_optional("clock", &self.clock)?;
        e.push_optional_text_element("on_poweroff", &self.on_poweroff);
        e.push_optional_text_element("on_reboot", &self.on_reboot);
        e.push_optional_text_element("on_crash", &self.on_crash);
        e.push_optional_text_element("on_lockfailure", &self.on_lockfailure);
        e.push_optional("pm", &self.pm)?;
        e.push_optional("devices", &self.devices)?;
        e.push_all("seclabel", &self.seclabels)?;
        e.push_optional("qemu:commandline", &self.qemu_commandline)
    }
}

impl Root for Domain {
    const TAG: &'static str = "domain";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_minimal_domain_any_order() {
        let domain: Domain = fragment(
            "<domain type='qemu' id='4'>
               <os><type arch='x86_64'>hvm</type></os>
               <memory unit='KiB'>524288</memory>
               <name>minimal</name>
             </domain>",
        )
        .unwrap();
        assert_eq!(domain.name, "minimal");
        assert_eq!(domain.id, Some(4));
        assert_eq!(domain.memory.unwrap().value, 524288);
    }

    #[test]
    fn test_name_and_os_required() {
        assert!(fragment::<Domain>("<domain type='kvm'><os><type>hvm</type></os></domain>").is_none());
        assert!(fragment::<Domain>("<domain type='kvm'><name>x</name></domain>").is_none());
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let xml = "<domain type='kvm'><name>a</name><name>b</name><os><type>hvm</type></os></domain>";
        assert!(fragment::<Domain>(xml).is_none());
    }

    #[test]
    fn test_unknown_domain_type() {
        assert!(fragment::<Domain>("<domain type='esx'><name>a</name><os><type>hvm</type></os></domain>").is_none());
    }

    #[test]
    fn test_metadata_kept_verbatim() {
        let domain: Domain = fragment(
            "<domain type='kvm'>
               <name>meta</name>
               <metadata><app1:foo xmlns:app1='http://app1.org/app1/'>fumble</app1:foo></metadata>
               <os><type>hvm</type></os>
             </domain>",
        )
        .unwrap();
        let metadata = domain.metadata.unwrap();
        let inner = metadata.child_elements().next().unwrap();
        assert_eq!(inner.name(), "app1:foo");
        assert_eq!(inner.attribute("xmlns:app1"), Some("http://app1.org/app1/"));
        assert_eq!(inner.text(), "fumble");
    }

    #[test]
    fn test_seclabels() {
        let domain: Domain = fragment(
            "<domain type='kvm'>
               <name>labelled</name>
               <os><type>hvm</type></os>
               <seclabel type='dynamic' model='selinux' relabel='yes'>
                 <label>system_u:system_r:svirt_t:s0:c392,c662</label>
                 <imagelabel>system_u:object_r:svirt_image_t:s0:c392,c662</imagelabel>
               </seclabel>
               <seclabel type='none' model='dac'/>
             </domain>",
        )
        .unwrap();
        assert_eq!(domain.seclabels.len(), 2);
        assert_eq!(domain.seclabels[0].relabel, Some(YesNo::Yes));
        assert!(domain.seclabels[0].label.as_deref().unwrap().starts_with("system_u"));
        assert_eq!(domain.seclabels[1].label_type, SeclabelType::None);
    }

    #[test]
    fn test_generated_element_order() {
        let mut domain = Domain::new(DomainType::Kvm, "gen", Os::hvm(vec![BootDevice::HardDisk]));
        domain.on_crash = Some(CrashAction::CoredumpRestart);
        domain.memory = Some(Memory {
            unit: None,
            dump_core: None,
            value: 1024,
        });
        domain.uuid = Some(Uuid::new("c7a5fdbd-edaf-9455-926a-d65c16db1809").unwrap());

        let root = domain.to_element().unwrap();
        let names: Vec<_> = root.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["name", "uuid", "memory", "os", "on_crash"]);
        assert_eq!(root.attribute("xmlns:qemu"), None);
        assert_eq!(Domain::from_element(&root).unwrap(), domain);
    }

    #[test]
    fn test_blkiotune_and_qemu_commandline() {
        let domain: Domain = fragment(
            "<domain type='kvm' xmlns:qemu='http://libvirt.org/schemas/domain/qemu/1.0'>
               <name>tuned</name>
               <qemu:commandline><qemu:arg value='-d'/></qemu:commandline>
               <blkiotune><weight>500</weight></blkiotune>
               <os><type>hvm</type></os>
             </domain>",
        )
        .unwrap();
        assert_eq!(domain.blkiotune.as_ref().unwrap().weight.unwrap().get(), 500);
        assert_eq!(domain.qemu_commandline.as_ref().unwrap().args, ["-d"]);

        let root = domain.to_element().unwrap();
        assert_eq!(root.attribute("xmlns:qemu"), Some(QEMU_NAMESPACE));
        let names: Vec<_> = root.child_elements().map(Element::name).collect();
        assert_eq!(names, vec!["name", "blkiotune", "os", "qemu:commandline"]);
        assert_eq!(Domain::from_element(&root).unwrap(), domain);
    }
}
