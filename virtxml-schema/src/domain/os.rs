//! `<os>`: guest boot configuration.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use crate::types::{AbsFilePath, DnsName, YesNo};

xml_enum! {
    pub enum OsType {
        Hvm = "hvm",
        Linux = "linux",
        Xen = "xen",
        Exe = "exe",
    }
}

xml_enum! {
    pub enum LoaderType {
        Rom = "rom",
        Pflash = "pflash",
    }
}

xml_enum! {
    pub enum BootDevice {
        Floppy = "fd",
        HardDisk = "hd",
        Cdrom = "cdrom",
        Network = "network",
    }
}

xml_enum! {
    pub enum SmbiosMode {
        Emulate = "emulate",
        Host = "host",
        Sysinfo = "sysinfo",
    }
}

/// `<type arch='x86_64' machine='q35'>hvm</type>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsTypeSpec {
    pub arch: Option<String>,
    pub machine: Option<DnsName>,
    pub os_type: OsType,
}

impl Fragment for OsTypeSpec {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            arch: c.optional_attribute("arch")?,
            machine: c.optional_attribute("machine")?,
            os_type: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("arch", &self.arch);
        e.put_optional("machine", &self.machine);
        e.put_text(&self.os_type);
        Ok(())
    }
}

/// Firmware image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loader {
    pub readonly: Option<YesNo>,
    pub secure: Option<YesNo>,
    pub loader_type: Option<LoaderType>,
    pub path: AbsFilePath,
}

impl Fragment for Loader {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            readonly: c.optional_attribute("readonly")?,
            secure: c.optional_attribute("secure")?,
            loader_type: c.optional_attribute("type")?,
            path: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("readonly", &self.readonly);
        e.put_optional("secure", &self.secure);
        e.put_optional("type", &self.loader_type);
        e.put_text(&self.path);
        Ok(())
    }
}

/// UEFI variable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nvram {
    pub template: Option<AbsFilePath>,
    pub path: AbsFilePath,
}

impl Fragment for Nvram {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            template: c.optional_attribute("template")?,
            path: c.text()?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("template", &self.template);
        e.put_text(&self.path);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootMenu {
    pub enable: YesNo,
    pub timeout: Option<u32>,
}

impl Fragment for BootMenu {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            enable: c.attribute("enable")?,
            timeout: c.optional_attribute("timeout")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("enable", &self.enable);
        e.put_optional("timeout", &self.timeout);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bios {
    pub use_serial: Option<YesNo>,
    pub reboot_timeout: Option<i32>,
}

impl Fragment for Bios {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        Some(Self {
            use_serial: c.optional_attribute("useserial")?,
            reboot_timeout: c.optional_attribute("rebootTimeout")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("useserial", &self.use_serial);
        e.put_optional("rebootTimeout", &self.reboot_timeout);
        Ok(())
    }
}

/// `<os>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Os {
    pub os_type: OsTypeSpec,
    pub loader: Option<Loader>,
    pub nvram: Option<Nvram>,
    pub kernel: Option<AbsFilePath>,
    pub initrd: Option<AbsFilePath>,
    pub cmdline: Option<String>,
    pub dtb: Option<AbsFilePath>,
    pub init: Option<AbsFilePath>,
    pub init_args: Vec<String>,
    pub boot: Vec<BootDevice>,
    pub boot_menu: Option<BootMenu>,
    pub smbios: Option<SmbiosMode>,
    pub bios: Option<Bios>,
}

impl Os {
    /// Full virtualization booting from the given devices.
    pub fn hvm(boot: Vec<BootDevice>) -> Self {
        Self {
            os_type: OsTypeSpec {
                arch: None,
                machine: None,
                os_type: OsType::Hvm,
            },
            loader: None,
            nvram: None,
            kernel: None,
            initrd: None,
            cmdline: None,
            dtb: None,
            init: None,
            init_args: Vec::new(),
            boot,
            boot_menu: None,
            smbios: None,
            bios: None,
        }
    }
}

impl Fragment for Os {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut os = Os::hvm(Vec::new());
        os.os_type = c.element("type", OsTypeSpec::consume)?;

        c.interleave(vec![
            member(|c| {
                os.loader = c.optional(|c| c.element("loader", Loader::consume));
                Some(())
            }),
            member(|c| {
                os.nvram = c.optional(|c| c.element("nvram", Nvram::consume));
                Some(())
            }),
            member(|c| {
                os.kernel = c.optional(|c| c.text_element("kernel"));
                Some(())
            }),
            member(|c| {
                os.initrd = c.optional(|c| c.text_element("initrd"));
                Some(())
            }),
            member(|c| {
                os.cmdline = c.optional(|c| c.text_element("cmdline"));
                Some(())
            }),
            member(|c| {
                os.dtb = c.optional(|c| c.text_element("dtb"));
                Some(())
            }),
            member(|c| {
                os.init = c.optional(|c| c.text_element("init"));
                Some(())
            }),
            member(|c| {
                os.init_args = c.zero_or_more(|c| c.text_element("initarg"));
                Some(())
            }),
            member(|c| {
                os.boot = c.zero_or_more(|c| c.element("boot", |c| c.attribute("dev")));
                Some(())
            }),
            member(|c| {
                os.boot_menu = c.optional(|c| c.element("bootmenu", BootMenu::consume));
                Some(())
            }),
            member(|c| {
                os.smbios = c.optional(|c| c.element("smbios", |c| c.attribute("mode")));
                Some(())
            }),
            member(|c| {
                os.bios = c.optional(|c| c.element("bios", Bios::consume));
                Some(())
            }),
        ])?;

        Some(os)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_fragment("type", &self.os_type)?;
        e.push_optional("loader", &self.loader)?;
        e.push_optional("nvram", &self.nvram)?;
        e.push_optional_text_element("kernel", &self.kernel);
        e.push_optional_text_element("initrd", &self.initrd);
        e.push_optional_text_element("cmdline", &self.cmdline);
        e.push_optional_text_element("dtb", &self.dtb);
        e.push_optional_text_element("init", &self.init);
        for arg in &self.init_args {
            e.push_text_element("initarg", arg);
        }
        for dev in &self.boot {
            e.push_element("boot", |b| {
                b.put("dev", dev);
                Ok(())
            })?;
        }
        e.push_optional("bootmenu", &self.boot_menu)?;
        if let Some(mode) = &self.smbios {
            e.push_element("smbios", |s| {
                s.put("mode", mode);
                Ok(())
            })?;
        }
        e.push_optional("bios", &self.bios)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_os_with_firmware() {
        let os: Os = fragment(
            "<os>
               <type arch='x86_64' machine='pc-q35-6.2'>hvm</type>
               <loader readonly='yes' type='pflash'>/usr/share/OVMF/OVMF_CODE.fd</loader>
               <nvram>/var/lib/libvirt/qemu/nvram/vm_VARS.fd</nvram>
               <boot dev='cdrom'/>
               <boot dev='hd'/>
               <bootmenu enable='yes' timeout='3000'/>
             </os>",
        )
        .unwrap();

        assert_eq!(os.os_type.os_type, OsType::Hvm);
        assert_eq!(os.os_type.arch.as_deref(), Some("x86_64"));
        assert_eq!(os.loader.unwrap().loader_type, Some(LoaderType::Pflash));
        assert_eq!(os.boot, vec![BootDevice::Cdrom, BootDevice::HardDisk]);
        assert_eq!(os.boot_menu.unwrap().timeout, Some(3000));
    }

    #[test]
    fn test_type_must_come_first() {
        let os = fragment::<Os>("<os><boot dev='hd'/><type>hvm</type></os>");
        assert!(os.is_none());
    }

    #[test]
    fn test_direct_kernel_boot() {
        let os: Os = fragment(
            "<os><type>hvm</type><kernel>/boot/vmlinuz</kernel><cmdline>console=ttyS0 root=/dev/vda1</cmdline></os>",
        )
        .unwrap();
        assert_eq!(os.kernel.unwrap().as_str(), "/boot/vmlinuz");
        assert_eq!(os.cmdline.as_deref(), Some("console=ttyS0 root=/dev/vda1"));
    }

    #[test]
    fn test_container_init() {
        let os: Os = fragment(
            "<os><type>exe</type><init>/sbin/init</init><initarg>--unit</initarg><initarg>emergency.service</initarg></os>",
        )
        .unwrap();
        assert_eq!(os.os_type.os_type, OsType::Exe);
        assert_eq!(os.init_args, vec!["--unit", "emergency.service"]);
    }
}
