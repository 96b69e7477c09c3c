//! Whole-document tests: realistic libvirt output read, regenerated and
//! read again.

use virtxml_schema::domain::devices::{DiskSource, Graphics, InterfaceSource};
use virtxml_schema::domain::{Device, Domain, DomainType};
use virtxml_schema::nodedev::{Capability, NodeDevice, Parent, ScsiHostSubcapability, StorageMedia};
use virtxml_schema::Root;

const GUEST: &str = r#"<?xml version="1.0"?>
<!-- written by virsh dumpxml -->
<domain type='kvm' id='7'>
  <name>fedora38</name>
  <uuid>c7a5fdbd-edaf-9455-926a-d65c16db1809</uuid>
  <title>Build host</title>
  <memory unit='KiB'>4194304</memory>
  <currentMemory unit='KiB'>4194304</currentMemory>
  <memoryBacking><source type='memfd'/><access mode='shared'/></memoryBacking>
  <vcpu placement='static'>4</vcpu>
  <cputune><shares>2048</shares></cputune>
  <resource-free-zone/>
  <os>
    <type arch='x86_64' machine='pc-q35-6.2'>hvm</type>
    <loader readonly='yes' type='pflash'>/usr/share/OVMF/OVMF_CODE.fd</loader>
    <nvram>/var/lib/libvirt/qemu/nvram/fedora38_VARS.fd</nvram>
    <boot dev='hd'/>
  </os>
  <features>
    <acpi/>
    <apic/>
    <vmport state='off'/>
  </features>
  <cpu mode='host-passthrough' check='none' migratable='yes'>
    <topology sockets='1' dies='1' cores='2' threads='2'/>
  </cpu>
  <clock offset='utc'>
    <timer name='rtc' tickpolicy='catchup'/>
    <timer name='pit' tickpolicy='delay'/>
    <timer name='hpet' present='no'/>
  </clock>
  <on_poweroff>destroy</on_poweroff>
  <on_reboot>restart</on_reboot>
  <on_crash>destroy</on_crash>
  <devices>
    <emulator>/usr/bin/qemu-system-x86_64</emulator>
    <disk type='file' device='disk'>
      <driver name='qemu' type='qcow2' cache='none' io='native' discard='unmap'/>
      <source file='/var/lib/libvirt/images/fedora38.qcow2'/>
      <target dev='vda' bus='virtio'/>
      <address type='pci' domain='0x0000' bus='0x04' slot='0x00' function='0x0'/>
    </disk>
    <disk type='file' device='cdrom'>
      <target dev='sda' bus='sata'/>
      <readonly/>
    </disk>
    <controller type='pci' index='1' model='pcie-root-port'>
      <target chassis='1' port='0x10'/>
      <address type='pci' domain='0x0000' bus='0x00' slot='0x02' function='0x0' multifunction='on'/>
    </controller>
    <interface type='network'>
      <mac address='52:54:00:6d:90:02'/>
      <source network='default'/>
      <model type='virtio'/>
      <address type='pci' domain='0x0000' bus='0x01' slot='0x00' function='0x0'/>
    </interface>
    <serial type='pty'>
      <target port='0'/>
    </serial>
    <console type='pty'>
      <target type='serial' port='0'/>
    </console>
    <channel type='unix'>
      <target type='virtio' name='org.qemu.guest_agent.0' state='connected'/>
      <source mode='bind' path='/var/lib/libvirt/qemu/fedora38.agent'/>
      <address type='virtio-serial' controller='0' bus='0' port='1'/>
    </channel>
    <input type='tablet' bus='usb'/>
    <graphics type='vnc' port='-1' autoport='yes' listen='0.0.0.0'>
      <listen type='address' address='0.0.0.0'/>
    </graphics>
    <video>
      <model type='virtio' heads='1' primary='yes'/>
    </video>
    <watchdog model='i6300esb' action='reset'/>
    <memballoon model='virtio'>
      <stats period='10'/>
    </memballoon>
    <rng model='virtio'>
      <backend model='random'>/dev/urandom</backend>
    </rng>
  </devices>
  <seclabel type='dynamic' model='selinux' relabel='yes'/>
</domain>
"#;

#[test]
fn test_guest_document_rejects_unknown_element() {
    // <resource-free-zone/> is not part of the grammar
    assert!(Domain::from_xml(GUEST).is_err());
}

fn guest() -> Domain {
    Domain::from_xml(&GUEST.replace("  <resource-free-zone/>\n", "")).unwrap()
}

#[test]
fn test_guest_document() {
    let domain = guest();
    assert_eq!(domain.domain_type, DomainType::Kvm);
    assert_eq!(domain.id, Some(7));
    assert_eq!(domain.title.as_deref(), Some("Build host"));
    assert_eq!(domain.devices().count(), 13);

    let disks: Vec<_> = domain
        .devices()
        .filter_map(|d| match d {
            Device::Disk(disk) => Some(disk),
            _ => None,
        })
        .collect();
    assert_eq!(disks.len(), 2);
    assert!(matches!(disks[0].source, DiskSource::File { file: Some(_) }));
    assert!(disks[1].readonly);

    let iface = domain
        .devices()
        .find_map(|d| match d {
            Device::Interface(iface) => Some(iface),
            _ => None,
        })
        .unwrap();
    assert!(matches!(iface.source, InterfaceSource::Network { .. }));

    assert!(domain
        .devices()
        .any(|d| matches!(d, Device::Graphics(Graphics::Vnc { .. }))));
}

#[test]
fn test_guest_regenerates_to_an_equal_model() {
    let domain = guest();
    let compact = domain.to_xml().unwrap();
    assert_eq!(Domain::from_xml(&compact).unwrap(), domain);

    let pretty = domain.to_xml_pretty().unwrap();
    assert!(pretty.starts_with("<domain"));
    assert_eq!(Domain::from_xml(&pretty).unwrap(), domain);
}

#[test]
fn test_guest_json_export() {
    let domain = guest();
    let json = serde_json::to_value(&domain).unwrap();
    assert_eq!(json["name"], "fedora38");
    assert_eq!(json["uuid"], "c7a5fdbd-edaf-9455-926a-d65c16db1809");

    let back: Domain = serde_json::from_value(json).unwrap();
    assert_eq!(back, domain);
}

#[test]
fn test_json_rejects_invalid_scalar() {
    let mut json = serde_json::to_value(guest()).unwrap();
    json["uuid"] = serde_json::Value::from("not-a-uuid");
    assert!(serde_json::from_value::<Domain>(json).is_err());
}

const HOTPLUG_GUEST: &str = r#"<domain type='kvm' xmlns:qemu='http://libvirt.org/schemas/domain/qemu/1.0'>
  <name>hotplug</name>
  <maxMemory slots='16' unit='KiB'>16777216</maxMemory>
  <memory unit='KiB'>2097152</memory>
  <blkiotune>
    <weight>800</weight>
    <device>
      <path>/dev/sda</path>
      <read_bytes_sec>52428800</read_bytes_sec>
    </device>
  </blkiotune>
  <os>
    <type arch='x86_64'>hvm</type>
  </os>
  <devices>
    <disk type='file' device='disk'>
      <source file='/var/lib/libvirt/images/hotplug.qcow2'/>
      <target dev='vda' bus='virtio'/>
      <encryption format='qcow'>
        <secret type='passphrase' usage='hotplug-disk'/>
      </encryption>
    </disk>
    <memory model='dimm'>
      <target>
        <size unit='KiB'>524288</size>
        <node>0</node>
      </target>
    </memory>
  </devices>
  <qemu:commandline>
    <qemu:arg value='-d'/>
    <qemu:arg value='guest_errors,unimp,cpu_reset'/>
  </qemu:commandline>
</domain>
"#;

#[test]
fn test_tuning_hotplug_and_passthrough_document() {
    let domain = Domain::from_xml(HOTPLUG_GUEST).unwrap();
    assert_eq!(domain.blkiotune.as_ref().unwrap().devices[0].read_bytes_sec, Some(52428800));
    assert!(domain.devices().any(|d| matches!(d, Device::Memory(_))));
    assert!(domain
        .devices()
        .any(|d| matches!(d, Device::Disk(disk) if disk.encryption.is_some())));
    assert_eq!(domain.qemu_commandline.as_ref().unwrap().args.len(), 2);

    let again = Domain::from_xml(&domain.to_xml_pretty().unwrap()).unwrap();
    assert_eq!(again, domain);

    let json = serde_json::to_value(&domain).unwrap();
    assert_eq!(serde_json::from_value::<Domain>(json).unwrap(), domain);
}

const PCI_NIC: &str = "<device>
  <name>pci_0000_03_00_0</name>
  <path>/sys/devices/pci0000:00/0000:00:01.0/0000:03:00.0</path>
  <parent>pci_0000_00_01_0</parent>
  <driver>
    <name>igb</name>
  </driver>
  <capability type='pci'>
    <domain>0</domain>
    <bus>3</bus>
    <slot>0</slot>
    <function>0</function>
    <product id='0x10c9'>82576 Gigabit Network Connection</product>
    <vendor id='0x8086'>Intel Corporation</vendor>
    <capability type='virt_functions' maxCount='7'/>
    <iommuGroup number='15'>
      <address domain='0x0000' bus='0x03' slot='0x00' function='0x0'/>
    </iommuGroup>
    <numa node='0'/>
    <pci-express>
      <link validity='cap' port='0' speed='2.5' width='4'/>
      <link validity='sta' speed='2.5' width='4'/>
    </pci-express>
  </capability>
</device>";

const VHBA: &str = "<device>
  <name>scsi_host5</name>
  <parent wwnn='20000000c9848140' wwpn='10000000c9848140'/>
  <capability type='scsi_host'>
    <host>5</host>
    <capability type='fc_host'>
      <wwnn>2001001b32a9da4e</wwnn>
      <wwpn>2101001b32a9da4e</wwpn>
    </capability>
  </capability>
</device>";

const CDROM: &str = "<device>
  <name>block_sr0</name>
  <devnode type='dev'>/dev/sr0</devnode>
  <devnode type='link'>/dev/cdrom</devnode>
  <parent>scsi_1_0_0_0</parent>
  <capability type='storage'>
    <block>/dev/sr0</block>
    <bus>scsi</bus>
    <drive_type>cdrom</drive_type>
    <capability type='removable'>
      <media_available>0</media_available>
      <media_size>0</media_size>
    </capability>
  </capability>
</device>";

#[test]
fn test_pci_node_device() {
    let dev = NodeDevice::from_xml(PCI_NIC).unwrap();
    assert_eq!(dev.driver.as_deref(), Some("igb"));
    assert_eq!(dev.parent, Some(Parent::Name("pci_0000_00_01_0".to_string())));
    let Some(Capability::Pci(pci)) = dev.capability("pci") else {
        panic!("expected a pci capability");
    };
    assert_eq!(pci.vendor.id.as_str(), "0x8086");
    assert_eq!(pci.virt_functions.as_ref().unwrap().addresses.len(), 0);
}

#[test]
fn test_vhba_node_device() {
    let dev = NodeDevice::from_xml(VHBA).unwrap();
    assert!(matches!(dev.parent, Some(Parent::Wwn { .. })));
    let Some(Capability::ScsiHost(host)) = dev.capability("scsi_host") else {
        panic!("expected a scsi_host capability");
    };
    assert!(matches!(
        host.capabilities[0],
        ScsiHostSubcapability::FcHost { fabric_wwn: None, .. }
    ));
}

#[test]
fn test_node_devices_regenerate() {
    for xml in [PCI_NIC, VHBA, CDROM] {
        let dev = NodeDevice::from_xml(xml).unwrap();
        let again = NodeDevice::from_xml(&dev.to_xml().unwrap()).unwrap();
        assert_eq!(again, dev, "regenerated {} differs", dev.name);
    }
}

#[test]
fn test_removable_media_model() {
    let dev = NodeDevice::from_xml(CDROM).unwrap();
    let Some(Capability::Storage(storage)) = dev.capability("storage") else {
        panic!("expected a storage capability");
    };
    assert!(matches!(
        storage.media,
        StorageMedia::Removable {
            media_available: false,
            ..
        }
    ));
}

#[test]
fn test_wrong_root_rejected() {
    assert!(NodeDevice::from_xml("<domain type='kvm'><name>x</name></domain>").is_err());
    assert!(Domain::from_xml(CDROM).is_err());
}
