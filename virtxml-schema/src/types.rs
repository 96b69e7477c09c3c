//! Validated leaf types shared by the domain and nodedev grammars.
//!
//! String types keep the text exactly as written; they only guarantee that
//! it matches the libvirt basic type grammar.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{bounded_int, validated_string, xml_enum, Scalar};

// =============================================================================
// ENUMERATIONS
// =============================================================================

xml_enum! {
    /// `yes`/`no` attribute.
    pub enum YesNo {
        Yes = "yes",
        No = "no",
    }
}

xml_enum! {
    /// `on`/`off` attribute.
    pub enum OnOff {
        On = "on",
        Off = "off",
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl From<bool> for OnOff {
    fn from(value: bool) -> Self {
        if value {
            OnOff::On
        } else {
            OnOff::Off
        }
    }
}

// =============================================================================
// NUMBERS AND NAMES
// =============================================================================

validated_string! {
    /// Hexadecimal unsigned integer, optionally prefixed with `0x`.
    pub struct HexUint = r"(0x)?[0-9a-f]+";

    /// File permission bits.
    pub struct OctalMode = r"[0-7]+";

    pub struct GenericName = r"[a-zA-Z0-9_\+\-]+";

    pub struct DnsName = r"[a-zA-Z0-9\.\-]+";

    pub struct DeviceName = r"[a-zA-Z0-9_\.\-\\:/]+";

    /// Size unit such as `KiB`, `M` or `bytes`.
    pub struct Unit = r"([bB]([yY][tT][eE][sS]?)?)|([kKmMgGtTpPeE]([iI]?[bB])?)";

    /// CPU list such as `0-3,^2,8`.
    pub struct Cpuset = r"([0-9]+(-[0-9]+)?|\^[0-9]+)(,([0-9]+(-[0-9]+)?|\^[0-9]+))*";

    /// Guest disk target such as `vda` or `hdc`.
    pub struct DiskTarget = r"(ioemu:)?(fd|hd|sd|vd|xvd|ubd)[a-zA-Z0-9_]+";

    /// Disk vendor string, up to 8 printable characters.
    pub struct DiskVendor = r"[\x20-\x7E]{0,8}";

    /// Disk product string, up to 16 printable characters.
    pub struct DiskProduct = r"[\x20-\x7E]{0,16}";
}

// =============================================================================
// PATHS
// =============================================================================

validated_string! {
    pub struct FilePath = r#"[a-zA-Z0-9_\.\+\-\\&"{}'<>/%: ]+"#;

    pub struct AbsFilePath = r#"/[a-zA-Z0-9_\.\+\-\\&"{}'<>/%,: ]+"#;

    pub struct AbsDirPath = r#"/[a-zA-Z0-9_\.\+\-\\&"{}'<>/%: ]*"#;

    /// Absolute host path such as a block device node.
    pub struct HostPath = r"/[a-zA-Z0-9_\+\-/%]+";
}

// =============================================================================
// IDENTIFIERS AND ADDRESSES
// =============================================================================

validated_string! {
    /// UUID in compact (32 hex digits) or dashed form.
    pub struct Uuid = r"[a-fA-F0-9]{32}|[a-fA-F0-9]{8}\-([a-fA-F0-9]{4}\-){3}[a-fA-F0-9]{12}";

    /// Unicast MAC address.
    pub struct UniMacAddr = r"[a-fA-F0-9][02468aAcCeE](:[a-fA-F0-9]{2}){5}";

    pub struct MacAddr = r"[a-fA-F0-9]{2}(:[a-fA-F0-9]{2}){5}";

    /// Fibre channel world wide name.
    pub struct Wwn = r"(0x)?[0-9a-fA-F]{16}";

    pub struct Ipv4Addr = r"(((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9]))\.){3}((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9]))";

    pub struct Ipv6Addr = r"(([0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){6}:[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){5}:([0-9A-Fa-f]{1,4}:)?[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){4}:([0-9A-Fa-f]{1,4}:){0,2}[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){3}:([0-9A-Fa-f]{1,4}:){0,3}[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){2}:([0-9A-Fa-f]{1,4}:){0,4}[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){6}(((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9]))\.){3}((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9])))|(([0-9A-Fa-f]{1,4}:){0,5}:(((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9]))\.){3}((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9])))|(::([0-9A-Fa-f]{1,4}:){0,5}(((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9]))\.){3}((25[0-5])|(2[0-4][0-9])|(1[0-9]{2})|([1-9][0-9])|([0-9])))|([0-9A-Fa-f]{1,4}::([0-9A-Fa-f]{1,4}:){0,5}[0-9A-Fa-f]{1,4})|(::([0-9A-Fa-f]{1,4}:){0,6}[0-9A-Fa-f]{1,4})|(([0-9A-Fa-f]{1,4}:){1,7}:)";
}

impl Uuid {
    /// Fresh random UUID in dashed form.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().hyphenated().to_string())
    }
}

// =============================================================================
// BUS ADDRESSES
// =============================================================================

validated_string! {
    pub struct PciDomain = r"(0x)?[0-9a-fA-F]{1,4}";

    pub struct PciBus = r"(0x)?[0-9a-fA-F]{1,2}";

    pub struct PciSlot = r"(0x)?[0-1]?[0-9a-fA-F]";

    pub struct PciFunc = r"(0x)?[0-7]";

    /// Drive, bus or unit number of a drive address.
    pub struct DriveNumber = r"[0-9]{1,2}";

    /// ISA I/O port base.
    pub struct Iobase = r"0x[a-fA-F0-9]{1,4}";

    pub struct Irq = r"0x[a-fA-F0-9]";

    pub struct CcwSsidRange = r"(0x)?[0-3]";

    /// Link speed in Gb/s, such as `2.5`.
    pub struct Speed = r"[0-9]+(.[0-9]+)?";

    /// Offload feature name of a network interface.
    pub struct NetFeatureName = r"[a-zA-Z\-_]+";

    /// Environment variable name passed to the emulator.
    pub struct EnvName = r"[A-Za-z_][A-Za-z0-9_]*";
}

bounded_int! {
    /// TCP port, where `-1` asks for automatic allocation.
    pub struct PortNumber(i32) in -1..=65535;

    pub struct Ipv4Prefix(u8) in 0..=32;

    /// Relative block I/O weight.
    pub struct BlkioWeight(u16) in 100..=1000;
}

/// Channel subsystem id: `0x00`..`0xfe` or `0`..`254`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CcwCssidRange(String);

/// Device number on a channel subsystem: `0x0000`..`0xffff` or `0`..`65535`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CcwDevnoRange(String);

impl CcwCssidRange {
    pub fn is_valid(text: &str) -> bool {
        match text.strip_prefix("0x") {
            Some(hex) => matches!(parse_hex(hex, 2), Some(value) if value <= 0xfe),
            None => matches!(u32::parse_text(text), Some(value) if value <= 254),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CcwDevnoRange {
    pub fn is_valid(text: &str) -> bool {
        match text.strip_prefix("0x") {
            Some(hex) => parse_hex(hex, 4).is_some(),
            None => matches!(u32::parse_text(text), Some(value) if value <= 65535),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parse 1 to `max_digits` hex digits.
fn parse_hex(digits: &str, max_digits: usize) -> Option<u32> {
    if digits.is_empty() || digits.len() > max_digits {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

macro_rules! range_scalar {
    ($($name:ident),+) => {$(
        impl Scalar for $name {
            fn parse_text(text: &str) -> Option<Self> {
                Self::is_valid(text).then(|| Self(text.to_string()))
            }

            fn to_text(&self) -> String {
                self.0.clone()
            }
        }

        impl TryFrom<String> for $name {
            type Error = virtxml_marshal::Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse_text(&value)
                    .ok_or_else(|| virtxml_marshal::Error::invalid(stringify!($name), value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    )+};
}

range_scalar!(CcwCssidRange, CcwDevnoRange);
