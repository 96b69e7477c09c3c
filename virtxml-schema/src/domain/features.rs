//! `<features>`: hypervisor features toggled for the guest.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use crate::types::OnOff;

xml_enum! {
    pub enum GicVersion {
        V2 = "2",
        V3 = "3",
        Host = "host",
    }
}

xml_enum! {
    pub enum IoapicDriver {
        Kvm = "kvm",
        Qemu = "qemu",
    }
}

/// A feature element whose only content is an optional `state`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    pub state: Option<OnOff>,
}

impl Toggle {
    pub fn on() -> Self {
        Self { state: Some(OnOff::On) }
    }
}

impl Fragment for Toggle {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        Some(Self {
            state: c.optional_attribute("state")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("state", &self.state);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spinlocks {
    pub state: OnOff,
    pub retries: Option<u32>,
}

impl Fragment for Spinlocks {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            state: c.attribute("state")?,
            retries: c.optional_attribute("retries")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("state", &self.state);
        e.put_optional("retries", &self.retries);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypervVendorId {
    pub state: OnOff,
    pub value: Option<String>,
}

impl Fragment for HypervVendorId {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            state: c.attribute("state")?,
            value: c.optional_attribute("value")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("state", &self.state);
        e.put_optional("value", &self.value);
        Ok(())
    }
}

/// Hyper-V enlightenments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperv {
    pub relaxed: Option<Toggle>,
    pub vapic: Option<Toggle>,
    pub spinlocks: Option<Spinlocks>,
    pub vpindex: Option<Toggle>,
    pub runtime: Option<Toggle>,
    pub synic: Option<Toggle>,
    pub stimer: Option<Toggle>,
    pub reset: Option<Toggle>,
    pub vendor_id: Option<HypervVendorId>,
    pub frequencies: Option<Toggle>,
    pub reftime: Option<Toggle>,
    pub tlbflush: Option<Toggle>,
    pub ipi: Option<Toggle>,
}

impl Fragment for Hyperv {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut hv = Hyperv::default();
        c.interleave(vec![
            member(|c| toggle(c, "relaxed", &mut hv.relaxed)),
            member(|c| toggle(c, "vapic", &mut hv.vapic)),
            member(|c| {
                hv.spinlocks = c.optional(|c| c.element("spinlocks", Spinlocks::consume));
                Some(())
            }),
            member(|c| toggle(c, "vpindex", &mut hv.vpindex)),
            member(|c| toggle(c, "runtime", &mut hv.runtime)),
            member(|c| toggle(c, "synic", &mut hv.synic)),
            member(|c| toggle(c, "stimer", &mut hv.stimer)),
            member(|c| toggle(c, "reset", &mut hv.reset)),
            member(|c| {
                hv.vendor_id = c.optional(|c| c.element("vendor_id", HypervVendorId::consume));
                Some(())
            }),
            member(|c| toggle(c, "frequencies", &mut hv.frequencies)),
            member(|c| toggle(c, "reftime", &mut hv.reftime)),
            member(|c| toggle(c, "tlbflush", &mut hv.tlbflush)),
            member(|c| toggle(c, "ipi", &mut hv.ipi)),
        ])?;
        Some(hv)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional("relaxed", &self.relaxed)?;
        e.push_optional("vapic", &self.vapic)?;
        e.push_optional("spinlocks", &self.spinlocks)?;
        e.push_optional("vpindex", &self.vpindex)?;
        e.push_optional("runtime", &self.runtime)?;
        e.push_optional("synic", &self.synic)?;
        e.push_optional("stimer", &self.stimer)?;
        e.push_optional("reset", &self.reset)?;
        e.push_optional("vendor_id", &self.vendor_id)?;
        e.push_optional("frequencies", &self.frequencies)?;
        e.push_optional("reftime", &self.reftime)?;
        e.push_optional("tlbflush", &self.tlbflush)?;
        e.push_optional("ipi", &self.ipi)?;
        Ok(())
    }
}

/// Interleave member for an optional `<name state=.../>` element.
fn toggle(c: &mut Cursor<'_>, name: &str, slot: &mut Option<Toggle>) -> Option<()> {
    *slot = c.optional(|c| c.element(name, Toggle::consume));
    Some(())
}

/// `<features>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub pae: bool,
    pub acpi: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
    pub apic: Option<Option<OnOff>>,
    pub hap: bool,
    pub privnet: bool,
    pub viridian: bool,
    pub hyperv: Option<Hyperv>,
    /// `<kvm><hidden state=.../></kvm>`
    #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
    pub kvm_hidden: Option<Option<Toggle>>,
    pub pvspinlock: Option<Toggle>,
    pub pmu: Option<Toggle>,
    pub vmport: Option<Toggle>,
    pub smm: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
    pub gic: Option<Option<GicVersion>>,
    pub ioapic: Option<IoapicDriver>,
}

impl Fragment for Features {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut f = Features::default();
        c.interleave(vec![
            member(|c| {
                f.pae = c.flag("pae");
                Some(())
            }),
            member(|c| {
                f.acpi = c.flag("acpi");
                Some(())
            }),
            member(|c| {
                f.apic = c.optional(|c| c.element("apic", |c| c.optional_attribute("eoi")));
                Some(())
            }),
            member(|c| {
                f.hap = c.flag("hap");
                Some(())
            }),
            member(|c| {
                f.privnet = c.flag("privnet");
                Some(())
            }),
            member(|c| {
                f.viridian = c.flag("viridian");
                Some(())
            }),
            member(|c| {
                f.hyperv = c.optional(|c| c.element("hyperv", Hyperv::consume));
                Some(())
            }),
            member(|c| {
                f.kvm_hidden = c.optional(|c| {
                    c.element("kvm", |c| Some(c.optional(|c| c.element("hidden", Toggle::consume))))
                });
                Some(())
            }),
            member(|c| toggle(c, "pvspinlock", &mut f.pvspinlock)),
            member(|c| toggle(c, "pmu", &mut f.pmu)),
            member(|c| toggle(c, "vmport", &mut f.vmport)),
            member(|c| toggle(c, "smm", &mut f.smm)),
            member(|c| {
                f.gic = c.optional(|c| c.element("gic", |c| c.optional_attribute("version")));
                Some(())
            }),
            member(|c| {
                f.ioapic = c.optional(|c| c.element("ioapic", |c| c.attribute("driver")));
                Some(())
            }),
        ])?;
        Some(f)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_flag("pae", self.pae);
        e.push_flag("acpi", self.acpi);
        if let Some(eoi) = &self.apic {
            e.push_element("apic", |a| {
                a.put_optional("eoi", eoi);
                Ok(())
            })?;
        }
        e.push_flag("hap", self.hap);
        e.push_flag("privnet", self.privnet);
        e.push_flag("viridian", self.viridian);
        e.push_optional("hyperv", &self.hyperv)?;
        if let Some(hidden) = &self.kvm_hidden {
            e.push_element("kvm", |k| k.push_optional("hidden", hidden))?;
        }
        e.push_optional("pvspinlock", &self.pvspinlock)?;
        e.push_optional("pmu", &self.pmu)?;
        e.push_optional("vmport", &self.vmport)?;
        e.push_optional("smm", &self.smm)?;
        if let Some(version) = &self.gic {
            e.push_element("gic", |g| {
                g.put_optional("version", version);
                Ok(())
            })?;
        }
        if let Some(driver) = &self.ioapic {
            e.push_element("ioapic", |i| {
                i.put("driver", driver);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_common_x86_features() {
        let f: Features = fragment(
            "<features>
               <acpi/>
               <apic/>
               <vmport state='off'/>
               <hyperv>
                 <relaxed state='on'/>
                 <spinlocks state='on' retries='8191'/>
                 <vendor_id state='on' value='KVM Hv'/>
               </hyperv>
               <kvm><hidden state='on'/></kvm>
             </features>",
        )
        .unwrap();

        assert!(f.acpi);
        assert!(!f.pae);
        assert_eq!(f.apic, Some(None));
        assert_eq!(f.vmport, Some(Toggle { state: Some(OnOff::Off) }));
        let hv = f.hyperv.unwrap();
        assert_eq!(hv.relaxed, Some(Toggle::on()));
        assert_eq!(hv.spinlocks.unwrap().retries, Some(8191));
        assert_eq!(hv.vendor_id.unwrap().value.as_deref(), Some("KVM Hv"));
        assert_eq!(f.kvm_hidden, Some(Some(Toggle::on())));
    }

    #[test]
    fn test_unknown_feature_rejected() {
        assert!(fragment::<Features>("<features><acpi/><warp-drive/></features>").is_none());
    }

    #[test]
    fn test_arm_gic() {
        let f: Features = fragment("<features><gic version='3'/></features>").unwrap();
        assert_eq!(f.gic, Some(Some(GicVersion::V3)));
    }
}
