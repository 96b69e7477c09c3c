//! Lifecycle event actions and guest power management.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use crate::types::YesNo;

xml_enum! {
    /// Action for `<on_poweroff>` and `<on_reboot>`.
    pub enum LifecycleAction {
        Destroy = "destroy",
        Restart = "restart",
        Preserve = "preserve",
        RenameRestart = "rename-restart",
    }
}

xml_enum! {
    /// Action for `<on_crash>`.
    pub enum CrashAction {
        Destroy = "destroy",
        Restart = "restart",
        Preserve = "preserve",
        RenameRestart = "rename-restart",
        CoredumpDestroy = "coredump-destroy",
        CoredumpRestart = "coredump-restart",
    }
}

xml_enum! {
    /// Action for `<on_lockfailure>`.
    pub enum LockFailureAction {
        Poweroff = "poweroff",
        Restart = "restart",
        Pause = "pause",
        Ignore = "ignore",
    }
}

/// `<pm>`: ACPI sleep states offered to the guest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pm {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
    pub suspend_to_mem: Option<Option<YesNo>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
    pub suspend_to_disk: Option<Option<YesNo>>,
}

impl Fragment for Pm {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut pm = Pm::default();
        c.interleave(vec![
            member(|c| {
                pm.suspend_to_mem = c.optional(|c| c.element("suspend-to-mem", |c| c.optional_attribute("enabled")));
                Some(())
            }),
            member(|c| {
                pm.suspend_to_disk = c.optional(|c| c.element("suspend-to-disk", |c| c.optional_attribute("enabled")));
                Some(())
            }),
        ])?;
        Some(pm)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        for (name, state) in [
            ("suspend-to-mem", &self.suspend_to_mem),
            ("suspend-to-disk", &self.suspend_to_disk),
        ] {
            if let Some(enabled) = state {
                e.push_element(name, |s| {
                    s.put_optional("enabled", enabled);
                    Ok(())
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;
    use virtxml_marshal::Scalar;

    #[test]
    fn test_crash_actions_extend_lifecycle_actions() {
        assert!(LifecycleAction::parse_text("coredump-restart").is_none());
        assert_eq!(CrashAction::parse_text("coredump-restart"), Some(CrashAction::CoredumpRestart));
        assert_eq!(LockFailureAction::ALL.len(), 4);
    }

    #[test]
    fn test_pm() {
        let pm: Pm = fragment("<pm><suspend-to-disk enabled='no'/><suspend-to-mem/></pm>").unwrap();
        assert_eq!(pm.suspend_to_mem, Some(None));
        assert_eq!(pm.suspend_to_disk, Some(Some(YesNo::No)));
    }
}
