//! `<qemu:commandline>`: extra emulator arguments and environment.
//!
//! Elements are matched by their prefixed name. The namespace declaration
//! itself is an attribute and is not checked when reading; the generated
//! `<domain>` always declares it.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, Cursor, Element, Fragment, Result};

use crate::types::EnvName;

/// Namespace bound to the `qemu` prefix.
pub const QEMU_NAMESPACE: &str = "http://libvirt.org/schemas/domain/qemu/1.0";

/// `<qemu:env name='...' value='...'/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QemuEnv {
    pub name: EnvName,
    pub value: Option<String>,
}

impl Fragment for QemuEnv {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.attribute("name")?,
            value: c.optional_attribute("value")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("name", &self.name);
        e.put_optional("value", &self.value);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QemuCommandline {
    pub args: Vec<String>,
    pub env: Vec<QemuEnv>,
}

impl QemuCommandline {
    /// Command line passing `args` in order.
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }
}

impl Fragment for QemuCommandline {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut commandline = QemuCommandline::default();
        c.interleave(vec![
            member(|c| {
                commandline.args = c.zero_or_more(|c| c.element("qemu:arg", |c| c.attribute("value")));
                Some(())
            }),
            member(|c| {
                commandline.env = c.zero_or_more(|c| c.element("qemu:env", QemuEnv::consume));
                Some(())
            }),
        ])?;
        Some(commandline)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        for arg in &self.args {
            e.push_child(Element::new("qemu:arg").with_attribute("value", arg.as_str()));
        }
        e.push_all("qemu:env", &self.env)
    }
}
