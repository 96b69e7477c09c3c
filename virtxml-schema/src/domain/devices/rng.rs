//! `<rng>` and `<tpm>`.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::chardev::{ChardevProtocol, ChardevSource, ChardevType};
use super::{address, alias, push_alias_and_address};
use crate::domain::address::Address;
use crate::types::AbsFilePath;

xml_enum! {
    pub enum RngModel {
        Virtio = "virtio",
        VirtioTransitional = "virtio-transitional",
        VirtioNonTransitional = "virtio-non-transitional",
    }
}

xml_enum! {
    pub enum TpmModel {
        TpmTis = "tpm-tis",
        TpmCrb = "tpm-crb",
        TpmSpapr = "tpm-spapr",
    }
}

/// `<rate bytes='..' period='..'/>`: entropy rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngRate {
    pub bytes: u32,
    /// Milliseconds.
    pub period: Option<u32>,
}

impl Fragment for RngRate {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            bytes: c.attribute("bytes")?,
            period: c.optional_attribute("period")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("bytes", &self.bytes);
        e.put_optional("period", &self.period);
        Ok(())
    }
}

/// Entropy source of an `<rng>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngBackend {
    /// Host device such as `/dev/urandom`.
    Random(Option<AbsFilePath>),
    /// EGD daemon reached through a character device.
    Egd {
        chardev_type: ChardevType,
        sources: Vec<ChardevSource>,
        protocol: Option<ChardevProtocol>,
    },
}

impl Fragment for RngBackend {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| {
                c.fixed_attribute("model", "random")?;
                let path = c.choice().or(|c| c.text().map(Some)).or(|c| c.empty().map(|_| None)).select(c)?;
                Some(RngBackend::Random(path))
            })
            .or(|c| {
                c.fixed_attribute("model", "egd")?;
                let chardev_type = c.attribute("type")?;
                let mut sources = Vec::new();
                let mut protocol = None;
                c.interleave(vec![
                    member(|c| {
                        sources = c.zero_or_more(|c| c.element("source", ChardevSource::consume));
                        Some(())
                    }),
                    member(|c| {
                        protocol = c.optional(|c| c.element("protocol", |c| c.attribute("type")));
                        Some(())
                    }),
                ])?;
                Some(RngBackend::Egd {
                    chardev_type,
                    sources,
                    protocol,
                })
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            RngBackend::Random(path) => {
                e.put_fixed("model", "random");
                if let Some(path) = path {
                    e.put_text(path);
                }
                Ok(())
            }
            RngBackend::Egd {
                chardev_type,
                sources,
                protocol,
            } => {
                e.put_fixed("model", "egd");
                e.put("type", chardev_type);
                e.push_all("source", sources)?;
                if let Some(protocol) = protocol {
                    e.push_element("protocol", |p| {
                        p.put("type", protocol);
                        Ok(())
                    })?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rng {
    pub model: RngModel,
    pub rate: Option<RngRate>,
    pub backend: RngBackend,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Rng {
    /// virtio RNG fed from `/dev/urandom`.
    pub fn urandom() -> Self {
        Self {
            model: RngModel::Virtio,
            rate: None,
            backend: RngBackend::Random(AbsFilePath::new("/dev/urandom").ok()),
            alias: None,
            address: None,
        }
    }
}

impl Fragment for Rng {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let model = c.attribute("model")?;
        let mut rate = None;
        let mut backend = None;
        let mut alias_name = None;
        let mut location = None;
        c.interleave(vec![
            member(|c| {
                rate = c.optional(|c| c.element("rate", RngRate::consume));
                Some(())
            }),
            member(|c| {
                backend = Some(c.element("backend", RngBackend::consume)?);
                Some(())
            }),
            member(|c| alias(c, &mut alias_name)),
            member(|c| address(c, &mut location)),
        ])?;
        Some(Self {
            model,
            rate,
            backend: backend?,
            alias: alias_name,
            address: location,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("model", &self.model);
        e.push_optional("rate", &self.rate)?;
        e.push_fragment("backend", &self.backend)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

/// Host side of a TPM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TpmBackend {
    /// Host TPM device, `/dev/tpm0` when no path is given.
    Passthrough { device: Option<AbsFilePath> },
    /// Software TPM run by libvirt.
    Emulator { version: Option<String> },
}

impl Fragment for TpmBackend {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| {
                c.fixed_attribute("type", "passthrough")?;
                let device = c.optional(|c| c.element("device", |c| c.attribute("path")));
                Some(TpmBackend::Passthrough { device })
            })
            .or(|c| {
                c.fixed_attribute("type", "emulator")?;
                c.empty()?;
                Some(TpmBackend::Emulator {
                    version: c.optional_attribute("version")?,
                })
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            TpmBackend::Passthrough { device } => {
                e.put_fixed("type", "passthrough");
                if let Some(path) = device {
                    e.push_element("device", |d| {
                        d.put("path", path);
                        Ok(())
                    })?;
                }
            }
            TpmBackend::Emulator { version } => {
                e.put_fixed("type", "emulator");
                e.put_optional("version", version);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tpm {
    pub model: Option<TpmModel>,
    pub backend: TpmBackend,
    pub alias: Option<String>,
}

impl Tpm {
    /// Emulated TPM 2.0 on the CRB interface.
    pub fn emulated() -> Self {
        Self {
            model: Some(TpmModel::TpmCrb),
            backend: TpmBackend::Emulator {
                version: Some("2.0".to_string()),
            },
            alias: None,
        }
    }
}

impl Fragment for Tpm {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let model = c.optional_attribute("model")?;
        let mut backend = None;
        let mut alias_name = None;
        c.interleave(vec![
            member(|c| {
                backend = Some(c.element("backend", TpmBackend::consume)?);
                Some(())
            }),
            member(|c| alias(c, &mut alias_name)),
        ])?;
        Some(Self {
            model,
            backend: backend?,
            alias: alias_name,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("model", &self.model);
        e.push_fragment("backend", &self.backend)?;
        push_alias_and_address(e, &self.alias, &None)
    }
}
