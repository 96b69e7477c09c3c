//! SCSI host, target and device capabilities.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{Cursor, Element, Fragment, Result};

use crate::types::Wwn;

/// Nested `<capability>` of a SCSI host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScsiHostSubcapability {
    /// Fibre channel HBA.
    FcHost {
        wwnn: Wwn,
        wwpn: Wwn,
        fabric_wwn: Option<Wwn>,
    },
    /// NPIV capable HBA.
    VportOps { max_vports: u32, vports: u32 },
}

impl Fragment for ScsiHostSubcapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| {
                c.fixed_attribute("type", "fc_host")?;
                Some(ScsiHostSubcapability::FcHost {
                    wwnn: c.text_element("wwnn")?,
                    wwpn: c.text_element("wwpn")?,
                    fabric_wwn: c.optional(|c| c.text_element("fabric_wwn")),
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "vport_ops")?;
                Some(ScsiHostSubcapability::VportOps {
                    max_vports: c.text_element("max_vports")?,
                    vports: c.text_element("vports")?,
                })
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            ScsiHostSubcapability::FcHost { wwnn, wwpn, fabric_wwn } => {
                e.put_fixed("type", "fc_host");
                e.push_text_element("wwnn", wwnn);
                e.push_text_element("wwpn", wwpn);
                e.push_optional_text_element("fabric_wwn", fabric_wwn);
            }
            ScsiHostSubcapability::VportOps { max_vports, vports } => {
                e.put_fixed("type", "vport_ops");
                e.push_text_element("max_vports", max_vports);
                e.push_text_element("vports", vports);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScsiHostCapability {
    pub host: u64,
    pub unique_id: Option<u32>,
    pub capabilities: Vec<ScsiHostSubcapability>,
}

impl Fragment for ScsiHostCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            host: c.text_element("host")?,
            unique_id: c.optional(|c| c.text_element("unique_id")),
            capabilities: c.zero_or_more(|c| c.element("capability", ScsiHostSubcapability::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("host", &self.host);
        e.push_optional_text_element("unique_id", &self.unique_id);
        e.push_all("capability", &self.capabilities)
    }
}

/// `<capability type='fc_remote_port'>` of a SCSI target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FcRemotePort {
    pub rport: String,
    pub wwpn: Wwn,
}

impl Fragment for FcRemotePort {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.fixed_attribute("type", "fc_remote_port")?;
        Some(Self {
            rport: c.text_element("rport")?,
            wwpn: c.text_element("wwpn")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_fixed("type", "fc_remote_port");
        e.push_text_element("rport", &self.rport);
        e.push_text_element("wwpn", &self.wwpn);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScsiTargetCapability {
    pub target: String,
    pub fc_remote_port: Option<FcRemotePort>,
}

impl Fragment for ScsiTargetCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            target: c.text_element("target")?,
            fc_remote_port: c.optional(|c| c.element("capability", FcRemotePort::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("target", &self.target);
        e.push_optional("capability", &self.fc_remote_port)
    }
}

/// A SCSI logical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScsiCapability {
    pub host: u64,
    pub bus: u64,
    pub target: u64,
    pub lun: u64,
    /// Peripheral type such as `disk` or `cdrom`.
    pub scsi_type: String,
}

impl Fragment for ScsiCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            host: c.text_element("host")?,
            bus: c.text_element("bus")?,
            target: c.text_element("target")?,
            lun: c.text_element("lun")?,
            scsi_type: c.text_element("type")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("host", &self.host);
        e.push_text_element("bus", &self.bus);
        e.push_text_element("target", &self.target);
        e.push_text_element("lun", &self.lun);
        e.push_text_element("type", &self.scsi_type);
        Ok(())
    }
}
