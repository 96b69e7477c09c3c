//! `<capability type='storage'>`

use serde::{Deserialize, Serialize};
use virtxml_marshal::{Cursor, Element, Fragment, Result};

use crate::types::HostPath;

/// Removable drives describe their media; fixed drives report a size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMedia {
    Removable {
        media_available: bool,
        media_size: u64,
        media_label: Option<String>,
    },
    Fixed {
        size: u64,
    },
}

/// `<media_available>` is written as `0` or `1`.
fn media_available(c: &mut Cursor<'_>) -> Option<bool> {
    c.element("media_available", |c| {
        c.choice()
            .or(|c| c.fixed_text("1").map(|_| true))
            .or(|c| c.fixed_text("0").map(|_| false))
            .select(c)
    })
}

impl Fragment for StorageMedia {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| {
                c.element("capability", |c| {
                    c.fixed_attribute("type", "removable")?;
                    Some(StorageMedia::Removable {
                        media_available: media_available(c)?,
                        media_size: c.text_element("media_size")?,
                        media_label: c.optional(|c| c.text_element("media_label")),
                    })
                })
            })
            .or(|c| c.text_element("size").map(|size| StorageMedia::Fixed { size }))
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            StorageMedia::Removable {
                media_available,
                media_size,
                media_label,
            } => e.push_element("capability", |cap| {
                cap.put_fixed("type", "removable");
                let available = if *media_available { "1" } else { "0" };
                cap.push_child(Element::new("media_available").with_text(available));
                cap.push_text_element("media_size", media_size);
                cap.push_optional_text_element("media_label", media_label);
                Ok(())
            }),
            StorageMedia::Fixed { size } => {
                e.push_text_element("size", size);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCapability {
    /// Block device path, usually under `/dev`.
    pub block: HostPath,
    pub bus: Option<String>,
    pub drive_type: Option<String>,
    pub model: Option<String>,
    pub vendor: Option<String>,
    pub serial: Option<String>,
    pub media: StorageMedia,
    pub hotpluggable: bool,
}

impl Fragment for StorageCapability {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            block: c.text_element("block")?,
            bus: c.optional(|c| c.text_element("bus")),
            drive_type: c.optional(|c| c.text_element("drive_type")),
            model: c.optional(|c| c.text_element("model")),
            vendor: c.optional(|c| c.text_element("vendor")),
            serial: c.optional(|c| c.text_element("serial")),
            media: StorageMedia::consume(c)?,
            hotpluggable: c
                .optional(|c| c.element("capability", |c| c.fixed_attribute("type", "hotpluggable")))
                .is_some(),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_text_element("block", &self.block);
        e.push_optional_text_element("bus", &self.bus);
        e.push_optional_text_element("drive_type", &self.drive_type);
        e.push_optional_text_element("model", &self.model);
        e.push_optional_text_element("vendor", &self.vendor);
        e.push_optional_text_element("serial", &self.serial);
        self.media.produce(e)?;
        if self.hotpluggable {
            e.push_child(Element::new("capability").with_attribute("type", "hotpluggable"));
        }
        Ok(())
    }
}
