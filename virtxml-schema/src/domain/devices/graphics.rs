//! `<graphics>` and `<video>`.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{member, xml_enum, Cursor, Element, Fragment, Result};

use super::{address, alias, push_alias_and_address};
use crate::domain::address::Address;
use crate::types::{AbsFilePath, PortNumber, YesNo};

xml_enum! {
    pub enum VideoModelType {
        Vga = "vga",
        Cirrus = "cirrus",
        Vmvga = "vmvga",
        Xen = "xen",
        Vbox = "vbox",
        Qxl = "qxl",
        Virtio = "virtio",
        Gop = "gop",
        None = "none",
        Bochs = "bochs",
        Ramfb = "ramfb",
    }
}

xml_enum! {
    pub enum SharePolicy {
        AllowExclusive = "allow-exclusive",
        ForceShared = "force-shared",
        Ignore = "ignore",
    }
}

xml_enum! {
    pub enum SpiceDefaultMode {
        Any = "any",
        Secure = "secure",
        Insecure = "insecure",
    }
}

/// `<listen>`: where a remote display accepts connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Listen {
    Address { address: Option<String> },
    Network { network: String, address: Option<String> },
    Socket { socket: Option<AbsFilePath> },
    None,
}

impl Fragment for Listen {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.empty()?;
        c.choice()
            .or(|c| {
                c.fixed_attribute("type", "address")?;
                Some(Listen::Address {
                    address: c.optional_attribute("address")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "network")?;
                Some(Listen::Network {
                    network: c.attribute("network")?,
                    address: c.optional_attribute("address")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "socket")?;
                Some(Listen::Socket {
                    socket: c.optional_attribute("socket")?,
                })
            })
            .or(|c| c.fixed_attribute("type", "none").map(|_| Listen::None))
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        match self {
            Listen::Address { address } => {
                e.put_fixed("type", "address");
                e.put_optional("address", address);
            }
            Listen::Network { network, address } => {
                e.put_fixed("type", "network");
                e.put("network", network);
                e.put_optional("address", address);
            }
            Listen::Socket { socket } => {
                e.put_fixed("type", "socket");
                e.put_optional("socket", socket);
            }
            Listen::None => e.put_fixed("type", "none"),
        }
        Ok(())
    }
}

/// Settings shared by the VNC, SPICE and RDP servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDisplay {
    pub port: Option<PortNumber>,
    pub autoport: Option<YesNo>,
    /// Legacy `listen` attribute; mirrors the first `<listen type='address'>`.
    pub listen: Option<String>,
    pub passwd: Option<String>,
    pub keymap: Option<String>,
    pub listens: Vec<Listen>,
}

impl RemoteDisplay {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            port: c.optional_attribute("port")?,
            autoport: c.optional_attribute("autoport")?,
            listen: c.optional_attribute("listen")?,
            passwd: c.optional_attribute("passwd")?,
            keymap: c.optional_attribute("keymap")?,
            listens: c.zero_or_more(|c| c.element("listen", Listen::consume)),
        })
    }

    fn put_attributes(&self, e: &mut Element) {
        e.put_optional("port", &self.port);
        e.put_optional("autoport", &self.autoport);
        e.put_optional("listen", &self.listen);
        e.put_optional("passwd", &self.passwd);
        e.put_optional("keymap", &self.keymap);
    }
}

/// `<graphics>`, one variant per `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Graphics {
    Vnc {
        display: RemoteDisplay,
        websocket: Option<PortNumber>,
        share_policy: Option<SharePolicy>,
    },
    Spice {
        display: RemoteDisplay,
        tls_port: Option<PortNumber>,
        default_mode: Option<SpiceDefaultMode>,
    },
    Sdl {
        display: Option<String>,
        xauth: Option<String>,
        fullscreen: Option<YesNo>,
    },
    Rdp {
        display: RemoteDisplay,
        multi_user: Option<YesNo>,
        replace_user: Option<YesNo>,
    },
    Desktop {
        display: Option<String>,
        fullscreen: Option<YesNo>,
    },
}

impl Graphics {
    /// VNC server with an automatically allocated port.
    pub fn vnc() -> Self {
        Graphics::Vnc {
            display: RemoteDisplay {
                port: PortNumber::new(-1).ok(),
                autoport: Some(YesNo::Yes),
                ..RemoteDisplay::default()
            },
            websocket: None,
            share_policy: None,
        }
    }

    /// Value of the `type` attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            Graphics::Vnc { .. } => "vnc",
            Graphics::Spice { .. } => "spice",
            Graphics::Sdl { .. } => "sdl",
            Graphics::Rdp { .. } => "rdp",
            Graphics::Desktop { .. } => "desktop",
        }
    }
}

impl Fragment for Graphics {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| {
                c.fixed_attribute("type", "vnc")?;
                Some(Graphics::Vnc {
                    websocket: c.optional_attribute("websocket")?,
                    share_policy: c.optional_attribute("sharePolicy")?,
                    display: RemoteDisplay::consume(c)?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "spice")?;
                Some(Graphics::Spice {
                    tls_port: c.optional_attribute("tlsPort")?,
                    default_mode: c.optional_attribute("defaultMode")?,
                    display: RemoteDisplay::consume(c)?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "sdl")?;
                c.empty()?;
                Some(Graphics::Sdl {
                    display: c.optional_attribute("display")?,
                    xauth: c.optional_attribute("xauth")?,
                    fullscreen: c.optional_attribute("fullscreen")?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "rdp")?;
                Some(Graphics::Rdp {
                    multi_user: c.optional_attribute("multiUser")?,
                    replace_user: c.optional_attribute("replaceUser")?,
                    display: RemoteDisplay::consume(c)?,
                })
            })
            .or(|c| {
                c.fixed_attribute("type", "desktop")?;
                c.empty()?;
                Some(Graphics::Desktop {
                    display: c.optional_attribute("display")?,
                    fullscreen: c.optional_attribute("fullscreen")?,
                })
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_fixed("type", self.kind());
        match self {
            Graphics::Vnc {
                display,
                websocket,
                share_policy,
            } => {
                display.put_attributes(e);
                e.put_optional("websocket", websocket);
                e.put_optional("sharePolicy", share_policy);
                e.push_all("listen", &display.listens)
            }
            Graphics::Spice {
                display,
                tls_port,
                default_mode,
            } => {
                display.put_attributes(e);
                e.put_optional("tlsPort", tls_port);
                e.put_optional("defaultMode", default_mode);
                e.push_all("listen", &display.listens)
            }
            Graphics::Sdl {
                display,
                xauth,
                fullscreen,
            } => {
                e.put_optional("display", display);
                e.put_optional("xauth", xauth);
                e.put_optional("fullscreen", fullscreen);
                Ok(())
            }
            Graphics::Rdp {
                display,
                multi_user,
                replace_user,
            } => {
                display.put_attributes(e);
                e.put_optional("multiUser", multi_user);
                e.put_optional("replaceUser", replace_user);
                e.push_all("listen", &display.listens)
            }
            Graphics::Desktop { display, fullscreen } => {
                e.put_optional("display", display);
                e.put_optional("fullscreen", fullscreen);
                Ok(())
            }
        }
    }
}

/// `<acceleration accel3d='yes'/>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acceleration {
    pub accel3d: Option<YesNo>,
    pub accel2d: Option<YesNo>,
}

impl Fragment for Acceleration {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            accel3d: c.optional_attribute("accel3d")?,
            accel2d: c.optional_attribute("accel2d")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put_optional("accel3d", &self.accel3d);
        e.put_optional("accel2d", &self.accel2d);
        Ok(())
    }
}

/// `<model>` of a video device. Memory sizes are in KiB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoModel {
    pub model_type: VideoModelType,
    pub vram: Option<u32>,
    pub ram: Option<u32>,
    pub vgamem: Option<u32>,
    pub heads: Option<u32>,
    pub primary: Option<YesNo>,
    pub acceleration: Option<Acceleration>,
}

impl VideoModel {
    pub fn new(model_type: VideoModelType) -> Self {
        Self {
            model_type,
            vram: None,
            ram: None,
            vgamem: None,
            heads: None,
            primary: None,
            acceleration: None,
        }
    }
}

impl Fragment for VideoModel {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            model_type: c.attribute("type")?,
            vram: c.optional_attribute("vram")?,
            ram: c.optional_attribute("ram")?,
            vgamem: c.optional_attribute("vgamem")?,
            heads: c.optional_attribute("heads")?,
            primary: c.optional_attribute("primary")?,
            acceleration: c.optional(|c| c.element("acceleration", Acceleration::consume)),
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("type", &self.model_type);
        e.put_optional("vram", &self.vram);
        e.put_optional("ram", &self.ram);
        e.put_optional("vgamem", &self.vgamem);
        e.put_optional("heads", &self.heads);
        e.put_optional("primary", &self.primary);
        e.push_optional("acceleration", &self.acceleration)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub model: Option<VideoModel>,
    pub alias: Option<String>,
    pub address: Option<Address>,
}

impl Fragment for Video {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let mut video = Video::default();
        c.interleave(vec![
            member(|c| {
                video.model = c.optional(|c| c.element("model", VideoModel::consume));
                Some(())
            }),
            member(|c| alias(c, &mut video.alias)),
            member(|c| address(c, &mut video.address)),
        ])?;
        Some(video)
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.push_optional("model", &self.model)?;
        push_alias_and_address(e, &self.alias, &self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_vnc_with_listen() {
        let graphics: Graphics = fragment(
            "<graphics type='vnc' port='-1' autoport='yes' listen='0.0.0.0' sharePolicy='force-shared'>
               <listen type='address' address='0.0.0.0'/>
             </graphics>",
        )
        .unwrap();
        let Graphics::Vnc {
            display, share_policy, ..
        } = graphics
        else {
            panic!("expected vnc graphics");
        };
        assert_eq!(display.port.unwrap().get(), -1);
        assert_eq!(share_policy, Some(SharePolicy::ForceShared));
        assert_eq!(
            display.listens,
            vec![Listen::Address {
                address: Some("0.0.0.0".to_string())
            }]
        );
    }

    #[test]
    fn test_spice_socket_listen() {
        let graphics: Graphics = fragment(
            "<graphics type='spice' autoport='no' tlsPort='5901'><listen type='socket' socket='/tmp/spice.sock'/><listen type='none'/></graphics>",
        )
        .unwrap();
        assert_eq!(graphics.kind(), "spice");
        let Graphics::Spice { display, tls_port, .. } = graphics else {
            panic!("expected spice graphics");
        };
        assert_eq!(tls_port.unwrap().get(), 5901);
        assert_eq!(display.listens[1], Listen::None);
    }

    #[test]
    fn test_sdl_has_no_children() {
        assert!(fragment::<Graphics>("<graphics type='sdl' display=':0.0' fullscreen='yes'/>").is_some());
        assert!(fragment::<Graphics>("<graphics type='sdl'><listen type='none'/></graphics>").is_none());
        assert!(fragment::<Graphics>("<graphics type='egl-headless'/>").is_none());
    }

    #[test]
    fn test_generate_vnc() {
        let mut e = Element::new("graphics");
        Graphics::vnc().produce(&mut e).unwrap();
        assert_eq!(e.attribute("type"), Some("vnc"));
        assert_eq!(e.attribute("port"), Some("-1"));
        assert_eq!(e.attribute("autoport"), Some("yes"));
    }

    #[test]
    fn test_video_model() {
        let video: Video = fragment(
            "<video>
               <model type='virtio' heads='1' primary='yes'><acceleration accel3d='yes'/></model>
               <alias name='video0'/>
             </video>",
        )
        .unwrap();
        let model = video.model.unwrap();
        assert_eq!(model.model_type, VideoModelType::Virtio);
        assert_eq!(model.acceleration.unwrap().accel3d, Some(YesNo::Yes));
        assert!(fragment::<Video>("<video><model type='s3'/></video>").is_none());
    }
}
