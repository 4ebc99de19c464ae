use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Vmess,
    Shadowsocks,
}

impl Protocol {
    /// Name used by the `protocol` field of a v2ray outbound.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Vmess => "vmess",
            Protocol::Shadowsocks => "shadowsocks",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolSettings {
    Vmess { id: String, alter_id: u32 },
    Shadowsocks { method: String, password: String },
}

/// One upstream server recovered from a subscription line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDescriptor {
    pub tag: String,
    pub address: String,
    pub port: u16,
    pub settings: ProtocolSettings,
}

impl ServerDescriptor {
    pub fn protocol(&self) -> Protocol {
        match self.settings {
            ProtocolSettings::Vmess { .. } => Protocol::Vmess,
            ProtocolSettings::Shadowsocks { .. } => Protocol::Shadowsocks,
        }
    }
}
