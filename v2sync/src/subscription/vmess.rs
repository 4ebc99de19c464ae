use crate::subscription::{
    decode_padded, MalformedEntryError, Protocol, ProtocolSettings, ServerDescriptor,
};
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

// Providers emit `port` and `aid` both as numbers and as numeric strings.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn parse<T: TryFrom<u64> + FromStr>(&self) -> Option<T> {
        match self {
            NumberOrString::Number(n) => T::try_from(*n).ok(),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

impl Display for NumberOrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberOrString::Number(n) => write!(f, "{}", n),
            NumberOrString::String(s) => write!(f, "{:?}", s),
        }
    }
}

// not deny_unknown_fields: v, net, type, host, path, tls are left to the template
#[derive(Deserialize, Debug)]
struct VmessLink {
    ps: String,
    add: String,
    port: NumberOrString,
    id: String,
    aid: NumberOrString,
}

/// Parse the part of a `vmess://` line after the scheme.
pub(super) fn parse(payload: &str) -> Result<ServerDescriptor, MalformedEntryError> {
    let bytes = decode_padded(payload)
        .map_err(|e| MalformedEntryError::Base64(Protocol::Vmess, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| MalformedEntryError::Utf8(Protocol::Vmess, e))?;
    let link: VmessLink = serde_json::from_str(&text)?;
    if link.add.is_empty() {
        return Err(MalformedEntryError::EmptyAddress(Protocol::Vmess));
    }
    let port = link.port.parse::<u16>().ok_or_else(|| {
        MalformedEntryError::BadNumber(Protocol::Vmess, "port", link.port.to_string())
    })?;
    let alter_id = link.aid.parse::<u32>().ok_or_else(|| {
        MalformedEntryError::BadNumber(Protocol::Vmess, "aid", link.aid.to_string())
    })?;
    Ok(ServerDescriptor {
        tag: link.ps,
        address: link.add,
        port,
        settings: ProtocolSettings::Vmess {
            id: link.id,
            alter_id,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD_NO_PAD;
    use base64::Engine;

    const VMESS_EXAMPLE: &str =
        "eyJwcyI6InRlc3QiLCJhZGQiOiIxLjIuMy40IiwicG9ydCI6NDQzLCJpZCI6ImFiYy0xMjMiLCJhaWQiOjB9";

    fn encode(server: &ServerDescriptor) -> String {
        let ProtocolSettings::Vmess { id, alter_id } = &server.settings else {
            panic!("not a vmess server");
        };
        let json = serde_json::json!({
            "v": "2",
            "ps": server.tag,
            "add": server.address,
            "port": server.port,
            "id": id,
            "aid": alter_id,
        });
        STANDARD_NO_PAD.encode(json.to_string())
    }

    #[test]
    fn test_parse_vmess() {
        let server = parse(VMESS_EXAMPLE).unwrap();
        assert_eq!(server.tag, "test");
        assert_eq!(server.address, "1.2.3.4");
        assert_eq!(server.port, 443);
        assert_eq!(
            server.settings,
            ProtocolSettings::Vmess {
                id: "abc-123".to_string(),
                alter_id: 0
            }
        );
        assert_eq!(server.protocol(), Protocol::Vmess);
    }

    #[test]
    fn test_string_numbers_and_missing_padding() {
        let payload = STANDARD_NO_PAD.encode(concat!(
            r#"{"ps":"hk-01","add":"hk.example.com","port":"10086","#,
            r#""id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"64","net":"ws"}"#,
        ));
        assert_ne!(payload.len() % 4, 0);
        let server = parse(&payload).unwrap();
        assert_eq!(server.tag, "hk-01");
        assert_eq!(server.address, "hk.example.com");
        assert_eq!(server.port, 10086);
        assert_eq!(
            server.settings,
            ProtocolSettings::Vmess {
                id: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                alter_id: 64
            }
        );
    }

    #[test]
    fn test_malformed_vmess() {
        // {"ps":"x","add":"1.2.3.4","port":443,"id":"u"} has no aid
        assert!(matches!(
            parse("eyJwcyI6IngiLCJhZGQiOiIxLjIuMy40IiwicG9ydCI6NDQzLCJpZCI6InUifQ"),
            Err(MalformedEntryError::Json(_))
        ));
        assert!(matches!(
            parse("!!not-base64!!"),
            Err(MalformedEntryError::Base64(Protocol::Vmess, _))
        ));
        let too_large = STANDARD_NO_PAD
            .encode(r#"{"ps":"x","add":"1.2.3.4","port":70000,"id":"u","aid":0}"#);
        assert!(matches!(
            parse(&too_large),
            Err(MalformedEntryError::BadNumber(Protocol::Vmess, "port", _))
        ));
        let no_address =
            STANDARD_NO_PAD.encode(r#"{"ps":"x","add":"","port":443,"id":"u","aid":0}"#);
        assert!(matches!(
            parse(&no_address),
            Err(MalformedEntryError::EmptyAddress(Protocol::Vmess))
        ));
    }

    #[test]
    fn test_reencode() {
        let server = ServerDescriptor {
            tag: "日本 02".to_string(),
            address: "jp.example.org".to_string(),
            port: 8443,
            settings: ProtocolSettings::Vmess {
                id: "0d6e1b25-7f1c-4bbd-9d5c-3a0d9c7f3c21".to_string(),
                alter_id: 2,
            },
        };
        let first = parse(&encode(&server)).unwrap();
        assert_eq!(first, server);
        assert_eq!(parse(&encode(&first)).unwrap(), first);
    }
}
