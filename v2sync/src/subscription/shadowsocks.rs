use crate::subscription::{
    decode_padded, MalformedEntryError, Protocol, ProtocolSettings, ServerDescriptor,
};

/// Parse the part of an `ss://` line after the scheme.
///
/// Accepts `base64(method:password@host:port)#tag` as well as the SIP002 form
/// `base64(method:password)@host:port#tag`. The tag is required.
pub(super) fn parse(payload: &str) -> Result<ServerDescriptor, MalformedEntryError> {
    let (body, fragment) = payload
        .split_once('#')
        .ok_or(MalformedEntryError::MissingTag)?;
    let tag = urlencoding::decode(fragment)
        .map_err(|e| MalformedEntryError::BadTag(fragment.to_string(), e))?
        .into_owned();
    let plain = match body.split_once('@') {
        Some((user_info, host_port)) => format!("{}@{}", decode_text(user_info)?, host_port),
        None => decode_text(body)?,
    };

    let (method_password, host_port) = split_pair(&plain, '@', "method:password@host:port")?;
    let (method, password) = split_pair(method_password, ':', "method:password")?;
    let (host, port) = split_pair(host_port, ':', "host:port")?;
    if host.is_empty() {
        return Err(MalformedEntryError::EmptyAddress(Protocol::Shadowsocks));
    }
    let port = port.parse::<u16>().map_err(|_| {
        MalformedEntryError::BadNumber(Protocol::Shadowsocks, "port", port.to_string())
    })?;
    Ok(ServerDescriptor {
        tag,
        address: host.to_string(),
        port,
        settings: ProtocolSettings::Shadowsocks {
            method: method.to_string(),
            password: password.to_string(),
        },
    })
}

fn decode_text(encoded: &str) -> Result<String, MalformedEntryError> {
    let bytes = decode_padded(encoded)
        .map_err(|e| MalformedEntryError::Base64(Protocol::Shadowsocks, e))?;
    String::from_utf8(bytes)
        .map_err(|e| MalformedEntryError::Utf8(Protocol::Shadowsocks, e))
}

// exactly two parts, otherwise the line is rejected
fn split_pair<'a>(
    text: &'a str,
    separator: char,
    expected: &'static str,
) -> Result<(&'a str, &'a str), MalformedEntryError> {
    let mut parts = text.split(separator);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) => Ok((left, right)),
        _ => Err(MalformedEntryError::BadPayload(Protocol::Shadowsocks, expected)),
    }
}
