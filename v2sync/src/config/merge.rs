use crate::config::{ConfigDocument, TemplateError};
use crate::subscription::{Protocol, ProtocolSettings, ServerDescriptor};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Build a new document from `template` with one outbound per server and the
/// balancer selector set to the server tags, both in server order.
///
/// The first `vmess` and the first `shadowsocks` outbound of the template are
/// cloned per server; both must exist even when the subscription carries only
/// one protocol. Everything else in the template is passed through.
pub fn merge(
    template: &ConfigDocument,
    servers: &[ServerDescriptor],
) -> Result<ConfigDocument, TemplateError> {
    let templates = template
        .get("outbounds")
        .and_then(Value::as_array)
        .ok_or(TemplateError::MissingOutbounds)?;
    let find_template = |protocol: Protocol| {
        templates
            .iter()
            .find(|outbound| {
                outbound.get("protocol").and_then(Value::as_str) == Some(protocol.as_str())
            })
            .ok_or(TemplateError::MissingOutbound(protocol))
    };
    let vmess_template = find_template(Protocol::Vmess)?;
    let ss_template = find_template(Protocol::Shadowsocks)?;

    let outbounds = servers
        .iter()
        .map(|server| match server.protocol() {
            Protocol::Vmess => build_outbound(vmess_template, server),
            Protocol::Shadowsocks => build_outbound(ss_template, server),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for server in servers {
        if !seen.insert(server.tag.as_str()) {
            tracing::warn!("Duplicate server tag {} in balancer selector", server.tag);
        }
    }
    let selector = servers
        .iter()
        .map(|server| Value::String(server.tag.clone()))
        .collect();

    let mut document = template.clone();
    document
        .pointer_mut("/routing/balancers/0")
        .and_then(Value::as_object_mut)
        .ok_or(TemplateError::MissingBalancer)?
        .insert("selector".to_string(), Value::Array(selector));
    document["outbounds"] = Value::Array(outbounds);
    Ok(document)
}

fn build_outbound(template: &Value, server: &ServerDescriptor) -> Result<Value, TemplateError> {
    let protocol = server.protocol();
    let mut outbound = template.clone();
    outbound["tag"] = json!(server.tag);
    match &server.settings {
        ProtocolSettings::Vmess { id, alter_id } => {
            let vnext = slot(&mut outbound, protocol, "/settings/vnext/0")?;
            vnext.insert("address".to_string(), json!(server.address));
            vnext.insert("port".to_string(), json!(server.port));
            let user = slot(&mut outbound, protocol, "/settings/vnext/0/users/0")?;
            user.insert("id".to_string(), json!(id));
            user.insert("alterId".to_string(), json!(alter_id));
        }
        ProtocolSettings::Shadowsocks { method, password } => {
            let entry = slot(&mut outbound, protocol, "/settings/servers/0")?;
            entry.insert("address".to_string(), json!(server.address));
            entry.insert("port".to_string(), json!(server.port));
            entry.insert("password".to_string(), json!(password));
            entry.insert("method".to_string(), json!(method));
        }
    }
    Ok(outbound)
}

fn slot<'a>(
    outbound: &'a mut Value,
    protocol: Protocol,
    path: &'static str,
) -> Result<&'a mut Map<String, Value>, TemplateError> {
    outbound
        .pointer_mut(path)
        .and_then(Value::as_object_mut)
        .ok_or(TemplateError::MissingField { protocol, path })
}
