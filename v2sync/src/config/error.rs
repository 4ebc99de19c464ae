use crate::subscription::Protocol;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
    #[error("{0} json error: {1}")]
    Json(String, serde_json::Error),
    #[error("{0} yaml error: {1}")]
    Yaml(String, serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template has no outbounds list")]
    MissingOutbounds,
    #[error("Template has no {0} outbound, make sure the template carries one")]
    MissingOutbound(Protocol),
    #[error("Template {protocol} outbound lacks {path}")]
    MissingField {
        protocol: Protocol,
        path: &'static str,
    },
    #[error("Template has no routing balancer")]
    MissingBalancer,
}
