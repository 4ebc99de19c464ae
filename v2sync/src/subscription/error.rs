use crate::subscription::Protocol;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubscriptionFormatError {
    #[error("Subscription is not valid base64: {0}")]
    Base64(base64::DecodeError),
    #[error("Subscription is not valid UTF-8: {0}")]
    Utf8(FromUtf8Error),
}

#[derive(Error, Debug)]
pub enum MalformedEntryError {
    #[error("Invalid {0} base64 payload: {1}")]
    Base64(Protocol, base64::DecodeError),
    #[error("Invalid {0} UTF-8 payload: {1}")]
    Utf8(Protocol, FromUtf8Error),
    #[error("Invalid vmess json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing shadowsocks tag")]
    MissingTag,
    #[error("Invalid shadowsocks tag {0}: {1}")]
    BadTag(String, FromUtf8Error),
    #[error("Invalid {0} payload, expected {1}")]
    BadPayload(Protocol, &'static str),
    #[error("Invalid {0} {1}: {2}")]
    BadNumber(Protocol, &'static str, String),
    #[error("Empty {0} address")]
    EmptyAddress(Protocol),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid subscription url {0}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("Unsupported subscription url: {0}")]
    UnsupportedScheme(String),
    #[error("Subscription file url is not a local path: {0}")]
    NotLocalFile(String),
    #[error("{0} request error: {1}")]
    Http(String, reqwest::Error),
    #[error("{0} responded with {1}")]
    Status(String, reqwest::StatusCode),
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
}
