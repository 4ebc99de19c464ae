mod error;
mod fetch;
mod server;
mod shadowsocks;
mod vmess;

pub use error::*;
pub use fetch::*;
pub use server::*;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, PAD};
use base64::Engine;
use std::fmt::{Display, Formatter};

/// Servers decoded from one subscription body, in line order.
#[derive(Debug, Default)]
pub struct Subscription {
    pub servers: Vec<ServerDescriptor>,
    pub rejected: Vec<RejectedLine>,
}

#[derive(Debug)]
pub struct RejectedLine {
    /// 1-based line number inside the decoded body
    pub line: usize,
    pub error: MalformedEntryError,
}

impl Display for RejectedLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

/// Decode a base64 subscription body into server descriptors.
///
/// Only a body that is not base64 or not UTF-8 fails the call. Lines that do not
/// parse under their scheme are logged, collected into `rejected` and skipped;
/// blank lines and unknown schemes are ignored silently.
pub fn decode(raw: &str) -> Result<Subscription, SubscriptionFormatError> {
    let body: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = decode_padded(&body).map_err(SubscriptionFormatError::Base64)?;
    let text = String::from_utf8(bytes).map_err(SubscriptionFormatError::Utf8)?;

    let mut subscription = Subscription::default();
    for (idx, line) in text.split('\n').enumerate() {
        let line = line.trim();
        let parsed = if let Some(payload) = line.strip_prefix("vmess://") {
            vmess::parse(payload)
        } else if let Some(payload) = line.strip_prefix("ss://") {
            shadowsocks::parse(payload)
        } else {
            continue;
        };
        match parsed {
            Ok(server) => subscription.servers.push(server),
            Err(error) => {
                let rejected = RejectedLine {
                    line: idx + 1,
                    error,
                };
                tracing::warn!("Skip subscription {}", rejected);
                subscription.rejected.push(rejected);
            }
        }
    }
    Ok(subscription)
}

// Some providers leave non-zero bits after the last full byte.
const LENIENT: GeneralPurposeConfig = PAD.with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Right-pad with `=` to a multiple of 4, then try the standard and URL-safe alphabets.
pub(crate) fn decode_padded(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut padded = payload.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    STANDARD_LENIENT
        .decode(&padded)
        .or_else(|e| URL_SAFE_LENIENT.decode(&padded).map_err(|_| e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    const VMESS_TEST: &str =
        "vmess://eyJwcyI6InRlc3QiLCJhZGQiOiIxLjIuMy40IiwicG9ydCI6NDQzLCJpZCI6ImFiYy0xMjMiLCJhaWQiOjB9";
    const SS_EXAMPLE: &str = "ss://YWVzLTI1Ni1nY206c2VjcmV0QGV4YW1wbGUuY29tOjgzODg#example";
    const SS_BROKEN: &str = "ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTpwQHNzQDEuMS4xLjE6NDQz#broken";

    fn encode_subscription(lines: &[&str]) -> String {
        STANDARD.encode(lines.join("\n"))
    }

    fn tags(subscription: &Subscription) -> Vec<&str> {
        subscription
            .servers
            .iter()
            .map(|s| s.tag.as_str())
            .collect()
    }

    #[test]
    fn test_padding() {
        assert_eq!(decode_padded("dGVzdA").unwrap(), b"test");
        assert_eq!(decode_padded("dGVzdA==").unwrap(), b"test");
        assert_eq!(decode_padded("aGk").unwrap(), b"hi");
        // trailing bits after the last byte are ignored
        assert_eq!(decode_padded("dGVzdB").unwrap(), b"test");
        assert_eq!(decode_padded("aGl").unwrap(), b"hi");
        // url-safe alphabet
        assert_eq!(decode_padded("-_8").unwrap(), vec![0xfb, 0xff]);
        assert!(decode_padded("a").is_err());
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_malformed_line_isolation() {
        let raw = encode_subscription(&[SS_BROKEN, VMESS_TEST, SS_EXAMPLE]);
        let subscription = decode(&raw).unwrap();
        assert_eq!(tags(&subscription), vec!["test", "example"]);
        assert_eq!(subscription.rejected.len(), 1);
        assert_eq!(subscription.rejected[0].line, 1);
        assert!(matches!(
            subscription.rejected[0].error,
            MalformedEntryError::BadPayload(Protocol::Shadowsocks, _)
        ));
        assert!(logs_contain("Skip subscription line 1"));
    }

    #[test]
    fn test_order_with_noise() {
        let raw = encode_subscription(&[
            "STATUS=remaining 12GB",
            SS_EXAMPLE,
            "",
            "trojan://pw@t.example.com:443#trojan",
            "vmess://%%%",
            VMESS_TEST,
            SS_BROKEN,
            "ss://YWVzLTI1Ni1nY206c2VjcmV0@10.0.0.8:443#sip",
        ]);
        let subscription = decode(&raw).unwrap();
        assert_eq!(tags(&subscription), vec!["example", "test", "sip"]);
        let rejected: Vec<usize> = subscription.rejected.iter().map(|r| r.line).collect();
        assert_eq!(rejected, vec![5, 7]);
    }

    #[test]
    fn test_crlf_and_wrapped_body() {
        let encoded = STANDARD.encode(format!("{}\r\n{}\r\n", VMESS_TEST, SS_EXAMPLE));
        // providers sometimes wrap the body at 76 columns
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        let subscription = decode(&format!("{}\n", wrapped)).unwrap();
        assert_eq!(tags(&subscription), vec!["test", "example"]);
        assert!(subscription.rejected.is_empty());
    }

    #[test]
    fn test_empty_subscription() {
        let subscription = decode("").unwrap();
        assert!(subscription.servers.is_empty());
        assert!(subscription.rejected.is_empty());
    }

    #[test]
    fn test_bad_subscription() {
        assert!(matches!(
            decode("vmess://not a subscription"),
            Err(SubscriptionFormatError::Base64(_))
        ));
        // base64 of 0xff 0xfe
        assert!(matches!(
            decode("//4="),
            Err(SubscriptionFormatError::Utf8(_))
        ));
    }
}
