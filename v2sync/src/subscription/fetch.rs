use crate::subscription::FetchError;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

/// Transport settings for the subscription request.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Option<Duration>,
    /// Honor `HTTP_PROXY`/`HTTPS_PROXY`; off so a stale proxy never carries the fetch.
    pub use_env_proxy: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            use_env_proxy: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionSource {
    File { path: PathBuf },
    Http { url: Url },
}

impl SubscriptionSource {
    pub fn parse(location: &str) -> Result<Self, FetchError> {
        let url = Url::parse(location)
            .map_err(|e| FetchError::InvalidUrl(location.to_string(), e))?;
        match url.scheme() {
            "http" | "https" => Ok(SubscriptionSource::Http { url }),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| FetchError::NotLocalFile(location.to_string()))?;
                Ok(SubscriptionSource::File { path })
            }
            _ => Err(FetchError::UnsupportedScheme(location.to_string())),
        }
    }

    /// Read the raw subscription body. Any non-success HTTP status is an error.
    pub async fn fetch(&self, options: &FetchOptions) -> Result<String, FetchError> {
        match self {
            SubscriptionSource::File { path } => fs::read_to_string(path)
                .map_err(|e| FetchError::Io(path.to_string_lossy().to_string(), e)),
            SubscriptionSource::Http { url } => {
                let http_err = |e| FetchError::Http(url.to_string(), e);
                let mut builder = reqwest::Client::builder()
                    .user_agent(options.user_agent.as_str());
                if !options.use_env_proxy {
                    builder = builder.no_proxy();
                }
                if let Some(timeout) = options.timeout {
                    builder = builder.timeout(timeout);
                }
                let client = builder.build().map_err(http_err)?;
                let resp = client.get(url.as_str()).send().await.map_err(http_err)?;
                if !resp.status().is_success() {
                    return Err(FetchError::Status(url.to_string(), resp.status()));
                }
                resp.text().await.map_err(http_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert!(matches!(
            SubscriptionSource::parse("https://sub.example.com/link/abc?sub=3").unwrap(),
            SubscriptionSource::Http { .. }
        ));
        assert_eq!(
            SubscriptionSource::parse("file:///var/lib/v2sync/sub.txt").unwrap(),
            SubscriptionSource::File {
                path: PathBuf::from("/var/lib/v2sync/sub.txt")
            }
        );
        assert!(matches!(
            SubscriptionSource::parse("ftp://sub.example.com/sub"),
            Err(FetchError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            SubscriptionSource::parse("sub.example.com"),
            Err(FetchError::InvalidUrl(_, _))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_remote_file_url() {
        assert!(matches!(
            SubscriptionSource::parse("file://sub.example.com/sub.txt"),
            Err(FetchError::NotLocalFile(_))
        ));
        assert_eq!(
            SubscriptionSource::parse("file://localhost/tmp/sub.txt").unwrap(),
            SubscriptionSource::File {
                path: PathBuf::from("/tmp/sub.txt")
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.txt");
        fs::write(&path, "dGVzdA==").unwrap();
        let source = SubscriptionSource::File { path: path.clone() };
        assert_eq!(
            source.fetch(&FetchOptions::default()).await.unwrap(),
            "dGVzdA=="
        );
        let missing = SubscriptionSource::File {
            path: dir.path().join("missing.txt"),
        };
        assert!(matches!(
            missing.fetch(&FetchOptions::default()).await,
            Err(FetchError::Io(_, _))
        ));
    }
}
