/// Normalized S3-compatible endpoint
///
/// Holds the bare `host[:port]` and whether the original URL asked for TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub secure: bool,
}

impl Endpoint {
    pub fn parse(endpoint: &str) -> Self {
        let secure = endpoint.starts_with("https://");
        let host = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        Self { host, secure }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL rebuilt from the normalized host and secure flag
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.host)
    }
}
