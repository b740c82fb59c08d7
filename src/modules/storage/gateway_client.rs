//! iFly gateway storage client
//!
//! The gateway is not S3-compatible. Requests are signed with HMAC-SHA256
//! over the `host`, `date`, request line and body digest, and every upload
//! asks the gateway for an expiring download link.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::core::config::StorageConfig;
use crate::core::error::{Result, StorageError, TransportError};

use super::sigv4::hmac_sha256;

/// Signed headers for a gateway request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayAuth {
    pub host: String,
    pub date: String,
    pub digest: String,
    pub authorization: String,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<GatewayData>,
}

#[derive(Debug, Deserialize)]
struct GatewayData {
    link: Option<String>,
}

pub struct IFlyGatewayStorageClient {
    endpoint: String,
    access_key_id: String,
    access_key_secret: String,
    bucket_name: String,
    ttl: u64,
    http_client: Client,
}

impl IFlyGatewayStorageClient {
    /// Capture the configuration. No request is made until the first upload.
    pub fn new(config: &StorageConfig) -> std::result::Result<Self, TransportError> {
        let http_client = Client::builder().build()?;

        info!(
            "Gateway storage client initialized for endpoint: {}, bucket: {}, ttl: {}",
            config.endpoint, config.bucket_name, config.ttl
        );

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_key_id: config.access_key_id.clone(),
            access_key_secret: config.access_key_secret.clone(),
            bucket_name: config.bucket_name.clone(),
            ttl: config.ttl,
            http_client,
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Upload a file and return the gateway's download link
    pub async fn upload(&self, path: &str, content: Vec<u8>, content_type: &str) -> Result<String> {
        debug!(
            "Uploading file '{}' ({} bytes) to gateway bucket '{}'",
            path,
            content.len(),
            self.bucket_name
        );

        self.send_upload(path, content, content_type)
            .await
            .map_err(|source| {
                error!("Failed to upload file '{}': {}", path, source);
                StorageError::Upload {
                    path: path.to_string(),
                    source,
                }
            })
    }

    fn upload_url(&self, path: &str) -> std::result::Result<Url, TransportError> {
        let base = format!("{}/api/v1/{}/upload", self.endpoint, self.bucket_name);
        let ttl = self.ttl.to_string();

        Url::parse_with_params(
            &base,
            &[
                ("filename", path),
                ("get_link", "true"),
                ("link_ttl", ttl.as_str()),
            ],
        )
        .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", base, e)))
    }

    /// Host and request path covered by the signature
    ///
    /// The gateway verifies the bare host name and the path without its query
    /// string, so neither the port nor the upload parameters are signed.
    fn signing_target(&self, url: &Url) -> std::result::Result<(String, String), TransportError> {
        let host = url.host_str().ok_or_else(|| {
            TransportError::InvalidEndpoint(format!("Endpoint URL has no host: {}", self.endpoint))
        })?;
        Ok((host.to_string(), url.path().to_string()))
    }

    async fn send_upload(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> std::result::Result<String, TransportError> {
        let url = self.upload_url(path)?;
        let (host, request_path) = self.signing_target(&url)?;

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let auth = sign_request(
            &self.access_key_id,
            &self.access_key_secret,
            &host,
            &date,
            "POST",
            &request_path,
            &content,
        )?;

        let response = self
            .http_client
            .post(url)
            .header("Host", &auth.host)
            .header("Date", &auth.date)
            .header("Digest", &auth.digest)
            .header("Authorization", &auth.authorization)
            .header("Content-Type", content_type)
            .body(content)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GatewayResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        if parsed.code != 0 {
            return Err(TransportError::Gateway {
                code: parsed.code,
                message: parsed.message,
            });
        }

        let link = parsed
            .data
            .and_then(|data| data.link)
            .ok_or_else(|| TransportError::Decode("response carries no download link".to_string()))?;

        debug!("Uploaded file '{}' -> {}", path, link);
        Ok(link)
    }
}

/// Compute the gateway authentication headers for a request
pub fn sign_request(
    api_key: &str,
    api_secret: &str,
    host: &str,
    date: &str,
    method: &str,
    request_path: &str,
    body: &[u8],
) -> std::result::Result<GatewayAuth, TransportError> {
    let digest = format!("SHA-256={}", BASE64.encode(Sha256::digest(body)));

    let signature_origin = format!(
        "host: {}\ndate: {}\n{} {} HTTP/1.1\ndigest: {}",
        host, date, method, request_path, digest
    );
    let signature = BASE64.encode(hmac_sha256(
        api_secret.as_bytes(),
        signature_origin.as_bytes(),
    )?);

    let authorization_origin = format!(
        "api_key=\"{}\", algorithm=\"hmac-sha256\", headers=\"host date request-line digest\", signature=\"{}\"",
        api_key, signature
    );

    Ok(GatewayAuth {
        host: host.to_string(),
        date: date.to_string(),
        digest,
        authorization: BASE64.encode(authorization_origin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::StubServer;
    use std::error::Error as _;

    fn config(endpoint: &str, ttl: &str) -> StorageConfig {
        StorageConfig::from_lookup(|key| match key {
            "OSS_ENDPOINT" => Some(endpoint.to_string()),
            "OSS_ACCESS_KEY_ID" => Some("key".to_string()),
            "OSS_ACCESS_KEY_SECRET" => Some("secret".to_string()),
            "OSS_BUCKET_NAME" => Some("workflow".to_string()),
            "OSS_TTL" => Some(ttl.to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_digest_of_empty_body() {
        let auth = sign_request("k", "s", "gw", "date", "POST", "/", b"").unwrap();
        assert_eq!(
            auth.digest,
            "SHA-256=47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_authorization_header_layout() {
        let auth = sign_request(
            "my-key",
            "my-secret",
            "gw.example.com",
            "Wed, 01 May 2024 12:30:45 GMT",
            "POST",
            "/api/v1/workflow/upload",
            b"hello",
        )
        .unwrap();

        let decoded = String::from_utf8(BASE64.decode(&auth.authorization).unwrap()).unwrap();
        assert!(decoded.starts_with("api_key=\"my-key\", algorithm=\"hmac-sha256\""));
        assert!(decoded.contains("headers=\"host date request-line digest\""));
        assert_eq!(auth.host, "gw.example.com");

        // Same inputs, same signature; different secret, different signature
        let again = sign_request(
            "my-key",
            "my-secret",
            "gw.example.com",
            "Wed, 01 May 2024 12:30:45 GMT",
            "POST",
            "/api/v1/workflow/upload",
            b"hello",
        )
        .unwrap();
        assert_eq!(auth, again);
        let other = sign_request(
            "my-key",
            "other",
            "gw.example.com",
            "Wed, 01 May 2024 12:30:45 GMT",
            "POST",
            "/api/v1/workflow/upload",
            b"hello",
        )
        .unwrap();
        assert_ne!(auth.authorization, other.authorization);
    }

    #[test]
    fn test_upload_url_carries_ttl() {
        let client = IFlyGatewayStorageClient::new(&config("http://gw.example.com/", "300")).unwrap();
        assert_eq!(client.ttl(), 300);

        let url = client.upload_url("dir/a b.txt").unwrap();
        assert_eq!(url.path(), "/api/v1/workflow/upload");
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("filename".to_string(), "dir/a b.txt".to_string())));
        assert!(params.contains(&("link_ttl".to_string(), "300".to_string())));
        assert!(params.contains(&("get_link".to_string(), "true".to_string())));
    }

    #[tokio::test]
    async fn test_upload_with_empty_endpoint_fails_without_url() {
        let client = IFlyGatewayStorageClient::new(&config("", "0")).unwrap();
        let err = client
            .upload("a.txt", b"data".to_vec(), "text/plain")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::Upload { source: TransportError::InvalidEndpoint(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_upload_transport_failure_is_wrapped() {
        let client = IFlyGatewayStorageClient::new(&config("http://127.0.0.1:1", "0")).unwrap();
        let err = client
            .upload("a.txt", b"data".to_vec(), "text/plain")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Upload { ref path, .. } if path == "a.txt"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_gateway_response_parsing() {
        let ok: GatewayResponse =
            serde_json::from_str(r#"{"code":0,"message":"success","data":{"link":"http://x/y"}}"#)
                .unwrap();
        assert_eq!(ok.code, 0);
        assert_eq!(ok.data.and_then(|d| d.link).as_deref(), Some("http://x/y"));

        let failed: GatewayResponse = serde_json::from_str(r#"{"code":10001}"#).unwrap();
        assert_eq!(failed.code, 10001);
        assert!(failed.data.is_none());
    }

    #[test]
    fn test_signature_covers_bare_host_and_path() {
        let client =
            IFlyGatewayStorageClient::new(&config("https://gw.example.com:8443", "60")).unwrap();
        let url = client.upload_url("a.txt").unwrap();

        let (host, path) = client.signing_target(&url).unwrap();
        assert_eq!(host, "gw.example.com");
        assert_eq!(path, "/api/v1/workflow/upload");

        // Changing only the query or port leaves the signature unchanged
        let other = IFlyGatewayStorageClient::new(&config("https://gw.example.com:9443", "120"))
            .unwrap();
        let other_url = other.upload_url("b.txt").unwrap();
        assert_eq!(other.signing_target(&other_url).unwrap(), (host, path));
    }

    #[tokio::test]
    async fn test_upload_returns_gateway_link() {
        let server = StubServer::start(|_| {
            (
                200,
                r#"{"code":0,"message":"success","data":{"link":"http://dl/x?sig=1"}}"#.to_string(),
            )
        })
        .await;

        let client = IFlyGatewayStorageClient::new(&config(&server.endpoint, "60")).unwrap();
        let link = client
            .upload("a.txt", b"data".to_vec(), "text/plain")
            .await
            .unwrap();
        assert_eq!(link, "http://dl/x?sig=1");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].path,
            "/api/v1/workflow/upload?filename=a.txt&get_link=true&link_ttl=60"
        );
        assert_eq!(requests[0].body, "data");
    }

    #[tokio::test]
    async fn test_upload_surfaces_gateway_and_http_failures() {
        let server = StubServer::start(|req| {
            if req.path.contains("filename=rejected") {
                (200, r#"{"code":10001,"message":"denied"}"#.to_string())
            } else if req.path.contains("filename=broken") {
                (200, r#"{"code":0,"data":{}}"#.to_string())
            } else {
                (500, "internal".to_string())
            }
        })
        .await;
        let client = IFlyGatewayStorageClient::new(&config(&server.endpoint, "0")).unwrap();

        let err = client.upload("rejected", Vec::new(), "text/plain").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Upload { source: TransportError::Gateway { code: 10001, .. }, .. }
        ));

        let err = client.upload("broken", Vec::new(), "text/plain").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Upload { source: TransportError::Decode(_), .. }
        ));

        let err = client.upload("other", Vec::new(), "text/plain").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Upload { source: TransportError::Status { status: 500, .. }, .. }
        ));
    }
}
