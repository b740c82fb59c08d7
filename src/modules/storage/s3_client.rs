//! S3-compatible transport issuing SigV4-signed HTTP requests directly

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use tracing::info;

use crate::core::config::StorageConfig;
use crate::core::error::TransportError;

use super::endpoint::Endpoint;
use super::s3_compatible::{ObjectTransport, S3CompatibleService};
use super::sigv4::{encode_path, SigV4Signer};

/// S3-compatible service using hand-signed requests
pub type S3Service = S3CompatibleService<S3Transport>;

/// Region that takes no `LocationConstraint` on bucket creation
const DEFAULT_REGION: &str = "us-east-1";

pub struct S3Transport {
    http_client: Client,
    signer: SigV4Signer,
    endpoint: Endpoint,
    bucket_name: String,
    region: String,
}

impl S3Transport {
    pub fn new(config: &StorageConfig) -> Result<Self, TransportError> {
        let endpoint = Endpoint::parse(&config.endpoint);

        info!(
            "Initializing S3 client: endpoint={}, secure={}, region={}",
            endpoint.host, endpoint.secure, config.region
        );

        let http_client = Client::builder().build()?;

        Ok(Self {
            http_client,
            signer: SigV4Signer::new(&config.access_key_id, &config.access_key_secret, &config.region),
            endpoint,
            bucket_name: config.bucket_name.clone(),
            region: config.region.clone(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn bucket_uri(&self) -> String {
        format!("/{}", encode_path(&self.bucket_name))
    }

    fn object_uri(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_uri(), encode_path(key))
    }

    /// CreateBucket payload; empty for the default region
    fn create_bucket_body(&self) -> Vec<u8> {
        if self.region.is_empty() || self.region == DEFAULT_REGION {
            return Vec::new();
        }

        format!(
            "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <LocationConstraint>{}</LocationConstraint>\
             </CreateBucketConfiguration>",
            self.region
        )
        .into_bytes()
    }

    /// Send a signed request to a path-style URI
    async fn send(
        &self,
        method: Method,
        canonical_uri: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<reqwest::Response, TransportError> {
        let signed = self.signer.sign(
            method.as_str(),
            &self.endpoint.host,
            canonical_uri,
            "",
            &body,
            Utc::now(),
        )?;

        let url = format!("{}{}", self.endpoint.base_url(), canonical_uri);
        let mut request = self
            .http_client
            .request(method, &url)
            .header("Host", &self.endpoint.host)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("Authorization", &signed.authorization);

        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }

        Ok(request.body(body).send().await?)
    }

    async fn status_error(response: reqwest::Response) -> TransportError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        TransportError::Status { status, body }
    }
}

#[async_trait]
impl ObjectTransport for S3Transport {
    async fn bucket_exists(&self) -> Result<bool, TransportError> {
        let response = self
            .send(Method::HEAD, &self.bucket_uri(), Vec::new(), None)
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::status_error(response).await),
        }
    }

    async fn create_bucket(&self) -> Result<(), TransportError> {
        let body = self.create_bucket_body();
        let content_type = (!body.is_empty()).then_some("application/xml");
        let response = self
            .send(Method::PUT, &self.bucket_uri(), body, content_type)
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        match Self::status_error(response).await {
            TransportError::Status { status: 409, body }
                if TransportError::is_already_exists_body(&body) =>
            {
                Err(TransportError::BucketAlreadyExists(self.bucket_name.clone()))
            }
            e => Err(e),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let response = self
            .send(Method::PUT, &self.object_uri(key), content, Some(content_type))
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::status_error(response).await)
        }
    }
}
