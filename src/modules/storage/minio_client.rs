//! MinIO/S3-compatible transport built on the rust-s3 client library

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::info;

use crate::core::config::StorageConfig;
use crate::core::error::TransportError;

use super::endpoint::Endpoint;
use super::s3_compatible::{ObjectTransport, S3CompatibleService};

/// S3-compatible service using the rust-s3 library
pub type MinIOService = S3CompatibleService<MinIOTransport>;

pub struct MinIOTransport {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: Endpoint,
}

impl MinIOTransport {
    pub fn new(config: &StorageConfig) -> Result<Self, TransportError> {
        let endpoint = Endpoint::parse(&config.endpoint);

        info!(
            "Initializing MinIO client: endpoint={}, secure={}",
            endpoint.host, endpoint.secure
        );

        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.access_key_secret),
            None,
            None,
            None,
        )
        .map_err(|e| TransportError::Credentials(e.to_string()))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: endpoint.base_url(),
        };

        let mut bucket = Bucket::new(&config.bucket_name, region.clone(), credentials.clone())?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    fn create_error(&self, status: u16, body: String) -> TransportError {
        if TransportError::is_already_exists_body(&body) {
            TransportError::BucketAlreadyExists(self.bucket.name())
        } else {
            TransportError::Status { status, body }
        }
    }
}

#[async_trait]
impl ObjectTransport for MinIOTransport {
    async fn bucket_exists(&self) -> Result<bool, TransportError> {
        // HEAD on the bucket root; `Bucket::exists` lists every bucket instead
        match self.bucket.head_object("/").await {
            Ok((_, status)) if (200..300).contains(&status) => Ok(true),
            Ok((_, 404)) | Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Ok((_, status)) => Err(TransportError::Status {
                status,
                body: String::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_bucket(&self) -> Result<(), TransportError> {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(response) if (200..300).contains(&response.response_code) => Ok(()),
            Ok(response) => Err(self.create_error(response.response_code, response.response_text)),
            Err(S3Error::HttpFailWithBody(status, body)) => Err(self.create_error(status, body)),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let response = match self
            .bucket
            .put_object_with_content_type(key, &content, content_type)
            .await
        {
            Ok(response) => response,
            Err(S3Error::HttpFailWithBody(status, body)) => {
                return Err(TransportError::Status { status, body })
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status_code();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&response.to_vec()).into_owned(),
            })
        }
    }
}
