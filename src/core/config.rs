use std::env;
use std::fmt;

use crate::core::error::{Result, StorageError};
use crate::shared::constants::env_keys;

/// Backend selector read from `OSS_TYPE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OssType {
    /// S3-compatible storage (`OSS_TYPE=s3`)
    S3,
    /// iFly gateway storage, used for every other selector value.
    /// Holds the raw tag for diagnostics.
    IflyGatewayStorage(String),
}

impl OssType {
    pub const S3_TAG: &'static str = "s3";
    pub const DEFAULT_TAG: &'static str = "ifly_gateway_storage";

    pub fn from_tag(tag: &str) -> Self {
        if tag == Self::S3_TAG {
            OssType::S3
        } else {
            OssType::IflyGatewayStorage(tag.to_string())
        }
    }
}

/// Object storage configuration
///
/// String values that are absent from the environment are stored as empty
/// strings. Only `OSS_TTL` can fail to load.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub oss_type: OssType,
    /// Use the S3 client library strategy instead of hand-signed requests
    pub use_minio_lib: bool,
    /// Endpoint URL, with or without scheme
    pub endpoint: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket_name: String,
    /// Prefix for synthesized download URLs (S3-compatible backends)
    pub download_host: String,
    /// Link time-to-live in seconds (gateway backend)
    pub ttl: u64,
    /// Region used for request signing (S3-compatible backends)
    pub region: String,
}

impl StorageConfig {
    const DEFAULT_USE_MINIO_LIB: &'static str = "1";
    const DEFAULT_REGION: &'static str = "us-east-1";

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Error loading .env file: {}", e);
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as absent, except for USE_MINIO_LIB
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let string = |key: &str| get(key).unwrap_or_default();

        let oss_type = get(env_keys::OSS_TYPE)
            .map(|tag| OssType::from_tag(&tag))
            .unwrap_or_else(|| OssType::from_tag(OssType::DEFAULT_TAG));

        // Set but empty selects the signed-request strategy
        let use_minio_lib = lookup(env_keys::USE_MINIO_LIB)
            .unwrap_or_else(|| Self::DEFAULT_USE_MINIO_LIB.to_string())
            == "1";

        let ttl = match get(env_keys::OSS_TTL) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                StorageError::Configuration(format!(
                    "{} must be a non-negative integer, got '{}'",
                    env_keys::OSS_TTL,
                    raw
                ))
            })?,
            None => 0,
        };

        let region =
            get(env_keys::OSS_REGION).unwrap_or_else(|| Self::DEFAULT_REGION.to_string());

        Ok(Self {
            oss_type,
            use_minio_lib,
            endpoint: string(env_keys::OSS_ENDPOINT),
            access_key_id: string(env_keys::OSS_ACCESS_KEY_ID),
            access_key_secret: string(env_keys::OSS_ACCESS_KEY_SECRET),
            bucket_name: string(env_keys::OSS_BUCKET_NAME),
            download_host: string(env_keys::OSS_DOWNLOAD_HOST),
            ttl,
            region,
        })
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("oss_type", &self.oss_type)
            .field("use_minio_lib", &self.use_minio_lib)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("bucket_name", &self.bucket_name)
            .field("download_host", &self.download_host)
            .field("ttl", &self.ttl)
            .field("region", &self.region)
            .finish()
    }
}
