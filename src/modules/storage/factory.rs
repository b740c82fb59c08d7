//! Storage client factory
//!
//! | `OSS_TYPE` | `USE_MINIO_LIB` | backend     |
//! |------------|-----------------|-------------|
//! | `s3`       | `1` (default)   | MinIO       |
//! | `s3`       | anything else   | S3          |
//! | other      | -               | iFly gateway|

use tracing::info;

use crate::core::config::{OssType, StorageConfig};
use crate::core::error::{Result, StorageError};

use super::gateway_client::IFlyGatewayStorageClient;
use super::minio_client::MinIOTransport;
use super::s3_client::S3Transport;
use super::s3_compatible::S3CompatibleService;
use super::{OssBackend, StorageClient};

/// Decide which backend a configuration maps to
pub fn select_backend(config: &StorageConfig) -> OssBackend {
    match (&config.oss_type, config.use_minio_lib) {
        (OssType::S3, true) => OssBackend::Minio,
        (OssType::S3, false) => OssBackend::S3,
        (OssType::IflyGatewayStorage(_), _) => OssBackend::IflyGateway,
    }
}

/// Build the storage client selected by `config`
///
/// S3-compatible backends check and, if needed, create the bucket before
/// returning, so this should be awaited once at startup rather than per
/// request.
pub async fn create(config: &StorageConfig) -> Result<StorageClient> {
    let backend = select_backend(config);
    info!(
        "Creating storage client: backend={:?}, bucket={}",
        backend, config.bucket_name
    );

    let construction = |source| StorageError::Construction {
        bucket: config.bucket_name.clone(),
        source,
    };

    let client = match backend {
        OssBackend::Minio => {
            let transport = MinIOTransport::new(config).map_err(construction)?;
            StorageClient::Minio(
                S3CompatibleService::connect(transport, &config.bucket_name, &config.download_host)
                    .await?,
            )
        }
        OssBackend::S3 => {
            let transport = S3Transport::new(config).map_err(construction)?;
            StorageClient::S3(
                S3CompatibleService::connect(transport, &config.bucket_name, &config.download_host)
                    .await?,
            )
        }
        OssBackend::IflyGateway => {
            StorageClient::IflyGateway(IFlyGatewayStorageClient::new(config).map_err(construction)?)
        }
    };

    Ok(client)
}
