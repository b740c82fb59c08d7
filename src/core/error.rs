use thiserror::Error;

/// Errors surfaced to callers of the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to ensure bucket '{bucket}' exists: {source}")]
    Construction {
        bucket: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to upload file '{path}': {source}")]
    Upload {
        path: String,
        #[source]
        source: TransportError,
    },
}

/// Errors raised by a backend's underlying client
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("S3 client error: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Unexpected response status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gateway returned code {code}: {message}")]
    Gateway { code: i64, message: String },

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Bucket '{0}' already exists")]
    BucketAlreadyExists(String),
}

impl TransportError {
    /// Error codes S3-compatible stores use when a bucket is already present
    const ALREADY_EXISTS_CODES: [&'static str; 2] =
        ["BucketAlreadyOwnedByYou", "BucketAlreadyExists"];

    /// Whether an S3 error body reports that the bucket already exists
    pub fn is_already_exists_body(body: &str) -> bool {
        Self::ALREADY_EXISTS_CODES
            .iter()
            .any(|code| body.contains(code))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_upload_error_keeps_cause() {
        let err = StorageError::Upload {
            path: "a/b.txt".to_string(),
            source: TransportError::Status {
                status: 403,
                body: "AccessDenied".to_string(),
            },
        };

        assert_eq!(
            err.to_string(),
            "Failed to upload file 'a/b.txt': Unexpected response status 403: AccessDenied"
        );
        let cause = err.source().expect("upload error should carry its cause");
        assert!(cause.to_string().contains("403"));
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(TransportError::is_already_exists_body(
            "<Error><Code>BucketAlreadyOwnedByYou</Code></Error>"
        ));
        assert!(TransportError::is_already_exists_body(
            "<Code>BucketAlreadyExists</Code>"
        ));
        assert!(!TransportError::is_already_exists_body(
            "<Code>AccessDenied</Code>"
        ));
    }
}
