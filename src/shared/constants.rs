/// MIME type used when an upload does not specify one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Environment variable names read by `StorageConfig`
pub mod env_keys {
    pub const OSS_TYPE: &str = "OSS_TYPE";
    pub const USE_MINIO_LIB: &str = "USE_MINIO_LIB";
    pub const OSS_ENDPOINT: &str = "OSS_ENDPOINT";
    pub const OSS_ACCESS_KEY_ID: &str = "OSS_ACCESS_KEY_ID";
    pub const OSS_ACCESS_KEY_SECRET: &str = "OSS_ACCESS_KEY_SECRET";
    pub const OSS_BUCKET_NAME: &str = "OSS_BUCKET_NAME";
    pub const OSS_DOWNLOAD_HOST: &str = "OSS_DOWNLOAD_HOST";
    pub const OSS_TTL: &str = "OSS_TTL";
    pub const OSS_REGION: &str = "OSS_REGION";
}
