//! Object storage abstraction with interchangeable backends
//!
//! ```ignore
//! use oss_storage::{create, OssService, StorageConfig};
//!
//! let config = StorageConfig::from_env()?;
//! let client = create(&config).await?;
//! let url = client.upload("reports/a.txt", b"hello".to_vec(), Some("text/plain")).await?;
//! ```

pub mod core;
pub mod modules;
pub mod shared;

pub use crate::core::config::{OssType, StorageConfig};
pub use crate::core::error::{Result, StorageError, TransportError};
pub use crate::modules::storage::{create, select_backend, OssBackend, OssService, StorageClient};
