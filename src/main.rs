use std::path::PathBuf;

use oss_storage::{create, OssService, StorageConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: oss-upload <local-file> <object-path> [content-type]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let local_file = args.next().map(PathBuf::from).ok_or_else(|| anyhow::anyhow!(USAGE))?;
    let object_path = args.next().ok_or_else(|| anyhow::anyhow!(USAGE))?;
    let content_type = args.next();

    let config = StorageConfig::from_env()?;
    tracing::info!("Configuration loaded successfully: {:?}", config);

    let client = create(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage client: {}", e))?;
    tracing::info!(
        "Storage client initialized: backend={:?}, bucket={}",
        client.backend(),
        client.bucket_name()
    );

    let content = tokio::fs::read(&local_file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", local_file.display(), e))?;

    let url = client
        .upload(&object_path, content, content_type.as_deref())
        .await?;

    println!("{}", url);
    Ok(())
}
