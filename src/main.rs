use std::path::PathBuf;

use anyhow::Context;
use tokio::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dropzone::service::{self, ServiceConfig, PORT, UPLOAD_DIR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let upload_dir = PathBuf::from(UPLOAD_DIR);

    // no degraded mode, a missing upload directory is fatal
    fs::create_dir_all(&upload_dir)
        .await
        .with_context(|| format!("creating the upload directory {} failed", upload_dir.display()))?;

    info!("files will be uploaded to {}", upload_dir.display());

    let config = ServiceConfig { upload_dir };
    service::run(service::app(config), PORT).await
}
