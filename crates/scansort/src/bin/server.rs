//! scansort server binary

use scansort::config::ScanConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ScanConfig::from_env();
    tracing::info!(
        "Starting scansort v{} on {}:{} (mode: {:?})",
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port,
        config.mode
    );
    tracing::info!(
        "Directories: scan={:?} fully={:?} partial={:?} failed={:?}",
        config.storage.scan_dir,
        config.storage.fully_indexed_dir,
        config.storage.partially_indexed_dir,
        config.storage.failed_dir
    );

    scansort::server::run(config).await?;
    Ok(())
}
