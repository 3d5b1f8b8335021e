mod commands;

use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use marathon_client::{ClientConfig, HttpNotificationApi, NotificationPanel, QueryCache};

use crate::commands::{Cli, StderrAlertSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marathon=info,marathon_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Config
    let mut config = ClientConfig::from_env()?;
    if let Some(size) = cli.page_size {
        config.page_size = size.max(1);
    }
    debug!(base_url = %config.base_url, authenticated = config.is_authenticated(), "client configured");

    let api = Arc::new(HttpNotificationApi::new(&config)?);
    let cache = Arc::new(QueryCache::new(config.stale_after));
    let mut panel = NotificationPanel::new(api, cache, Arc::new(StderrAlertSink), config.page_size);

    commands::run(cli.command, &mut panel).await
}
