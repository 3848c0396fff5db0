use blog_common::database;
use crate::infrastructure::AppStateImpl;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::settings::Settings;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod domain;
mod infrastructure;
#[cfg(test)]
mod test_utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!("Configuration loaded");

    let database = database::connect(&settings.database).await?;
    tracing::info!("Connected to DB");

    tokio::fs::create_dir_all(&settings.photos.directory)
        .await
        .with_context(|| format!("failed to create {}", settings.photos.directory.display()))?;

    let state = AppStateImpl::new(database, &settings)?;

    let server_config = HttpServerConfig {
        port: &settings.server_port,
        photo_directory: &settings.photos.directory,
    };
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
