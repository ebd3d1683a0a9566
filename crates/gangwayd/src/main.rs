//! Gangway webhook daemon.
//!
//! Boots the HTTP server that receives pull-request deliveries from the
//! hosting platform and feeds them into the validation pipeline.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gangway_core::{CheckPipeline, ManifestSchema};
use gangway_github::GitHubClient;

mod config;
mod server;
mod signature;

use config::DaemonConfig;
use server::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = DaemonConfig::from_env();
    if config.webhook_secret.is_none() {
        tracing::warn!("GANGWAY_WEBHOOK_SECRET not set, accepting unsigned deliveries");
    }

    let github = Arc::new(GitHubClient::from_env()?);
    let schema = Arc::new(ManifestSchema::compile()?);
    let pipeline = CheckPipeline::new(github.clone(), github.clone(), schema);

    let state = Arc::new(AppState {
        pipeline,
        actions: github,
        webhook_secret: config.webhook_secret.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "gangwayd listening");
    axum::serve(listener, build_app(state)).await?;

    Ok(())
}
