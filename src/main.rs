//! PulsePath terminal client
//!
//! A client for the PulsePath mental-health assistant backend: a durable
//! token store, a transport layer, the conversational session state machine
//! with its mood trend, and a thin terminal rendering layer.

mod api;
mod auth;
mod mood;
mod runtime;
mod session;
mod ui;

use api::ApiClient;
use auth::{FileTokenStore, TokenStore};
use runtime::SessionRuntime;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; logs go to stderr so the transcript stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulsepath=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Configuration
    let base_url = std::env::var("PULSEPATH_API_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());

    let token_path = std::env::var("PULSEPATH_TOKEN_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.pulsepath/token")
    });

    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::open(token_path)?);
    let client = Arc::new(ApiClient::new(base_url.clone(), Arc::clone(&tokens)));

    tracing::info!(%base_url, "PulsePath client starting");

    let (handle, snapshots) = SessionRuntime::spawn(Arc::clone(&client));

    // A persisted credential from a previous run means we can load the
    // durable history straight away.
    if tokens.get().is_some() {
        handle.hydrate().await;
    }

    ui::run(client, tokens, handle, snapshots).await?;

    Ok(())
}
