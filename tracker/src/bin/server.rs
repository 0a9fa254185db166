//! Event Tracker Server
//!
//! Serves the attendee registry over HTTP.
//!
//! # Usage
//!
//! ```bash
//! DATA_DIR=./data VERIFICATION_SECRET=change-me cargo run --bin server
//! ```

use event_tracker::config::LogFormat;
use event_tracker::{Config, TrackerApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,event_tracker=debug,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        address = %config.server.bind_address(),
        data_dir = ?config.storage.data_dir,
        "Configuration loaded"
    );

    let app = TrackerApp::new(config).await?;
    app.run().await
}
