//! EnergyWise portal server
//!
//! Entry point serving the bill upload form and the chat assistant.

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use mimalloc::MiMalloc;

use energywise_portal::{config::AppConfig, server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize tracing (M-LOG-STRUCTURED)
    telemetry::init(config.logging.json);

    server::start_server(Arc::new(config))
        .await
        .context("server terminated")
}
