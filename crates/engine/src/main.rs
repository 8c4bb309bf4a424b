//! Guilds Engine - Main entry point.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guilds_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    json_store::JsonFileStorage,
    settings::EngineSettings,
};
use guilds_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root, then the working directory.
    load_dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guilds_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Guilds Engine");

    // Load configuration
    let settings = EngineSettings::from_env().context("invalid GUILDS_* settings")?;
    let rules = settings.rules().context("failed to load guild rules")?;
    tracing::info!(
        data_root = %settings.data_root.display(),
        autosave_secs = settings.autosave_interval.as_secs(),
        load_policy = %settings.load_policy,
        "Configuration loaded"
    );

    let storage = Arc::new(
        JsonFileStorage::new(&settings.data_root).context("failed to open guild storage")?,
    );

    let (mut app, report) = App::bootstrap(
        &settings,
        &rules,
        storage,
        Arc::new(SystemClock::new()),
        Arc::new(SystemRandom::new()),
    )
    .context("failed to load guilds")?;
    tracing::info!(loaded = report.loaded, skipped = report.skipped, "Guild registry ready");

    app.start_autosave();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    app.shutdown().await.context("final save failed")?;
    Ok(())
}

fn load_dotenv() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    let _ = dotenvy::dotenv();
}
