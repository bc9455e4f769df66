use std::sync::Arc;

use anyhow::Context;
use bazaar::config::{self, CliArgs};
use bazaar::media::MediaStore;
use bazaar::{create_app, db, logging, run_migrations, AppOptions, AppState};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenv::dotenv().ok();

    let args = CliArgs::parse();

    // Config first, since the log directory may come from the config file
    let config = config::get_config(&args);
    let _log_guard = logging::init_tracing(args.debug, config.log_dir.as_deref())?;
    info!("Starting bazaar with {:?}", config);

    let pool = db::init_pool(&config.database_url)
        .with_context(|| format!("opening database {}", config.database_url))?;
    {
        let mut conn = pool.get().context("getting a connection for migrations")?;
        run_migrations(&mut conn)?;
    }
    info!("Database ready at {}", config.database_url);

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("creating media root {}", config.media_root.display()))?;
    let media = MediaStore::new(&config.media_root, &config.media_url);

    let state = AppState::new(Arc::new(pool), media, &config.identity_header)?;
    let app = create_app(state, AppOptions::from_config(&config));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
