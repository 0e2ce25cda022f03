//! # TaskHive API Server
//!
//! Loads configuration, connects to PostgreSQL, applies pending migrations,
//! then either serves the HTTP API until SIGINT/SIGTERM or mints signup
//! licenses.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-api
//! cargo run -p taskhive-api -- issue-licenses --count 5
//! ```

use clap::Parser;
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_api::{
    app::{build_router, AppState},
    cli::{Cli, Command},
    config::Config,
};
use taskhive_shared::{
    db::{migrations, pool},
    redis::{RedisClient, RedisConfig},
    services::LicenseLedger,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_api=debug,taskhive_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("TaskHive API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let db = connect(&config).await?;

    let result = match cli.command() {
        Command::Serve => serve(db.clone(), config).await,
        Command::IssueLicenses { count } => issue_licenses(db.clone(), *count).await,
    };

    pool::close_pool(db).await;
    result
}

/// Connects to PostgreSQL and brings the schema up to date
async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    if !config.api.production {
        migrations::ensure_database_exists(&config.database.url).await?;
    }

    let db = pool::create_pool(config.pool_config()).await?;
    migrations::run_migrations(&db).await?;

    let schema = migrations::get_migration_status(&db).await?;
    if !schema.is_up_to_date {
        anyhow::bail!("Database schema is behind this build (at {:?})", schema.latest_version);
    }
    tracing::info!(
        applied = schema.applied_migrations,
        version = ?schema.latest_version,
        "Database schema ready"
    );

    Ok(db)
}

async fn serve(db: PgPool, config: Config) -> anyhow::Result<()> {
    let redis = RedisClient::new(RedisConfig::new(config.redis.url.clone())).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, Arc::new(redis));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Prints one fresh license key per line on stdout
async fn issue_licenses(db: PgPool, count: u32) -> anyhow::Result<()> {
    let ledger = LicenseLedger::new(db);

    for _ in 0..count {
        let key = ledger.issue().await?;
        println!("{}", key);
    }

    tracing::info!(count, "Licenses issued");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
