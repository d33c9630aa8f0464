//! rfdash-ui - RF dashboard web server
//!
//! Serves the login page, report pages, spreadsheet import and account
//! administration over a local SQLite database.

use anyhow::{Context, Result};
use clap::Parser;
use rfdash_common::config::{ConfigOverrides, DashboardConfig};
use rfdash_common::db::{init_database, InitOptions};
use rfdash_ui::{build_router, AppState};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "rfdash-ui")]
#[command(about = "Role-gated dashboard for 3G/4G/5G RF cell data")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "RFDASH_BIND")]
    bind: Option<String>,

    /// SQLite database URL (sqlite://path?mode=rwc)
    #[arg(long, env = "RFDASH_DATABASE_URL")]
    database_url: Option<String>,

    /// Key used to sign session cookies
    #[arg(long, env = "RFDASH_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Password for the bootstrap admin created on first run
    #[arg(long, env = "RFDASH_BOOTSTRAP_PASSWORD", hide_env_values = true)]
    bootstrap_password: Option<String>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "RFDASH_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// bcrypt cost for new password hashes (4-31)
    #[arg(long, env = "RFDASH_PASSWORD_HASH_COST")]
    password_hash_cost: Option<u32>,

    /// Drop and recreate tables whose stored schema is incompatible (their rows are lost)
    #[arg(long, env = "RFDASH_RESET_ON_SCHEMA_DRIFT")]
    reset_on_schema_drift: bool,
}

impl Args {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            secret_key: self.secret_key,
            database_url: self.database_url,
            bind: self.bind,
            bootstrap_password: self.bootstrap_password,
            max_upload_bytes: self.max_upload_bytes,
            password_hash_cost: self.password_hash_cost,
            // Absent flag defers to the config file
            reset_on_schema_drift: self.reset_on_schema_drift.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting RF Dashboard (rfdash-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = DashboardConfig::resolve(args.into_overrides())?;

    if config.uses_dev_secret() {
        warn!("Session cookies are signed with the development key");
    }

    let options = InitOptions {
        reset_on_schema_drift: config.reset_on_schema_drift,
        bootstrap_password: config.bootstrap_password.clone(),
        password_hash_cost: config.password_hash_cost,
    };

    let pool = match init_database(&config.database_url, &options).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let bind = config.bind.clone();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Cannot listen on {}", bind))?;
    info!("rfdash-ui listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
