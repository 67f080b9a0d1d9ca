//! Storefront server binary.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drinks_storefront::{
    api::router,
    config::{Config, Environment},
    database::Database,
    services::AppState,
};

/// How often idle rate limiter buckets are dropped.
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("loading configuration")?;
    init_tracing(config.environment);
    info!(environment = ?config.environment, "Starting drinks storefront");

    let database = Database::connect(&config.database_url)
        .await
        .context("connecting to the database")?;
    database.migrate().await.context("running migrations")?;
    info!("Database ready");

    let addr = config.server_addr();
    let state = AppState::new(database, config);

    if let Some(admin) = state.auth_service.bootstrap_admin().await? {
        info!(email = %admin.email, "Created bootstrap admin account");
    }

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.cleanup();
        }
    });

    let app = router(state);

    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// Pretty logs while developing, JSON lines everywhere else.
fn init_tracing(environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("drinks_storefront=debug,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if environment.is_development() {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .pretty(),
            )
            .init();
    } else {
        registry.with(fmt::layer().json().with_current_span(false)).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
