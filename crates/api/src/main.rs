use agrimaan_api::{app, config::Config, middleware, services};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    middleware::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    middleware::init_metrics().context("Failed to install metrics recorder")?;

    info!("Starting Agrimaan API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into())
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");

    services::bootstrap_admin(&pool, &config.admin)
        .await
        .context("Failed to bootstrap admin user")?;

    let addr = config.socket_addr().context("Invalid server address")?;
    let state = app::AppState::new(config, pool).context("Invalid JWT configuration")?;

    if let Some(limiter) = state.rate_limiter.clone() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                limiter.prune();
            }
        });
    }

    let app = app::build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
