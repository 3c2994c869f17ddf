mod api_models;
mod app;
mod handler;
mod models;
mod repositories;
mod routes;
mod schema;
mod services;
mod utils;

use std::net::SocketAddr;

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    utils::logging::init_logging();

    let cfg = utils::config::ServerConfig::from_env()?;
    let db_cfg = utils::config::DatabaseConfig::from_env()?;
    let addr: SocketAddr = cfg.addr;
    let pool = app::build_pool(&db_cfg);
    let app = app::build_app_with_pool(pool, cfg.cache_ttl);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {} failed", addr))?;
    tracing::info!(
        "Revenue lab listening on http://{} (cache ttl {}s)",
        listener.local_addr()?,
        cfg.cache_ttl.as_secs()
    );
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
