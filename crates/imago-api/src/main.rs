use imago_api::{build_router, AppState};
use imago_core::Config;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    imago_api::telemetry::init();

    let config = Config::from_env()?;

    let state = AppState::initialize(config.clone()).await?;
    let router = build_router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        backend = %config.storage_backend,
        "imago-api listening"
    );

    axum::serve(listener, router).await?;

    Ok(())
}
