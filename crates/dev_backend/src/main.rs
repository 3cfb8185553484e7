use std::{net::SocketAddr, sync::Arc};

use dev_backend::{build_router, config::load_settings, ApiContext, Store};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let store = if settings.seed_demo_data {
        Store::seeded().await
    } else {
        Store::new()
    };
    let app = build_router(ApiContext {
        store: Arc::new(store),
    });

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, seeded = settings.seed_demo_data, "dev backend listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
