pub mod handlers;
pub mod router;

pub use handlers::AppState;
pub use router::build_router;

use crate::aggregator::SentimentService;
use std::sync::Arc;
use tracing::{info, warn};

/// Binds `addr` and serves the API until Ctrl+C.
pub async fn start_server(addr: &str, service: Arc<SentimentService>) -> anyhow::Result<()> {
    let router = build_router(AppState { service });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 DevPulse API listening on http://{}", listener.local_addr()?);
    info!("Dashboard: devpulse dashboard --api http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            }
            info!("🛑 Shutting down API server");
        })
        .await?;
    Ok(())
}
