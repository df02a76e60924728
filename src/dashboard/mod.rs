//! Web dashboard
//!
//! A single form page that scores one customer, plus a small JSON API over the
//! same predictor.

mod api;
mod error;
mod handlers;
mod state;
pub mod view;

pub use api::create_router;
pub use error::DashboardError;
pub use handlers::PredictResponse;
pub use state::AppState;

use crate::config::ServerConfig;
use crate::prediction::Predictor;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Serve the dashboard until ctrl+c
pub async fn run_server(config: ServerConfig, predictor: Predictor) -> anyhow::Result<()> {
    let trees = predictor.artifacts().model.n_trees();
    let features = predictor.artifacts().features.len();
    let state = Arc::new(AppState::new(predictor));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, trees, features, "Dashboard listening");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install ctrl+c handler");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping dashboard");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Dashboard shut down cleanly");
    Ok(())
}
