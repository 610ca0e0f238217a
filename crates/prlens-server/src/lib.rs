//! HTTP surface for prlens.
//!
//! - `POST /analyze`: `{"pr_url"}` to `{review, pr, files}`
//! - `POST /list-prs`: `{"pr_url"}` to `{prs}`
//! - `GET /health`: `{"status": "ok"}`

pub mod error;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use prlens_core::{PrLensConfig, PrLensError};
use prlens_review::pipeline::Analyzer;
use tokio::net::TcpListener;
use tracing::info;

pub use routes::app;

/// Build the router from configuration.
///
/// # Errors
///
/// Returns an error if the upstream HTTP clients cannot be built.
pub fn router(config: &PrLensConfig) -> Result<axum::Router, PrLensError> {
    let analyzer = Arc::new(Analyzer::from_config(config)?);
    Ok(app(analyzer, &config.server.allowed_origins))
}

/// Bind `config.server` and serve until the process is stopped.
///
/// # Errors
///
/// Returns [`PrLensError::Io`] if the address cannot be bound or the
/// server fails.
pub async fn run_server(config: &PrLensConfig) -> Result<(), PrLensError> {
    let app = router(config)?;

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        model = %config.llm.model,
        origins = ?config.server.allowed_origins,
        "server running on http://{addr}"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
