use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use prlens_core::PullSummary;
use prlens_review::pipeline::{AnalysisReport, Analyzer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::ApiError;

/// Body of `POST /analyze` and `POST /list-prs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrUrlRequest {
    pub pr_url: String,
}

/// Body of a successful `POST /list-prs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListPrsResponse {
    pub prs: Vec<PullSummary>,
}

pub async fn analyze(
    State(analyzer): State<Arc<Analyzer>>,
    Json(request): Json<PrUrlRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let report = analyzer.analyze(&request.pr_url).await?;
    Ok(Json(report))
}

pub async fn list_prs(
    State(analyzer): State<Arc<Analyzer>>,
    Json(request): Json<PrUrlRequest>,
) -> Result<Json<ListPrsResponse>, ApiError> {
    info!(repo_url = %request.pr_url, "listing open pull requests");
    match analyzer.list_open_prs(&request.pr_url).await {
        Ok(prs) => Ok(Json(ListPrsResponse { prs })),
        Err(e) => {
            error!(error = %e, "listing failed");
            Err(e.into())
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
