use crate::aggregator::SentimentService;
use crate::model::{
    AnalyzeRequest, Classification, CompareRequest, CompareResponse, HealthResponse,
    InsightsResponse, ModelInfo, SentimentSnapshot, ServiceError, StatsResponse,
    TechnologiesResponse,
};
use crate::utils::normalize_key;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub const ENDPOINTS: &[&str] = &[
    "GET /api/health",
    "GET /api/technologies",
    "GET /api/sentiment/{technology}?refresh=true",
    "GET /api/insights/{technology}",
    "POST /api/compare",
    "POST /api/analyze",
    "GET /api/stats",
    "GET /api/model-info",
];

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SentimentService>,
}

/// `ServiceError` rendered as `{error, message}` with a matching status.
pub struct AppError(ServiceError);

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            ServiceError::NoData(_) => (StatusCode::NOT_FOUND, "No data"),
            ServiceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            ServiceError::Analysis(_) | ServiceError::Storage(_) => {
                error!("❌ Request failed: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(json!({ "error": kind, "message": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SentimentQuery {
    #[serde(default)]
    refresh: Option<String>,
}

impl SentimentQuery {
    fn force_refresh(&self) -> bool {
        matches!(self.refresh.as_deref().map(normalize_key).as_deref(), Some("true" | "1"))
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy".into(), time: Utc::now() })
}

pub async fn technologies(State(state): State<AppState>) -> Json<TechnologiesResponse> {
    Json(TechnologiesResponse { technologies: state.service.technologies() })
}

pub async fn sentiment(
    State(state): State<AppState>,
    Path(technology): Path<String>,
    Query(query): Query<SentimentQuery>,
) -> Result<Json<SentimentSnapshot>, AppError> {
    let snapshot = state.service.get_snapshot(&technology, query.force_refresh()).await?;
    Ok(Json(snapshot.as_ref().clone()))
}

pub async fn insights(
    State(state): State<AppState>,
    Path(technology): Path<String>,
) -> Result<Json<InsightsResponse>, AppError> {
    let insights = state.service.insights(&technology).await?;
    Ok(Json(InsightsResponse { technology: normalize_key(&technology), insights }))
}

pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    Ok(Json(state.service.compare(&request.technologies).await?))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Classification>, AppError> {
    Ok(Json(state.service.analyze_text(&request.text).await?))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.stats().await)
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.service.model_info())
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found", "available_endpoints": ENDPOINTS })),
    )
}
