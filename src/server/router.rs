use crate::server::handlers::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/technologies", get(handlers::technologies))
        .route("/api/sentiment/:technology", get(handlers::sentiment))
        .route("/api/insights/:technology", get(handlers::insights))
        .route("/api/compare", post(handlers::compare))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/stats", get(handlers::stats))
        .route("/api/model-info", get(handlers::model_info))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use crate::test_support::{FakeCollector, spawn_router, test_service};
    use serde_json::Value;
    use std::sync::Arc;

    async fn serve(days: i64) -> (String, Arc<FakeCollector>) {
        let collector = FakeCollector::new(Source::Github, days);
        let service = test_service(vec![collector.clone()], None);
        let base = spawn_router(build_router(AppState { service: Arc::new(service) })).await;
        (base, collector)
    }

    #[tokio::test]
    async fn unknown_route_lists_endpoints() {
        let (base, _) = serve(3).await;
        let response = reqwest::get(format!("{}/api/nope", base)).await.unwrap();
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Endpoint not found");
        assert_eq!(body["available_endpoints"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn refresh_query_forces_recompute() {
        let (base, collector) = serve(3).await;
        let client = reqwest::Client::new();
        for url in [
            format!("{}/api/sentiment/react", base),
            format!("{}/api/sentiment/react", base),
            format!("{}/api/sentiment/react?refresh=true", base),
        ] {
            assert_eq!(client.get(url).send().await.unwrap().status(), 200);
        }
        assert_eq!(collector.calls(), 2);
    }

    #[tokio::test]
    async fn service_errors_map_to_status() {
        let (base, _) = serve(0).await;
        let client = reqwest::Client::new();

        let missing = client.get(format!("{}/api/insights/react", base)).send().await.unwrap();
        assert_eq!(missing.status(), 404);
        let body: Value = missing.json().await.unwrap();
        assert_eq!(body["error"], "No data");
        assert_eq!(body["message"], "No data available for react");

        let invalid = client
            .post(format!("{}/api/analyze", base))
            .json(&serde_json::json!({ "text": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(invalid.status(), 400);
    }
}
