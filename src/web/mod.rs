/// Dashboard HTTP surface: page shell, htmx partial, JSON API, static files
pub mod render;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

use crate::pipeline::Assembler;

#[derive(Clone)]
pub struct AppState {
    pub assembler: Assembler,
    pub refresh_interval_secs: u64,
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/load_data", get(load_data_handler))
        .route("/api/readings", get(api_readings_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render::page(state.refresh_interval_secs))
}

/// htmx endpoint, re-runs the whole pipeline on every poll
async fn load_data_handler(State(state): State<AppState>) -> Response {
    match state.assembler.assemble().await {
        Ok(readings) => Html(render::sensor_cards(&readings)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(render::error_partial(&e)),
        )
            .into_response(),
    }
}

async fn api_readings_handler(State(state): State<AppState>) -> Response {
    match state.assembler.assemble().await {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": e.to_string(),
                "device_id": e.device_id(),
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::registry::DeviceRegistry;
    use crate::store::memory::{sample, MemoryStore};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tokio::time::Duration;
    use tower::ServiceExt;

    fn router(registry: DeviceRegistry) -> Router {
        let state = AppState {
            assembler: Assembler::new(Arc::new(registry), Duration::from_secs(5)),
            refresh_interval_secs: 30,
        };
        build_router(state, Path::new("static"))
    }

    fn healthy_registry() -> DeviceRegistry {
        DeviceRegistry::new()
            .with_device(
                "b1",
                "Bedroom",
                Arc::new(MemoryStore::new(vec![sample(2000, 5000, "2026-10-15T10:00:00Z")])),
            )
            .with_device(
                "a2",
                "Attic",
                Arc::new(MemoryStore::new(vec![sample(1500, 6000, "2026-10-15T10:00:00Z")])),
            )
    }

    fn failing_registry() -> DeviceRegistry {
        healthy_registry().with_device(
            "c0",
            "Cellar",
            Arc::new(MemoryStore::failing(StoreError::Query(
                "connection refused".to_string(),
            ))),
        )
    }

    async fn request(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_page() {
        let (status, body) = request(router(healthy_registry()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("every 30s"));
    }

    #[tokio::test]
    async fn test_load_data_renders_sorted_cards() {
        let (status, body) = request(router(healthy_registry()), "/load_data").await;
        assert_eq!(status, StatusCode::OK);
        let attic = body.find("Attic").unwrap();
        let bedroom = body.find("Bedroom").unwrap();
        assert!(attic < bedroom);
    }

    #[tokio::test]
    async fn test_load_data_failure_renders_no_data() {
        let (status, body) = request(router(failing_registry()), "/load_data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Data could not be loaded"));
        assert!(body.contains("c0"));
        assert!(!body.contains("Attic"));
    }

    #[tokio::test]
    async fn test_api_readings_json() {
        let (status, body) = request(router(healthy_registry()), "/api/readings").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let readings = json.as_array().unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0]["device_id"], "a2");
        assert_eq!(readings[0]["battery_class"], "THREE_QUARTER");
        assert_eq!(readings[0]["dew_point_label"], "Dew point");
        assert_eq!(readings[1]["temperature_c"], 20.0);
    }

    #[tokio::test]
    async fn test_api_readings_failure() {
        let (status, body) = request(router(failing_registry()), "/api/readings").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["device_id"], "c0");
    }
}
