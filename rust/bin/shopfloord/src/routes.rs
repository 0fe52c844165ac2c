//! Route registration: module routes plus system endpoints.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Merge module routers (paths are absolute) with `/health` and `/version`.
pub fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        tracing::debug!("mounting module {}", name);
        app = app.merge(router);
    }

    app.layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "shopfloord",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use shopfloor_blob::FileStore;
    use shopfloor_core::Module;
    use shopfloor_machine::service::{MachineService, RegistryConfig};
    use shopfloor_machine::MachineModule;
    use shopfloor_sql::SqliteStore;
    use tower::ServiceExt;

    use super::*;

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn system_endpoints() {
        let app = build_router(Vec::new());

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(&app, "/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "shopfloord");
    }

    #[tokio::test]
    async fn machine_module_is_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let svc = MachineService::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(FileStore::open(dir.path()).unwrap()),
            RegistryConfig::default(),
        )
        .unwrap();
        let module = MachineModule::new(svc);
        let app = build_router(vec![(module.name(), module.routes())]);

        let (status, body) = get_json(&app, "/api/machines").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let (status, body) = get_json(&app, "/api/machines/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
