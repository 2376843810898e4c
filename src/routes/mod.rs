pub mod dashboard;
pub mod field_reports;
pub mod inventory;
pub mod planificacion;
pub mod solicitudes;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Everything served under `/api`. Inventory routes carry their own auth layer.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(inventory::routes())
        .merge(solicitudes::routes())
        .merge(planificacion::routes())
        .merge(field_reports::routes())
        .merge(dashboard::routes())
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_router())
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool");
        build_app(AppState::new(pool, config))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_responds_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn temporary_key_is_fresh_json() {
        let response = app()
            .oneshot(Request::builder().uri("/api/temporary-key").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["key"].as_str().map(str::len), Some(6));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn feasibility_requires_coordinates() {
        let response = app()
            .oneshot(post_json("/api/factibilidad", r#"{"latitud": "10.5"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Latitude or longitude is missing");
    }

    #[tokio::test]
    async fn plan_rejects_malformed_dates() {
        let response = app()
            .oneshot(Request::builder().uri("/api/planificacion/2026-13-40").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inventory_routes_require_a_token() {
        let ledger = app()
            .oneshot(
                Request::builder()
                    .uri("/api/technicians/6f1c1c1e-6c55-4f4e-9d57-3a1f6f0f8a11/ledger")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ledger.status(), StatusCode::UNAUTHORIZED);

        let finalize = app().oneshot(post_json("/api/audits/finalize-day", "{}")).await.unwrap();
        assert_eq!(finalize.status(), StatusCode::UNAUTHORIZED);
    }
}
