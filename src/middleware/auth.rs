use axum::body::Body;
use axum::http::{Request, StatusCode};
use http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::verify_token;

const SUPERVISOR_ROLES: [&str; 2] = ["supervisor", "admin"];

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: String,
    pub username: String,
}

impl AuthContext {
    /// Supervisors and admins may save and approve audits.
    pub fn is_supervisor(&self) -> bool {
        SUPERVISOR_ROLES.iter().any(|r| self.role.eq_ignore_ascii_case(r))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

pub async fn require_auth(mut req: Request<Body>, next: Next) -> Response {
    let auth_header = match req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return unauthorized("Invalid Authorization format"),
    };

    let secret = match std::env::var("JWT_SECRET") {
        Ok(s) => s,
        Err(_) => {
            tracing::error!("JWT_SECRET is not set; rejecting authenticated request");
            return unauthorized("Server auth misconfiguration");
        }
    };

    let claims = match verify_token(token, &secret) {
        Ok(c) => c,
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        role: claims.role,
        username: claims.username,
    });

    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code: "unauthorized" });
    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
        auth.username
    }

    fn app() -> Router {
        Router::new()
            .route("/me", get(whoami))
            .route_layer(axum::middleware::from_fn(require_auth))
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let response = app()
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn supervisor_roles_are_case_insensitive() {
        let ctx = |role: &str| AuthContext { user_id: Uuid::nil(), role: role.into(), username: "x".into() };
        assert!(ctx("Supervisor").is_supervisor());
        assert!(ctx("admin").is_supervisor());
        assert!(!ctx("technician").is_supervisor());
    }
}
