use axum::{routing::post, Router};

use crate::handlers::field_report::{create_reporte, create_soporte};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reportes", post(create_reporte))
        .route("/soportes", post(create_soporte))
}
