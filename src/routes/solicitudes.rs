use axum::{routing::get, Router};

use crate::handlers::solicitud::{create_solicitud, get_solicitud, list_solicitudes, update_solicitud};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/solicitudes", get(list_solicitudes).post(create_solicitud))
        .route("/solicitudes/{id}", get(get_solicitud).put(update_solicitud))
}
