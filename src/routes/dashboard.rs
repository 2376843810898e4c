use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::factibilidad::factibilidad;
use crate::handlers::stats::stats;
use crate::handlers::technician::list_technicians;
use crate::handlers::temporary_key::temporary_key;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/technicians", get(list_technicians))
        .route("/temporary-key", get(temporary_key))
        .route("/factibilidad", post(factibilidad))
}
