use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::planificacion::{assign, create_team, day_plan, delete_team, unassign, update_team};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/planificacion/assign", post(assign))
        .route("/planificacion/unassign", post(unassign))
        .route("/planificacion/team", post(create_team))
        .route("/planificacion/team/{letra}", put(update_team).delete(delete_team))
        .route("/planificacion/{fecha}", get(day_plan))
}
