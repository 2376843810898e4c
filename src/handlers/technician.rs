use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::error::AppError;
use crate::models::crew::Technician;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_technicians(State(state): State<AppState>) -> Result<Json<Vec<Technician>>, AppError> {
    let technicians =
        sqlx::query_as::<_, Technician>("SELECT id, nombre FROM technicians WHERE activo ORDER BY nombre ASC")
            .fetch_all(&state.db_pool)
            .await?;
    Ok(Json(technicians))
}
