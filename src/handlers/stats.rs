use axum::extract::State;
use axum::Json;
use chrono::Utc;
use tracing::instrument;

use crate::dtos::stats::StatsResponse;
use crate::error::AppError;
use crate::inventory::audit::business_date;
use crate::models::solicitud::EstadoSolicitud;
use crate::state::AppState;

/// Dashboard counters; "today" is the business day, not the UTC day.
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let today = business_date(Utc::now(), state.config.offset());
    let pool = &state.db_pool;
    let count_by_status = "SELECT COUNT(*) FROM solicitudes WHERE estado_solicitud = $1";

    let (pendientes, en_proceso, instalaciones_hoy, soportes_activos) = tokio::try_join!(
        sqlx::query_scalar::<_, i64>(count_by_status)
            .bind(EstadoSolicitud::Pendiente.to_string())
            .fetch_one(pool),
        sqlx::query_scalar::<_, i64>(count_by_status)
            .bind(EstadoSolicitud::Planificada.to_string())
            .fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reportes_instalacion WHERE fecha_reporte = $1")
            .bind(today)
            .fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reportes_soporte WHERE fecha_reporte = $1")
            .bind(today)
            .fetch_one(pool),
    )?;

    Ok(Json(StatsResponse { pendientes, en_proceso, instalaciones_hoy, soportes_activos }))
}
