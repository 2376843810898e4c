use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::dtos::planificacion::{
    AssignRequest, CreateTeamRequest, DayPlanResponse, MessageResponse, PlannedSolicitud, UnassignRequest,
    UpdateTeamRequest,
};
use crate::error::{map_unique_violation, AppError};
use crate::handlers::solicitud::{fetch_solicitud, lenient_int};
use crate::inventory::parse::LenientText;
use crate::models::crew::{Equipo, Technician};
use crate::models::solicitud::{EstadoSolicitud, Solicitud, SOLICITUD_SELECT};
use crate::state::AppState;

const EQUIPO_COLUMNS: &str = "letra, tecnico_1_id, tecnico_2_id, fecha_actualizacion";

/// Accepts only real calendar dates written as `YYYY-MM-DD`.
pub fn parse_plan_date(raw: &str) -> Result<NaiveDate, AppError> {
    let well_formed = raw.len() == 10
        && raw.char_indices().all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(AppError::validation("Invalid date format, use YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AppError::validation("Invalid date, it must be a real calendar day"))
}

fn required_id(value: &LenientText, field: &str) -> Result<i64, AppError> {
    value.to_int().ok_or_else(|| AppError::validation(format!("{field} is required")))
}

#[instrument(skip(state))]
pub async fn day_plan(State(state): State<AppState>, Path(fecha): Path<String>) -> Result<Json<DayPlanResponse>, AppError> {
    let day = parse_plan_date(&fecha)?;
    let pool = &state.db_pool;

    let solicitudes_sql = format!(
        "{SOLICITUD_SELECT} WHERE s.fecha_disponibilidad = $1 OR s.fecha_asignada = $1 ORDER BY s.fecha_creacion DESC"
    );
    let equipos_sql = format!("SELECT {EQUIPO_COLUMNS} FROM equipos ORDER BY letra");

    let (solicitudes, technicians, equipos) = tokio::try_join!(
        sqlx::query_as::<_, Solicitud>(&solicitudes_sql).bind(day).fetch_all(pool),
        sqlx::query_as::<_, Technician>("SELECT id, nombre FROM technicians WHERE activo ORDER BY nombre")
            .fetch_all(pool),
        sqlx::query_as::<_, Equipo>(&equipos_sql).fetch_all(pool),
    )?;

    let crews: HashMap<&str, &Equipo> = equipos.iter().map(|e| (e.letra.as_str(), e)).collect();
    let solicitudes = solicitudes
        .into_iter()
        .map(|solicitud| {
            let crew = solicitud.equipo.as_deref().and_then(|letra| crews.get(letra));
            PlannedSolicitud {
                team_tecnico_1_id: crew.and_then(|c| c.tecnico_1_id),
                team_tecnico_2_id: crew.and_then(|c| c.tecnico_2_id),
                solicitud,
            }
        })
        .collect();

    Ok(Json(DayPlanResponse { solicitudes, technicians, equipos }))
}

#[instrument(skip(state, req))]
pub async fn assign(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<MessageResponse<Solicitud>>, AppError> {
    let solicitud_id = required_id(&req.solicitud_id, "solicitud_id")?;
    if req.equipo.trim().is_empty() {
        return Err(AppError::validation("A crew is required"));
    }

    let updated = sqlx::query(
        r#"UPDATE solicitudes
           SET estado_solicitud = $2, equipo = $3, tecnico_1_id = $4, tecnico_2_id = $5,
               fecha_asignada = $6, fecha_actualizacion = NOW()
           WHERE id = $1"#,
    )
    .bind(solicitud_id)
    .bind(EstadoSolicitud::Planificada.to_string())
    .bind(req.equipo.trim())
    .bind(lenient_int(&req.tecnico1))
    .bind(lenient_int(&req.tecnico2))
    .bind(req.fecha_asignada)
    .execute(&state.db_pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::not_found("Request not found"));
    }
    let data = fetch_solicitud(&state.db_pool, solicitud_id).await?;
    Ok(Json(MessageResponse { message: "Request assigned".to_string(), data }))
}

#[instrument(skip(state, req))]
pub async fn unassign(
    State(state): State<AppState>,
    Json(req): Json<UnassignRequest>,
) -> Result<Json<MessageResponse<Solicitud>>, AppError> {
    let solicitud_id = required_id(&req.solicitud_id, "solicitud_id")?;

    let updated = sqlx::query(
        r#"UPDATE solicitudes
           SET estado_solicitud = $2, equipo = NULL, tecnico_1_id = NULL, tecnico_2_id = NULL,
               fecha_asignada = NULL, fecha_actualizacion = NOW()
           WHERE id = $1"#,
    )
    .bind(solicitud_id)
    .bind(EstadoSolicitud::Pendiente.to_string())
    .execute(&state.db_pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::not_found("Request not found"));
    }
    let data = fetch_solicitud(&state.db_pool, solicitud_id).await?;
    Ok(Json(MessageResponse { message: "Request unassigned".to_string(), data }))
}

#[instrument(skip(state, req))]
pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<MessageResponse<Equipo>>), AppError> {
    let letra = req.letra.trim();
    if letra.is_empty() {
        return Err(AppError::validation("Crew letter is required"));
    }

    let equipo = sqlx::query_as::<_, Equipo>(&format!(
        "INSERT INTO equipos (letra, tecnico_1_id, tecnico_2_id) VALUES ($1, $2, $3) RETURNING {EQUIPO_COLUMNS}"
    ))
    .bind(letra)
    .bind(lenient_int(&req.tecnico_1_id))
    .bind(lenient_int(&req.tecnico_2_id))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Crew letter already exists"))?;

    info!(letra = %equipo.letra, "Crew created");
    Ok((StatusCode::CREATED, Json(MessageResponse { message: "Crew created".to_string(), data: equipo })))
}

#[instrument(skip(state, req))]
pub async fn update_team(
    State(state): State<AppState>,
    Path(letra): Path<String>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<MessageResponse<Equipo>>, AppError> {
    let slot = |value: &Option<Option<LenientText>>| -> (bool, Option<i64>) {
        match value {
            None => (false, None),
            Some(inner) => (true, inner.as_ref().and_then(LenientText::to_int)),
        }
    };
    let (set_1, tecnico_1) = slot(&req.tecnico_1_id);
    let (set_2, tecnico_2) = slot(&req.tecnico_2_id);

    let equipo = sqlx::query_as::<_, Equipo>(&format!(
        r#"UPDATE equipos SET
             tecnico_1_id = CASE WHEN $2 THEN $3 ELSE tecnico_1_id END,
             tecnico_2_id = CASE WHEN $4 THEN $5 ELSE tecnico_2_id END,
             fecha_actualizacion = NOW()
           WHERE letra = $1
           RETURNING {EQUIPO_COLUMNS}"#
    ))
    .bind(&letra)
    .bind(set_1)
    .bind(tecnico_1)
    .bind(set_2)
    .bind(tecnico_2)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Crew not found"))?;

    Ok(Json(MessageResponse { message: "Crew updated".to_string(), data: equipo }))
}

/// Removes a crew after sending its requests back to the pending queue.
#[instrument(skip(state))]
pub async fn delete_team(State(state): State<AppState>, Path(letra): Path<String>) -> Result<Json<Value>, AppError> {
    let released = sqlx::query(
        r#"UPDATE solicitudes
           SET estado_solicitud = $2, equipo = NULL, tecnico_1_id = NULL, tecnico_2_id = NULL,
               fecha_asignada = NULL, fecha_actualizacion = NOW()
           WHERE equipo = $1"#,
    )
    .bind(&letra)
    .bind(EstadoSolicitud::Pendiente.to_string())
    .execute(&state.db_pool)
    .await?;

    let deleted = sqlx::query("DELETE FROM equipos WHERE letra = $1")
        .bind(&letra)
        .execute(&state.db_pool)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::not_found("Crew not found"));
    }

    info!(%letra, released = released.rows_affected(), "Crew deleted");
    Ok(Json(json!({ "message": format!("Crew {letra} deleted and its requests unassigned") })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_dates_must_be_real_and_well_formed() {
        assert_eq!(parse_plan_date("2026-03-02").unwrap(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert!(matches!(parse_plan_date("2026-3-2"), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_plan_date("2024-02-30"), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_plan_date("02/03/2026"), Err(AppError::ValidationError(_))));
    }
}
