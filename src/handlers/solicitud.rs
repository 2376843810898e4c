use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::PgPool;
use tracing::{error, instrument};

use crate::dtos::solicitud::{CreateSolicitudRequest, SolicitudMutation, UpdateSolicitudRequest};
use crate::error::AppError;
use crate::inventory::parse::LenientText;
use crate::models::solicitud::{EstadoSolicitud, Solicitud, SOLICITUD_SELECT};
use crate::state::AppState;

pub(crate) fn lenient_int(value: &Option<LenientText>) -> Option<i64> {
    value.as_ref().and_then(LenientText::to_int)
}

pub(crate) fn lenient_float(value: &Option<LenientText>) -> Option<f64> {
    value.as_ref().and_then(LenientText::to_float)
}

pub(crate) async fn fetch_solicitud(pool: &PgPool, id: i64) -> Result<Solicitud, AppError> {
    sqlx::query_as::<_, Solicitud>(&format!("{SOLICITUD_SELECT} WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))
}

#[instrument(skip(state, req))]
pub async fn create_solicitud(
    State(state): State<AppState>,
    Json(req): Json<CreateSolicitudRequest>,
) -> Result<(StatusCode, Json<SolicitudMutation>), AppError> {
    if req.nombre_cliente.trim().is_empty() {
        return Err(AppError::validation("Client name is required"));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO solicitudes
            (nombre_cliente, cedula, telefono, direccion, plan, latitud, longitud,
             observaciones, fecha_disponibilidad, estado_solicitud)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
           RETURNING id"#,
    )
    .bind(req.nombre_cliente.trim())
    .bind(&req.cedula)
    .bind(&req.telefono)
    .bind(&req.direccion)
    .bind(&req.plan)
    .bind(lenient_float(&req.latitud))
    .bind(lenient_float(&req.longitud))
    .bind(&req.observaciones)
    .bind(req.fecha_disponibilidad)
    .bind(EstadoSolicitud::Pendiente.to_string())
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        error!(?e, "Could not insert request");
        AppError::db(e)
    })?;

    let data = fetch_solicitud(&state.db_pool, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(SolicitudMutation { message: "Request created".to_string(), id, data }),
    ))
}

#[instrument(skip(state))]
pub async fn list_solicitudes(State(state): State<AppState>) -> Result<Json<Vec<Solicitud>>, AppError> {
    let rows = sqlx::query_as::<_, Solicitud>(&format!("{SOLICITUD_SELECT} ORDER BY s.fecha_creacion DESC"))
        .fetch_all(&state.db_pool)
        .await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_solicitud(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Solicitud>, AppError> {
    fetch_solicitud(&state.db_pool, id).await.map(Json)
}

#[instrument(skip(state, req))]
pub async fn update_solicitud(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSolicitudRequest>,
) -> Result<Json<SolicitudMutation>, AppError> {
    let updated = sqlx::query_scalar::<_, i64>(
        r#"UPDATE solicitudes SET
             nombre_cliente = COALESCE($2, nombre_cliente),
             cedula = COALESCE($3, cedula),
             telefono = COALESCE($4, telefono),
             direccion = COALESCE($5, direccion),
             plan = COALESCE($6, plan),
             latitud = COALESCE($7, latitud),
             longitud = COALESCE($8, longitud),
             observaciones = COALESCE($9, observaciones),
             fecha_disponibilidad = COALESCE($10, fecha_disponibilidad),
             fecha_asignada = COALESCE($11, fecha_asignada),
             equipo = COALESCE($12, equipo),
             tecnico_1_id = COALESCE($13, tecnico_1_id),
             tecnico_2_id = COALESCE($14, tecnico_2_id),
             estado_solicitud = COALESCE($15, estado_solicitud),
             fecha_actualizacion = NOW()
           WHERE id = $1
           RETURNING id"#,
    )
    .bind(id)
    .bind(&req.nombre_cliente)
    .bind(&req.cedula)
    .bind(&req.telefono)
    .bind(&req.direccion)
    .bind(&req.plan)
    .bind(lenient_float(&req.latitud))
    .bind(lenient_float(&req.longitud))
    .bind(&req.observaciones)
    .bind(req.fecha_disponibilidad)
    .bind(req.fecha_asignada)
    .bind(&req.equipo)
    .bind(lenient_int(&req.tecnico_1_id))
    .bind(lenient_int(&req.tecnico_2_id))
    .bind(req.estado_solicitud.map(|e| e.to_string()))
    .fetch_optional(&state.db_pool)
    .await?;

    let Some(id) = updated else {
        return Err(AppError::not_found("Request not found"));
    };
    let data = fetch_solicitud(&state.db_pool, id).await?;
    Ok(Json(SolicitudMutation { message: "Request updated".to_string(), id, data }))
}
