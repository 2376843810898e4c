use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{error, info, instrument};

use crate::dtos::field_report::{CreateReporteRequest, CreateSoporteRequest, ReporteCreated, SoporteCreated};
use crate::error::AppError;
use crate::handlers::solicitud::{fetch_solicitud, lenient_float, lenient_int};
use crate::models::field_report::{InstallationReport, SupportReport};
use crate::models::solicitud::EstadoSolicitud;
use crate::state::AppState;

/// Files an installation report and marks its request as installed.
#[instrument(skip(state, req))]
pub async fn create_reporte(
    State(state): State<AppState>,
    Json(req): Json<CreateReporteRequest>,
) -> Result<(StatusCode, Json<ReporteCreated>), AppError> {
    let solicitud_id = req
        .solicitud_id
        .to_int()
        .ok_or_else(|| AppError::validation("solicitud_id is required"))?;
    let tecnico_1_id = req
        .tecnico_1_id
        .to_int()
        .ok_or_else(|| AppError::validation("tecnico_1_id is required"))?;
    let pool = &state.db_pool;

    let reporte = sqlx::query_as::<_, InstallationReport>(
        r#"INSERT INTO reportes_instalacion
            (solicitud_id, fecha_reporte, hora_reporte, equipo_letra, nombre_cliente, pw_asignado, precinto, onu_pon,
             router, mac, plan_contratado, velocidad_descarga_mbps, velocidad_subida_mbps, potencia_nap,
             potencia_cliente, metraje_utilizado_m, metraje_desechado_m, tensores_utilizados,
             estado_instalacion, metodo_pago, tecnico_1_id, tecnico_2_id)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
           RETURNING *"#,
    )
    .bind(solicitud_id)
    .bind(req.fecha_reporte)
    .bind(&req.hora_reporte)
    .bind(&req.equipo)
    .bind(&req.nombre_cliente)
    .bind(&req.pw_asignado)
    .bind(&req.precinto)
    .bind(&req.onu_pon)
    .bind(&req.router)
    .bind(&req.mac)
    .bind(&req.plan_contratado)
    .bind(lenient_float(&req.velocidad_descarga_mbps))
    .bind(lenient_float(&req.velocidad_subida_mbps))
    .bind(lenient_float(&req.potencia_nap))
    .bind(lenient_float(&req.potencia_cliente))
    .bind(lenient_int(&req.metraje_utilizado_m))
    .bind(lenient_int(&req.metraje_desechado_m))
    .bind(lenient_int(&req.tensores_utilizados))
    .bind(&req.estado_instalacion)
    .bind(&req.metodo_pago)
    .bind(tecnico_1_id)
    .bind(lenient_int(&req.tecnico_2_id))
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            AppError::validation("The referenced request does not exist")
        }
        other => {
            error!(e = ?other, "Could not insert installation report");
            AppError::db(other)
        }
    })?;

    // The report stays even if linking the request fails.
    sqlx::query(
        "UPDATE solicitudes SET estado_solicitud = $2, reporte_id = $3, fecha_actualizacion = NOW() WHERE id = $1",
    )
    .bind(solicitud_id)
    .bind(EstadoSolicitud::Instalado.to_string())
    .bind(reporte.id)
    .execute(pool)
    .await?;

    let solicitud = fetch_solicitud(pool, solicitud_id).await?;
    info!(reporte_id = reporte.id, solicitud_id, "Installation reported");
    Ok((
        StatusCode::CREATED,
        Json(ReporteCreated { message: "Installation report created".to_string(), reporte, solicitud }),
    ))
}

#[instrument(skip(state, req))]
pub async fn create_soporte(
    State(state): State<AppState>,
    Json(req): Json<CreateSoporteRequest>,
) -> Result<(StatusCode, Json<SoporteCreated>), AppError> {
    let reporte = sqlx::query_as::<_, SupportReport>(
        r#"INSERT INTO reportes_soporte
            (fecha_reporte, hora_reporte, nombre_cliente, coordenadas, precinto, caja_nap,
             cantidad_puertos_nap, puerto_cliente, potencia_dbm, zona, estatus_visita, causa_problema,
             accion_realizada, conectores_utilizados, metraje_utilizado_m, observaciones, realizado_por_tecnico)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
           RETURNING *"#,
    )
    .bind(req.fecha_reporte)
    .bind(&req.hora_reporte)
    .bind(&req.nombre_cliente)
    .bind(&req.coordenadas)
    .bind(&req.precinto)
    .bind(&req.caja_nap)
    .bind(lenient_int(&req.cantidad_puertos_nap))
    .bind(lenient_int(&req.puerto_cliente))
    .bind(lenient_float(&req.potencia_dbm))
    .bind(&req.zona)
    .bind(&req.estatus_visita)
    .bind(&req.causa_problema)
    .bind(&req.accion_realizada)
    .bind(lenient_int(&req.conectores_utilizados))
    .bind(lenient_int(&req.metraje_utilizado_m))
    .bind(&req.observaciones)
    .bind(&req.realizado_por_tecnico)
    .fetch_one(&state.db_pool)
    .await?;

    info!(reporte_id = reporte.id, "Support visit reported");
    Ok((
        StatusCode::CREATED,
        Json(SoporteCreated { message: "Support report created".to_string(), reporte }),
    ))
}
