use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::dtos::stats::{FactibilidadRequest, FactibilidadResponse, NapSummary};
use crate::error::AppError;
use crate::geo::{assess, nearest_nap, Coordinates};
use crate::handlers::solicitud::lenient_float;
use crate::models::nap::NapBox;
use crate::state::AppState;

/// Client coordinates, rejecting missing or zero values like the intake form does.
pub fn client_coordinates(req: &FactibilidadRequest) -> Result<Coordinates, AppError> {
    match (lenient_float(&req.latitud), lenient_float(&req.longitud)) {
        (Some(latitud), Some(longitud)) if latitud != 0.0 && longitud != 0.0 => Ok(Coordinates { latitud, longitud }),
        _ => Err(AppError::validation("Latitude or longitude is missing")),
    }
}

#[instrument(skip(state))]
pub async fn factibilidad(
    State(state): State<AppState>,
    Json(req): Json<FactibilidadRequest>,
) -> Result<Json<FactibilidadResponse>, AppError> {
    let cliente = client_coordinates(&req)?;

    let boxes = sqlx::query_as::<_, NapBox>("SELECT id, nombre_caja, latitud, longitud FROM cajas_nap")
        .fetch_all(&state.db_pool)
        .await?;
    if boxes.is_empty() {
        return Err(AppError::not_found("No NAP boxes found"));
    }

    let (nap, distance) =
        nearest_nap(cliente, &boxes).ok_or_else(|| AppError::not_found("No NAP box has coordinates"))?;
    let verdict = assess(distance, state.config.feasibility_max_distance_m);

    Ok(Json(FactibilidadResponse {
        es_factible: verdict.es_factible,
        distancia_metros: verdict.distancia_metros,
        nap_cercana: NapSummary {
            id: nap.id,
            nombre_nap: nap.nombre_caja.clone(),
            latitud: nap.latitud,
            longitud: nap.longitud,
        },
        cliente,
    }))
}
