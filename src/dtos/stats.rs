use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::inventory::parse::LenientText;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub pendientes: i64,
    pub en_proceso: i64,
    pub instalaciones_hoy: i64,
    pub soportes_activos: i64,
}

#[derive(Debug, Serialize)]
pub struct TemporaryKeyResponse {
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FactibilidadRequest {
    pub latitud: Option<LenientText>,
    pub longitud: Option<LenientText>,
}

#[derive(Debug, Serialize)]
pub struct NapSummary {
    pub id: i64,
    pub nombre_nap: String,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FactibilidadResponse {
    pub es_factible: bool,
    pub distancia_metros: f64,
    pub nap_cercana: NapSummary,
    pub cliente: Coordinates,
}
