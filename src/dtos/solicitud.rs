use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::inventory::parse::LenientText;
use crate::models::solicitud::{EstadoSolicitud, Solicitud};

#[derive(Debug, Deserialize)]
pub struct CreateSolicitudRequest {
    pub nombre_cliente: String,
    pub cedula: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub plan: Option<String>,
    pub latitud: Option<LenientText>,
    pub longitud: Option<LenientText>,
    pub observaciones: Option<String>,
    pub fecha_disponibilidad: Option<NaiveDate>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSolicitudRequest {
    pub nombre_cliente: Option<String>,
    pub cedula: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub plan: Option<String>,
    pub latitud: Option<LenientText>,
    pub longitud: Option<LenientText>,
    pub observaciones: Option<String>,
    pub fecha_disponibilidad: Option<NaiveDate>,
    pub fecha_asignada: Option<NaiveDate>,
    pub equipo: Option<String>,
    pub tecnico_1_id: Option<LenientText>,
    pub tecnico_2_id: Option<LenientText>,
    pub estado_solicitud: Option<EstadoSolicitud>,
}

#[derive(Serialize)]
pub struct SolicitudMutation {
    pub message: String,
    pub id: i64,
    pub data: Solicitud,
}
