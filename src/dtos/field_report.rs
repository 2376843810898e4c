use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::inventory::parse::LenientText;
use crate::models::field_report::{InstallationReport, SupportReport};
use crate::models::solicitud::Solicitud;

/// Numeric fields arrive as form text or numbers; both are accepted.
#[derive(Debug, Deserialize)]
pub struct CreateReporteRequest {
    pub solicitud_id: LenientText,
    pub fecha_reporte: NaiveDate,
    pub hora_reporte: Option<String>,
    pub equipo: Option<String>,
    pub nombre_cliente: Option<String>,
    pub pw_asignado: Option<String>,
    pub mac: Option<String>,
    pub precinto: Option<String>,
    pub onu_pon: Option<String>,
    pub router: Option<String>,
    pub plan_contratado: Option<String>,
    pub velocidad_descarga_mbps: Option<LenientText>,
    pub velocidad_subida_mbps: Option<LenientText>,
    pub potencia_nap: Option<LenientText>,
    pub potencia_cliente: Option<LenientText>,
    pub metraje_utilizado_m: Option<LenientText>,
    pub metraje_desechado_m: Option<LenientText>,
    pub estado_instalacion: Option<String>,
    pub tensores_utilizados: Option<LenientText>,
    pub metodo_pago: Option<String>,
    pub tecnico_1_id: LenientText,
    pub tecnico_2_id: Option<LenientText>,
}

#[derive(Serialize)]
pub struct ReporteCreated {
    pub message: String,
    pub reporte: InstallationReport,
    pub solicitud: Solicitud,
}

#[derive(Debug, Deserialize)]
pub struct CreateSoporteRequest {
    pub fecha_reporte: NaiveDate,
    pub hora_reporte: Option<String>,
    pub nombre_cliente: Option<String>,
    pub coordenadas: Option<String>,
    pub precinto: Option<String>,
    pub caja_nap: Option<String>,
    pub cantidad_puertos_nap: Option<LenientText>,
    pub puerto_cliente: Option<LenientText>,
    pub potencia_dbm: Option<LenientText>,
    pub zona: Option<String>,
    pub estatus_visita: Option<String>,
    pub causa_problema: Option<String>,
    pub accion_realizada: Option<String>,
    pub conectores_utilizados: Option<LenientText>,
    pub metraje_utilizado_m: Option<LenientText>,
    pub observaciones: Option<String>,
    pub realizado_por_tecnico: Option<String>,
}

#[derive(Serialize)]
pub struct SoporteCreated {
    pub message: String,
    pub reporte: SupportReport,
}
