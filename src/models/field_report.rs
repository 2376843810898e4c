use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InstallationReport {
    pub id: i64,
    pub solicitud_id: i64,
    pub fecha_reporte: NaiveDate,
    pub hora_reporte: Option<String>,
    pub equipo_letra: Option<String>,
    pub nombre_cliente: Option<String>,
    pub pw_asignado: Option<String>,
    pub precinto: Option<String>,
    pub onu_pon: Option<String>,
    pub router: Option<String>,
    pub mac: Option<String>,
    pub plan_contratado: Option<String>,
    pub velocidad_descarga_mbps: Option<f64>,
    pub velocidad_subida_mbps: Option<f64>,
    pub potencia_nap: Option<f64>,
    pub potencia_cliente: Option<f64>,
    pub metraje_utilizado_m: Option<i64>,
    pub metraje_desechado_m: Option<i64>,
    pub tensores_utilizados: Option<i64>,
    pub estado_instalacion: Option<String>,
    pub metodo_pago: Option<String>,
    pub tecnico_1_id: Option<i64>,
    pub tecnico_2_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupportReport {
    pub id: i64,
    pub fecha_reporte: NaiveDate,
    pub hora_reporte: Option<String>,
    pub nombre_cliente: Option<String>,
    pub coordenadas: Option<String>,
    pub precinto: Option<String>,
    pub caja_nap: Option<String>,
    pub cantidad_puertos_nap: Option<i64>,
    pub puerto_cliente: Option<i64>,
    pub potencia_dbm: Option<f64>,
    pub zona: Option<String>,
    pub estatus_visita: Option<String>,
    pub causa_problema: Option<String>,
    pub accion_realizada: Option<String>,
    pub conectores_utilizados: Option<i64>,
    pub metraje_utilizado_m: Option<i64>,
    pub observaciones: Option<String>,
    pub realizado_por_tecnico: Option<String>,
    pub created_at: DateTime<Utc>,
}
