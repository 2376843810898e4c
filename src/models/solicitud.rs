use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};

/// Lifecycle of an installation request; stored as the display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum EstadoSolicitud {
    Pendiente,
    Planificada,
    Instalado,
}

/// Installation request joined with its technicians' names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Solicitud {
    pub id: i64,
    pub nombre_cliente: String,
    pub cedula: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub plan: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    pub observaciones: Option<String>,
    pub fecha_disponibilidad: Option<NaiveDate>,
    pub fecha_asignada: Option<NaiveDate>,
    pub equipo: Option<String>,
    pub tecnico_1_id: Option<i64>,
    pub tecnico_2_id: Option<i64>,
    pub estado_solicitud: String,
    pub reporte_id: Option<i64>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub tecnico_1_nombre: Option<String>,
    pub tecnico_2_nombre: Option<String>,
}

pub const SOLICITUD_SELECT: &str = r#"
    SELECT s.id, s.nombre_cliente, s.cedula, s.telefono, s.direccion, s.plan, s.latitud, s.longitud,
           s.observaciones, s.fecha_disponibilidad, s.fecha_asignada, s.equipo, s.tecnico_1_id,
           s.tecnico_2_id, s.estado_solicitud, s.reporte_id, s.fecha_creacion, s.fecha_actualizacion,
           t1.nombre AS tecnico_1_nombre, t2.nombre AS tecnico_2_nombre
    FROM solicitudes s
    LEFT JOIN technicians t1 ON t1.id = s.tecnico_1_id
    LEFT JOIN technicians t2 ON t2.id = s.tecnico_2_id"#;
