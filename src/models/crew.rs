use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Technician {
    pub id: i64,
    pub nombre: String,
}

/// Dispatch crew, identified by its letter.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipo {
    pub letra: String,
    pub tecnico_1_id: Option<i64>,
    pub tecnico_2_id: Option<i64>,
    pub fecha_actualizacion: DateTime<Utc>,
}
