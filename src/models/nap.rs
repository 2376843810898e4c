use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NapBox {
    pub id: i64,
    pub nombre_caja: String,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
}
