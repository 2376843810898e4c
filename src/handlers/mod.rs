pub mod audit;
pub mod factibilidad;
pub mod field_report;
pub mod ledger;
pub mod planificacion;
pub mod records;
pub mod solicitud;
pub mod stats;
pub mod technician;
pub mod temporary_key;
