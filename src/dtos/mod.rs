pub mod audit;
pub mod field_report;
pub mod ledger;
pub mod planificacion;
pub mod solicitud;
pub mod stats;
