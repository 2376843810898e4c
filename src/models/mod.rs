pub mod assignment;
pub mod audit;
pub mod crew;
pub mod field_report;
pub mod nap;
pub mod product;
pub mod report;
pub mod return_record;
pub mod solicitud;
