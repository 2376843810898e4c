//! Field operations backend: technician inventory ledgers, daily audits, and the
//! dispatch endpoints used by the installation crews.

pub mod auth;
pub mod config;
pub mod database;
pub mod dtos;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod inventory;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
