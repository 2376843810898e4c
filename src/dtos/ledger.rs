use serde::Serialize;
use uuid::Uuid;

use crate::inventory::kit::KitStatus;
use crate::inventory::ledger::{ItemKey, LedgerEntry};

#[derive(Serialize)]
pub struct LedgerLine {
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub serials: Vec<String>,
    pub waste: f64,
    pub spool_serial: Option<String>,
}

impl LedgerLine {
    pub fn new(key: &ItemKey, entry: &LedgerEntry) -> Self {
        Self {
            sku: key.sku().to_string(),
            name: entry.name.clone(),
            quantity: entry.quantity,
            serials: entry.serials.clone(),
            waste: entry.waste,
            spool_serial: key.spool_serial().map(str::to_string),
        }
    }
}

#[derive(Serialize)]
pub struct LedgerResponse {
    pub technician_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
    pub items: Vec<LedgerLine>,
    pub kit: KitStatus,
}
