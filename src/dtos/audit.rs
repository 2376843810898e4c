use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inventory::audit::{reconcile, VarianceStatus};
use crate::inventory::review::{InstallationSummary, SpoolLine};
use crate::models::audit::{AuditHeader, AuditItem, UnitType};

/// One line of an audit as shown to a supervisor.
#[derive(Debug, Serialize)]
pub struct AuditLineView {
    pub item_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub unit_type: String,
    pub assigned: f64,
    pub reported: f64,
    pub theoretical: f64,
    pub physical: Option<f64>,
    pub variance: Option<f64>,
    pub status: VarianceStatus,
    pub status_label: String,
    pub notes: Option<String>,
}

impl AuditLineView {
    pub fn from_counts(
        item_id: Option<Uuid>,
        product_id: Option<Uuid>,
        sku: String,
        name: String,
        unit_type: String,
        counts: (f64, f64, Option<f64>),
        notes: Option<String>,
    ) -> Self {
        let (assigned, reported, physical) = counts;
        let result = reconcile(assigned, reported, physical);
        Self {
            item_id,
            product_id,
            sku,
            name,
            unit_type,
            assigned,
            reported,
            theoretical: result.theoretical,
            physical,
            variance: result.variance,
            status: result.status,
            status_label: result.status.label(),
            notes,
        }
    }
}

impl From<AuditItem> for AuditLineView {
    fn from(item: AuditItem) -> Self {
        AuditLineView::from_counts(
            Some(item.id),
            item.product_id,
            item.product_sku,
            item.product_name,
            item.unit_type,
            (item.assigned_quantity, item.reported_quantity, item.physical_quantity),
            item.notes,
        )
    }
}

#[derive(Serialize)]
pub struct AuditSheetResponse {
    pub audit: Option<AuditHeader>,
    pub technician_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub members: Vec<Uuid>,
    pub lines: Vec<AuditLineView>,
    pub spools: Vec<SpoolLine>,
    pub installations: Vec<InstallationSummary>,
}

#[derive(Serialize)]
pub struct AuditDetailResponse {
    pub audit: AuditHeader,
    pub lines: Vec<AuditLineView>,
    pub spools: Vec<SpoolLine>,
    pub installations: Vec<InstallationSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeDayRequest {
    /// Supervisors may close on behalf of a technician; defaults to the caller.
    pub technician_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct FinalizeDayResponse {
    pub audit_id: Uuid,
    pub created: bool,
    pub items_added: usize,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditLineInput {
    /// Required when saving into an existing audit.
    pub item_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub assigned: f64,
    #[serde(default)]
    pub reported: f64,
    pub physical: Option<f64>,
    pub unit_type: Option<UnitType>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAuditRequest {
    pub audit_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub notes: Option<String>,
    pub items: Vec<AuditLineInput>,
    #[serde(default)]
    pub reconcile_stock: bool,
}

#[derive(Serialize)]
pub struct SaveAuditResponse {
    pub audit_id: Uuid,
    pub created: bool,
    pub adjustments: usize,
}

#[derive(Debug, Deserialize)]
pub struct PhysicalCountInput {
    pub id: Uuid,
    pub physical_quantity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveAuditRequest {
    #[serde(default)]
    pub items: Vec<PhysicalCountInput>,
    pub notes: Option<String>,
    #[serde(default)]
    pub spool_updates: Vec<crate::inventory::audit::SpoolCount>,
}
