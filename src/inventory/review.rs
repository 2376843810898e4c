//! What a supervisor sees next to an audit: live per-reel figures and the
//! installations filed during the audit's business day.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::audit::AuditItem;
use crate::models::report::{ConsumptionReport, ReportKind};

use super::audit::{reconcile, VarianceStatus};
use super::ledger::Ledger;
use super::parse::parse_lenient_opt;
use super::sku::is_spool;
use super::usage::UsageTally;

/// One reel as counted by a supervisor. `theoretical` and `reported` are the figures
/// a spool override is approved with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpoolLine {
    pub serial: String,
    /// Meters on the reel before any reported usage.
    pub base: f64,
    pub reported: f64,
    pub theoretical: f64,
    pub physical: Option<f64>,
    pub status: VarianceStatus,
    pub status_label: String,
}

impl SpoolLine {
    fn new(serial: &str, base: f64, reported: f64, physical: Option<f64>) -> Self {
        let result = reconcile(base, reported, physical);
        Self {
            serial: serial.to_string(),
            base,
            reported,
            theoretical: result.theoretical,
            physical,
            status: result.status,
            status_label: result.status.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallationSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub technician_id: Option<Uuid>,
    pub client: Option<String>,
    pub spool_serial: Option<String>,
    pub meters_used: i64,
    pub meters_discarded: i64,
    pub onu_serial: Option<String>,
}

/// Installation closures filed in `[from, to)`, oldest first.
pub fn installations_between(
    reports: &[ConsumptionReport],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<InstallationSummary> {
    let mut installations: Vec<InstallationSummary> = reports
        .iter()
        .filter(|r| r.kind == ReportKind::Installation && r.created_at >= from && r.created_at < to)
        .map(|r| InstallationSummary {
            id: r.id,
            created_at: r.created_at,
            technician_id: r.technician_id.or(r.user_id),
            client: r.client.clone(),
            spool_serial: r.spool().map(str::to_string),
            meters_used: parse_lenient_opt(r.meters_used.as_deref()),
            meters_discarded: parse_lenient_opt(r.meters_discarded.as_deref()),
            onu_serial: r.onu_serial.clone(),
        })
        .collect();
    installations.sort_by_key(|i| i.created_at);
    installations
}

/// Reels to count: every reel still held plus any reel used by the listed installations.
///
/// A completed audit keeps the figures it was approved with. Otherwise the live ledger
/// wins and only a saved physical count is carried over; a reel gone from the ledger
/// falls back to its saved line.
pub fn spool_breakdown(
    ledger: &Ledger,
    tally: &UsageTally,
    installations: &[InstallationSummary],
    saved: &[AuditItem],
    completed: bool,
) -> Vec<SpoolLine> {
    let mut serials: BTreeSet<&str> = ledger
        .entries()
        .filter(|(_, entry)| !entry.serials.is_empty())
        .filter_map(|(key, _)| key.spool_serial())
        .collect();
    serials.extend(installations.iter().filter_map(|i| i.spool_serial.as_deref()));

    serials
        .into_iter()
        .map(|serial| {
            let saved_line = saved.iter().find(|i| i.product_sku == serial);
            match (saved_line, ledger.spool(serial)) {
                (Some(item), _) if completed => {
                    SpoolLine::new(serial, item.assigned_quantity, item.reported_quantity, item.physical_quantity)
                }
                (saved_line, Some(entry)) => {
                    let reported = tally.for_spool(serial);
                    SpoolLine::new(
                        serial,
                        entry.quantity + reported,
                        reported,
                        saved_line.and_then(|i| i.physical_quantity),
                    )
                }
                (Some(item), None) => {
                    SpoolLine::new(serial, item.assigned_quantity, item.reported_quantity, item.physical_quantity)
                }
                (None, None) => SpoolLine::new(serial, 0.0, tally.for_spool(serial), None),
            }
        })
        .collect()
}

/// Audit lines minus the per-reel records, which are shown as spool lines instead.
pub fn without_spool_records(items: Vec<AuditItem>, spools: &[SpoolLine]) -> Vec<AuditItem> {
    items
        .into_iter()
        .filter(|i| !spools.iter().any(|s| s.serial == i.product_sku))
        .collect()
}

/// Pending audit lines refreshed against the reels: the first pooled cable line takes
/// the live totals and keeps any physical count already entered.
pub fn resync_pending(items: Vec<AuditItem>, spools: &[SpoolLine]) -> Vec<AuditItem> {
    let mut items = without_spool_records(items, spools);
    if spools.is_empty() {
        return items;
    }

    if let Some(cable) = items.iter_mut().find(|i| is_spool(&i.product_sku, &i.product_name)) {
        cable.assigned_quantity = spools.iter().map(|s| s.base).sum();
        cable.reported_quantity = spools.iter().map(|s| s.reported).sum();
    }
    items
}
