//! Supervisor reconciliation: theoretical stock against a physical count, and the
//! single-audit-per-day batching used when technicians close their day.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::models::assignment::Assignment;
use crate::models::audit::{AuditHeader, UnitType};
use crate::models::product::Product;
use crate::models::report::ConsumptionReport;

use super::sku::{is_spool, KpiKey};
use super::usage::UsageTally;

/// Differences smaller than this are floating point noise from split spool lines.
const VARIANCE_EPSILON: f64 = 1e-6;

pub const INITIAL_DAY_CLOSE_NOTE: &str = "Day close (initial)";
const DAY_CLOSE_NOTE: &str = "Day close";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "amount", rename_all = "snake_case")]
pub enum VarianceStatus {
    /// No physical count entered yet; not the same as counting zero.
    Uncounted,
    Reconciled,
    Shortage(f64),
    Overage(f64),
}

impl VarianceStatus {
    pub fn from_variance(variance: f64) -> Self {
        if variance.abs() < VARIANCE_EPSILON {
            VarianceStatus::Reconciled
        } else if variance < 0.0 {
            VarianceStatus::Shortage(-variance)
        } else {
            VarianceStatus::Overage(variance)
        }
    }

    pub fn label(&self) -> String {
        match self {
            VarianceStatus::Uncounted => "not counted".to_string(),
            VarianceStatus::Reconciled => "reconciled".to_string(),
            VarianceStatus::Shortage(n) => format!("shortage of {}", format_quantity(*n)),
            VarianceStatus::Overage(n) => format!("overage of {}", format_quantity(*n)),
        }
    }
}

fn format_quantity(n: f64) -> String {
    if n.fract().abs() < VARIANCE_EPSILON {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineReconciliation {
    pub assigned: f64,
    pub reported: f64,
    /// Assigned minus reported; negative means more was reported than ever issued.
    pub theoretical: f64,
    pub physical: Option<f64>,
    pub variance: Option<f64>,
    pub status: VarianceStatus,
}

pub fn theoretical_quantity(assigned: f64, reported: f64) -> f64 {
    assigned - reported
}

pub fn reconcile(assigned: f64, reported: f64, physical: Option<f64>) -> LineReconciliation {
    let theoretical = theoretical_quantity(assigned, reported);
    let variance = physical.map(|count| count - theoretical);
    let status = variance.map_or(VarianceStatus::Uncounted, VarianceStatus::from_variance);

    LineReconciliation { assigned, reported, theoretical, physical, variance, status }
}

/// One product on an audit sheet before any physical count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetLine {
    pub product_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub assigned: f64,
    pub reported: f64,
    pub unit_type: UnitType,
}

pub fn unit_type_for(sku: &str, name: &str) -> UnitType {
    if is_spool(sku, name) {
        UnitType::Meters
    } else {
        UnitType::Units
    }
}

/// Assigned and reported totals per SKU, plus the standard KPI products even when
/// nothing of them was assigned.
pub fn build_sheet(assignments: &[Assignment], tally: &UsageTally, standard_products: &[Product]) -> Vec<SheetLine> {
    struct Acc {
        product_id: Option<Uuid>,
        name: String,
        assigned: f64,
        serials: Vec<String>,
    }

    let mut by_sku: BTreeMap<String, Acc> = BTreeMap::new();
    for assignment in assignments.iter().filter(|a| a.status.holds_stock()) {
        for item in &assignment.items {
            let acc = by_sku.entry(item.product.sku.clone()).or_insert_with(|| Acc {
                product_id: item.product.id,
                name: item.product.name.clone(),
                assigned: 0.0,
                serials: Vec::new(),
            });
            acc.assigned += item.quantity;
            acc.serials.extend(item.serials.iter().cloned());
        }
    }

    let mut lines: Vec<SheetLine> = by_sku
        .into_iter()
        .map(|(sku, acc)| SheetLine {
            reported: tally.reported_for(&sku, &acc.name, &acc.serials),
            unit_type: unit_type_for(&sku, &acc.name),
            product_id: acc.product_id,
            name: acc.name,
            assigned: acc.assigned,
            sku,
        })
        .collect();

    for product in standard_products {
        if lines.iter().any(|l| l.sku == product.sku || l.product_id == Some(product.id)) {
            continue;
        }
        let reported = KpiKey::for_sku(&product.sku).map(|k| tally.for_key(k)).unwrap_or(0.0);
        lines.push(SheetLine {
            product_id: Some(product.id),
            sku: product.sku.clone(),
            name: product.name.clone(),
            assigned: 0.0,
            reported,
            unit_type: unit_type_for(&product.sku, &product.name),
        });
    }

    lines
}

/// Start of the business day containing `now`, in UTC.
pub fn business_day_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    business_date(now, offset)
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(now)
}

pub fn business_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// Half-open UTC window of the business day containing `at`.
pub fn business_day_bounds(at: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = business_day_start(at, offset);
    (start, start + Duration::days(1))
}

/// Reports belonging to one day-close batch: filed at or after the previous batch
/// mark and before this close.
pub fn reports_in_batch(
    reports: &[ConsumptionReport],
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> impl Iterator<Item = &ConsumptionReport> {
    reports.iter().filter(move |r| r.created_at >= since && r.created_at < until)
}

/// Most recent audit created on the same business day as `now`.
pub fn todays_audit<'a>(headers: &'a [AuditHeader], now: DateTime<Utc>, offset: FixedOffset) -> Option<&'a AuditHeader> {
    let today = business_date(now, offset);
    headers
        .iter()
        .filter(|h| business_date(h.created_at, offset) == today)
        .max_by_key(|h| h.created_at)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftAuditItem {
    pub product_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub assigned: f64,
    pub reported: f64,
    pub unit_type: UnitType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayClosePlan {
    Create { notes: String, items: Vec<DraftAuditItem> },
    Append { audit_id: Uuid, notes: String, items: Vec<DraftAuditItem> },
}

/// Decides how a technician's day close is written.
///
/// With no audit yet today every line is recorded. Otherwise the existing audit is
/// reopened and only lines with usage since its last batch are appended, so repeated
/// closes never create a second header for the day.
pub fn plan_day_close(existing: Option<&AuditHeader>, lines: Vec<SheetLine>, batch_at: DateTime<FixedOffset>) -> DayClosePlan {
    let draft = |line: SheetLine, notes: Option<String>| DraftAuditItem {
        product_id: line.product_id,
        sku: line.sku,
        name: line.name,
        assigned: line.assigned,
        reported: line.reported,
        unit_type: line.unit_type,
        notes,
    };

    match existing {
        None => DayClosePlan::Create {
            notes: INITIAL_DAY_CLOSE_NOTE.to_string(),
            items: lines.into_iter().map(|l| draft(l, None)).collect(),
        },
        Some(header) => {
            let label = format!("Batch {}", batch_at.format("%H:%M:%S"));
            let base = header.notes.clone().unwrap_or_else(|| DAY_CLOSE_NOTE.to_string());
            DayClosePlan::Append {
                audit_id: header.id,
                notes: format!("{base} | {label}"),
                items: lines
                    .into_iter()
                    .filter(|l| l.reported.abs() > VARIANCE_EPSILON)
                    .map(|l| draft(l, Some(label.clone())))
                    .collect(),
            }
        }
    }
}

/// Whose stock an audit is about.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditTarget {
    Technician(Uuid),
    Team { id: Uuid, members: Vec<Uuid> },
}

impl AuditTarget {
    /// Profile that holds stock corrections; crews use their first member.
    pub fn holder(&self) -> Option<Uuid> {
        match self {
            AuditTarget::Technician(id) => Some(*id),
            AuditTarget::Team { members, .. } => members.first().copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentKind {
    In,
    Out,
    Adjust,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAdjustment {
    pub product_id: Option<Uuid>,
    pub kind: AdjustmentKind,
    pub quantity: f64,
    pub reason: String,
    pub holder: Uuid,
    pub serials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountedLine {
    pub product_id: Option<Uuid>,
    pub sku: String,
    pub assigned: f64,
    pub reported: f64,
    pub physical: Option<f64>,
}

/// Stock corrections that make the physical count the new system figure.
/// Uncounted and reconciled lines produce nothing; so does a crew with no members.
pub fn plan_adjustments(lines: &[CountedLine], target: &AuditTarget) -> Vec<StockAdjustment> {
    let Some(holder) = target.holder() else {
        return Vec::new();
    };

    lines
        .iter()
        .filter_map(|line| {
            let result = reconcile(line.assigned, line.reported, line.physical);
            let (kind, quantity, reason) = match result.status {
                VarianceStatus::Overage(n) => (AdjustmentKind::In, n, "Audit adjustment: overage"),
                VarianceStatus::Shortage(n) => (AdjustmentKind::Out, n, "Audit adjustment: shortage"),
                VarianceStatus::Reconciled | VarianceStatus::Uncounted => return None,
            };
            Some(StockAdjustment {
                product_id: line.product_id,
                kind,
                quantity,
                reason: reason.to_string(),
                holder,
                serials: Vec::new(),
            })
        })
        .collect()
}

/// Supervisor override of a single reel's remaining meters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpoolCount {
    pub serial: String,
    pub physical: f64,
    pub theoretical: f64,
    #[serde(default)]
    pub reported: f64,
}

impl SpoolCount {
    /// Audit line recording the override, keyed by the reel serial so later
    /// overrides of the same reel update it in place.
    pub fn audit_item(&self) -> DraftAuditItem {
        DraftAuditItem {
            product_id: None,
            sku: self.serial.clone(),
            name: format!("Spool {}", self.serial),
            assigned: self.theoretical + self.reported,
            reported: self.reported,
            unit_type: UnitType::Meters,
            notes: None,
        }
    }

    pub fn adjustment_reason(&self) -> String {
        format!("Supervised audit: spool {} set to {} m", self.serial, format_quantity(self.physical))
    }

    /// `ADJUST` transaction setting the reel to its counted length.
    pub fn stock_adjustment(&self, holder: Uuid) -> StockAdjustment {
        StockAdjustment {
            product_id: None,
            kind: AdjustmentKind::Adjust,
            quantity: self.physical,
            reason: self.adjustment_reason(),
            holder,
            serials: vec![self.serial.clone()],
        }
    }
}
