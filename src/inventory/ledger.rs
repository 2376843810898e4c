//! On-hand stock for a technician or crew, folded from the four record streams:
//! assignments in, job usage out, returns out, installed modems out.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::models::assignment::Assignment;
use crate::models::report::ConsumptionReport;
use crate::models::return_record::{ReturnCondition, ReturnRecord};

use super::parse::parse_lenient_opt;
use super::sku::{is_onu, is_spool_product, Consumable};

/// Ledger bucket. Spools are tracked one physical reel at a time, everything else per SKU.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKey {
    Sku(String),
    SpoolSerial { sku: String, serial: String },
}

impl ItemKey {
    pub fn sku(&self) -> &str {
        match self {
            ItemKey::Sku(sku) | ItemKey::SpoolSerial { sku, .. } => sku,
        }
    }

    pub fn spool_serial(&self) -> Option<&str> {
        match self {
            ItemKey::SpoolSerial { serial, .. } => Some(serial),
            ItemKey::Sku(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerEntry {
    pub name: String,
    pub quantity: f64,
    pub serials: Vec<String>,
    /// Discarded spool meters, kept for display only.
    pub waste: f64,
}

/// Who the ledger is computed for. Resolved by the caller, never inside the fold.
#[derive(Debug, Clone, Default)]
pub struct LedgerScope {
    pub technician_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
    pub member_ids: Vec<Uuid>,
}

impl LedgerScope {
    pub fn technician(id: Uuid) -> Self {
        Self { technician_id: Some(id), member_ids: vec![id], ..Default::default() }
    }

    /// Whether a job report was filed by someone this ledger covers.
    pub fn covers(&self, report: &ConsumptionReport) -> bool {
        let by_member = [report.technician_id, report.user_id]
            .into_iter()
            .flatten()
            .any(|id| self.member_ids.contains(&id));

        let by_crew = match (&self.team_name, &report.crew) {
            (Some(team), Some(crew)) => team.trim().eq_ignore_ascii_case(crew.trim()),
            _ => false,
        };

        by_member || by_crew
    }
}

/// How a spool assignment line carrying several serials is spread over its reels.
///
/// The real business rule is unconfirmed; lines are normally one reel each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpoolLineSplit {
    #[default]
    EvenAcrossSerials,
    FirstSerialOnly,
}

/// What a CONSUMED return of a spool does to the ledger.
///
/// Skipped by default: the reel is already accounted for through job usage, and the daily
/// automatic closure files such returns. Fragile if a reel is ever returned CONSUMED without
/// matching usage reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsumedSpoolReturns {
    #[default]
    Ignore,
    Subtract,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerPolicy {
    pub spool_line_split: SpoolLineSplit,
    pub consumed_spool_returns: ConsumedSpoolReturns,
}

pub struct LedgerInputs<'a> {
    pub scope: &'a LedgerScope,
    pub assignments: &'a [Assignment],
    pub reports: &'a [ConsumptionReport],
    pub returns: &'a [ReturnRecord],
    /// Modem serials already installed at a client, from an independent lookup.
    pub installed_serials: &'a HashSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: BTreeMap<ItemKey, LedgerEntry>,
}

impl Ledger {
    pub fn get(&self, key: &ItemKey) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    pub fn spool(&self, serial: &str) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key.spool_serial() == Some(serial))
            .map(|(_, entry)| entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ItemKey, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Entries worth showing: anything with stock left. Empty buckets stay in the map.
    pub fn visible(&self) -> impl Iterator<Item = (&ItemKey, &LedgerEntry)> {
        self.entries.iter().filter(|(_, entry)| entry.quantity > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn sku_entry(&mut self, sku: &str, name: &str) -> &mut LedgerEntry {
        self.entries
            .entry(ItemKey::Sku(sku.to_string()))
            .or_insert_with(|| LedgerEntry { name: name.to_string(), ..Default::default() })
    }

    fn spool_entry(&mut self, sku: &str, name: &str, serial: &str) -> &mut LedgerEntry {
        self.entries
            .entry(ItemKey::SpoolSerial { sku: sku.to_string(), serial: serial.to_string() })
            .or_insert_with(|| LedgerEntry {
                name: format!("{name} ({serial})"),
                serials: vec![serial.to_string()],
                ..Default::default()
            })
    }

    fn spool_mut(&mut self, serial: &str) -> Option<&mut LedgerEntry> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key.spool_serial() == Some(serial))
            .map(|(_, entry)| entry)
    }

    /// First per-SKU bucket for a consumable, in key order.
    fn consumable_mut(&mut self, consumable: Consumable) -> Option<&mut LedgerEntry> {
        self.entries
            .iter_mut()
            .find(|(key, _)| {
                matches!(key, ItemKey::Sku(sku) if Consumable::for_sku(sku) == Some(consumable))
            })
            .map(|(_, entry)| entry)
    }
}

/// Folds assignments, job usage, returns and installed modems into current stock.
///
/// Returns are applied after usage; the CONSUMED spool rule depends on that order.
pub fn aggregate(inputs: &LedgerInputs<'_>, policy: LedgerPolicy) -> Ledger {
    let mut ledger = Ledger::default();

    add_assignments(&mut ledger, inputs.assignments, policy.spool_line_split);

    for report in inputs.reports.iter().filter(|r| inputs.scope.covers(r)) {
        subtract_usage(&mut ledger, report);
    }

    for record in inputs.returns {
        subtract_return(&mut ledger, record, policy.consumed_spool_returns);
    }

    drop_installed_onus(&mut ledger, inputs.installed_serials);

    ledger
}

fn add_assignments(ledger: &mut Ledger, assignments: &[Assignment], split: SpoolLineSplit) {
    for assignment in assignments.iter().filter(|a| a.status.holds_stock()) {
        for item in &assignment.items {
            let product = &item.product;

            if is_spool_product(product) && !item.serials.is_empty() {
                let share = item.quantity / item.serials.len() as f64;
                for (idx, serial) in item.serials.iter().enumerate() {
                    let amount = match split {
                        SpoolLineSplit::EvenAcrossSerials => share,
                        SpoolLineSplit::FirstSerialOnly if idx == 0 => item.quantity,
                        SpoolLineSplit::FirstSerialOnly => 0.0,
                    };
                    ledger.spool_entry(&product.sku, &product.name, serial).quantity += amount;
                }
                continue;
            }

            let entry = ledger.sku_entry(&product.sku, &product.name);
            entry.quantity += item.quantity;
            for serial in &item.serials {
                if !entry.serials.contains(serial) {
                    entry.serials.push(serial.clone());
                }
            }
        }
    }
}

fn subtract_usage(ledger: &mut Ledger, report: &ConsumptionReport) {
    if let Some(serial) = report.spool() {
        let used = parse_lenient_opt(report.meters_used.as_deref()) as f64;
        let discarded = parse_lenient_opt(report.meters_discarded.as_deref()) as f64;

        match ledger.spool_mut(serial) {
            Some(entry) => {
                entry.quantity -= used + discarded;
                entry.waste += discarded;
            }
            None => debug!(report = %report.id, serial, "Usage against a spool not held in this ledger"),
        }
    }

    for consumable in [
        Consumable::Connector,
        Consumable::Seal,
        Consumable::WallPlate,
        Consumable::Tensioner,
        Consumable::PatchCord,
    ] {
        let used = consumable.ledger_usage(report);
        if used == 0 {
            continue;
        }
        if let Some(entry) = ledger.consumable_mut(consumable) {
            entry.quantity -= used as f64;
        }
    }
}

fn subtract_return(ledger: &mut Ledger, record: &ReturnRecord, consumed_spools: ConsumedSpoolReturns) {
    for item in &record.items {
        let product = &item.product;

        if is_spool_product(product) {
            if item.condition == ReturnCondition::Consumed && consumed_spools == ConsumedSpoolReturns::Ignore {
                continue;
            }

            if !item.serials.is_empty() {
                let share = item.quantity / item.serials.len() as f64;
                for serial in &item.serials {
                    if let Some(entry) = ledger.spool_mut(serial) {
                        entry.quantity -= share;
                        entry.serials.retain(|s| s != serial);
                    }
                }
                continue;
            }
        }

        if let Some(entry) = ledger.entries.get_mut(&ItemKey::Sku(product.sku.clone())) {
            entry.quantity -= item.quantity;
            entry.serials.retain(|s| !item.serials.contains(s));
        } else {
            debug!(return_id = %record.id, sku = %product.sku, "Return of an item not held in this ledger");
        }
    }
}

/// For modems the serial list is the stock: quantity follows the serials still on hand.
fn drop_installed_onus(ledger: &mut Ledger, installed: &HashSet<String>) {
    for (key, entry) in ledger.entries.iter_mut() {
        if let ItemKey::Sku(sku) = key {
            if is_onu(sku) && !entry.serials.is_empty() {
                entry.serials.retain(|s| !installed.contains(s));
                entry.quantity = entry.serials.len() as f64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignment::{AssignmentItem, AssignmentStatus};
    use crate::models::product::ProductRef;
    use crate::models::report::ReportKind;
    use crate::models::return_record::ReturnItem;
    use chrono::Utc;

    fn assignment(items: Vec<AssignmentItem>) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            assigned_to: None,
            team_id: None,
            status: AssignmentStatus::Active,
            created_at: Utc::now(),
            items,
        }
    }

    fn line(sku: &str, name: &str, quantity: f64, serials: &[&str]) -> AssignmentItem {
        AssignmentItem {
            product: ProductRef::new(sku, name),
            quantity,
            serials: serials.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn report_by(tech: Uuid) -> ConsumptionReport {
        ConsumptionReport {
            id: Uuid::new_v4(),
            kind: ReportKind::Installation,
            technician_id: Some(tech),
            created_at: Utc::now(),
            ..Default::default()
        }
    }

    fn returned(sku: &str, name: &str, quantity: f64, serials: &[&str], condition: ReturnCondition) -> ReturnRecord {
        ReturnRecord {
            id: Uuid::new_v4(),
            assignment_id: Uuid::new_v4(),
            created_at: Utc::now(),
            items: vec![ReturnItem {
                product: ProductRef::new(sku, name),
                quantity,
                serials: serials.iter().map(|s| s.to_string()).collect(),
                condition,
            }],
        }
    }

    struct Fixture {
        scope: LedgerScope,
        assignments: Vec<Assignment>,
        reports: Vec<ConsumptionReport>,
        returns: Vec<ReturnRecord>,
        installed: HashSet<String>,
    }

    impl Fixture {
        fn new(tech: Uuid) -> Self {
            Self {
                scope: LedgerScope::technician(tech),
                assignments: vec![],
                reports: vec![],
                returns: vec![],
                installed: HashSet::new(),
            }
        }

        fn run(&self) -> Ledger {
            self.run_with(LedgerPolicy::default())
        }

        fn run_with(&self, policy: LedgerPolicy) -> Ledger {
            aggregate(
                &LedgerInputs {
                    scope: &self.scope,
                    assignments: &self.assignments,
                    reports: &self.reports,
                    returns: &self.returns,
                    installed_serials: &self.installed,
                },
                policy,
            )
        }
    }

    fn sku(s: &str) -> ItemKey {
        ItemKey::Sku(s.to_string())
    }

    #[test]
    fn no_records_yields_empty_ledger() {
        let ledger = Fixture::new(Uuid::new_v4()).run();
        assert!(ledger.is_empty());
    }

    #[test]
    fn closure_usage_reduces_consumable_stock() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CONV", "Conector", 10.0, &[])]));
        fx.reports.push(ConsumptionReport { connectors: Some("4".into()), ..report_by(tech) });

        let ledger = fx.run();
        assert_eq!(ledger.get(&sku("CONV")).unwrap().quantity, 6.0);
    }

    #[test]
    fn spool_remaining_length_and_waste_are_tracked_per_reel() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CARRETE", "Bobina", 1000.0, &["C-01"])]));
        for _ in 0..2 {
            fx.reports.push(ConsumptionReport {
                spool_serial: Some("C-01".into()),
                meters_used: Some("100m".into()),
                meters_discarded: Some("20".into()),
                ..report_by(tech)
            });
        }

        let ledger = fx.run();
        let reel = ledger.spool("C-01").unwrap();
        assert_eq!(reel.quantity, 760.0);
        assert_eq!(reel.waste, 40.0);
        assert_eq!(reel.name, "Bobina (C-01)");
    }

    #[test]
    fn usage_against_one_reel_leaves_other_reels_untouched() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![
            line("CARRETE", "Bobina", 1000.0, &["C-01"]),
            line("CARRETE", "Bobina", 1000.0, &["C-011"]),
        ]));
        fx.reports.push(ConsumptionReport {
            spool_serial: Some("C-01".into()),
            meters_used: Some("300".into()),
            ..report_by(tech)
        });

        let ledger = fx.run();
        assert_eq!(ledger.spool("C-01").unwrap().quantity, 700.0);
        assert_eq!(ledger.spool("C-011").unwrap().quantity, 1000.0);
    }

    #[test]
    fn consumed_spool_return_does_not_decrement_reel() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CARRETE", "Bobina", 1000.0, &["C-01"])]));
        fx.returns.push(returned("CARRETE", "Bobina", 1000.0, &["C-01"], ReturnCondition::Consumed));

        let ledger = fx.run();
        let reel = ledger.spool("C-01").unwrap();
        assert_eq!(reel.quantity, 1000.0);
        assert_eq!(reel.serials, vec!["C-01".to_string()]);
    }

    #[test]
    fn consumed_spool_return_subtracts_when_policy_says_so() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CARRETE", "Bobina", 1000.0, &["C-01"])]));
        fx.returns.push(returned("CARRETE", "Bobina", 400.0, &["C-01"], ReturnCondition::Consumed));

        let policy = LedgerPolicy { consumed_spool_returns: ConsumedSpoolReturns::Subtract, ..Default::default() };
        assert_eq!(fx.run_with(policy).spool("C-01").unwrap().quantity, 600.0);
    }

    #[test]
    fn good_spool_return_removes_reel_from_stock() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CARRETE", "Bobina", 1000.0, &["C-01"])]));
        fx.returns.push(returned("CARRETE", "Bobina", 1000.0, &["C-01"], ReturnCondition::Good));

        let ledger = fx.run();
        let reel = ledger.spool("C-01").unwrap();
        assert_eq!(reel.quantity, 0.0);
        assert!(reel.serials.is_empty());
        assert_eq!(ledger.visible().count(), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn multi_serial_spool_line_splits_evenly() {
        let mut fx = Fixture::new(Uuid::new_v4());
        fx.assignments.push(assignment(vec![line("CARRETE", "Bobina", 2000.0, &["A", "B"])]));

        let ledger = fx.run();
        assert_eq!(ledger.spool("A").unwrap().quantity, 1000.0);
        assert_eq!(ledger.spool("B").unwrap().quantity, 1000.0);

        let first_only = LedgerPolicy { spool_line_split: SpoolLineSplit::FirstSerialOnly, ..Default::default() };
        let ledger = fx.run_with(first_only);
        assert_eq!(ledger.spool("A").unwrap().quantity, 2000.0);
        assert_eq!(ledger.spool("B").unwrap().quantity, 0.0);
    }

    #[test]
    fn spool_returns_apply_after_usage_and_split_across_reels() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CARRETE", "Bobina", 2000.0, &["A", "B"])]));
        fx.reports.push(ConsumptionReport {
            spool_serial: Some("A".into()),
            meters_used: Some("100".into()),
            ..report_by(tech)
        });
        fx.returns.push(returned("CARRETE", "Bobina", 2000.0, &["A", "B"], ReturnCondition::Good));

        let ledger = fx.run();
        let a = ledger.spool("A").unwrap();
        let b = ledger.spool("B").unwrap();
        assert_eq!(a.quantity, -100.0);
        assert_eq!(b.quantity, 0.0);
        assert!(a.serials.is_empty());
        assert!(b.serials.is_empty());
        assert_eq!(ledger.visible().count(), 0);
    }

    #[test]
    fn returns_remove_serials_and_quantity() {
        let mut fx = Fixture::new(Uuid::new_v4());
        fx.assignments.push(assignment(vec![line("ROUTER-TP", "Router", 3.0, &["R1", "R2", "R3"])]));
        fx.returns.push(returned("ROUTER-TP", "Router", 1.0, &["R2"], ReturnCondition::Damaged));

        let ledger = fx.run();
        let routers = ledger.get(&sku("ROUTER-TP")).unwrap();
        assert_eq!(routers.quantity, 2.0);
        assert_eq!(routers.serials, vec!["R1".to_string(), "R3".to_string()]);
    }

    #[test]
    fn installed_onus_leave_the_available_list() {
        let mut fx = Fixture::new(Uuid::new_v4());
        fx.assignments.push(assignment(vec![line("ONU-ZTE", "ONU", 3.0, &["Z1", "Z2", "Z3"])]));
        fx.installed.insert("Z2".to_string());

        let ledger = fx.run();
        let onus = ledger.get(&sku("ONU-ZTE")).unwrap();
        assert_eq!(onus.serials, vec!["Z1".to_string(), "Z3".to_string()]);
        assert_eq!(onus.quantity, 2.0);
    }

    #[test]
    fn serial_is_listed_once_even_if_assigned_twice() {
        let mut fx = Fixture::new(Uuid::new_v4());
        fx.assignments.push(assignment(vec![line("ONU-ZTE", "ONU", 1.0, &["Z1"])]));
        fx.assignments.push(assignment(vec![line("ONU-ZTE", "ONU", 1.0, &["Z1"])]));

        let ledger = fx.run();
        assert_eq!(ledger.get(&sku("ONU-ZTE")).unwrap().serials.len(), 1);
        assert_eq!(ledger.get(&sku("ONU-ZTE")).unwrap().quantity, 1.0);
    }

    #[test]
    fn reports_outside_the_scope_are_ignored() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("TENS", "Tensor", 8.0, &[])]));
        fx.reports.push(ConsumptionReport { tensioners: Some("3".into()), ..report_by(Uuid::new_v4()) });

        assert_eq!(fx.run().get(&sku("TENS")).unwrap().quantity, 8.0);
    }

    #[test]
    fn crew_name_matches_legacy_reports() {
        let mut fx = Fixture::new(Uuid::new_v4());
        fx.scope.team_name = Some("Equipo A".into());
        fx.assignments.push(assignment(vec![line("TENS", "Tensor", 8.0, &[])]));
        fx.reports.push(ConsumptionReport {
            technician_id: None,
            crew: Some(" equipo a ".into()),
            tensioners: Some("3".into()),
            ..report_by(Uuid::new_v4())
        });

        assert_eq!(fx.run().get(&sku("TENS")).unwrap().quantity, 5.0);
    }

    #[test]
    fn flags_and_support_reports_both_deduct() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![
            line("PATCH1", "Patchcord", 5.0, &[]),
            line("ROSETA", "Roseta", 5.0, &[]),
        ]));
        fx.reports.push(ConsumptionReport { patch_cords: Some("Si".into()), wall_plates: Some("4".into()), ..report_by(tech) });
        fx.reports.push(ConsumptionReport {
            kind: ReportKind::Support,
            patch_cords: Some("true".into()),
            ..report_by(tech)
        });

        let ledger = fx.run();
        assert_eq!(ledger.get(&sku("PATCH1")).unwrap().quantity, 3.0);
        assert_eq!(ledger.get(&sku("ROSETA")).unwrap().quantity, 4.0);
    }

    #[test]
    fn returned_assignments_do_not_count() {
        let mut fx = Fixture::new(Uuid::new_v4());
        let mut closed = assignment(vec![line("CONV", "Conector", 10.0, &[])]);
        closed.status = AssignmentStatus::Returned;
        fx.assignments.push(closed);

        assert!(fx.run().is_empty());
    }

    #[test]
    fn garbage_usage_counts_as_nothing() {
        let tech = Uuid::new_v4();
        let mut fx = Fixture::new(tech);
        fx.assignments.push(assignment(vec![line("CONV", "Conector", 10.0, &[])]));
        fx.reports.push(ConsumptionReport { connectors: Some("ninguno".into()), ..report_by(tech) });

        assert_eq!(fx.run().get(&sku("CONV")).unwrap().quantity, 10.0);
    }
}
