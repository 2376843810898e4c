use serde::Serialize;

use super::ledger::Ledger;

/// Minimum stock a technician must carry to start an installation.
pub struct KitRequirement {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    /// Sum every matching bucket (one per reel) instead of reading the first.
    pub pooled: bool,
}

pub const MINIMUM_KIT: [KitRequirement; 6] = [
    KitRequirement { key: "ONU", label: "ONU", min: 1.0, pooled: false },
    KitRequirement { key: "CARRETE", label: "Fiber cable", min: 1.0, pooled: true },
    KitRequirement { key: "CONV", label: "Connectors", min: 2.0, pooled: false },
    KitRequirement { key: "TENS", label: "Tensioners", min: 2.0, pooled: false },
    KitRequirement { key: "PATCH1", label: "Patch cord", min: 1.0, pooled: false },
    KitRequirement { key: "ROSETA", label: "Wall plate", min: 1.0, pooled: false },
];

impl KitRequirement {
    fn on_hand(&self, ledger: &Ledger) -> f64 {
        if self.pooled {
            return ledger
                .entries()
                .filter(|(key, _)| key.spool_serial().is_some() || key.sku().contains(self.key))
                .map(|(_, entry)| entry.quantity.max(0.0))
                .sum();
        }

        ledger
            .entries()
            .find(|(key, _)| key.sku().contains(self.key))
            .map(|(_, entry)| entry.quantity)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KitStatus {
    pub missing: Vec<&'static str>,
    pub can_install: bool,
}

/// Checks the ledger against the minimum kit. Cable counts every reel held; other
/// requirements look at the first bucket whose SKU contains their key, stocked or not.
pub fn check_minimum_kit(ledger: &Ledger, restrictions_enabled: bool) -> KitStatus {
    let missing: Vec<&'static str> = MINIMUM_KIT
        .iter()
        .filter(|req| req.on_hand(ledger) < req.min)
        .map(|req| req.label)
        .collect();

    KitStatus {
        can_install: !restrictions_enabled || missing.is_empty(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ledger::{aggregate, LedgerInputs, LedgerPolicy, LedgerScope};
    use crate::models::assignment::{Assignment, AssignmentItem, AssignmentStatus};
    use crate::models::product::ProductRef;
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn ledger_with(lines: Vec<(&str, f64, Vec<&str>)>) -> Ledger {
        let assignment = Assignment {
            id: Uuid::new_v4(),
            assigned_to: None,
            team_id: None,
            status: AssignmentStatus::Active,
            created_at: Utc::now(),
            items: lines
                .into_iter()
                .map(|(sku, qty, serials)| AssignmentItem {
                    product: ProductRef::new(sku, sku),
                    quantity: qty,
                    serials: serials.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        };
        let scope = LedgerScope::default();
        aggregate(
            &LedgerInputs {
                scope: &scope,
                assignments: &[assignment],
                reports: &[],
                returns: &[],
                installed_serials: &HashSet::new(),
            },
            LedgerPolicy::default(),
        )
    }

    #[test]
    fn full_kit_can_install() {
        let ledger = ledger_with(vec![
            ("ONU-ZTE", 1.0, vec!["Z1"]),
            ("CARRETE", 500.0, vec!["C-01"]),
            ("CONV", 4.0, vec![]),
            ("TENS", 2.0, vec![]),
            ("PATCH1", 1.0, vec![]),
            ("ROSETA", 1.0, vec![]),
        ]);
        let status = check_minimum_kit(&ledger, true);
        assert!(status.missing.is_empty());
        assert!(status.can_install);
    }

    #[test]
    fn missing_items_block_only_when_restricted() {
        let ledger = ledger_with(vec![("CONV", 1.0, vec![])]);

        let restricted = check_minimum_kit(&ledger, true);
        assert!(!restricted.can_install);
        assert!(restricted.missing.contains(&"Connectors"));
        assert_eq!(restricted.missing.len(), 6);

        assert!(check_minimum_kit(&ledger, false).can_install);
    }

    #[test]
    fn cable_counts_every_reel_held() {
        // Reel A-01 comes first in key order and is empty.
        let ledger = ledger_with(vec![
            ("CARRETE", 0.0, vec!["A-01"]),
            ("CARRETE", 800.0, vec!["B-01"]),
        ]);
        let status = check_minimum_kit(&ledger, true);
        assert!(!status.missing.contains(&"Fiber cable"));

        let empty = ledger_with(vec![("CARRETE", 0.0, vec!["A-01"])]);
        assert!(check_minimum_kit(&empty, true).missing.contains(&"Fiber cable"));
    }
}
