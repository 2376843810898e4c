use std::collections::{BTreeMap, HashMap};

use crate::models::report::ConsumptionReport;

use super::parse::{count_serial_like, parse_lenient_opt};
use super::sku::{is_spool, KpiKey};

/// Reported material usage across a set of job reports, as shown to supervisors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageTally {
    by_key: BTreeMap<KpiKey, f64>,
    by_spool: HashMap<String, f64>,
}

impl UsageTally {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a ConsumptionReport>) -> Self {
        let mut tally = UsageTally::default();

        for report in reports {
            let meters = (parse_lenient_opt(report.meters_used.as_deref())
                + parse_lenient_opt(report.meters_discarded.as_deref())) as f64;

            if let Some(serial) = report.spool() {
                *tally.by_spool.entry(serial.to_string()).or_default() += meters;
            }
            *tally.by_key.entry(KpiKey::Spool).or_default() += meters;

            for key in [
                KpiKey::Connector,
                KpiKey::Seal,
                KpiKey::WallPlate,
                KpiKey::Tensioner,
                KpiKey::PatchCord,
            ] {
                if let Some(consumable) = key.consumable() {
                    *tally.by_key.entry(key).or_default() += consumable.reported_usage(report) as f64;
                }
            }

            *tally.by_key.entry(KpiKey::Onu).or_default() +=
                count_serial_like(report.onu_serial.as_deref()) as f64;
        }

        tally
    }

    pub fn for_key(&self, key: KpiKey) -> f64 {
        self.by_key.get(&key).copied().unwrap_or(0.0)
    }

    pub fn for_spool(&self, serial: &str) -> f64 {
        self.by_spool.get(serial).copied().unwrap_or(0.0)
    }

    /// Usage attributable to a product line: spools by their serials, others by KPI key.
    pub fn reported_for(&self, sku: &str, name: &str, serials: &[String]) -> f64 {
        if is_spool(sku, name) {
            if serials.is_empty() {
                return self.for_key(KpiKey::Spool);
            }
            return serials.iter().map(|s| self.for_spool(s)).sum();
        }

        KpiKey::for_sku(sku).map(|key| self.for_key(key)).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.values().all(|v| *v == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reports() -> Vec<ConsumptionReport> {
        vec![
            ConsumptionReport {
                spool_serial: Some("C-01".into()),
                meters_used: Some("120 m".into()),
                meters_discarded: Some("5".into()),
                connectors: Some("2".into()),
                seal: Some("P-100".into()),
                onu_serial: Some("ZTEG123".into()),
                ..Default::default()
            },
            ConsumptionReport {
                spool_serial: Some("C-02".into()),
                meters_used: Some("80".into()),
                connectors: Some("si".into()),
                patch_cords: Some("Si".into()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn tallies_per_key_and_per_reel() {
        let tally = UsageTally::from_reports(&reports());

        assert_eq!(tally.for_key(KpiKey::Spool), 205.0);
        assert_eq!(tally.for_spool("C-01"), 125.0);
        assert_eq!(tally.for_spool("C-02"), 80.0);
        assert_eq!(tally.for_key(KpiKey::Connector), 3.0);
        assert_eq!(tally.for_key(KpiKey::Seal), 1.0);
        assert_eq!(tally.for_key(KpiKey::PatchCord), 1.0);
        assert_eq!(tally.for_key(KpiKey::Onu), 1.0);
    }

    #[test]
    fn product_lines_pick_their_usage() {
        let tally = UsageTally::from_reports(&reports());

        assert_eq!(tally.reported_for("CARRETE", "Bobina", &["C-02".to_string()]), 80.0);
        assert_eq!(tally.reported_for("CARRETE", "Bobina", &[]), 205.0);
        assert_eq!(tally.reported_for("CONV-SC", "Conector", &[]), 3.0);
        assert_eq!(tally.reported_for("ROUTER", "Router", &[]), 0.0);
    }

    #[test]
    fn empty_input_reports_nothing() {
        let tally = UsageTally::from_reports(&[]);
        assert!(tally.is_empty());
    }
}
