use serde::Serialize;
use strum::{EnumIter, IntoEnumIterator};

use crate::models::product::ProductRef;
use crate::models::report::ConsumptionReport;

use super::parse::{count_quantity, count_serial_like, parse_flag, parse_lenient_opt};

const LEGACY_SPOOL_SKU: &str = "I002";

pub fn is_spool(sku: &str, name: &str) -> bool {
    let upper_name = name.to_uppercase();
    sku == LEGACY_SPOOL_SKU
        || sku.contains("CARRETE")
        || upper_name.contains("BOBINA")
        || upper_name.contains("CARRETE")
}

pub fn is_spool_product(product: &ProductRef) -> bool {
    is_spool(&product.sku, &product.name)
}

pub fn is_onu(sku: &str) -> bool {
    sku.contains("ONU")
}

/// Consumables deducted from a technician's stock by the usage fields of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Consumable {
    Connector,
    Seal,
    WallPlate,
    Tensioner,
    PatchCord,
}

impl Consumable {
    /// SKU prefix that identifies the product.
    pub fn prefix(self) -> &'static str {
        match self {
            Consumable::Connector => "CONV",
            Consumable::Seal => "PREC",
            Consumable::WallPlate => "ROSETA",
            Consumable::Tensioner => "TENS",
            Consumable::PatchCord => "PATCH1",
        }
    }

    pub fn for_sku(sku: &str) -> Option<Consumable> {
        Consumable::iter().find(|c| sku.starts_with(c.prefix()))
    }

    /// Units of this consumable a single report deducts from the ledger.
    pub fn ledger_usage(self, report: &ConsumptionReport) -> i64 {
        match self {
            Consumable::Connector => parse_lenient_opt(report.connectors.as_deref()),
            Consumable::Tensioner => parse_lenient_opt(report.tensioners.as_deref()),
            Consumable::Seal => count_serial_like(report.seal.as_deref()),
            Consumable::WallPlate => parse_flag(report.wall_plates.as_deref()),
            Consumable::PatchCord => parse_flag(report.patch_cords.as_deref()),
        }
    }

    /// Units reported for the supervisor's usage tally, which also reads serial lists.
    pub fn reported_usage(self, report: &ConsumptionReport) -> i64 {
        match self {
            Consumable::Connector => count_quantity(report.connectors.as_deref()),
            Consumable::Tensioner => count_quantity(report.tensioners.as_deref()),
            _ => self.ledger_usage(report),
        }
    }
}

/// Keys the audit template and usage tally are organised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, EnumIter)]
pub enum KpiKey {
    #[serde(rename = "CARRETE")]
    Spool,
    #[serde(rename = "CONV")]
    Connector,
    #[serde(rename = "PREC")]
    Seal,
    #[serde(rename = "ROSETA")]
    WallPlate,
    #[serde(rename = "TENS")]
    Tensioner,
    #[serde(rename = "PATCH1")]
    PatchCord,
    #[serde(rename = "ONU")]
    Onu,
}

impl KpiKey {
    pub fn code(self) -> &'static str {
        match self {
            KpiKey::Spool => "CARRETE",
            KpiKey::Connector => "CONV",
            KpiKey::Seal => "PREC",
            KpiKey::WallPlate => "ROSETA",
            KpiKey::Tensioner => "TENS",
            KpiKey::PatchCord => "PATCH1",
            KpiKey::Onu => "ONU",
        }
    }

    /// First key whose code appears in the SKU.
    pub fn for_sku(sku: &str) -> Option<KpiKey> {
        KpiKey::iter().find(|k| sku.contains(k.code()))
    }

    pub fn codes() -> Vec<&'static str> {
        KpiKey::iter().map(KpiKey::code).collect()
    }

    pub fn consumable(self) -> Option<Consumable> {
        match self {
            KpiKey::Connector => Some(Consumable::Connector),
            KpiKey::Seal => Some(Consumable::Seal),
            KpiKey::WallPlate => Some(Consumable::WallPlate),
            KpiKey::Tensioner => Some(Consumable::Tensioner),
            KpiKey::PatchCord => Some(Consumable::PatchCord),
            KpiKey::Spool | KpiKey::Onu => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spools_are_recognised_by_sku_or_name() {
        assert!(is_spool("CARRETE-1000", "Fibra drop"));
        assert!(is_spool("I002", "Cable"));
        assert!(is_spool("FIB-01", "Bobina de fibra"));
        assert!(!is_spool("CONV-SC", "Conector SC/APC"));
    }

    #[test]
    fn consumables_match_by_prefix() {
        assert_eq!(Consumable::for_sku("CONV-SC"), Some(Consumable::Connector));
        assert_eq!(Consumable::for_sku("PATCH1-3M"), Some(Consumable::PatchCord));
        assert_eq!(Consumable::for_sku("XCONV"), None);
        assert_eq!(Consumable::for_sku("ONU-ZTE"), None);
    }

    #[test]
    fn flag_fields_deduct_at_most_one() {
        let report = ConsumptionReport {
            patch_cords: Some("Si".into()),
            wall_plates: Some("2".into()),
            connectors: Some("4 conectores".into()),
            ..Default::default()
        };
        assert_eq!(Consumable::PatchCord.ledger_usage(&report), 1);
        assert_eq!(Consumable::WallPlate.ledger_usage(&report), 1);
        assert_eq!(Consumable::Connector.ledger_usage(&report), 4);
    }

    #[test]
    fn kpi_keys_follow_sku_text() {
        assert_eq!(KpiKey::for_sku("ONU-HG8145"), Some(KpiKey::Onu));
        assert_eq!(KpiKey::for_sku("CARRETE"), Some(KpiKey::Spool));
        assert_eq!(KpiKey::for_sku("ROUTER"), None);
        assert_eq!(KpiKey::codes().len(), 7);
    }
}
