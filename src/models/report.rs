use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    #[default]
    Installation,
    Support,
}

impl TryFrom<String> for ReportKind {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// End-of-job material usage, from either an installation closure or a support visit.
///
/// Usage columns are free text as typed in the field; they are only ever read through
/// the lenient parsers in `inventory::parse`.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct ConsumptionReport {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub kind: ReportKind,
    pub technician_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Crew name recorded on legacy closures.
    pub crew: Option<String>,
    /// Client name; only installation closures carry one.
    pub client: Option<String>,
    pub meters_used: Option<String>,
    pub meters_discarded: Option<String>,
    pub connectors: Option<String>,
    pub seal: Option<String>,
    pub wall_plates: Option<String>,
    pub tensioners: Option<String>,
    pub patch_cords: Option<String>,
    pub onu_serial: Option<String>,
    pub spool_serial: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConsumptionReport {
    /// Declared spool serial, ignoring blank entries.
    pub fn spool(&self) -> Option<&str> {
        self.spool_serial
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
