use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    Meters,
    Units,
}

/// Audit header; one per technician per business day by convention.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditHeader {
    pub id: Uuid,
    pub technician_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// When the last day-close batch was taken.
    pub last_batch_at: Option<DateTime<Utc>>,
}

impl AuditHeader {
    /// Usage recorded after this instant belongs to the next batch. Supervisor
    /// edits move `updated_at` but never this mark.
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.last_batch_at.unwrap_or(self.created_at)
    }

    pub fn is_pending(&self) -> bool {
        self.status.parse::<AuditStatus>().ok() == Some(AuditStatus::Pending)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditItem {
    pub id: Uuid,
    pub audit_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_sku: String,
    pub product_name: String,
    pub assigned_quantity: f64,
    pub reported_quantity: f64,
    pub physical_quantity: Option<f64>,
    pub unit_type: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cutoff_ignores_later_edits() {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let mut header = AuditHeader {
            id: Uuid::new_v4(),
            technician_id: Some(Uuid::new_v4()),
            team_id: None,
            notes: None,
            status: AuditStatus::Pending.to_string(),
            created_at,
            updated_at: None,
            last_batch_at: None,
        };
        assert_eq!(header.cutoff(), created_at);

        let batch = Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap();
        header.last_batch_at = Some(batch);
        header.updated_at = Some(Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap());
        assert_eq!(header.cutoff(), batch);
        assert!(header.is_pending());
    }
}
