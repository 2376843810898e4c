use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::product::ProductRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnCondition {
    Good,
    Consumed,
    Damaged,
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub product: ProductRef,
    pub quantity: f64,
    pub serials: Vec<String>,
    pub condition: ReturnCondition,
}

#[derive(Debug, Clone)]
pub struct ReturnRecord {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReturnItem>,
}

#[derive(Debug, FromRow)]
pub struct ReturnLineRow {
    pub return_id: Uuid,
    pub assignment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub serials: Vec<String>,
    pub condition: String,
}

impl ReturnRecord {
    pub fn from_rows(rows: Vec<ReturnLineRow>) -> Vec<ReturnRecord> {
        let mut records: Vec<ReturnRecord> = Vec::new();

        for row in rows {
            // Unrecognised conditions are treated as a plain return to the warehouse.
            let condition = row.condition.parse().unwrap_or(ReturnCondition::Good);
            let item = ReturnItem {
                product: ProductRef { id: Some(row.product_id), sku: row.sku, name: row.name },
                quantity: row.quantity,
                serials: row.serials,
                condition,
            };

            match records.iter_mut().find(|r| r.id == row.return_id) {
                Some(existing) => existing.items.push(item),
                None => records.push(ReturnRecord {
                    id: row.return_id,
                    assignment_id: row.assignment_id,
                    created_at: row.created_at,
                    items: vec![item],
                }),
            }
        }

        records
    }
}
