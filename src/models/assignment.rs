use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::product::ProductRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Active,
    PartialReturn,
    Returned,
}

impl AssignmentStatus {
    /// Returned assignments no longer contribute to anyone's on-hand stock.
    pub fn holds_stock(self) -> bool {
        matches!(self, AssignmentStatus::Active | AssignmentStatus::PartialReturn)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentItem {
    pub product: ProductRef,
    pub quantity: f64,
    pub serials: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<AssignmentItem>,
}

/// One assignment line joined with its header and product.
#[derive(Debug, FromRow)]
pub struct AssignmentLineRow {
    pub assignment_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub serials: Vec<String>,
}

impl Assignment {
    /// Folds joined line rows back into assignments, keeping first-seen order.
    pub fn from_rows(rows: Vec<AssignmentLineRow>) -> Vec<Assignment> {
        let mut assignments: Vec<Assignment> = Vec::new();

        for row in rows {
            let item = AssignmentItem {
                product: ProductRef { id: Some(row.product_id), sku: row.sku, name: row.name },
                quantity: row.quantity,
                serials: row.serials,
            };

            match assignments.iter_mut().find(|a| a.id == row.assignment_id) {
                Some(existing) => existing.items.push(item),
                None => {
                    let status = row.status.parse().unwrap_or_else(|_| {
                        tracing::warn!(status = %row.status, assignment = %row.assignment_id, "Unknown assignment status");
                        AssignmentStatus::Returned
                    });
                    assignments.push(Assignment {
                        id: row.assignment_id,
                        assigned_to: row.assigned_to,
                        team_id: row.team_id,
                        status,
                        created_at: row.created_at,
                        items: vec![item],
                    });
                }
            }
        }

        assignments
    }
}
