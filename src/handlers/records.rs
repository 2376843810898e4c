// Queries shared by the ledger and audit handlers.
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::inventory::audit::{AuditTarget, DraftAuditItem};
use crate::inventory::ledger::{aggregate, Ledger, LedgerInputs, LedgerPolicy, LedgerScope};
use crate::inventory::sku::KpiKey;
use crate::models::assignment::{Assignment, AssignmentLineRow};
use crate::models::audit::{AuditHeader, AuditItem};
use crate::models::product::Product;
use crate::models::report::ConsumptionReport;
use crate::models::return_record::{ReturnLineRow, ReturnRecord};

const ASSIGNMENT_LINES_SQL: &str = r#"
    SELECT a.id AS assignment_id, a.assigned_to, a.team_id, a.status, a.created_at,
           p.id AS product_id, p.sku, p.name, i.quantity, i.serials
    FROM inventory_assignments a
    JOIN inventory_assignment_items i ON i.assignment_id = a.id
    JOIN inventory_products p ON p.id = i.product_id
    WHERE a.assigned_to = ANY($1) OR ($2::uuid IS NOT NULL AND a.team_id = $2)
    ORDER BY a.created_at, a.id"#;

const RETURN_LINES_SQL: &str = r#"
    SELECT r.id AS return_id, r.assignment_id, r.created_at,
           p.id AS product_id, p.sku, p.name, ri.quantity, ri.serials, ri.condition
    FROM inventory_returns r
    JOIN inventory_assignments a ON a.id = r.assignment_id
    JOIN inventory_return_items ri ON ri.return_id = r.id
    JOIN inventory_products p ON p.id = ri.product_id
    WHERE a.assigned_to = ANY($1) OR ($2::uuid IS NOT NULL AND a.team_id = $2)
    ORDER BY r.created_at, r.id"#;

// Closures and support visits share one shape; legacy closures may only carry the crew name.
const REPORTS_SQL: &str = r#"
    SELECT * FROM (
        SELECT id, 'installation'::text AS kind, tecnico_id AS technician_id, user_id,
               equipo AS crew, cliente AS client, metraje_usado AS meters_used, metraje_desechado AS meters_discarded,
               conectores AS connectors, precinto AS seal, rosetas AS wall_plates,
               tensores AS tensioners, patchcord AS patch_cords, onu AS onu_serial,
               codigo_carrete AS spool_serial, created_at
        FROM cierres
        WHERE tecnico_id = ANY($1) OR user_id = ANY($1)
           OR ($2::text IS NOT NULL AND lower(trim(equipo)) = lower(trim($2)))
        UNION ALL
        SELECT id, 'support'::text, tecnico_id, user_id,
               NULL::text, NULL::text, metraje_usado, metraje_desechado,
               conectores, NULL::text, rosetas,
               tensores, patchcord, onu_nueva,
               codigo_carrete, created_at
        FROM soportes
        WHERE tecnico_id = ANY($1) OR user_id = ANY($1)
    ) reports
    WHERE $3::timestamptz IS NULL OR created_at >= $3
    ORDER BY created_at"#;

const INSTALLED_SERIALS_SQL: &str = r#"
    SELECT trim(onu) FROM cierres
    WHERE (tecnico_id = ANY($1) OR user_id = ANY($1)) AND coalesce(trim(onu), '') <> ''
    UNION
    SELECT trim(onu_nueva) FROM soportes
    WHERE (tecnico_id = ANY($1) OR user_id = ANY($1)) AND coalesce(trim(onu_nueva), '') <> ''"#;

pub const AUDIT_COLUMNS: &str = "id, technician_id, team_id, notes, status, created_at, updated_at, last_batch_at";

/// Who an id names, plus the ledger scope covering them.
pub struct ResolvedEntity {
    pub target: AuditTarget,
    pub scope: LedgerScope,
}

/// Current holding for a scope, with the records it was folded from.
pub struct StockSnapshot {
    pub assignments: Vec<Assignment>,
    pub reports: Vec<ConsumptionReport>,
    pub ledger: Ledger,
}

pub async fn technician_scope(pool: &PgPool, technician_id: Uuid) -> Result<LedgerScope, AppError> {
    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM profiles WHERE id = $1")
        .bind(technician_id)
        .fetch_optional(pool)
        .await?;

    match exists {
        Some(_) => Ok(LedgerScope::technician(technician_id)),
        None => Err(AppError::not_found("Technician not found")),
    }
}

pub async fn team_scope(pool: &PgPool, team_id: Uuid) -> Result<LedgerScope, AppError> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM teams WHERE id = $1")
        .bind(team_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    let member_ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM profiles WHERE team_id = $1 ORDER BY first_name, last_name, id",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    Ok(LedgerScope { technician_id: None, team_id: Some(team_id), team_name: Some(name), member_ids })
}

/// Resolves an id that may name either a technician or a team.
pub async fn resolve_entity(pool: &PgPool, entity_id: Uuid) -> Result<ResolvedEntity, AppError> {
    match technician_scope(pool, entity_id).await {
        Ok(scope) => Ok(ResolvedEntity { target: AuditTarget::Technician(entity_id), scope }),
        Err(AppError::NotFound(_)) => {
            let scope = team_scope(pool, entity_id).await.map_err(|e| match e {
                AppError::NotFound(_) => AppError::not_found("No technician or team with that id"),
                other => other,
            })?;
            Ok(ResolvedEntity {
                target: AuditTarget::Team { id: entity_id, members: scope.member_ids.clone() },
                scope,
            })
        }
        Err(e) => Err(e),
    }
}

/// Ledger scope for an existing audit. `None` when its crew no longer exists.
pub async fn header_scope(pool: &PgPool, header: &AuditHeader) -> Result<Option<LedgerScope>, AppError> {
    match (header.team_id, header.technician_id) {
        (Some(team_id), _) => match team_scope(pool, team_id).await {
            Ok(scope) => Ok(Some(scope)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        },
        (None, Some(technician_id)) => Ok(Some(LedgerScope::technician(technician_id))),
        (None, None) => Ok(None),
    }
}

/// Fetches the four record streams concurrently and folds them into a ledger.
pub async fn load_stock(pool: &PgPool, scope: &LedgerScope) -> Result<StockSnapshot, AppError> {
    let (assignments, reports, returns, installed) = tokio::try_join!(
        fetch_assignments(pool, scope),
        fetch_reports(pool, scope, None),
        fetch_returns(pool, scope),
        fetch_installed_serials(pool, scope),
    )?;

    debug!(
        assignments = assignments.len(),
        reports = reports.len(),
        returns = returns.len(),
        "Aggregating ledger"
    );

    let ledger = aggregate(
        &LedgerInputs {
            scope,
            assignments: &assignments,
            reports: &reports,
            returns: &returns,
            installed_serials: &installed,
        },
        LedgerPolicy::default(),
    );

    Ok(StockSnapshot { assignments, reports, ledger })
}

pub async fn fetch_assignments(pool: &PgPool, scope: &LedgerScope) -> Result<Vec<Assignment>, AppError> {
    let rows = sqlx::query_as::<_, AssignmentLineRow>(ASSIGNMENT_LINES_SQL)
        .bind(&scope.member_ids)
        .bind(scope.team_id)
        .fetch_all(pool)
        .await?;
    Ok(Assignment::from_rows(rows))
}

pub async fn fetch_returns(pool: &PgPool, scope: &LedgerScope) -> Result<Vec<ReturnRecord>, AppError> {
    let rows = sqlx::query_as::<_, ReturnLineRow>(RETURN_LINES_SQL)
        .bind(&scope.member_ids)
        .bind(scope.team_id)
        .fetch_all(pool)
        .await?;
    Ok(ReturnRecord::from_rows(rows))
}

pub async fn fetch_reports(
    pool: &PgPool,
    scope: &LedgerScope,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<ConsumptionReport>, AppError> {
    let reports = sqlx::query_as::<_, ConsumptionReport>(REPORTS_SQL)
        .bind(&scope.member_ids)
        .bind(scope.team_name.as_deref())
        .bind(since)
        .fetch_all(pool)
        .await?;
    Ok(reports)
}

pub async fn fetch_installed_serials(pool: &PgPool, scope: &LedgerScope) -> Result<HashSet<String>, AppError> {
    let serials = sqlx::query_scalar::<_, String>(INSTALLED_SERIALS_SQL)
        .bind(&scope.member_ids)
        .fetch_all(pool)
        .await?;
    Ok(serials.into_iter().collect())
}

/// Products that always appear on an audit sheet.
pub async fn fetch_standard_products(pool: &PgPool) -> Result<Vec<Product>, AppError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, sku, name FROM inventory_products WHERE sku = ANY($1) ORDER BY sku",
    )
    .bind(KpiKey::codes())
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn fetch_audit(pool: &PgPool, audit_id: Uuid) -> Result<AuditHeader, AppError> {
    sqlx::query_as::<_, AuditHeader>(&format!("SELECT {AUDIT_COLUMNS} FROM inventory_audits WHERE id = $1"))
        .bind(audit_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Audit not found"))
}

pub async fn fetch_audit_items(pool: &PgPool, audit_id: Uuid) -> Result<Vec<AuditItem>, AppError> {
    let items = sqlx::query_as::<_, AuditItem>(
        r#"SELECT id, audit_id, product_id, product_sku, product_name, assigned_quantity,
                  reported_quantity, physical_quantity, unit_type, notes
           FROM inventory_audit_items
           WHERE audit_id = $1
           ORDER BY product_sku, id"#,
    )
    .bind(audit_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Inserts audit lines one by one, outside any transaction.
pub async fn insert_audit_items(
    pool: &PgPool,
    audit_id: Uuid,
    items: &[DraftAuditItem],
    physical: impl Fn(&DraftAuditItem) -> Option<f64>,
) -> Result<(), AppError> {
    for item in items {
        sqlx::query(
            r#"INSERT INTO inventory_audit_items
                (id, audit_id, product_id, product_sku, product_name, assigned_quantity,
                 reported_quantity, physical_quantity, unit_type, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(Uuid::new_v4())
        .bind(audit_id)
        .bind(item.product_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.assigned)
        .bind(item.reported)
        .bind(physical(item))
        .bind(item.unit_type.to_string())
        .bind(&item.notes)
        .execute(pool)
        .await?;
    }
    Ok(())
}
