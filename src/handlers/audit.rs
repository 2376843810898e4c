use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{FixedOffset, Utc};
use sqlx::PgPool;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::dtos::audit::{
    ApproveAuditRequest, AuditDetailResponse, AuditLineInput, AuditLineView, AuditSheetResponse,
    FinalizeDayRequest, FinalizeDayResponse, SaveAuditRequest, SaveAuditResponse,
};
use crate::error::AppError;
use crate::handlers::records::{
    fetch_assignments, fetch_audit, fetch_audit_items, fetch_reports, fetch_standard_products, header_scope,
    insert_audit_items, load_stock, resolve_entity, team_scope, technician_scope, AUDIT_COLUMNS,
};
use crate::inventory::audit::{
    build_sheet, business_day_bounds, business_day_start, plan_adjustments, plan_day_close, reports_in_batch,
    todays_audit, unit_type_for, AuditTarget, CountedLine, DayClosePlan, DraftAuditItem, StockAdjustment,
};
use crate::inventory::review::{installations_between, resync_pending, spool_breakdown, without_spool_records};
use crate::inventory::usage::UsageTally;
use crate::middleware::auth::AuthContext;
use crate::models::audit::{AuditHeader, AuditStatus};
use crate::state::AppState;

fn require_supervisor(auth: &AuthContext) -> Result<(), AppError> {
    if auth.is_supervisor() {
        Ok(())
    } else {
        Err(AppError::forbidden("Only supervisors can reconcile audits"))
    }
}

#[instrument(skip(state, _auth))]
pub async fn audit_sheet(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(entity_id): Path<Uuid>,
) -> Result<Json<AuditSheetResponse>, AppError> {
    let pool = &state.db_pool;
    let entity = resolve_entity(pool, entity_id).await?;
    let (technician_id, team_id, members) = match &entity.target {
        AuditTarget::Technician(id) => (Some(*id), None, vec![*id]),
        AuditTarget::Team { id, members } => (None, Some(*id), members.clone()),
    };

    let pending_sql = format!(
        "SELECT {AUDIT_COLUMNS} FROM inventory_audits
         WHERE (technician_id = $1 OR team_id = $1) AND status = $2
         ORDER BY created_at DESC LIMIT 1"
    );
    let (pending, stock, standard) = tokio::try_join!(
        async {
            sqlx::query_as::<_, AuditHeader>(&pending_sql)
                .bind(entity_id)
                .bind(AuditStatus::Pending.to_string())
                .fetch_optional(pool)
                .await
                .map_err(AppError::from)
        },
        load_stock(pool, &entity.scope),
        fetch_standard_products(pool),
    )?;

    let tally = UsageTally::from_reports(&stock.reports);
    let window_day = pending.as_ref().map(|a| a.created_at).unwrap_or_else(Utc::now);
    let (from, to) = business_day_bounds(window_day, state.config.offset());
    let installations = installations_between(&stock.reports, from, to);

    if let Some(audit) = pending {
        let saved = fetch_audit_items(pool, audit.id).await?;
        let spools = spool_breakdown(&stock.ledger, &tally, &installations, &saved, false);
        let lines = resync_pending(saved, &spools).into_iter().map(AuditLineView::from).collect();
        return Ok(Json(AuditSheetResponse {
            audit: Some(audit),
            technician_id,
            team_id,
            members,
            lines,
            spools,
            installations,
        }));
    }

    let spools = spool_breakdown(&stock.ledger, &tally, &installations, &[], false);
    let lines = build_sheet(&stock.assignments, &tally, &standard)
        .into_iter()
        .map(|line| {
            AuditLineView::from_counts(
                None,
                line.product_id,
                line.sku,
                line.name,
                line.unit_type.to_string(),
                (line.assigned, line.reported, None),
                None,
            )
        })
        .collect();

    Ok(Json(AuditSheetResponse { audit: None, technician_id, team_id, members, lines, spools, installations }))
}

/// Technician closes the day: one audit per business day, later closes append a batch.
#[instrument(skip(state, auth, req), fields(user = %auth.user_id))]
pub async fn finalize_day(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<FinalizeDayRequest>,
) -> Result<(StatusCode, Json<FinalizeDayResponse>), AppError> {
    let technician_id = req.technician_id.unwrap_or(auth.user_id);
    if technician_id != auth.user_id && !auth.is_supervisor() {
        return Err(AppError::forbidden("You can only close your own day"));
    }

    let pool = &state.db_pool;
    let scope = technician_scope(pool, technician_id).await?;
    let offset = state.config.offset();
    let now = Utc::now();
    let day_start = business_day_start(now, offset);

    let todays = sqlx::query_as::<_, AuditHeader>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM inventory_audits
         WHERE technician_id = $1 AND created_at >= $2
         ORDER BY created_at DESC"
    ))
    .bind(technician_id)
    .bind(day_start)
    .fetch_all(pool)
    .await?;

    let existing = todays_audit(&todays, now, offset);
    let since = existing.map(AuditHeader::cutoff).unwrap_or(day_start);

    let (assignments, reports, standard) = tokio::try_join!(
        fetch_assignments(pool, &scope),
        fetch_reports(pool, &scope, Some(since)),
        fetch_standard_products(pool),
    )?;
    let tally = UsageTally::from_reports(reports_in_batch(&reports, since, now));
    let lines = build_sheet(&assignments, &tally, &standard);

    match plan_day_close(existing, lines, now.with_timezone(&offset)) {
        DayClosePlan::Create { notes, items } => {
            let audit_id = Uuid::new_v4();
            sqlx::query(
                r#"INSERT INTO inventory_audits (id, technician_id, notes, status, last_batch_at)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(audit_id)
            .bind(technician_id)
            .bind(&notes)
            .bind(AuditStatus::Pending.to_string())
            .bind(now)
            .execute(pool)
            .await?;

            // A failure here leaves an empty header; the next close appends to it.
            insert_audit_items(pool, audit_id, &items, |_| None).await.map_err(|e| {
                error!(?e, %audit_id, "Audit header saved without its items");
                e
            })?;

            info!(%audit_id, items = items.len(), "Day close audit created");
            Ok((
                StatusCode::CREATED,
                Json(FinalizeDayResponse { audit_id, created: true, items_added: items.len(), notes }),
            ))
        }
        DayClosePlan::Append { audit_id, notes, items } => {
            sqlx::query(
                r#"UPDATE inventory_audits
                   SET notes = $1, status = $2, updated_at = NOW(), last_batch_at = $3
                   WHERE id = $4"#,
            )
            .bind(&notes)
            .bind(AuditStatus::Pending.to_string())
            .bind(now)
            .bind(audit_id)
            .execute(pool)
            .await?;

            insert_audit_items(pool, audit_id, &items, |_| None).await?;

            info!(%audit_id, items = items.len(), "Day close batch appended");
            Ok((
                StatusCode::OK,
                Json(FinalizeDayResponse { audit_id, created: false, items_added: items.len(), notes }),
            ))
        }
    }
}

/// Supervisor saves physical counts, optionally turning them into stock corrections.
#[instrument(skip(state, auth, req), fields(user = %auth.user_id))]
pub async fn save_audit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SaveAuditRequest>,
) -> Result<(StatusCode, Json<SaveAuditResponse>), AppError> {
    require_supervisor(&auth)?;
    if req.items.is_empty() {
        return Err(AppError::validation("An audit needs at least one line"));
    }

    let pool = &state.db_pool;
    let (audit_id, target, created) = match req.audit_id {
        Some(audit_id) => {
            let header = fetch_audit(pool, audit_id).await?;
            if !header.is_pending() {
                return Err(AppError::conflict("Audit is already completed"));
            }
            let counts = counts_by_item(&req.items)?;
            let target = target_for_header(pool, &header).await?;

            // Leaves last_batch_at alone so the next day close still sees every job since its batch.
            sqlx::query("UPDATE inventory_audits SET notes = COALESCE($1, notes), updated_at = NOW() WHERE id = $2")
                .bind(&req.notes)
                .bind(audit_id)
                .execute(pool)
                .await?;

            for (item_id, physical) in counts {
                sqlx::query("UPDATE inventory_audit_items SET physical_quantity = $1 WHERE id = $2 AND audit_id = $3")
                    .bind(physical)
                    .bind(item_id)
                    .bind(audit_id)
                    .execute(pool)
                    .await?;
            }
            (audit_id, target, false)
        }
        None => {
            let target = match (req.technician_id, req.team_id) {
                (Some(id), None) => {
                    technician_scope(pool, id).await?;
                    AuditTarget::Technician(id)
                }
                (None, Some(id)) => {
                    let scope = team_scope(pool, id).await?;
                    AuditTarget::Team { id, members: scope.member_ids }
                }
                _ => return Err(AppError::validation("Provide either technician_id or team_id")),
            };
            let (technician_id, team_id) = match &target {
                // Crew audits also name their first member so history survives the crew.
                AuditTarget::Team { id, .. } => (target.holder(), Some(*id)),
                AuditTarget::Technician(id) => (Some(*id), None),
            };

            let audit_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO inventory_audits (id, technician_id, team_id, notes, status) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(audit_id)
            .bind(technician_id)
            .bind(team_id)
            .bind(&req.notes)
            .bind(AuditStatus::Pending.to_string())
            .execute(pool)
            .await?;

            for item in &req.items {
                let draft = DraftAuditItem {
                    product_id: item.product_id,
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    assigned: item.assigned,
                    reported: item.reported,
                    unit_type: item.unit_type.unwrap_or_else(|| unit_type_for(&item.sku, &item.name)),
                    notes: None,
                };
                insert_audit_items(pool, audit_id, std::slice::from_ref(&draft), |_| item.physical).await?;
            }

            (audit_id, target, true)
        }
    };

    let mut adjustments = Vec::new();
    if req.reconcile_stock {
        let counted: Vec<CountedLine> = req
            .items
            .iter()
            .map(|item| CountedLine {
                product_id: item.product_id,
                sku: item.sku.clone(),
                assigned: item.assigned,
                reported: item.reported,
                physical: item.physical,
            })
            .collect();
        adjustments = plan_adjustments(&counted, &target);
        record_adjustments(pool, &adjustments, &auth).await?;
    }

    info!(%audit_id, created, adjustments = adjustments.len(), "Audit saved");
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(SaveAuditResponse { audit_id, created, adjustments: adjustments.len() })))
}

/// Supervisor finalises an audit: counts, reel overrides, then COMPLETED.
#[instrument(skip(state, auth, req), fields(user = %auth.user_id))]
pub async fn approve_audit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(audit_id): Path<Uuid>,
    Json(req): Json<ApproveAuditRequest>,
) -> Result<Json<AuditDetailResponse>, AppError> {
    require_supervisor(&auth)?;
    let pool = &state.db_pool;
    let header = fetch_audit(pool, audit_id).await?;
    let holder = match target_for_header(pool, &header).await {
        Ok(target) => target.holder(),
        Err(_) => None,
    }
    .unwrap_or(auth.user_id);

    for item in &req.items {
        sqlx::query("UPDATE inventory_audit_items SET physical_quantity = $1 WHERE id = $2 AND audit_id = $3")
            .bind(item.physical_quantity)
            .bind(item.id)
            .bind(audit_id)
            .execute(pool)
            .await?;
    }

    for count in &req.spool_updates {
        sqlx::query("UPDATE inventory_serials SET current_quantity = $1 WHERE serial_number = $2")
            .bind(count.physical)
            .bind(&count.serial)
            .execute(pool)
            .await?;

        let draft = count.audit_item();
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM inventory_audit_items WHERE audit_id = $1 AND product_sku = $2",
        )
        .bind(audit_id)
        .bind(&count.serial)
        .fetch_optional(pool)
        .await?;

        match existing {
            Some(item_id) => {
                sqlx::query(
                    r#"UPDATE inventory_audit_items
                       SET physical_quantity = $1, assigned_quantity = $2, reported_quantity = $3
                       WHERE id = $4"#,
                )
                .bind(count.physical)
                .bind(draft.assigned)
                .bind(draft.reported)
                .bind(item_id)
                .execute(pool)
                .await?;
            }
            None => {
                insert_audit_items(pool, audit_id, std::slice::from_ref(&draft), |_| Some(count.physical)).await?;
            }
        }
    }

    let spool_adjustments: Vec<StockAdjustment> =
        req.spool_updates.iter().map(|count| count.stock_adjustment(holder)).collect();
    record_adjustments(pool, &spool_adjustments, &auth).await?;

    sqlx::query(
        "UPDATE inventory_audits SET status = $1, notes = COALESCE($2, notes), updated_at = NOW() WHERE id = $3",
    )
    .bind(AuditStatus::Completed.to_string())
    .bind(&req.notes)
    .bind(audit_id)
    .execute(pool)
    .await?;

    info!(%audit_id, spools = req.spool_updates.len(), "Audit approved");
    audit_detail_response(pool, audit_id, state.config.offset()).await.map(Json)
}

#[instrument(skip(state, _auth))]
pub async fn pending_audits(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> Result<Json<Vec<AuditHeader>>, AppError> {
    let audits = sqlx::query_as::<_, AuditHeader>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM inventory_audits WHERE status = $1 ORDER BY created_at DESC"
    ))
    .bind(AuditStatus::Pending.to_string())
    .fetch_all(&state.db_pool)
    .await?;
    Ok(Json(audits))
}

#[instrument(skip(state, _auth))]
pub async fn audit_history(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(entity_id): Path<Uuid>,
) -> Result<Json<Vec<AuditHeader>>, AppError> {
    let audits = sqlx::query_as::<_, AuditHeader>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM inventory_audits
         WHERE team_id = $1 OR technician_id = $1
         ORDER BY created_at DESC"
    ))
    .bind(entity_id)
    .fetch_all(&state.db_pool)
    .await?;
    Ok(Json(audits))
}

#[instrument(skip(state, _auth))]
pub async fn audit_detail(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(audit_id): Path<Uuid>,
) -> Result<Json<AuditDetailResponse>, AppError> {
    audit_detail_response(&state.db_pool, audit_id, state.config.offset()).await.map(Json)
}

/// Audit lines plus live reel figures and the installations of the audit's business day.
async fn audit_detail_response(
    pool: &PgPool,
    audit_id: Uuid,
    offset: FixedOffset,
) -> Result<AuditDetailResponse, AppError> {
    let (audit, items) = tokio::try_join!(fetch_audit(pool, audit_id), fetch_audit_items(pool, audit_id))?;

    let scope = header_scope(pool, &audit).await?;
    let Some(scope) = scope else {
        let lines = items.into_iter().map(AuditLineView::from).collect();
        return Ok(AuditDetailResponse { audit, lines, spools: Vec::new(), installations: Vec::new() });
    };

    let stock = load_stock(pool, &scope).await?;
    let tally = UsageTally::from_reports(&stock.reports);
    let (from, to) = business_day_bounds(audit.created_at, offset);
    let installations = installations_between(&stock.reports, from, to);
    let spools = spool_breakdown(&stock.ledger, &tally, &installations, &items, !audit.is_pending());
    let lines = without_spool_records(items, &spools).into_iter().map(AuditLineView::from).collect();

    Ok(AuditDetailResponse { audit, lines, spools, installations })
}

/// Physical counts keyed by audit line. Lines of one SKU can repeat across day-close
/// batches, so every line must name its item.
fn counts_by_item(items: &[AuditLineInput]) -> Result<Vec<(Uuid, Option<f64>)>, AppError> {
    items
        .iter()
        .map(|item| {
            item.item_id
                .map(|id| (id, item.physical))
                .ok_or_else(|| AppError::validation(format!("Line {} is missing its item id", item.sku)))
        })
        .collect()
}

async fn target_for_header(pool: &PgPool, header: &AuditHeader) -> Result<AuditTarget, AppError> {
    match (header.team_id, header.technician_id) {
        (Some(team_id), _) => {
            let members = team_scope(pool, team_id).await.map(|s| s.member_ids).unwrap_or_default();
            Ok(AuditTarget::Team { id: team_id, members })
        }
        (None, Some(technician_id)) => Ok(AuditTarget::Technician(technician_id)),
        (None, None) => Err(AppError::internal(format!("Audit {} has no owner", header.id))),
    }
}

async fn record_adjustments(pool: &PgPool, adjustments: &[StockAdjustment], auth: &AuthContext) -> Result<(), AppError> {
    for adjustment in adjustments {
        sqlx::query(
            r#"INSERT INTO inventory_transactions
                (id, product_id, kind, quantity, reason, assigned_to, receiver_id, received_by, serials)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(Uuid::new_v4())
        .bind(adjustment.product_id)
        .bind(adjustment.kind.to_string())
        .bind(adjustment.quantity)
        .bind(&adjustment.reason)
        .bind(adjustment.holder)
        .bind(auth.user_id)
        .bind(&auth.username)
        .bind(&adjustment.serials)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(?e, "Stock adjustment failed");
            AppError::internal(format!("Could not record stock adjustment: {e}"))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: Option<Uuid>, sku: &str, physical: Option<f64>) -> AuditLineInput {
        AuditLineInput {
            item_id,
            product_id: None,
            sku: sku.to_string(),
            name: sku.to_string(),
            assigned: 0.0,
            reported: 0.0,
            physical,
            unit_type: None,
        }
    }

    #[test]
    fn counts_target_individual_batch_lines() {
        let (initial, batch) = (Uuid::new_v4(), Uuid::new_v4());
        let counts = counts_by_item(&[line(Some(initial), "CONV", Some(8.0)), line(Some(batch), "CONV", None)]).unwrap();
        assert_eq!(counts, vec![(initial, Some(8.0)), (batch, None)]);
    }

    #[test]
    fn counts_without_an_item_id_are_rejected() {
        let err = counts_by_item(&[line(Some(Uuid::new_v4()), "CONV", Some(8.0)), line(None, "TENS", Some(1.0))])
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("TENS")));
    }
}
