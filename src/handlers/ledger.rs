use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::dtos::ledger::{LedgerLine, LedgerResponse};
use crate::error::AppError;
use crate::handlers::records::{load_stock, team_scope, technician_scope};
use crate::inventory::kit::check_minimum_kit;
use crate::inventory::ledger::LedgerScope;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn technician_ledger(
    State(state): State<AppState>,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<LedgerResponse>, AppError> {
    let scope = technician_scope(&state.db_pool, technician_id).await?;
    build_ledger(&state, scope).await.map(Json)
}

#[instrument(skip(state))]
pub async fn team_ledger(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<LedgerResponse>, AppError> {
    let scope = team_scope(&state.db_pool, team_id).await?;
    build_ledger(&state, scope).await.map(Json)
}

async fn build_ledger(state: &AppState, scope: LedgerScope) -> Result<LedgerResponse, AppError> {
    let stock = load_stock(&state.db_pool, &scope).await?;

    let kit = check_minimum_kit(&stock.ledger, state.config.installation_restrictions_enabled);
    let items = stock.ledger.visible().map(|(key, entry)| LedgerLine::new(key, entry)).collect();

    Ok(LedgerResponse {
        technician_id: scope.technician_id,
        team_id: scope.team_id,
        team_name: scope.team_name,
        items,
        kit,
    })
}
