use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::audit::{
    approve_audit, audit_detail, audit_history, audit_sheet, finalize_day, pending_audits, save_audit,
};
use crate::handlers::ledger::{team_ledger, technician_ledger};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/technicians/{id}/ledger", get(technician_ledger))
        .route("/teams/{id}/ledger", get(team_ledger))
        .route("/audits", post(save_audit))
        .route("/audits/pending", get(pending_audits))
        .route("/audits/finalize-day", post(finalize_day))
        .route("/audits/sheet/{entity_id}", get(audit_sheet))
        .route("/audits/history/{entity_id}", get(audit_history))
        .route("/audits/{id}", get(audit_detail))
        .route("/audits/{id}/approve", post(approve_audit))
        .route_layer(middleware::from_fn(require_auth))
}
