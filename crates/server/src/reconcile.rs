//! Ledger reconciliation endpoint

use api_types::reconcile::{ReconcileReportView, ReconcileRun};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState};
use ledger::{ReconcileMode, users};

pub async fn run(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ReconcileRun>,
) -> Result<Json<ReconcileReportView>, ServerError> {
    let caller = account.caller()?;
    let mode = if payload.truncate_anomalies.unwrap_or(false) {
        ReconcileMode::TruncateAnomalies
    } else {
        ReconcileMode::ClampOnly
    };

    let report = state.ledger.reconcile(&caller, mode).await?;
    Ok(Json(ReconcileReportView {
        owners_processed: report.owners_processed,
        anomalies_found: report.anomalies_found,
        amounts_truncated: report.amounts_truncated,
    }))
}
