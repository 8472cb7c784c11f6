//! Balance and summary endpoints

use api_types::balance::{BalanceView, OwnerQuery, SummaryView};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{ServerError, server::ServerState};
use ledger::{Money, users};

pub(crate) fn balance_view(balance: Money) -> Json<BalanceView> {
    Json(BalanceView {
        balance_minor: balance.minor(),
    })
}

pub async fn get(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<BalanceView>, ServerError> {
    let caller = account.caller()?;
    let owner_id = query.user_id.unwrap_or(account.id);
    let balance = state.ledger.balance_of(&caller, owner_id).await?;
    Ok(balance_view(balance))
}

pub async fn summary(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<SummaryView>, ServerError> {
    let caller = account.caller()?;
    let owner_id = query.user_id.unwrap_or(account.id);
    let summary = state.ledger.summary(&caller, owner_id).await?;
    Ok(Json(SummaryView {
        total_deposits_minor: summary.total_deposits.minor(),
        total_withdrawals_minor: summary.total_withdrawals.minor(),
        transactions: summary.transactions,
    }))
}
