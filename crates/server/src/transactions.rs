//! Transactions API endpoints

use api_types::transaction::{
    BulkDelete, TransactionListQuery, TransactionListResponse, TransactionNew, TransactionUpdate,
    TransactionView,
};
use api_types::{PaymentMethod as ApiPaymentMethod, TransactionKind as ApiKind};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;

use crate::{ServerError, balance::balance_view, server::ServerState};
use ledger::{AmendCmd, RecordCmd, users};

// Original UI pages ten transactions at a time.
const DEFAULT_PAGE_SIZE: u64 = 10;

pub(crate) fn map_kind(kind: ApiKind) -> ledger::TransactionKind {
    match kind {
        ApiKind::Deposit => ledger::TransactionKind::Deposit,
        ApiKind::Withdrawal => ledger::TransactionKind::Withdrawal,
    }
}

fn map_kind_out(kind: ledger::TransactionKind) -> ApiKind {
    match kind {
        ledger::TransactionKind::Deposit => ApiKind::Deposit,
        ledger::TransactionKind::Withdrawal => ApiKind::Withdrawal,
    }
}

pub(crate) fn map_payment_method(method: ApiPaymentMethod) -> ledger::PaymentMethod {
    match method {
        ApiPaymentMethod::Momo => ledger::PaymentMethod::Momo,
        ApiPaymentMethod::Airtel => ledger::PaymentMethod::Airtel,
        ApiPaymentMethod::Bank => ledger::PaymentMethod::Bank,
    }
}

fn map_payment_method_out(method: ledger::PaymentMethod) -> ApiPaymentMethod {
    match method {
        ledger::PaymentMethod::Momo => ApiPaymentMethod::Momo,
        ledger::PaymentMethod::Airtel => ApiPaymentMethod::Airtel,
        ledger::PaymentMethod::Bank => ApiPaymentMethod::Bank,
    }
}

fn map_transaction(tx: ledger::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        user_id: tx.user_id,
        kind: map_kind_out(tx.kind),
        amount_minor: tx.amount.minor(),
        description: tx.description,
        payment_method: map_payment_method_out(tx.payment_method),
        created_at: tx.created_at,
        balance_minor: tx.balance.map(ledger::Money::minor),
    }
}

pub async fn record(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<api_types::balance::BalanceView>, ServerError> {
    let caller = account.caller()?;
    let owner_id = payload.user_id.unwrap_or(account.id);

    let mut cmd = RecordCmd::new(
        map_kind(payload.kind),
        ledger::Money::new(payload.amount_minor),
        Utc::now(),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(method) = payload.payment_method {
        cmd = cmd.payment_method(map_payment_method(method));
    }

    let new_balance = state.ledger.record(&caller, owner_id, cmd).await?;
    Ok(balance_view(new_balance))
}

pub async fn list(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let caller = account.caller()?;
    let owner_id = query.user_id.unwrap_or(account.id);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let (transactions, total) = state
        .ledger
        .transactions_page(&caller, owner_id, limit, offset)
        .await?;
    let balance = state.ledger.balance_of(&caller, owner_id).await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(map_transaction).collect(),
        total,
        balance_minor: balance.minor(),
    }))
}

pub async fn update(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<api_types::balance::BalanceView>, ServerError> {
    let caller = account.caller()?;

    let mut cmd = AmendCmd::new(ledger::Money::new(payload.amount_minor));
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(method) = payload.payment_method {
        cmd = cmd.payment_method(map_payment_method(method));
    }

    let new_balance = state.ledger.amend(&caller, transaction_id, cmd).await?;
    Ok(balance_view(new_balance))
}

pub async fn delete(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<api_types::balance::BalanceView>, ServerError> {
    let caller = account.caller()?;
    let new_balance = state.ledger.remove(&caller, transaction_id).await?;
    Ok(balance_view(new_balance))
}

pub async fn bulk_delete(
    Extension(account): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BulkDelete>,
) -> Result<Json<api_types::balance::BalanceView>, ServerError> {
    let caller = account.caller()?;
    let new_balance = state
        .ledger
        .remove_many(&caller, payload.user_id, &payload.transaction_ids)
        .await?;
    Ok(balance_view(new_balance))
}
