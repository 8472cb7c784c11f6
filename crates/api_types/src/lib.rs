use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Momo,
    Airtel,
    Bank,
}

pub mod transaction {
    use super::*;

    /// Request body for recording a deposit or withdrawal.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        /// Amount in minor units (centimes), > 0.
        pub amount_minor: i64,
        pub description: Option<String>,
        pub payment_method: Option<PaymentMethod>,
        /// Record the transaction for another user (admin only).
        pub user_id: Option<i64>,
    }

    /// Request body for amending a transaction (admin only).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount_minor: i64,
        pub description: Option<String>,
        pub payment_method: Option<PaymentMethod>,
    }

    /// Request body for bulk deletion (admin only).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BulkDelete {
        pub user_id: i64,
        pub transaction_ids: Vec<i64>,
    }

    /// Query parameters for listing transactions.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub limit: Option<u64>,
        pub offset: Option<u64>,
        /// View another user's ledger (admin only).
        pub user_id: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub user_id: i64,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub payment_method: PaymentMethod,
        pub created_at: DateTime<Utc>,
        /// Cached running balance after this transaction, if computed.
        pub balance_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub total: u64,
        pub balance_minor: i64,
    }
}

pub mod balance {
    use super::*;

    /// Response carrying the owner's balance after an operation or read.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub balance_minor: i64,
    }

    /// Query parameters for balance/summary reads.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OwnerQuery {
        /// Read another user's ledger (admin only).
        pub user_id: Option<i64>,
    }

    /// Aggregate totals for one owner.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryView {
        pub total_deposits_minor: i64,
        pub total_withdrawals_minor: i64,
        pub transactions: u64,
    }
}

pub mod reconcile {
    use super::*;

    /// Request body for a reconciliation run (admin only).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReconcileRun {
        /// Destructive mode: rewrite anomalous withdrawal amounts to the
        /// available balance. Defaults to false.
        pub truncate_anomalies: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileReportView {
        pub owners_processed: u64,
        pub anomalies_found: u64,
        pub amounts_truncated: u64,
    }
}

pub mod user {
    use super::*;

    /// Request body for self-service registration.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserCreated {
        pub id: i64,
        pub username: String,
    }
}
