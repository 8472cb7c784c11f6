//! Savings ledger core.
//!
//! The transaction history is the source of truth; per-row running balances
//! and the per-owner balance record are caches maintained exclusively by the
//! [`Ledger`] ops. The rules:
//!
//! - balances are derived by replaying the history in (created_at, id) order
//!   through [`calc::replay`], clamped at zero, never read back from caches
//!   when deciding whether a withdrawal is covered;
//! - every mutation runs in one database transaction and under a per-owner
//!   lock, so partial balance states are never observable;
//! - over-withdrawal is rejected when recording; stored amounts are only ever
//!   rewritten by the explicit destructive reconciliation mode, which logs
//!   each rewrite append-only.

pub use error::LedgerError;
pub use money::Money;
pub use ops::{
    AmendCmd, Ledger, LedgerBuilder, OwnerSummary, ReconcileMode, ReconcileReport, RecordCmd,
};
pub use transactions::{PaymentMethod, Transaction, TransactionKind};
pub use users::{Caller, Role, hash_password};

pub mod adjustments;
pub mod balances;
pub mod calc;
mod error;
mod money;
mod ops;
pub mod transactions;
pub mod users;

type ResultLedger<T> = Result<T, LedgerError>;
