use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError, Weak},
};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, prelude::*,
    sea_query::OnConflict,
};
use tokio::sync::Mutex as OwnerMutex;

use crate::{Money, ResultLedger, TransactionKind, balances, transactions};

mod access;
mod list;
mod reconcile;
mod write;

pub use list::OwnerSummary;
pub use reconcile::{ReconcileMode, ReconcileReport};
pub use write::{AmendCmd, RecordCmd};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The only component permitted to write transaction or balance state.
///
/// Mutations for one owner are serialized through a per-owner async lock, so
/// concurrent record/amend/remove calls (and reconciliation, which is just
/// another mutator) cannot interleave their read-modify-write of the running
/// balance chain. Operations on different owners run in parallel.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
    // Weak handles: an entry outlives its lock only until the next miss,
    // which sweeps released owners out of the map.
    owner_locks: StdMutex<HashMap<i64, Weak<OwnerMutex<()>>>>,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    pub(crate) fn owner_lock(&self, owner_id: i64) -> Arc<OwnerMutex<()>> {
        let mut locks = self
            .owner_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(&owner_id).and_then(Weak::upgrade) {
            return lock;
        }

        locks.retain(|_, weak| weak.strong_count() > 0);
        let lock = Arc::new(OwnerMutex::new(()));
        locks.insert(owner_id, Arc::downgrade(&lock));
        lock
    }
}

/// Fetches one owner's full history in replay order: created_at ascending,
/// ties broken by id ascending.
pub(crate) async fn load_history<C>(
    db: &C,
    owner_id: i64,
) -> ResultLedger<Vec<transactions::Model>>
where
    C: ConnectionTrait,
{
    transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(owner_id))
        .order_by_asc(transactions::Column::CreatedAt)
        .order_by_asc(transactions::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Maps stored rows to the calculator's input.
pub(crate) fn replay_entries(
    history: &[transactions::Model],
) -> ResultLedger<Vec<(TransactionKind, Money)>> {
    history
        .iter()
        .map(|row| {
            Ok((
                TransactionKind::try_from(row.kind.as_str())?,
                Money::new(row.amount_minor),
            ))
        })
        .collect()
}

pub(crate) async fn upsert_balance<C>(
    db: &C,
    owner_id: i64,
    balance: Money,
    now: DateTime<Utc>,
) -> ResultLedger<()>
where
    C: ConnectionTrait,
{
    let row = balances::ActiveModel {
        user_id: ActiveValue::Set(owner_id),
        balance_minor: ActiveValue::Set(balance.minor()),
        updated_at: ActiveValue::Set(now),
    };
    balances::Entity::insert(row)
        .on_conflict(
            OnConflict::column(balances::Column::UserId)
                .update_columns([
                    balances::Column::BalanceMinor,
                    balances::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
            owner_locks: StdMutex::new(HashMap::new()),
        }
    }
}
