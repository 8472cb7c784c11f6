use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Caller, LedgerError, Money, PaymentMethod, ResultLedger, TransactionKind, calc, transactions,
};

use super::{Ledger, load_history, normalize_optional_text, replay_entries, upsert_balance, with_tx};

/// Parameters for [`Ledger::record`].
#[derive(Clone, Debug)]
pub struct RecordCmd {
    pub kind: TransactionKind,
    pub amount: Money,
    pub description: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl RecordCmd {
    #[must_use]
    pub fn new(kind: TransactionKind, amount: Money, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            amount,
            description: None,
            payment_method: PaymentMethod::default(),
            created_at,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }
}

/// Parameters for [`Ledger::amend`]. Fields left unset keep the stored
/// values.
#[derive(Clone, Debug)]
pub struct AmendCmd {
    pub new_amount: Money,
    /// `None` keeps the stored description; empty text clears it.
    pub description: Option<String>,
    /// `None` keeps the stored payment method.
    pub payment_method: Option<PaymentMethod>,
}

impl AmendCmd {
    #[must_use]
    pub fn new(new_amount: Money) -> Self {
        Self {
            new_amount,
            description: None,
            payment_method: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = Some(payment_method);
        self
    }
}

/// Amounts must be positive and at most [`Money::MAX`]; the bound keeps
/// replayed balance sums inside `i64`.
fn ensure_amount(amount: Money) -> ResultLedger<()> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount("amount must be > 0".to_string()));
    }
    if amount > Money::MAX {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must not exceed {}",
            Money::MAX
        )));
    }
    Ok(())
}

impl Ledger {
    /// Records a deposit or withdrawal against `owner_id`'s balance.
    ///
    /// The available balance is replayed from the full history, never read
    /// from the cache. A withdrawal exceeding it fails with
    /// [`LedgerError::InsufficientFunds`] and performs no write; there is no
    /// silent truncation on this path. Returns the new balance.
    pub async fn record(
        &self,
        caller: &Caller,
        owner_id: i64,
        cmd: RecordCmd,
    ) -> ResultLedger<Money> {
        self.require_self_or_admin(caller, owner_id)?;
        ensure_amount(cmd.amount)?;
        let description = normalize_optional_text(cmd.description.as_deref());

        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            self.require_owner(&db_tx, owner_id).await?;

            let history = load_history(&db_tx, owner_id).await?;
            let current = calc::final_balance(replay_entries(&history)?);

            let new_balance = match cmd.kind {
                TransactionKind::Deposit => current + cmd.amount,
                TransactionKind::Withdrawal => {
                    if cmd.amount > current {
                        return Err(LedgerError::InsufficientFunds(format!(
                            "cannot withdraw {}, available balance is {current}",
                            cmd.amount
                        )));
                    }
                    current - cmd.amount
                }
            };

            let row = transactions::ActiveModel {
                user_id: ActiveValue::Set(owner_id),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(cmd.amount.minor()),
                description: ActiveValue::Set(description.clone()),
                payment_method: ActiveValue::Set(cmd.payment_method.as_str().to_string()),
                created_at: ActiveValue::Set(cmd.created_at),
                balance_minor: ActiveValue::Set(Some(new_balance.minor())),
                ..Default::default()
            };
            row.insert(&db_tx).await?;

            upsert_balance(&db_tx, owner_id, new_balance, Utc::now()).await?;
            Ok(new_balance)
        })
    }

    /// Updates a transaction's amount (and optionally its description and
    /// payment method), then recomputes the running balance of that
    /// transaction and of everything after it for the same owner. Earlier
    /// rows are untouched; fields the command leaves unset keep their stored
    /// values.
    ///
    /// Admin only. Returns the owner's new balance.
    pub async fn amend(
        &self,
        caller: &Caller,
        transaction_id: i64,
        cmd: AmendCmd,
    ) -> ResultLedger<Money> {
        self.require_admin(caller)?;
        ensure_amount(cmd.new_amount)?;

        // Resolve the owner before taking their lock; the row is re-read
        // inside the transaction.
        let owner_id = self.find_transaction_owner(transaction_id).await?;
        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            let target = transactions::Entity::find_by_id(transaction_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("transaction not exists".to_string()))?;

            let mut active = transactions::ActiveModel {
                id: ActiveValue::Set(transaction_id),
                amount_minor: ActiveValue::Set(cmd.new_amount.minor()),
                ..Default::default()
            };
            if let Some(text) = cmd.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(text)));
            }
            if let Some(method) = cmd.payment_method {
                active.payment_method = ActiveValue::Set(method.as_str().to_string());
            }
            active.update(&db_tx).await?;

            let new_balance = self
                .rewrite_running_balances(
                    &db_tx,
                    target.user_id,
                    Some((target.created_at, target.id)),
                )
                .await?;
            Ok(new_balance)
        })
    }

    /// Deletes a transaction, then recomputes running balances for the
    /// remaining rows at or after the deleted position.
    ///
    /// Admin only. Returns the owner's new balance.
    pub async fn remove(&self, caller: &Caller, transaction_id: i64) -> ResultLedger<Money> {
        self.require_admin(caller)?;

        let owner_id = self.find_transaction_owner(transaction_id).await?;
        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            let target = transactions::Entity::find_by_id(transaction_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| LedgerError::NotFound("transaction not exists".to_string()))?;

            let res = transactions::Entity::delete_by_id(transaction_id)
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                return Err(LedgerError::NotFound("transaction not exists".to_string()));
            }

            let new_balance = self
                .rewrite_running_balances(
                    &db_tx,
                    target.user_id,
                    Some((target.created_at, target.id)),
                )
                .await?;
            Ok(new_balance)
        })
    }

    /// Deletes a batch of transactions belonging to `owner_id`, then fully
    /// replays the remaining history.
    ///
    /// All-or-nothing: if any id does not resolve within the owner's set, the
    /// whole operation rolls back and nothing is deleted. A full replay (not
    /// a forward patch) is used because multiple interior deletions make
    /// "seed from immediately before" ambiguous.
    ///
    /// Admin only. Returns the owner's new balance.
    pub async fn remove_many(
        &self,
        caller: &Caller,
        owner_id: i64,
        transaction_ids: &[i64],
    ) -> ResultLedger<Money> {
        self.require_admin(caller)?;
        if transaction_ids.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "transaction_ids must not be empty".to_string(),
            ));
        }
        let mut ids = transaction_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            let res = transactions::Entity::delete_many()
                .filter(transactions::Column::Id.is_in(ids.clone()))
                .filter(transactions::Column::UserId.eq(owner_id))
                .exec(&db_tx)
                .await?;
            // Dropping the transaction rolls the deletes back.
            if res.rows_affected != ids.len() as u64 {
                return Err(LedgerError::NotFound(
                    "transaction not exists for this user".to_string(),
                ));
            }

            let new_balance = self
                .rewrite_running_balances(&db_tx, owner_id, None)
                .await?;
            Ok(new_balance)
        })
    }

    async fn find_transaction_owner(&self, transaction_id: i64) -> ResultLedger<i64> {
        let target = transactions::Entity::find_by_id(transaction_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("transaction not exists".to_string()))?;
        Ok(target.user_id)
    }

    /// Replays the owner's history and rewrites every stale cached running
    /// balance from `from` (a `(created_at, id)` position; `None` means the
    /// start) onward, plus the owner's balance record.
    pub(super) async fn rewrite_running_balances(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: i64,
        from: Option<(DateTime<Utc>, i64)>,
    ) -> ResultLedger<Money> {
        let history = load_history(db_tx, owner_id).await?;
        let out = calc::replay(replay_entries(&history)?);

        let start = match from {
            Some(key) => history
                .iter()
                .position(|row| (row.created_at, row.id) >= key)
                .unwrap_or(history.len()),
            None => 0,
        };

        for (row, balance) in history.iter().zip(out.running.iter()).skip(start) {
            if row.balance_minor != Some(balance.minor()) {
                let active = transactions::ActiveModel {
                    id: ActiveValue::Set(row.id),
                    balance_minor: ActiveValue::Set(Some(balance.minor())),
                    ..Default::default()
                };
                active.update(db_tx).await?;
            }
        }

        upsert_balance(db_tx, owner_id, out.final_balance, Utc::now()).await?;
        Ok(out.final_balance)
    }
}
