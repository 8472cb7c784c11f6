use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    Caller, Money, ResultLedger, Transaction, TransactionKind, balances, calc, transactions,
};

use super::{Ledger, load_history, replay_entries};

/// Aggregate totals for one owner's ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnerSummary {
    pub total_deposits: Money,
    pub total_withdrawals: Money,
    pub transactions: u64,
}

impl Ledger {
    /// Returns the owner's current balance.
    ///
    /// Reads the cache; when no balance record exists yet, the balance is
    /// derived by replaying the history without writing anything back
    /// (reads never mutate state).
    pub async fn balance_of(&self, caller: &Caller, owner_id: i64) -> ResultLedger<Money> {
        self.require_self_or_admin(caller, owner_id)?;

        let cached = balances::Entity::find_by_id(owner_id)
            .one(&self.database)
            .await?;
        if let Some(record) = cached {
            return Ok(Money::new(record.balance_minor).clamp_zero());
        }

        let history = load_history(&self.database, owner_id).await?;
        Ok(calc::final_balance(replay_entries(&history)?))
    }

    /// Returns one page of the owner's transactions, newest first, together
    /// with the total count.
    pub async fn transactions_page(
        &self,
        caller: &Caller,
        owner_id: i64,
        limit: u64,
        offset: u64,
    ) -> ResultLedger<(Vec<Transaction>, u64)> {
        self.require_self_or_admin(caller, owner_id)?;

        let total = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(owner_id))
            .count(&self.database)
            .await?;

        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(owner_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Transaction::try_from(row)?);
        }
        Ok((out, total))
    }

    /// Returns deposit/withdrawal totals and the transaction count for one
    /// owner. Presentation stays in the callers.
    pub async fn summary(&self, caller: &Caller, owner_id: i64) -> ResultLedger<OwnerSummary> {
        self.require_self_or_admin(caller, owner_id)?;

        let history = load_history(&self.database, owner_id).await?;
        let mut summary = OwnerSummary::default();
        for (kind, amount) in replay_entries(&history)? {
            match kind {
                TransactionKind::Deposit => summary.total_deposits += amount,
                TransactionKind::Withdrawal => summary.total_withdrawals += amount,
            }
            summary.transactions += 1;
        }
        Ok(summary)
    }
}
