use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QuerySelect, TransactionTrait, prelude::*};

use crate::{Caller, Money, ResultLedger, adjustments, calc, transactions};

use super::{Ledger, load_history, replay_entries, upsert_balance, with_tx};

/// How reconciliation treats withdrawals that could not have been covered by
/// the balance at that point of the history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Flag the anomaly and clamp the running-balance cache at zero; never
    /// touch stored amounts.
    #[default]
    ClampOnly,
    /// Destructive: rewrite the anomalous withdrawal's amount to the balance
    /// that was available, appending each rewrite to `balance_adjustments`.
    TruncateAnomalies,
}

/// Outcome of a reconciliation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub owners_processed: u64,
    pub anomalies_found: u64,
    pub amounts_truncated: u64,
}

impl Ledger {
    /// Full repair pass: replays every owner's history and rewrites stale
    /// running-balance caches and balance records.
    ///
    /// Takes the same per-owner serialization as ordinary mutations, one
    /// owner at a time, so a live `record` call cannot race the pass.
    /// Idempotent: a second run with no intervening mutations yields the same
    /// balances, and zero anomalies after a truncate run.
    ///
    /// Admin only.
    pub async fn reconcile(
        &self,
        caller: &Caller,
        mode: ReconcileMode,
    ) -> ResultLedger<ReconcileReport> {
        self.require_admin(caller)?;

        let owners: Vec<i64> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::UserId)
            .distinct()
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut report = ReconcileReport::default();
        for owner_id in owners {
            let lock = self.owner_lock(owner_id);
            let _guard = lock.lock().await;

            let (anomalies, truncated) = with_tx!(self, |db_tx| {
                self.reconcile_owner(&db_tx, owner_id, mode).await
            })?;
            report.owners_processed += 1;
            report.anomalies_found += anomalies;
            report.amounts_truncated += truncated;
        }

        tracing::info!(
            owners = report.owners_processed,
            anomalies = report.anomalies_found,
            truncated = report.amounts_truncated,
            "reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_owner(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: i64,
        mode: ReconcileMode,
    ) -> ResultLedger<(u64, u64)> {
        let history = load_history(db_tx, owner_id).await?;
        let out = calc::replay(replay_entries(&history)?);

        let mut truncated = 0u64;
        if mode == ReconcileMode::TruncateAnomalies {
            for &index in &out.anomalies {
                // The coverable amount is the running balance just before the
                // anomalous withdrawal; after truncation the replayed (clamped)
                // running balances are already correct.
                let available = if index == 0 {
                    Money::ZERO
                } else {
                    out.running[index - 1]
                };
                let row = &history[index];

                tracing::info!(
                    transaction_id = row.id,
                    user_id = owner_id,
                    original_amount = row.amount_minor,
                    adjusted_amount = available.minor(),
                    "truncating anomalous withdrawal"
                );

                let active = transactions::ActiveModel {
                    id: ActiveValue::Set(row.id),
                    amount_minor: ActiveValue::Set(available.minor()),
                    ..Default::default()
                };
                active.update(db_tx).await?;

                let log = adjustments::ActiveModel {
                    transaction_id: ActiveValue::Set(row.id),
                    user_id: ActiveValue::Set(owner_id),
                    original_amount_minor: ActiveValue::Set(row.amount_minor),
                    adjusted_amount_minor: ActiveValue::Set(available.minor()),
                    created_at: ActiveValue::Set(Utc::now()),
                    ..Default::default()
                };
                log.insert(db_tx).await?;
                truncated += 1;
            }
        }

        for (row, balance) in history.iter().zip(out.running.iter()) {
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
        Ok((out.anomalies.len() as u64, truncated))
    }
}
