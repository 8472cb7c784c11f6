//! Pure balance calculator.
//!
//! The single place where a running balance is derived from a transaction
//! history. Every mutation op and the reconciliation job replay through
//! [`replay`]; no other code path computes balances.

use crate::{Money, TransactionKind};

/// Result of replaying one owner's ordered transaction history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Replay {
    /// Running balance after each input transaction, in input order.
    pub running: Vec<Money>,
    /// Balance after the last transaction (`Money::ZERO` for empty input).
    pub final_balance: Money,
    /// Indices of withdrawals whose amount exceeded the prior running
    /// balance. The replay clamps the balance at zero for these; the caller
    /// decides whether the stored amount gets rewritten.
    pub anomalies: Vec<usize>,
}

/// Replays `(kind, amount)` pairs in (created_at, id) ascending order.
///
/// Rule: `balance_i = clamp0(balance_{i-1} + amount_i)` for deposits and
/// `clamp0(balance_{i-1} - amount_i)` for withdrawals. Amounts are expected
/// non-negative; the output never contains a negative balance.
///
/// Deterministic and side-effect free: replaying the same sequence twice
/// yields identical output.
pub fn replay<I>(entries: I) -> Replay
where
    I: IntoIterator<Item = (TransactionKind, Money)>,
{
    let mut running = Vec::new();
    let mut anomalies = Vec::new();
    let mut balance = Money::ZERO;

    for (index, (kind, amount)) in entries.into_iter().enumerate() {
        match kind {
            TransactionKind::Deposit => {
                balance = (balance + amount).clamp_zero();
            }
            TransactionKind::Withdrawal => {
                if amount > balance {
                    anomalies.push(index);
                }
                balance = (balance - amount).clamp_zero();
            }
        }
        running.push(balance);
    }

    Replay {
        final_balance: balance,
        running,
        anomalies,
    }
}

/// Replays only the final balance, without per-row output.
pub fn final_balance<I>(entries: I) -> Money
where
    I: IntoIterator<Item = (TransactionKind, Money)>,
{
    replay(entries).final_balance
}
