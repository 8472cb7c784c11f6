use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Money amount represented as **integer centimes** (RWF).
///
/// Use this type for **all** monetary values in the ledger (balances,
/// transaction amounts) to avoid floating-point drift. The original schema
/// stored `DECIMAL(15, 2)`; two fractional digits map losslessly to i64
/// minor units.
///
/// Balances are kept non-negative by the ledger; the type itself is signed so
/// intermediate arithmetic can underflow before [`Money::clamp_zero`] is
/// applied.
///
/// # Examples
///
/// ```rust
/// use ledger::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "RWF 12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more than 2 decimals):
///
/// ```rust
/// use ledger::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest accepted amount, the `DECIMAL(15, 2)` ceiling in minor units.
    /// Mutations reject anything above it, which keeps balance sums far away
    /// from `i64` overflow.
    pub const MAX: Money = Money(999_999_999_999_999);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Floors the amount at zero. Negative balances are never persisted.
    #[must_use]
    pub const fn clamp_zero(self) -> Money {
        if self.0 < 0 { Money::ZERO } else { self }
    }

}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let francs = abs / 100;
        let centimes = abs % 100;
        write!(f, "{sign}RWF {francs}.{centimes:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

// Balance arithmetic saturates instead of wrapping: amounts are bounded by
// `Money::MAX` at the mutation seams, and a saturated sum still clamps to a
// valid non-negative balance.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings and negative amounts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || LedgerError::InvalidAmount("empty amount".to_string());
        let invalid = || LedgerError::InvalidAmount("invalid amount".to_string());
        let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        if trimmed.starts_with('-') {
            return Err(LedgerError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }
        let rest = trimmed.strip_prefix('+').unwrap_or(trimmed).trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let francs_str = parts.next().ok_or_else(invalid)?;
        let centimes_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if francs_str.is_empty() || !francs_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let francs: i64 = francs_str.parse().map_err(|_| invalid())?;

        let centimes: i64 = match centimes_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(LedgerError::InvalidAmount(
                            "too many decimals".to_string(),
                        ));
                    }
                }
            }
        };

        let total = francs
            .checked_mul(100)
            .and_then(|v| v.checked_add(centimes))
            .ok_or_else(overflow)?;
        if total > Money::MAX.0 {
            return Err(overflow());
        }

        Ok(Money(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_rwf() {
        assert_eq!(Money::new(0).to_string(), "RWF 0.00");
        assert_eq!(Money::new(1).to_string(), "RWF 0.01");
        assert_eq!(Money::new(10).to_string(), "RWF 0.10");
        assert_eq!(Money::new(1050).to_string(), "RWF 10.50");
        assert_eq!(Money::new(-1050).to_string(), "-RWF 10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("+1.00".parse::<Money>().unwrap().minor(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_negative_and_excess_decimals() {
        assert!("-0.01".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn parse_rejects_amounts_above_max() {
        assert_eq!(
            "9999999999999.99".parse::<Money>().unwrap(),
            Money::MAX
        );
        assert!("10000000000000.00".parse::<Money>().is_err());
    }

    #[test]
    fn arithmetic_saturates_at_the_extremes() {
        assert_eq!(
            Money::new(i64::MAX) + Money::new(1),
            Money::new(i64::MAX)
        );
        assert_eq!(
            (Money::new(i64::MIN) - Money::new(1)).clamp_zero(),
            Money::ZERO
        );

        let mut sum = Money::new(i64::MAX);
        sum += Money::new(i64::MAX);
        assert_eq!(sum, Money::new(i64::MAX));
    }

    #[test]
    fn clamp_zero_floors_negatives() {
        assert_eq!(Money::new(-1).clamp_zero(), Money::ZERO);
        assert_eq!(Money::new(0).clamp_zero(), Money::ZERO);
        assert_eq!(Money::new(7).clamp_zero(), Money::new(7));
    }
}
