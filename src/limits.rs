//! Transaction amount validation.
//!
//! Checks an amount against a provider's configured bounds before the
//! transaction processor submits a payment. Pure and stateless; daily and
//! monthly limits are declared on the record but not aggregated here.

use thiserror::Error;

use crate::models::TransactionLimits;

/// Reason an amount was rejected. Carries the violated bound so callers can
/// surface it instead of a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("transaction amount must be a positive number")]
    InvalidAmount,
    #[error("amount {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: i64, minimum: i64 },
    #[error("amount {amount} exceeds the maximum of {maximum}")]
    AboveMaximum { amount: i64, maximum: i64 },
    #[error("amount {amount} exceeds the per-transaction limit of {limit}")]
    AbovePerTransactionLimit { amount: i64, limit: i64 },
}

/// Validates `amount` against the configured bounds.
///
/// Checks run in a fixed order (positivity, minimum, maximum, per-transaction
/// limit) and the first failure short-circuits, so exactly one violation is
/// ever reported. Bounds are inclusive.
pub fn validate_amount(limits: &TransactionLimits, amount: i64) -> Result<(), LimitViolation> {
    if amount <= 0 {
        return Err(LimitViolation::InvalidAmount);
    }
    if let Some(minimum) = limits.min_amount
        && amount < minimum
    {
        return Err(LimitViolation::BelowMinimum { amount, minimum });
    }
    if let Some(maximum) = limits.max_amount
        && amount > maximum
    {
        return Err(LimitViolation::AboveMaximum { amount, maximum });
    }
    if let Some(limit) = limits.per_transaction_limit
        && amount > limit
    {
        return Err(LimitViolation::AbovePerTransactionLimit { amount, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(
        min: Option<i64>,
        max: Option<i64>,
        per_transaction: Option<i64>,
    ) -> TransactionLimits {
        TransactionLimits {
            min_amount: min,
            max_amount: max,
            per_transaction_limit: per_transaction,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let bounds = limits(Some(100), Some(2_000_000), Some(2_000_000));
        assert_eq!(validate_amount(&bounds, 0), Err(LimitViolation::InvalidAmount));
        assert_eq!(
            validate_amount(&bounds, -500),
            Err(LimitViolation::InvalidAmount)
        );
    }

    #[test]
    fn unbounded_limits_accept_any_positive_amount() {
        assert_eq!(validate_amount(&TransactionLimits::default(), 1), Ok(()));
        assert_eq!(
            validate_amount(&TransactionLimits::default(), i64::MAX),
            Ok(())
        );
    }

    #[test]
    fn reports_the_violated_bound() {
        let bounds = limits(Some(100), Some(2_000_000), Some(2_000_000));
        assert_eq!(
            validate_amount(&bounds, 50),
            Err(LimitViolation::BelowMinimum {
                amount: 50,
                minimum: 100
            })
        );
        assert_eq!(validate_amount(&bounds, 500_000), Ok(()));
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = limits(Some(100), Some(2_000_000), None);
        assert_eq!(validate_amount(&bounds, 100), Ok(()));
        assert_eq!(validate_amount(&bounds, 2_000_000), Ok(()));
        assert_eq!(
            validate_amount(&bounds, 2_000_001),
            Err(LimitViolation::AboveMaximum {
                amount: 2_000_001,
                maximum: 2_000_000
            })
        );
    }

    #[test]
    fn per_transaction_limit_is_checked_last() {
        // A tighter per-transaction limit still applies when max passes.
        let bounds = limits(None, Some(5_000_000), Some(1_000_000));
        assert_eq!(
            validate_amount(&bounds, 2_000_000),
            Err(LimitViolation::AbovePerTransactionLimit {
                amount: 2_000_000,
                limit: 1_000_000
            })
        );
        // When both max and per-transaction would fail, max wins.
        let bounds = limits(None, Some(1_000_000), Some(500_000));
        assert_eq!(
            validate_amount(&bounds, 2_000_000),
            Err(LimitViolation::AboveMaximum {
                amount: 2_000_000,
                maximum: 1_000_000
            })
        );
    }
}
