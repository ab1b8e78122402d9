//! Fee calculator.
//!
//! Prices a transaction amount against a provider's fee schedule. Pure and
//! deterministic: safe to call from any number of concurrent callers.

use crate::models::FeeSchedule;

/// Computes the fee owed for `amount` under the given schedule.
///
/// The raw fee is `fixed_fee + amount * percentage_fee / 100`, clamped to
/// `minimum_fee`/`maximum_fee` when those are set and positive, then rounded
/// to the nearest whole currency unit. A non-positive amount prices as zero
/// rather than an error; there is simply nothing to charge.
pub fn compute_fee(fees: &FeeSchedule, amount: i64) -> i64 {
    if amount <= 0 {
        return 0;
    }

    let fixed = fees.fixed_fee.unwrap_or(0) as f64;
    let percentage = fees.percentage_fee.unwrap_or(0.0);
    let mut fee = fixed + amount as f64 * percentage / 100.0;

    if let Some(minimum) = fees.minimum_fee
        && minimum > 0
        && fee < minimum as f64
    {
        fee = minimum as f64;
    }
    if let Some(maximum) = fees.maximum_fee
        && maximum > 0
        && fee > maximum as f64
    {
        fee = maximum as f64;
    }

    fee.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(
        fixed: Option<i64>,
        percentage: Option<f64>,
        minimum: Option<i64>,
        maximum: Option<i64>,
    ) -> FeeSchedule {
        FeeSchedule {
            fixed_fee: fixed,
            percentage_fee: percentage,
            minimum_fee: minimum,
            maximum_fee: maximum,
        }
    }

    #[test]
    fn non_positive_amounts_price_as_zero() {
        let fees = schedule(Some(500), Some(10.0), Some(2_000), None);
        assert_eq!(compute_fee(&fees, 0), 0);
        assert_eq!(compute_fee(&fees, -1_000), 0);
    }

    #[test]
    fn empty_schedule_charges_nothing() {
        assert_eq!(compute_fee(&FeeSchedule::default(), 10_000), 0);
    }

    #[test]
    fn fixed_plus_percentage() {
        let fees = schedule(Some(500), Some(10.0), None, None);
        assert_eq!(compute_fee(&fees, 1_000), 600);
    }

    #[test]
    fn clamps_up_to_minimum_fee() {
        // Raw fee 500 + 100 = 600, below the 2000 floor.
        let fees = schedule(Some(500), Some(10.0), Some(2_000), Some(0));
        assert_eq!(compute_fee(&fees, 1_000), 2_000);
    }

    #[test]
    fn clamps_down_to_maximum_fee() {
        let fees = schedule(Some(0), Some(10.0), None, Some(1_000));
        assert_eq!(compute_fee(&fees, 50_000), 1_000);
        // At the boundary nothing is clamped.
        assert_eq!(compute_fee(&fees, 10_000), 1_000);
    }

    #[test]
    fn zero_clamps_are_unbounded() {
        let fees = schedule(Some(0), Some(10.0), Some(0), Some(0));
        assert_eq!(compute_fee(&fees, 50_000), 5_000);
    }

    #[test]
    fn percentage_only_pricing() {
        let fees = schedule(Some(0), Some(1.5), None, None);
        assert_eq!(compute_fee(&fees, 500_000), 7_500);
    }

    #[test]
    fn rounds_to_nearest_unit() {
        let fees = schedule(None, Some(1.5), None, None);
        // 333 * 1.5% = 4.995
        assert_eq!(compute_fee(&fees, 333), 5);
        // 100 * 1.4% = 1.4
        let fees = schedule(None, Some(1.4), None, None);
        assert_eq!(compute_fee(&fees, 100), 1);
    }
}
