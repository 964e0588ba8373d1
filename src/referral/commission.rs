//! Commission estimation
//!
//! Pure arithmetic over the stored signup counter and fixed pricing constants.
//! These figures are display-only approximations for the ambassador dashboard;
//! this service is not a ledger and the estimates carry no accounting
//! guarantee. Payouts are settled elsewhere.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed pricing constants, loaded from configuration at startup.
#[derive(Debug, Clone)]
pub struct Pricing {
    /// Flat price of the referred product
    pub plan_price: Decimal,
    /// Upfront commission rate applied to `plan_price` per signup
    pub upfront_rate: Decimal,
    /// Fixed monthly recurring amount per signup
    pub monthly_per_signup: Decimal,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            plan_price: dec!(79.00),
            upfront_rate: dec!(0.30),
            monthly_per_signup: dec!(5.00),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    pub upfront: Decimal,
    pub monthly_recurring: Decimal,
    pub six_month_total: Decimal,
}

/// Estimate commissions from a signup count. Monotonically non-decreasing in
/// `signups`; zero signups estimate to zero everywhere.
pub fn estimate(signups: i64, pricing: &Pricing) -> Estimate {
    let n = Decimal::from(signups.max(0));
    let upfront = (n * pricing.plan_price * pricing.upfront_rate).round_dp(2);
    let monthly_recurring = (n * pricing.monthly_per_signup).round_dp(2);
    let six_month_total = (upfront + monthly_recurring * dec!(6)).round_dp(2);
    Estimate {
        upfront,
        monthly_recurring,
        six_month_total,
    }
}
