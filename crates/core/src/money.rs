use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Round `value` to `dp` decimal places.
///
/// Rounding is half-to-even on the exact binary value of the float, so a
/// value stored as `2.67499999…` rounds down even though it prints as `2.675`.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Round to whole cents (2dp).
pub fn round_cents(value: f64) -> f64 {
    round_dp(value, 2)
}

/// Parse an amount string such as `"1,234.56"` or `" 3.49 "`.
pub fn parse_amount(s: &str) -> Option<f64> {
    let clean = s.trim().replace(',', "");
    Decimal::from_str(&clean).ok()?.to_f64()
}
