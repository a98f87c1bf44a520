//! Money calculation utilities using rust_decimal for precision
//!
//! All financial arithmetic is done with `Decimal` internally and
//! converted to `f64` only at the storage/serialization boundary.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price
pub const MAX_UNIT_PRICE: f64 = 1_000_000.0;

/// Convert f64 to Decimal for calculation
///
/// Input values are validated finite at the command boundary. If a
/// non-finite value somehow reaches here, log and fall back to zero
/// rather than corrupting a financial calculation.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp from bounded inputs is always
        // within f64 representable range
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Validate that a monetary input is finite, non-negative and bounded
pub fn validate_amount(value: f64, field_name: &str) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{} must be a finite number, got {}", field_name, value));
    }
    if value < 0.0 {
        return Err(format!("{} must be non-negative, got {}", field_name, value));
    }
    if value > MAX_UNIT_PRICE {
        return Err(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_UNIT_PRICE, value
        ));
    }
    Ok(())
}

/// Configured per-unit penalty rates for invoice deductions.
///
/// Passed in at construction; deduction rules are never read from
/// ambient process-wide state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeductionRates {
    /// Deduction per lost/dead bird
    pub mortality_penalty_per_unit: f64,
    /// Percentage of the subtotal deducted when quality inspection fails
    pub quality_penalty_percent: f64,
}

impl Default for DeductionRates {
    fn default() -> Self {
        Self {
            mortality_penalty_per_unit: 25.0,
            quality_penalty_percent: 10.0,
        }
    }
}

/// Computed invoice amounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub quality_deduction: f64,
    pub loss_deduction: f64,
    pub other_deduction: f64,
    /// subtotal − Σ deductions, floored at zero
    pub total: f64,
}

/// Compute invoice totals for a verified delivery.
///
/// - subtotal = delivered quantity × unit price
/// - loss deduction = loss count × per-unit mortality penalty
/// - quality deduction = subtotal × quality penalty percent, only when the
///   inspection failed
/// - total = subtotal − deductions, never below zero
pub fn compute_invoice_totals(
    quantity: u32,
    unit_price: f64,
    quality_passed: bool,
    loss_count: u32,
    rates: &DeductionRates,
) -> InvoiceTotals {
    let subtotal = to_decimal(unit_price) * Decimal::from(quantity);

    let loss_deduction =
        to_decimal(rates.mortality_penalty_per_unit) * Decimal::from(loss_count);

    let quality_deduction = if quality_passed {
        Decimal::ZERO
    } else {
        (subtotal * to_decimal(rates.quality_penalty_percent) / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
    };

    let total = (subtotal - loss_deduction - quality_deduction).max(Decimal::ZERO);

    InvoiceTotals {
        subtotal: to_f64(subtotal),
        quality_deduction: to_f64(quality_deduction),
        loss_deduction: to_f64(loss_deduction),
        other_deduction: 0.0,
        total: to_f64(total),
    }
}
