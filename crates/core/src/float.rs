//! Tolerance-based floating-point comparison.
//!
//! The engine uses binary double-precision throughout rather than exact
//! decimal arithmetic, so equality checks always go through one of these
//! helpers rather than `==`.

/// Tolerance used when comparing ratios (leverage, margin ratio, percentages).
pub const RATIO_TOLERANCE: f64 = 1e-9;

/// Tolerance used when comparing aggregate monetary values (cash, PnL,
/// portfolio value).
pub const AGGREGATE_TOLERANCE: f64 = 1e-6;

#[must_use]
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

#[must_use]
pub fn is_zero(value: f64, tolerance: f64) -> bool {
    value.abs() <= tolerance
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_approx_eq_within_tolerance() {
        assert!(approx_eq(1.000_000_0001, 1.0, AGGREGATE_TOLERANCE));
    }

    #[rstest]
    fn test_approx_eq_outside_tolerance() {
        assert!(!approx_eq(1.1, 1.0, RATIO_TOLERANCE));
    }

    #[rstest]
    fn test_is_zero() {
        assert!(is_zero(0.0, RATIO_TOLERANCE));
        assert!(!is_zero(0.01, RATIO_TOLERANCE));
    }
}
