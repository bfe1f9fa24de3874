//! Correctness-check helpers for validating inputs at API boundaries.
//!
//! These mirror a design-by-contract style: call at the top of a public
//! operation and propagate the `anyhow::Error` outward as a validation
//! failure. They never panic in non-test code.

use anyhow::{Result, bail};

/// Checks `predicate` is true, failing with `msg` otherwise.
#[inline]
pub fn check_predicate_true(predicate: bool, msg: &str) -> Result<()> {
    if !predicate {
        bail!("Condition failed: {msg}");
    }
    Ok(())
}

/// Checks `value` is finite (not NaN or infinite).
#[inline]
pub fn check_finite(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() {
        bail!("Condition failed: `{name}` must be finite, was {value}");
    }
    Ok(())
}

/// Checks `value` is strictly positive and finite.
#[inline]
pub fn check_positive(value: f64, name: &str) -> Result<()> {
    check_finite(value, name)?;
    if value <= 0.0 {
        bail!("Condition failed: `{name}` must be positive, was {value}");
    }
    Ok(())
}

/// Checks `value` is non-negative and finite.
#[inline]
pub fn check_non_negative(value: f64, name: &str) -> Result<()> {
    check_finite(value, name)?;
    if value < 0.0 {
        bail!("Condition failed: `{name}` must be non-negative, was {value}");
    }
    Ok(())
}

/// Checks `value` lies in the inclusive range `[min, max]`.
#[inline]
pub fn check_in_range_inclusive(value: f64, min: f64, max: f64, name: &str) -> Result<()> {
    check_finite(value, name)?;
    if value < min || value > max {
        bail!("Condition failed: `{name}` must be in range [{min}, {max}], was {value}");
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
