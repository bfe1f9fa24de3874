//! Leverage statistics computed over the trade log.

/// Mean and maximum leverage across a set of trades. `0.0` average and
/// max when there are no trades.
#[must_use]
pub fn avg_and_max_leverage(leverages: &[f64]) -> (f64, f64) {
    if leverages.is_empty() {
        return (0.0, 0.0);
    }
    let avg = leverages.iter().sum::<f64>() / leverages.len() as f64;
    let max = leverages.iter().copied().fold(0.0_f64, f64::max);
    (avg, max)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_empty_leverages_is_zero() {
        assert_eq!(avg_and_max_leverage(&[]), (0.0, 0.0));
    }

    #[rstest]
    fn test_avg_and_max() {
        assert_eq!(avg_and_max_leverage(&[5.0, 10.0, 5.0]), (20.0 / 3.0, 10.0));
    }
}
