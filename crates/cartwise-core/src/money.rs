//! Currency helpers
//!
//! Amounts are carried as `f64` dollars throughout the pipeline. Sums are
//! accumulated unrounded and only passed through [`round_cents`] when a
//! statistic is finalized.

/// Tolerance used when comparing receipt totals against subtotal + tax.
pub const CENT_TOLERANCE: f64 = 0.02;

/// Round a dollar amount to whole cents.
pub fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid printing "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// True when two amounts differ by no more than `tolerance`.
///
/// The comparison happens in whole cents so float noise on an exact
/// boundary (`21.39` vs `19.99 + 1.38`) does not tip it over.
pub fn within(a: f64, b: f64, tolerance: f64) -> bool {
    ((a - b).abs() * 100.0).round() <= (tolerance * 100.0).round()
}

/// Percentage of `part` relative to `base`, or 0 when `base` is zero.
pub fn percent_of(part: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        part / base * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(19.994), 19.99);
        assert_eq!(round_cents(19.996), 20.0);
        assert_eq!(round_cents(-2.004), -2.0);
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
    }

    #[test]
    fn test_round_cents_negative_zero() {
        let value = round_cents(-0.001);
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within(21.37, 21.39, CENT_TOLERANCE));
        assert!(!within(21.37, 21.40, CENT_TOLERANCE));
    }

    #[test]
    fn test_within_exact_boundary_after_addition() {
        // 19.99 + 1.38 is 21.369999..., two cents below 21.39
        assert!(within(21.39, 19.99 + 1.38, CENT_TOLERANCE));
        assert!(within(19.99 + 1.38, 21.35, CENT_TOLERANCE));
        assert!(!within(21.40, 19.99 + 1.38, CENT_TOLERANCE));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(5.0, 0.0), 0.0);
        assert!((percent_of(0.5, 3.0) - 16.6667).abs() < 0.001);
    }
}
