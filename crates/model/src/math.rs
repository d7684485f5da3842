//! Decimal rounding helpers for price/quantity normalization.

use rust_decimal::Decimal;

/// Returns the `floor`-ed value at `decimals` fractional digits using the
/// nearest-to-zero strategy.
///
/// # Examples
///
/// ```
/// # use rust_decimal_macros::dec;
/// # use model::floor_to_decimals;
/// assert_eq!(floor_to_decimals(dec!(1.0011), 3), dec!(1.001));
/// assert_eq!(floor_to_decimals(dec!(-1.0011), 3), dec!(-1.001));
/// assert_eq!(floor_to_decimals(dec!(1001.0011), -3), dec!(1000));
/// ```
pub fn floor_to_decimals(value: Decimal, decimals: i32) -> Decimal {
    scale(value, decimals, |v| {
        if v > Decimal::ZERO {
            v.floor()
        } else {
            v.ceil()
        }
    })
}

/// Returns the `ceil`-ed value at `decimals` fractional digits using the
/// farthest-from-zero strategy.
///
/// # Examples
///
/// ```
/// # use rust_decimal_macros::dec;
/// # use model::ceil_to_decimals;
/// assert_eq!(ceil_to_decimals(dec!(1.0001), 3), dec!(1.001));
/// assert_eq!(ceil_to_decimals(dec!(-1.0011), 3), dec!(-1.002));
/// assert_eq!(ceil_to_decimals(dec!(1001.0011), -3), dec!(2000));
/// ```
pub fn ceil_to_decimals(value: Decimal, decimals: i32) -> Decimal {
    scale(value, decimals, |v| {
        if v > Decimal::ZERO {
            v.ceil()
        } else {
            v.floor()
        }
    })
}

/// Returns the `round`-ed value at `decimals` fractional digits using the
/// round-to-even strategy.
///
/// # Examples
///
/// ```
/// # use rust_decimal_macros::dec;
/// # use model::round_to_decimals;
/// assert_eq!(round_to_decimals(dec!(1.0015), 3), dec!(1.002));
/// assert_eq!(round_to_decimals(dec!(-1.0001), 0), dec!(-1));
/// assert_eq!(round_to_decimals(dec!(1005.0011), -3), dec!(1000));
/// ```
pub fn round_to_decimals(value: Decimal, decimals: i32) -> Decimal {
    scale(value, decimals, |v| v.round())
}

fn scale(mut value: Decimal, decimals: i32, op: impl Fn(Decimal) -> Decimal) -> Decimal {
    if decimals >= 0 {
        let unit = Decimal::new(1, decimals.try_into().expect("cannot fit decimals into u32"));
        value /= unit;
        op(value) * unit
    } else {
        let unit = Decimal::new(
            1,
            (-decimals)
                .try_into()
                .expect("cannot fit -decimals into u32"),
        );
        value *= unit;
        op(value) / unit
    }
}

/// Returns true if `s`, after trimming whitespace, is a decimal string whose
/// value is zero (`"0"`, `"0.000"`, `".0"`, `"-0"`). Non-numeric strings are
/// not zero.
pub fn is_zero_str(s: &str) -> bool {
    s.trim()
        .parse::<Decimal>()
        .map(|d| d.is_zero())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_floor_to_decimals() {
        assert_eq!(floor_to_decimals(dec!(1.0001), 3), dec!(1.000));
        assert_eq!(floor_to_decimals(dec!(1.0011), 3), dec!(1.001));
        assert_eq!(floor_to_decimals(dec!(-1.0011), 3), dec!(-1.001));
        assert_eq!(floor_to_decimals(dec!(1.0001), 0), dec!(1));
        assert_eq!(floor_to_decimals(dec!(-1.0001), 0), dec!(-1));
        assert_eq!(floor_to_decimals(dec!(1001.0011), -3), dec!(1000));
        assert_eq!(floor_to_decimals(dec!(-1001.0011), -3), dec!(-1000));
    }

    #[test]
    fn test_ceil_to_decimals() {
        assert_eq!(ceil_to_decimals(dec!(1.0001), 3), dec!(1.001));
        assert_eq!(ceil_to_decimals(dec!(1.0011), 3), dec!(1.002));
        assert_eq!(ceil_to_decimals(dec!(-1.0011), 3), dec!(-1.002));
        assert_eq!(ceil_to_decimals(dec!(1.0001), 0), dec!(2));
        assert_eq!(ceil_to_decimals(dec!(-1.0001), 0), dec!(-2));
        assert_eq!(ceil_to_decimals(dec!(1001.0011), -3), dec!(2000));
        assert_eq!(ceil_to_decimals(dec!(-1001.0011), -3), dec!(-2000));
    }

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(dec!(1.0001), 3), dec!(1.000));
        assert_eq!(round_to_decimals(dec!(1.0015), 3), dec!(1.002));
        assert_eq!(round_to_decimals(dec!(-1.0015), 3), dec!(-1.002));
        assert_eq!(round_to_decimals(dec!(1005.0011), -3), dec!(1000));
        assert_eq!(round_to_decimals(dec!(-1005.0011), -3), dec!(-1000));
    }

    #[test]
    fn test_is_zero_str() {
        assert!(is_zero_str("0"));
        assert!(is_zero_str("0.000"));
        assert!(is_zero_str(".0"));
        assert!(is_zero_str("-0"));
        assert!(is_zero_str(" 0.0 "));
        assert!(!is_zero_str("0.0001"));
        assert!(!is_zero_str("-1"));
        assert!(!is_zero_str(""));
        assert!(!is_zero_str("abc"));
    }
}
