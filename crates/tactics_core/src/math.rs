//! Fixed-point math utilities for deterministic simulation.
//!
//! Gameplay numbers are small integers. The only fractional quantities are
//! the slopes tracked by the shadowcasting field of view, and those use
//! fixed-point arithmetic so every platform lights exactly the same tiles.

use fixed::types::I32F32;

/// Fixed-point number type for all fractional simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build the fixed-point ratio `num / den`.
///
/// # Panics
///
/// Panics if `den` is zero.
#[must_use]
pub fn ratio(num: i32, den: i32) -> Fixed {
    assert!(den != 0, "ratio denominator must be non-zero");
    Fixed::from_num(num) / Fixed::from_num(den)
}

/// Divide by two, rounding towards negative infinity.
#[must_use]
pub const fn half_floor(value: i32) -> i32 {
    value.div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(1, 2), Fixed::from_num(0.5));
        assert_eq!(ratio(-3, -1), Fixed::from_num(3));
        assert_eq!(ratio(1, -3), -ratio(1, 3));
    }

    #[test]
    fn test_half_floor() {
        assert_eq!(half_floor(7), 3);
        assert_eq!(half_floor(8), 4);
        assert_eq!(half_floor(-1), -1);
        assert_eq!(half_floor(-4), -2);
    }
}
