use num_bigint::BigInt;
use std::fmt;

///
/// Decimal
///
/// Arbitrary-precision decimal stored as `unscaled * 10^(-scale)`,
/// matching the wire model of the CQL `decimal` type.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Decimal {
    unscaled: BigInt,
    scale: i32,
}

impl Decimal {
    #[must_use]
    pub fn new(unscaled: impl Into<BigInt>, scale: i32) -> Self {
        Self {
            unscaled: unscaled.into(),
            scale,
        }
    }

    #[must_use]
    pub const fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    #[must_use]
    pub const fn scale(&self) -> i32 {
        self.scale
    }
}

impl fmt::Display for Decimal {
    /// Exponent form; `scale` is widened before negation so `i32::MIN` cannot
    /// overflow.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}E{}", self.unscaled, -i64::from(self.scale))
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Self::new(v, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_exponent_form() {
        assert_eq!(Decimal::new(1234, 2).to_string(), "1234E-2");
        assert_eq!(Decimal::new(-5, 0).to_string(), "-5E0");
        assert_eq!(Decimal::new(7, -3).to_string(), "7E3");
    }

    #[test]
    fn equality_is_structural_not_numeric() {
        // 10E-1 and 1E0 denote the same number but are distinct values.
        assert_ne!(Decimal::new(10, 1), Decimal::new(1, 0));
        assert_eq!(Decimal::new(10, 1), Decimal::new(10, 1));
    }
}
