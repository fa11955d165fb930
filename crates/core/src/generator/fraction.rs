use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FractionError {
    #[error("fraction denominator cannot be zero")]
    ZeroDenominator,
}

/// Greatest common divisor of the absolute values; `gcd(0, 0) == 0`.
#[must_use]
pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).unwrap_or(i64::MAX)
}

/// A fraction kept exactly as written; reduction only happens on request.
///
/// The sign always lives on the numerator. A denominator of 1 renders as a
/// bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: i64,
    den: i64,
}

impl Fraction {
    /// # Errors
    ///
    /// Returns `FractionError::ZeroDenominator` when `den` is zero.
    pub fn new(num: i64, den: i64) -> Result<Self, FractionError> {
        if den == 0 {
            return Err(FractionError::ZeroDenominator);
        }
        if den < 0 {
            return Ok(Self {
                num: -num,
                den: -den,
            });
        }
        Ok(Self { num, den })
    }

    /// Builds a fraction from a denominator the caller knows is positive.
    pub(crate) fn unreduced(num: i64, den: i64) -> Self {
        debug_assert!(den > 0, "generator denominators are positive");
        Self { num, den }
    }

    #[must_use]
    pub fn num(&self) -> i64 {
        self.num
    }

    #[must_use]
    pub fn den(&self) -> i64 {
        self.den
    }

    /// Divides numerator and denominator by their gcd.
    #[must_use]
    pub fn simplified(self) -> Self {
        let g = gcd(self.num, self.den);
        if g <= 1 {
            return self;
        }
        Self {
            num: self.num / g,
            den: self.den / g,
        }
    }

    /// True when both fractions denote the same rational number.
    #[must_use]
    pub fn same_value(&self, other: &Fraction) -> bool {
        i128::from(self.num) * i128::from(other.den) == i128::from(other.num) * i128::from(self.den)
    }
}

/// Reduces `num/den` to lowest terms.
///
/// # Errors
///
/// Returns `FractionError::ZeroDenominator` when `den` is zero.
pub fn simplify(num: i64, den: i64) -> Result<Fraction, FractionError> {
    Fraction::new(num, den).map(Fraction::simplified)
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_handles_signs_and_zero() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(-12, 18), 6);
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(0, 0), 0);
    }

    #[test]
    fn simplify_reduces_to_lowest_terms() {
        for num in -40..=40 {
            for den in (-24..=24).filter(|d| *d != 0) {
                let reduced = simplify(num, den).unwrap();
                assert!(reduced.den() > 0);
                assert_eq!(gcd(reduced.num(), reduced.den()), 1, "{num}/{den}");
                assert_eq!(
                    reduced.num() * den,
                    num * reduced.den(),
                    "{num}/{den} changed value"
                );
            }
        }
    }

    #[test]
    fn zero_denominator_is_an_error() {
        assert_eq!(simplify(1, 0), Err(FractionError::ZeroDenominator));
    }

    #[test]
    fn unit_denominator_renders_as_integer() {
        assert_eq!(simplify(12, 4).unwrap().to_string(), "3");
        assert_eq!(simplify(6, 8).unwrap().to_string(), "3/4");
        assert_eq!(Fraction::new(6, 8).unwrap().to_string(), "6/8");
        assert_eq!(Fraction::new(3, -4).unwrap().to_string(), "-3/4");
    }

    #[test]
    fn same_value_compares_across_forms() {
        let half = Fraction::new(1, 2).unwrap();
        assert!(half.same_value(&Fraction::new(3, 6).unwrap()));
        assert!(!half.same_value(&Fraction::new(2, 3).unwrap()));
    }
}
