use std::fmt;

use super::fraction::Fraction;

/// A number stored in tenths so one-decimal values stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tenths(pub i64);

impl Tenths {
    #[must_use]
    pub fn from_whole(value: i64) -> Self {
        Self(value * 10)
    }

    #[must_use]
    pub fn is_whole(self) -> bool {
        self.0 % 10 == 0
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

/// The value behind an option, before it becomes a display string.
///
/// Correct answers and distractors share this type, so a distractor is always
/// derived from the exact answer rather than from its rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Whole(i64),
    /// Always shown with one decimal place (`7.0`).
    Decimal(Tenths),
    /// Shown as an integer when whole, otherwise with one decimal (`7`, `7.5`).
    Trimmed(Tenths),
    Fraction(Fraction),
    Ratio(i64, i64),
}

impl Answer {
    /// Exact value as `(numerator, positive denominator)`.
    fn rational(&self) -> (i128, i128) {
        match *self {
            Answer::Whole(n) => (i128::from(n), 1),
            Answer::Decimal(t) | Answer::Trimmed(t) => (i128::from(t.0), 10),
            Answer::Fraction(f) => (i128::from(f.num()), i128::from(f.den())),
            Answer::Ratio(a, b) => (i128::from(a), i128::from(b)),
        }
    }

    #[must_use]
    pub fn same_value(&self, other: &Answer) -> bool {
        let (an, ad) = self.rational();
        let (bn, bd) = other.rational();
        an * bd == bn * ad
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.rational().0 < 0
    }

    /// The `step`-th fallback near this answer: offsets run `+1, -1, +2, -2, …`
    /// in the answer's own unit.
    pub(crate) fn nudged(&self, step: i64) -> Option<Answer> {
        let offset = if step % 2 == 1 { (step + 1) / 2 } else { -(step / 2) };
        match *self {
            Answer::Whole(n) => Some(Answer::Whole(n + offset)),
            Answer::Decimal(t) => Some(Answer::Decimal(Tenths(t.0 + offset))),
            Answer::Trimmed(t) => Some(Answer::Trimmed(Tenths(t.0 + 5 * offset))),
            Answer::Fraction(f) => {
                Some(Answer::Fraction(Fraction::unreduced(f.num() + offset, f.den()).simplified()))
            }
            Answer::Ratio(a, b) => (b + offset > 0).then_some(Answer::Ratio(a, b + offset)),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Whole(n) => write!(f, "{n}"),
            Answer::Decimal(t) => write!(f, "{t}"),
            Answer::Trimmed(t) if t.is_whole() => write!(f, "{}", t.0 / 10),
            Answer::Trimmed(t) => write!(f, "{t}"),
            Answer::Fraction(frac) => write!(f, "{frac}"),
            Answer::Ratio(a, b) => write!(f, "{a}:{b}"),
        }
    }
}
