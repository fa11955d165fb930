//! Multi-digit multiplication, like fractions, decimals and area.

use rand::Rng;

use super::answer::{Answer, Tenths};
use super::fraction::Fraction;
use super::Problem;

pub(super) fn problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    match rng.random_range(0..4) {
        0 => long_multiplication(rng),
        1 => like_fractions(rng),
        2 => decimal_sum(rng),
        _ => rectangle_area(rng),
    }
}

fn long_multiplication<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let a = rng.random_range(12..=25);
    let b = rng.random_range(10..=20);
    let ans = a * b;
    Problem::new(
        format!("{a} × {b} = ?"),
        Answer::Whole(ans),
        [
            Answer::Whole(ans + 10),
            Answer::Whole(ans - 10),
            Answer::Whole(ans + rng.random_range(1..=9)),
        ],
    )
}

fn like_fractions<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let den = rng.random_range(3..=9);
    let frac = |num| Answer::Fraction(Fraction::unreduced(num, den));
    Problem::new(
        format!("1/{den} + 1/{den} = ?"),
        frac(2),
        // added one too many, dropped a term, treated the sum as a whole
        [frac(3), frac(1), Answer::Whole(1)],
    )
}

fn decimal_sum<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let a = Tenths(rng.random_range(10..=90));
    let b = Tenths(rng.random_range(10..=90));
    let ans = a.0 + b.0;
    let dec = |t| Answer::Decimal(Tenths(t));
    Problem::new(
        format!("{a} + {b} = ?"),
        dec(ans),
        [dec(ans + 1), dec(ans - 10), dec(ans + 10)],
    )
}

fn rectangle_area<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let w = rng.random_range(5..=12);
    let h = rng.random_range(5..=12);
    let ans = w * h;
    Problem::new(
        format!("Area of rectangle: {w}cm by {h}cm?"),
        Answer::Whole(ans),
        // the perimeter is the classic trap
        [
            Answer::Whole(ans + w),
            Answer::Whole(2 * (w + h)),
            Answer::Whole(ans - 5),
        ],
    )
}
