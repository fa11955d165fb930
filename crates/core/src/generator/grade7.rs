//! One-step equations, fraction products, percent change, angles and simple probability.

use rand::Rng;

use super::answer::{Answer, Tenths};
use super::fraction::Fraction;
use super::{Problem, linear_equation_prompt, pick};

const INCREASE_BASES: [i64; 6] = [40, 60, 80, 120, 150, 200];
const INCREASE_PERCENTS: [i64; 6] = [5, 10, 12, 15, 20, 25];

pub(super) fn problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    match rng.random_range(0..5) {
        0 => solve_equation(rng),
        1 => fraction_product(rng),
        2 => percent_increase(rng),
        3 => angles_on_a_line(rng),
        _ => single_draw(rng),
    }
}

fn solve_equation<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let a = pick(rng, &[2, 3, 4, 5, 6]);
    let x = rng.random_range(2..=15);
    let b = rng.random_range(-10..=10);
    Problem::new(
        linear_equation_prompt(a, b, a * x + b),
        Answer::Whole(x),
        [
            Answer::Whole(x + 1),
            Answer::Whole(x - 1),
            Answer::Whole((x + pick(rng, &[2, 3])).max(0)),
        ],
    )
}

fn fraction_product<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let n1 = rng.random_range(2..=9);
    let d1 = rng.random_range(3..=12);
    let n2 = rng.random_range(2..=9);
    let d2 = rng.random_range(3..=12);
    let (num, den) = (n1 * n2, d1 * d2);
    let frac = |n, d| Answer::Fraction(Fraction::unreduced(n, d));
    Problem::new(
        format!("Compute: {n1}/{d1} × {n2}/{d2}"),
        Answer::Fraction(Fraction::unreduced(num, den).simplified()),
        // left unsimplified, added across, fumbled the denominator
        [
            frac(num, den),
            frac(n1 + n2, d1 + d2),
            frac(num, den + pick(rng, &[1, 2])),
        ],
    )
}

fn percent_increase<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let base = pick(rng, &INCREASE_BASES);
    let percent = pick(rng, &INCREASE_PERCENTS);
    // bases are multiples of ten, so every value here is a whole number of tenths
    let ans = base * (100 + percent) / 10;
    let trimmed = |t| Answer::Trimmed(Tenths(t));
    Problem::new(
        format!("Increase {base} by {percent}%"),
        trimmed(ans),
        [
            trimmed(Tenths::from_whole(base + percent).0),
            trimmed(base * percent / 10),
            trimmed(base * (100 - percent) / 10),
        ],
    )
}

fn angles_on_a_line<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let angle = rng.random_range(35..=145);
    Problem::new(
        format!(
            "Two angles form a straight line. One angle is {angle}°. What is the other angle?"
        ),
        Answer::Whole(180 - angle),
        [
            Answer::Whole(180 + angle),
            Answer::Whole(angle),
            Answer::Whole(90 - angle % 90),
        ],
    )
}

fn single_draw<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let red = rng.random_range(1..=6);
    let blue = rng.random_range(1..=6);
    let green = rng.random_range(1..=6);
    let total = red + blue + green;
    let chance = |count| Answer::Fraction(Fraction::unreduced(count, total).simplified());
    Problem::new(
        format!(
            "A bag has {red} red, {blue} blue, and {green} green counters. What is P(red)?"
        ),
        chance(red),
        [
            chance(blue),
            chance(green),
            Answer::Fraction(Fraction::unreduced(total, red)),
        ],
    )
}
