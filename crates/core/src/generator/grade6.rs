//! Order of operations, ratios, percentages, grid distance and the mean.

use rand::Rng;

use super::answer::{Answer, Tenths};
use super::fraction::gcd;
use super::{Problem, pick};

const PERCENTS: [i64; 7] = [10, 15, 20, 25, 30, 40, 50];
const BASES: [i64; 6] = [40, 60, 80, 120, 160, 200];

pub(super) fn problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    match rng.random_range(0..5) {
        0 => order_of_operations(rng),
        1 => simplify_ratio(rng),
        2 => percent_of(rng),
        3 => grid_distance(rng),
        _ => mean_of_four(rng),
    }
}

fn order_of_operations<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let a = rng.random_range(2..=18);
    let b = rng.random_range(2..=12);
    let c = rng.random_range(2..=12);
    Problem::new(
        format!("Evaluate: {a} + {b} × {c}"),
        Answer::Whole(a + b * c),
        [
            Answer::Whole((a + b) * c),
            Answer::Whole(a + b + c),
            Answer::Whole(a + b * (c - 1)),
        ],
    )
}

fn simplify_ratio<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let k = rng.random_range(2..=6);
    let r1 = rng.random_range(2..=9);
    let r2 = rng.random_range(2..=9);
    let (a, b) = (r1 * k, r2 * k);
    let g = gcd(a, b);
    Problem::new(
        format!("Simplify the ratio {a}:{b}"),
        Answer::Ratio(a / g, b / g),
        [
            Answer::Ratio(a, b),
            Answer::Ratio(a / k, b / k + 1),
            Answer::Ratio(a / g, b / g + 1),
        ],
    )
}

fn percent_of<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let percent = pick(rng, &PERCENTS);
    let base = pick(rng, &BASES);
    // every percent/base pairing divides evenly
    let ans = percent * base / 100;
    Problem::new(
        format!("Find {percent}% of {base}"),
        Answer::Whole(ans),
        [
            Answer::Whole(base + ans),
            Answer::Whole(base - ans),
            Answer::Whole(percent * base),
        ],
    )
}

fn grid_distance<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let x1: i64 = rng.random_range(-6..=6);
    let x2: i64 = rng.random_range(-6..=6);
    let y: i64 = rng.random_range(-6..=6);
    let ans = (x2 - x1).abs();
    Problem::new(
        format!("On a grid, what is the distance between ({x1}, {y}) and ({x2}, {y})?"),
        Answer::Whole(ans),
        [
            Answer::Whole((x2 + x1).abs()),
            Answer::Whole(ans + 1),
            Answer::Whole((ans - 1).max(0)),
        ],
    )
}

fn mean_of_four<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let values: [i64; 4] = std::array::from_fn(|_| rng.random_range(4..=20));
    let sum: i64 = values.iter().sum();
    // sum / 4 in tenths, halves rounded up
    let ans = (sum * 10 + 2) / 4;
    let trimmed = |t| Answer::Trimmed(Tenths(t));
    Problem::new(
        format!(
            "Find the mean of {}, {}, {}, {}",
            values[0], values[1], values[2], values[3]
        ),
        trimmed(ans),
        [
            trimmed(ans + Tenths::from_whole(1).0),
            trimmed(ans - Tenths::from_whole(1).0),
            trimmed(ans + 5),
        ],
    )
}
