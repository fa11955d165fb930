//! Two-step equations, Pythagoras, sequences, volume and compound probability.

use rand::Rng;

use super::answer::Answer;
use super::fraction::Fraction;
use super::{Problem, linear_equation_prompt, pick};

const TRIPLES: [(i64, i64, i64); 5] = [(3, 4, 5), (5, 12, 13), (6, 8, 10), (7, 24, 25), (9, 12, 15)];

pub(super) fn problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    match rng.random_range(0..5) {
        0 => two_step_equation(rng),
        1 => pythagoras(rng),
        2 => nth_term(rng),
        3 => prism_volume(rng),
        _ => two_draws(rng),
    }
}

fn two_step_equation<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let a = pick(rng, &[2, 3, 4, 5, 6, 7]);
    let x = rng.random_range(2..=20);
    let b = rng.random_range(-20..=20);
    let c = a * x + b;
    // divided by a + 1: round((c - b) / (a + 1)), halves up
    let wrong_divisor = (2 * (c - b) + a + 1) / (2 * (a + 1));
    Problem::new(
        linear_equation_prompt(a, b, c),
        Answer::Whole(x),
        [
            Answer::Whole(x + pick(rng, &[1, 2])),
            Answer::Whole(x - pick(rng, &[1, 2])),
            Answer::Whole(wrong_divisor.max(0)),
        ],
    )
}

fn pythagoras<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let (a, b, c) = pick(rng, &TRIPLES);
    match rng.random_range(0..3) {
        0 => Problem::new(
            format!("Right triangle: legs {a} and {b}. Find the hypotenuse."),
            Answer::Whole(c),
            [Answer::Whole(a + b), Answer::Whole(c - 1), Answer::Whole(c + 1)],
        ),
        1 => Problem::new(
            format!("Right triangle: hypotenuse {c} and one leg {b}. Find the other leg."),
            Answer::Whole(a),
            [Answer::Whole(b), Answer::Whole(a + 1), Answer::Whole((a - 1).max(1))],
        ),
        _ => Problem::new(
            format!("Right triangle: hypotenuse {c} and one leg {a}. Find the other leg."),
            Answer::Whole(b),
            [Answer::Whole(a), Answer::Whole(b + 1), Answer::Whole((b - 1).max(1))],
        ),
    }
}

fn nth_term<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let d = pick(rng, &[2, 3, 4, 5, 6]);
    let a1 = rng.random_range(1..=10);
    let n = rng.random_range(6..=15);
    let an = a1 + (n - 1) * d;
    Problem::new(
        format!(
            "A sequence starts {a1}, {}, {}, ... What is term {n}?",
            a1 + d,
            a1 + 2 * d
        ),
        Answer::Whole(an),
        // off by one term, one step short, and n·d with the start forgotten
        [
            Answer::Whole(a1 + n * d),
            Answer::Whole(an - d),
            Answer::Whole(n * d),
        ],
    )
}

fn prism_volume<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let l = rng.random_range(4..=16);
    let w = rng.random_range(3..=12);
    let h = rng.random_range(3..=10);
    let ans = l * w * h;
    Problem::new(
        format!("Volume of a prism: {l}cm × {w}cm × {h}cm = ?"),
        Answer::Whole(ans),
        // surface area, base area only, and a dropped layer
        [
            Answer::Whole(2 * (l * w + l * h + w * h)),
            Answer::Whole(l * w),
            Answer::Whole(ans - l),
        ],
    )
}

fn two_draws<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let red = rng.random_range(2..=7);
    let blue = rng.random_range(2..=7);
    let total = red + blue;
    let den = total * (total - 1);
    let chance = |num| Answer::Fraction(Fraction::unreduced(num, den).simplified());
    Problem::new(
        format!(
            "A bag has {red} red and {blue} blue counters. Two are drawn without replacement. What is P(both red)?"
        ),
        chance(red * (red - 1)),
        // wrong colour, one of each, and forgetting the second draw
        [
            chance(blue * (blue - 1)),
            chance(2 * red * blue),
            Answer::Fraction(Fraction::unreduced(red, total)),
        ],
    )
}
