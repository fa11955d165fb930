//! Foundational arithmetic and rounding.

use rand::Rng;

use super::answer::Answer;
use super::Problem;

pub(super) fn problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let (prompt, ans) = match rng.random_range(0..5) {
        0 => {
            let a = rng.random_range(10..=99);
            let b = rng.random_range(10..=99);
            (format!("{a} + {b} = ?"), a + b)
        }
        1 => {
            let a = rng.random_range(50..=150);
            let b = rng.random_range(10..=50);
            (format!("{a} - {b} = ?"), a - b)
        }
        2 => {
            let a = rng.random_range(2..=12);
            let b = rng.random_range(2..=12);
            (format!("{a} × {b} = ?"), a * b)
        }
        3 => {
            let b = rng.random_range(2..=10);
            let a = b * rng.random_range(2..=10);
            (format!("{a} ÷ {b} = ?"), a / b)
        }
        _ => {
            let n: i64 = rng.random_range(101..=999);
            (format!("Round {n} to nearest 10"), (n + 5) / 10 * 10)
        }
    };
    near_misses(rng, prompt, ans)
}

/// Near misses either side, plus a place-value slip.
fn near_misses<R: Rng + ?Sized>(rng: &mut R, prompt: String, ans: i64) -> Problem {
    let over = ans + rng.random_range(1..=5);
    let under = ans - rng.random_range(1..=5);

    Problem::new(
        prompt,
        Answer::Whole(ans),
        [Answer::Whole(over), Answer::Whole(under), Answer::Whole(ans + 10)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn addition_places_the_sum_among_near_misses() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..200 {
            let problem = near_misses(&mut rng, "23 + 48 = ?".to_string(), 71);
            let q = super::super::assemble(&mut rng, problem);
            assert_eq!(q.correct_option(), "71");
            for (i, option) in q.options().iter().enumerate() {
                if i == q.correct_index() {
                    continue;
                }
                let value: i64 = option.parse().unwrap();
                assert!(
                    (66..=76).contains(&value) || value == 81,
                    "unexpected distractor {value}"
                );
            }
        }
    }
}
