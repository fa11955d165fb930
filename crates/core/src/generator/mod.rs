//! Grade-tiered arithmetic question synthesis.
//!
//! Each tier picks one archetype uniformly, samples operands, computes the
//! exact answer and three designed distractors, then shuffles the four options.

mod answer;
mod fraction;
mod grade4;
mod grade5;
mod grade6;
mod grade7;
mod grade8;

use rand::Rng;
use rand::seq::SliceRandom;

pub use answer::{Answer, Tenths};
pub use fraction::{Fraction, FractionError, gcd, simplify};

use crate::model::{GradeTier, OPTION_COUNT, Question};

// ─── PROBLEM ────────────────────────────────────────────────────────────────

/// An archetype's output before option assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Problem {
    prompt: String,
    answer: Answer,
    distractors: [Answer; 3],
}

impl Problem {
    fn new(prompt: String, answer: Answer, distractors: [Answer; 3]) -> Self {
        Self {
            prompt,
            answer,
            distractors,
        }
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, values: &[T]) -> T {
    values[rng.random_range(0..values.len())]
}

fn linear_equation_prompt(a: i64, b: i64, c: i64) -> String {
    if b < 0 {
        format!("Solve: {a}x - {} = {c}", b.unsigned_abs())
    } else {
        format!("Solve: {a}x + {b} = {c}")
    }
}

// ─── GENERATOR ──────────────────────────────────────────────────────────────

/// Stateless question factory. Every call succeeds for every tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionGenerator;

impl QuestionGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generates a question using the thread-local RNG.
    #[must_use]
    pub fn generate(&self, tier: GradeTier) -> Question {
        self.generate_with(&mut rand::rng(), tier)
    }

    /// Generates a question from the supplied RNG, so a seeded RNG reproduces
    /// the same question sequence.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R, tier: GradeTier) -> Question {
        let problem = match tier {
            GradeTier::Four => grade4::problem(rng),
            GradeTier::Five => grade5::problem(rng),
            GradeTier::Six => grade6::problem(rng),
            GradeTier::Seven => grade7::problem(rng),
            GradeTier::Eight => grade8::problem(rng),
        };
        assemble(rng, problem)
    }
}

/// Shorthand for `QuestionGenerator.generate(tier)`.
#[must_use]
pub fn generate(tier: GradeTier) -> Question {
    QuestionGenerator.generate(tier)
}

// ─── ASSEMBLY ───────────────────────────────────────────────────────────────

fn assemble<R: Rng + ?Sized>(rng: &mut R, problem: Problem) -> Question {
    let Problem {
        prompt,
        answer,
        distractors,
    } = problem;
    let rendered = distinct_options(answer, distractors);

    let mut order: [usize; OPTION_COUNT] = [0, 1, 2, 3];
    order.shuffle(rng);
    let correct_index = order.iter().position(|&slot| slot == 0).unwrap_or(0);
    let options = order.map(|slot| rendered[slot].clone());

    Question::assembled(prompt, options, correct_index)
}

/// Renders the answer followed by three distractors, replacing any distractor
/// that collides with an option already kept.
///
/// Two options collide when they render the same or denote the same value. A
/// replacement is the first value in the answer's fallback sequence that is
/// non-negative and collides with nothing kept so far.
fn distinct_options(answer: Answer, distractors: [Answer; 3]) -> [String; OPTION_COUNT] {
    let mut kept: Vec<(Answer, String)> = Vec::with_capacity(OPTION_COUNT);
    kept.push((answer, answer.to_string()));

    let fresh = |candidate: &Answer, kept: &[(Answer, String)]| {
        let text = candidate.to_string();
        (!candidate.is_negative()
            && kept
                .iter()
                .all(|(value, shown)| !value.same_value(candidate) && *shown != text))
        .then_some(text)
    };

    let mut step = 0;
    for distractor in distractors {
        if let Some(text) = fresh(&distractor, &kept) {
            kept.push((distractor, text));
            continue;
        }
        loop {
            step += 1;
            let Some(candidate) = answer.nudged(step) else {
                continue;
            };
            if let Some(text) = fresh(&candidate, &kept) {
                kept.push((candidate, text));
                break;
            }
        }
    }

    let mut options: [String; OPTION_COUNT] = Default::default();
    for (slot, (_, text)) in options.iter_mut().zip(kept) {
        *slot = text;
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn colliding_distractors_fall_back_around_the_answer() {
        let options = distinct_options(
            Answer::Whole(10),
            [Answer::Whole(10), Answer::Whole(12), Answer::Whole(12)],
        );
        assert_eq!(options, ["10", "11", "12", "9"].map(str::to_string));
    }

    #[test]
    fn fraction_equal_after_reduction_is_replaced() {
        let half = Answer::Fraction(Fraction::new(1, 2).unwrap());
        let two_quarters = Answer::Fraction(Fraction::new(2, 4).unwrap());
        let options = distinct_options(
            half,
            [two_quarters, Answer::Fraction(Fraction::new(1, 3).unwrap()), Answer::Whole(1)],
        );
        assert_eq!(options, ["1/2", "1", "1/3", "0"].map(str::to_string));
    }

    #[test]
    fn equal_values_with_different_renderings_collide() {
        let two_thirds = Answer::Fraction(Fraction::new(2, 3).unwrap());
        let options = distinct_options(
            two_thirds,
            [
                Answer::Fraction(Fraction::new(3, 3).unwrap()),
                Answer::Fraction(Fraction::new(1, 3).unwrap()),
                Answer::Whole(1),
            ],
        );
        assert_eq!(options, ["2/3", "3/3", "1/3", "4/3"].map(str::to_string));
    }

    #[test]
    fn negative_distractors_are_replaced() {
        let options = distinct_options(
            Answer::Whole(0),
            [Answer::Whole(-1), Answer::Whole(-2), Answer::Whole(5)],
        );
        assert_eq!(options, ["0", "1", "2", "5"].map(str::to_string));
    }

    #[test]
    fn seeded_rng_reproduces_questions() {
        let generator = QuestionGenerator::new();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for tier in GradeTier::ALL {
            assert_eq!(
                generator.generate_with(&mut a, tier),
                generator.generate_with(&mut b, tier)
            );
        }
    }

    #[test]
    fn every_tier_yields_four_distinct_options() {
        let generator = QuestionGenerator::new();
        let mut rng = StdRng::seed_from_u64(42);
        for tier in GradeTier::ALL {
            for _ in 0..500 {
                let q = generator.generate_with(&mut rng, tier);
                let options = q.options();
                assert!(q.correct_index() < OPTION_COUNT);
                for (i, option) in options.iter().enumerate() {
                    assert!(!options[..i].contains(option), "{tier}: {:?}", q);
                }
            }
        }
    }

    #[test]
    fn linear_prompt_shows_subtraction_for_negative_constant() {
        assert_eq!(linear_equation_prompt(3, -4, 11), "Solve: 3x - 4 = 11");
        assert_eq!(linear_equation_prompt(3, 4, 19), "Solve: 3x + 4 = 19");
    }
}
