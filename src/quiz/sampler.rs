use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::quiz::{Question, Subject};

/// A question drawn for one test together with the order its options are
/// shown in. Grading only ever looks at `question.answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledQuestion {
    pub question: Question,
    pub options: Vec<String>,
}

pub type SampledSet = Vec<SampledQuestion>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not enough questions for {subject}. Need {required}.")]
pub struct InsufficientQuestions {
    pub subject: String,
    pub required: usize,
}

/// Fisher-Yates shuffle: walks down from the last slot, swapping each slot with
/// a uniformly chosen slot at or below it.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Draws `n` distinct questions from `subject` in random order and shuffles the
/// options of each one. The subject itself is left untouched.
pub fn sample<R: Rng + ?Sized>(
    subject: &Subject,
    n: usize,
    rng: &mut R,
) -> Result<SampledSet, InsufficientQuestions> {
    if subject.questions.len() < n {
        return Err(InsufficientQuestions {
            subject: subject.name.clone(),
            required: n,
        });
    }

    let mut pool: Vec<&Question> = subject.questions.iter().collect();
    shuffle(&mut pool, rng);

    Ok(pool
        .into_iter()
        .take(n)
        .map(|question| {
            let mut options = question.options.clone();
            shuffle(&mut options, rng);
            SampledQuestion {
                question: question.clone(),
                options,
            }
        })
        .collect())
}
