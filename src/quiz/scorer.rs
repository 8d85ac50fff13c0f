use serde::{Deserialize, Serialize};

use crate::quiz::session::{Answers, QuizSession};

/// Shown in place of a submitted value for questions left unanswered.
pub const NOT_ANSWERED: &str = "Not Answered";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub question_text: String,
    pub submitted: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl AnswerRecord {
    pub fn submitted_display(&self) -> &str {
        self.submitted.as_deref().unwrap_or(NOT_ANSWERED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: usize,
    pub total: usize,
    pub records: Vec<AnswerRecord>,
}

impl ScoreReport {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score as f64 / self.total as f64 * 100.0
    }

    /// `score / total (pp.pp%)`
    pub fn summary(&self) -> String {
        format!("{} / {} ({:.2}%)", self.score, self.total, self.percentage())
    }
}

/// Grades `answers` against the session's questions in sampled order.
///
/// Every question yields exactly one record. Missing or empty answers are
/// recorded as unanswered and never count. Comparison is exact: no trimming,
/// no case folding.
pub fn score(quiz: &QuizSession, answers: &Answers) -> ScoreReport {
    let records: Vec<AnswerRecord> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(index, sampled)| {
            let submitted = answers
                .get(&index)
                .and_then(|answer| answer.as_deref())
                .filter(|answer| !answer.is_empty());
            let is_correct = submitted == Some(sampled.question.answer.as_str());
            AnswerRecord {
                question_index: index,
                question_text: sampled.question.text.clone(),
                submitted: submitted.map(str::to_string),
                correct_answer: sampled.question.answer.clone(),
                is_correct,
            }
        })
        .collect();

    ScoreReport {
        score: records.iter().filter(|r| r.is_correct).count(),
        total: quiz.questions.len(),
        records,
    }
}
