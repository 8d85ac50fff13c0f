//! Text shown to the user. Kept free of any Telegram types so it can be
//! checked without a bot.

use crate::quiz::bank::BankSource;
use crate::quiz::sampler::SampledQuestion;
use crate::quiz::scorer::{AnswerRecord, ScoreReport};
use crate::quiz::Dataset;

/// Telegram rejects messages longer than 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4000;

pub const SELECT_SUBJECT: &str = "-- Select Subject --";

pub fn load_failure(source: &BankSource) -> String {
    format!("Could not load quiz data. Check {} file.", source)
}

pub fn subject_prompt(dataset: &Dataset) -> String {
    let mut text = String::from(SELECT_SUBJECT);
    for subject in dataset.subjects() {
        text.push_str(&format!("\n• {}", subject.name));
    }
    text
}

pub fn quiz_title(subject_name: &str, total: usize) -> String {
    format!("Subject: {}\n{} questions. Good luck!", subject_name, total)
}

/// `{n}. {question}` followed by the options in their shuffled order.
pub fn question_card(index: usize, sampled: &SampledQuestion) -> String {
    let mut text = format!("{}. {}", index + 1, sampled.question.text);
    for option in &sampled.options {
        text.push_str(&format!("\n  ◦ {}", option));
    }
    text
}

pub fn results(subject_name: &str, report: &ScoreReport) -> String {
    format!("Subject: {}\nScore: {}", subject_name, report.summary())
}

/// The question review, split over as many messages as needed.
pub fn review_messages(report: &ScoreReport) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::from("Question Review:");

    for record in &report.records {
        let entry = review_entry(record);
        if !current.is_empty()
            && current.chars().count() + entry.chars().count() + 2 > MAX_MESSAGE_CHARS
        {
            messages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&entry);
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

/// One review entry, never longer than a single message. Long question text
/// is cut first; the answers are kept whenever they fit.
fn review_entry(record: &AnswerRecord) -> String {
    let format_entry = |question_text: &str| {
        format!(
            "{} Q{}: {}\nYour Answer: {} | Correct Answer: {}",
            if record.is_correct { "✅" } else { "❌" },
            record.question_index + 1,
            question_text,
            record.submitted_display(),
            record.correct_answer
        )
    };

    let entry = format_entry(&record.question_text);
    let excess = entry.chars().count().saturating_sub(MAX_MESSAGE_CHARS);
    if excess == 0 {
        return entry;
    }

    let keep = record.question_text.chars().count().saturating_sub(excess + 1);
    let shortened: String = record.question_text.chars().take(keep).chain(Some('…')).collect();
    let entry = format_entry(&shortened);
    if entry.chars().count() <= MAX_MESSAGE_CHARS {
        return entry;
    }
    entry.chars().take(MAX_MESSAGE_CHARS - 1).chain(Some('…')).collect()
}
