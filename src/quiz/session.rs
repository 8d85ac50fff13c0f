use std::collections::BTreeMap;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::quiz::sampler::{self, InsufficientQuestions, SampledQuestion};
use crate::quiz::scorer::{self, ScoreReport};
use crate::quiz::{Dataset, SubjectId, NUM_QUESTIONS};

/// Submitted value per question index. `None` or a missing index means the
/// question was left unanswered.
pub type Answers = BTreeMap<usize, Option<String>>;

/// One test attempt: the subject it was drawn from and its sampled questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub questions: Vec<SampledQuestion>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Please select a subject to start the test.")]
    NoSubjectSelected,
    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
    #[error(transparent)]
    InsufficientQuestions(#[from] InsufficientQuestions),
    #[error("Cannot {command} while {state}.")]
    InvalidTransition {
        command: &'static str,
        state: &'static str,
    },
    #[error("There is no question {}; the test has {total}.", .index + 1)]
    QuestionOutOfRange { index: usize, total: usize },
}

/// Idle -> Active -> Scored -> Idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Session {
    #[default]
    Idle,
    Active {
        quiz: QuizSession,
        answers: Answers,
    },
    Scored {
        subject_name: String,
        report: ScoreReport,
    },
}

impl Session {
    pub fn state_name(&self) -> &'static str {
        match self {
            Session::Idle => "idle",
            Session::Active { .. } => "taking a test",
            Session::Scored { .. } => "showing results",
        }
    }

    /// Samples a fresh test for the subject with id `subject_id`.
    ///
    /// On any error the session stays `Idle`.
    pub fn start_session<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        subject_id: &str,
        rng: &mut R,
    ) -> Result<&QuizSession, SessionError> {
        self.expect_idle("start a test")?;
        if subject_id.is_empty() {
            return Err(SessionError::NoSubjectSelected);
        }
        let subject = dataset
            .find(subject_id)
            .ok_or_else(|| SessionError::UnknownSubject(subject_id.to_string()))?;

        let questions = sampler::sample(subject, NUM_QUESTIONS, rng)?;
        info!(
            "Started a test on {} ({} of {} questions)",
            subject.name,
            questions.len(),
            subject.questions.len()
        );

        *self = Session::Active {
            quiz: QuizSession {
                subject_id: subject.id.clone(),
                subject_name: subject.name.clone(),
                questions,
            },
            answers: Answers::new(),
        };
        match self {
            Session::Active { quiz, .. } => Ok(quiz),
            _ => unreachable!(),
        }
    }

    /// Records the value submitted for question `index`, replacing any earlier one.
    pub fn record_answer(&mut self, index: usize, value: Option<String>) -> Result<(), SessionError> {
        let state = self.state_name();
        match self {
            Session::Active { quiz, answers } => {
                if index >= quiz.questions.len() {
                    return Err(SessionError::QuestionOutOfRange {
                        index,
                        total: quiz.questions.len(),
                    });
                }
                debug!("Answer for question {}: {:?}", index + 1, value);
                answers.insert(index, value);
                Ok(())
            }
            _ => Err(SessionError::InvalidTransition {
                command: "answer a question",
                state,
            }),
        }
    }

    /// Grades the recorded answers, with `answers` taking precedence, and moves
    /// to `Scored`.
    pub fn submit(&mut self, answers: Answers) -> Result<&ScoreReport, SessionError> {
        let (quiz, mut collected) = match std::mem::take(self) {
            Session::Active { quiz, answers } => (quiz, answers),
            other => {
                let state = other.state_name();
                *self = other;
                return Err(SessionError::InvalidTransition {
                    command: "submit",
                    state,
                });
            }
        };
        collected.extend(answers);

        let report = scorer::score(&quiz, &collected);
        info!("Test on {} scored {}", quiz.subject_name, report.summary());

        *self = Session::Scored {
            subject_name: quiz.subject_name,
            report,
        };
        match self {
            Session::Scored { report, .. } => Ok(report),
            _ => unreachable!(),
        }
    }

    /// Drops the current test and any results. A test in progress may be
    /// abandoned this way too.
    pub fn restart(&mut self) {
        if !matches!(self, Session::Idle) {
            info!("Restarting from {}", self.state_name());
        }
        *self = Session::Idle;
    }

    pub fn quiz(&self) -> Option<&QuizSession> {
        match self {
            Session::Active { quiz, .. } => Some(quiz),
            _ => None,
        }
    }

    /// First question without a recorded answer, if the test is in progress.
    pub fn next_unanswered(&self) -> Option<usize> {
        match self {
            Session::Active { quiz, answers } => {
                (0..quiz.questions.len()).find(|i| !answers.contains_key(i))
            }
            _ => None,
        }
    }

    fn expect_idle(&self, command: &'static str) -> Result<(), SessionError> {
        match self {
            Session::Idle => Ok(()),
            _ => Err(SessionError::InvalidTransition {
                command,
                state: self.state_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::quiz::fixtures;

    fn started(seed: u64) -> Session {
        let mut session = Session::default();
        session
            .start_session(&fixtures::dataset(), "math", &mut StdRng::seed_from_u64(seed))
            .unwrap();
        session
    }

    #[test]
    fn starting_samples_thirty_questions() {
        let dataset = fixtures::dataset();
        let mut session = Session::default();
        let quiz = session
            .start_session(&dataset, "math", &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(quiz.subject_name, "Math");
        assert_eq!(quiz.questions.len(), NUM_QUESTIONS);
        assert_eq!(session.next_unanswered(), Some(0));
        assert_eq!(dataset, fixtures::dataset());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut session = Session::default();
        let err = session
            .start_session(&fixtures::dataset(), "", &mut StdRng::seed_from_u64(2))
            .unwrap_err();
        assert!(matches!(err, SessionError::NoSubjectSelected));
        assert_eq!(err.to_string(), "Please select a subject to start the test.");
        assert_eq!(session, Session::Idle);
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let mut session = Session::default();
        let err = session
            .start_session(&fixtures::dataset(), "chemistry", &mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownSubject(ref id) if id == "chemistry"));
        assert_eq!(session, Session::Idle);
    }

    #[test]
    fn small_subject_leaves_session_idle() {
        let mut session = Session::default();
        let err = session
            .start_session(&fixtures::dataset(), "art", &mut StdRng::seed_from_u64(4))
            .unwrap_err();
        assert!(matches!(err, SessionError::InsufficientQuestions(_)));
        assert_eq!(err.to_string(), "Not enough questions for Art. Need 30.");
        assert_eq!(session, Session::Idle);
    }

    #[test]
    fn cannot_start_twice() {
        let mut session = started(5);
        let before = session.clone();
        let err = session
            .start_session(&fixtures::dataset(), "history", &mut StdRng::seed_from_u64(5))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn math_scenario_scores_twenty_of_thirty() {
        let mut session = started(6);
        let quiz = session.quiz().unwrap().clone();

        let answers: Answers = quiz
            .questions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let value = if i < 10 {
                    s.options.iter().find(|o| **o != s.question.answer).unwrap().clone()
                } else {
                    s.question.answer.clone()
                };
                (i, Some(value))
            })
            .collect();

        let report = session.submit(answers).unwrap();
        assert_eq!(report.score, 20);
        assert_eq!(report.summary(), "20 / 30 (66.67%)");
        assert!(matches!(session, Session::Scored { .. }));
    }

    #[test]
    fn recorded_answers_are_scored_and_submitted_ones_win() {
        let mut session = started(7);
        let quiz = session.quiz().unwrap().clone();

        session.record_answer(0, Some(quiz.questions[0].question.answer.clone())).unwrap();
        session.record_answer(1, Some("nope".to_string())).unwrap();
        session.record_answer(2, None).unwrap();
        assert_eq!(session.next_unanswered(), Some(3));

        let mut overrides = Answers::new();
        overrides.insert(1, Some(quiz.questions[1].question.answer.clone()));

        let report = session.submit(overrides).unwrap();
        assert_eq!(report.score, 2);
        assert_eq!(report.records.len(), NUM_QUESTIONS);
        assert!(!report.records[2].is_correct);
    }

    #[test]
    fn answers_outside_the_test_are_rejected() {
        let mut session = started(8);
        let err = session.record_answer(NUM_QUESTIONS, Some("x".to_string())).unwrap_err();
        assert!(matches!(err, SessionError::QuestionOutOfRange { index: 30, total: 30 }));
        assert_eq!(err.to_string(), "There is no question 31; the test has 30.");
    }

    #[test]
    fn submit_needs_an_active_test() {
        let mut session = Session::default();
        assert!(matches!(
            session.submit(Answers::new()),
            Err(SessionError::InvalidTransition { command: "submit", state: "idle" })
        ));
        assert_eq!(session, Session::Idle);

        let mut session = started(9);
        session.submit(Answers::new()).unwrap();
        let scored = session.clone();
        assert!(matches!(
            session.submit(Answers::new()),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert_eq!(session, scored);
        assert!(session.record_answer(0, None).is_err());
    }

    #[test]
    fn restart_clears_everything() {
        let mut session = started(10);
        session.submit(Answers::new()).unwrap();
        session.restart();
        assert_eq!(session, Session::Idle);
        assert!(session.quiz().is_none());

        let mut rng = StdRng::seed_from_u64(11);
        session.start_session(&fixtures::dataset(), "math", &mut rng).unwrap();
        assert_eq!(session.next_unanswered(), Some(0));
        match &session {
            Session::Active { answers, .. } => assert!(answers.is_empty()),
            other => panic!("expected an active test, got {:?}", other),
        }
    }

    #[test]
    fn restart_draws_fresh_questions() {
        let dataset = fixtures::dataset();
        let mut rng = StdRng::seed_from_u64(12);
        let mut session = Session::default();

        let mut draws = HashSet::new();
        for _ in 0..5 {
            let quiz = session.start_session(&dataset, "math", &mut rng).unwrap();
            let order: Vec<String> = quiz.questions.iter().map(|s| s.question.text.clone()).collect();
            draws.insert(order);
            session.submit(Answers::new()).unwrap();
            session.restart();
        }
        assert!(draws.len() > 1);
    }

    #[test]
    fn restart_may_abandon_a_test() {
        let mut session = started(13);
        session.restart();
        assert_eq!(session, Session::Idle);
    }
}
