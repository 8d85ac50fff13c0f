pub mod bank;
pub mod sampler;
pub mod scorer;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of questions drawn for every test.
pub const NUM_QUESTIONS: usize = 30;

/// Subject identifier as found in the question bank.
///
/// Banks may use either strings or numbers for ids; both are kept in their
/// string form so `"1"` and `1` name the same subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawSubjectId")]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubjectId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawSubjectId> for SubjectId {
    fn from(raw: RawSubjectId) -> Self {
        match raw {
            RawSubjectId::Text(text) => Self::new(text),
            RawSubjectId::Number(number) => Self::new(number.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "q")]
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Every subject of the question bank. Loaded once and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub subjects: Vec<Subject>,
}

impl Dataset {
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn find(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id.as_str() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }
}
