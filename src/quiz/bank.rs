use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::quiz::Dataset;

/// Where the question bank is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    File(PathBuf),
    Url(String),
}

impl BankSource {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for BankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read {location}: {cause}")]
    Read {
        location: String,
        #[source]
        cause: std::io::Error,
    },
    #[error("could not fetch {location}: {cause}")]
    Fetch {
        location: String,
        #[source]
        cause: reqwest::Error,
    },
    #[error("timed out after {after:?} loading {location}")]
    Timeout { location: String, after: Duration },
    #[error("malformed question bank: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid question bank: {0}")]
    Invalid(String),
}

/// Reads, parses and validates the question bank. There is exactly one
/// attempt; a failure is final for the lifetime of the process.
pub async fn load(source: &BankSource, timeout: Duration) -> Result<Dataset, LoadError> {
    info!("Loading question bank from {}", source);

    let raw = match tokio::time::timeout(timeout, fetch(source)).await {
        Ok(raw) => raw?,
        Err(_) => {
            return Err(LoadError::Timeout {
                location: source.to_string(),
                after: timeout,
            })
        }
    };
    debug!("Read {} bytes of question bank", raw.len());

    let dataset = parse_bank(&raw)?;
    info!(
        "Loaded {} subjects ({} questions)",
        dataset.subjects().len(),
        dataset.subjects().iter().map(|s| s.questions.len()).sum::<usize>()
    );
    Ok(dataset)
}

async fn fetch(source: &BankSource) -> Result<String, LoadError> {
    match source {
        BankSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|cause| LoadError::Read {
                    location: source.to_string(),
                    cause,
                })
        }
        BankSource::Url(url) => {
            let fetch_error = |cause| LoadError::Fetch {
                location: url.clone(),
                cause,
            };
            reqwest::get(url)
                .await
                .and_then(|response| response.error_for_status())
                .map_err(fetch_error)?
                .text()
                .await
                .map_err(fetch_error)
        }
    }
}

pub fn parse_bank(raw: &str) -> Result<Dataset, LoadError> {
    let dataset: Dataset = serde_json::from_str(raw)?;
    validate(&dataset)?;
    Ok(dataset)
}

fn validate(dataset: &Dataset) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for subject in dataset.subjects() {
        if !seen.insert(subject.id.as_str()) {
            return Err(LoadError::Invalid(format!(
                "subject id {} is used more than once",
                subject.id
            )));
        }

        for (index, question) in subject.questions.iter().enumerate() {
            let invalid = |problem: String| {
                LoadError::Invalid(format!(
                    "question {} of {} {}",
                    index + 1,
                    subject.name,
                    problem
                ))
            };

            if question.options.len() < 2 {
                return Err(invalid("needs at least two options".to_string()));
            }
            let mut distinct = HashSet::new();
            if let Some(repeated) = question.options.iter().find(|o| !distinct.insert(o.as_str())) {
                return Err(invalid(format!("lists option {:?} more than once", repeated)));
            }
            if question.answer.is_empty() {
                return Err(invalid("has an empty answer".to_string()));
            }
            if !question.options.contains(&question.answer) {
                return Err(invalid(format!(
                    "does not list its answer {:?} among its options",
                    question.answer
                )));
            }
        }
    }
    Ok(())
}
