use std::env;
use std::time::Duration;

use crate::quiz::bank::BankSource;

const DEFAULT_BANK: &str = "questions.json";
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bank_source: BankSource,
    pub load_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment. `.env` should
    /// already have been loaded by the caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bank = lookup("QUIZ_BANK")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BANK.to_string());

        let load_timeout = match lookup("QUIZ_LOAD_TIMEOUT_SECS") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
        };

        Ok(Self {
            bank_source: BankSource::parse(bank.trim()),
            load_timeout,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "QUIZ_LOAD_TIMEOUT_SECS",
        reason,
    };
    let secs: u64 = raw.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
    if secs == 0 {
        return Err(invalid("must be at least 1 second".to_string()));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(
            config.bank_source,
            BankSource::File(PathBuf::from("questions.json"))
        );
        assert_eq!(config.load_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_bank_url_and_timeout() {
        let config = config(&[
            ("QUIZ_BANK", "https://quiz.example.org/questions.json"),
            ("QUIZ_LOAD_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(
            config.bank_source,
            BankSource::Url("https://quiz.example.org/questions.json".to_string())
        );
        assert_eq!(config.load_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_timeouts() {
        for raw in ["soon", "-1", "0"] {
            let err = config(&[("QUIZ_LOAD_TIMEOUT_SECS", raw)]).unwrap_err();
            assert!(err.to_string().starts_with("Invalid value for QUIZ_LOAD_TIMEOUT_SECS"));
        }
    }
}
