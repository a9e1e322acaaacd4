//! Configuration loader and validator for the homework status bot.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingSecrets(Vec<&'static str>),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration, built once at startup and handed to the poller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub practicum: Practicum,
    pub telegram: Telegram,
}

/// Loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub retry_period_secs: u64,
}

impl Default for App {
    fn default() -> Self {
        Self {
            retry_period_secs: DEFAULT_RETRY_PERIOD_SECS,
        }
    }
}

/// Homework API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Practicum {
    pub endpoint: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Telegram bot settings. `chat_id` is a numeric id or an `@channel` name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Telegram {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.app.retry_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.practicum.timeout_secs)
    }

    /// Overwrite secrets with values found through `lookup`; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = read(ENV_PRACTICUM_TOKEN) {
            self.practicum.token = v;
        }
        if let Some(v) = read(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = v;
        }
        if let Some(v) = read(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = v;
        }
    }
}

/// Load configuration from an optional YAML file plus the process environment.
/// - If `path` is None, built-in defaults are used and secrets must come from the environment.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    cfg.apply_env(lookup);
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let mut missing = Vec::new();
    if cfg.practicum.token.trim().is_empty() {
        missing.push(ENV_PRACTICUM_TOKEN);
    }
    if cfg.telegram.bot_token.trim().is_empty() {
        missing.push(ENV_TELEGRAM_TOKEN);
    }
    if cfg.telegram.chat_id.trim().is_empty() {
        missing.push(ENV_TELEGRAM_CHAT_ID);
    }
    if !missing.is_empty() {
        return Err(ConfigError::MissingSecrets(missing));
    }

    if cfg.app.retry_period_secs == 0 {
        return Err(ConfigError::Invalid("app.retry_period_secs must be > 0"));
    }
    if cfg.practicum.timeout_secs == 0 {
        return Err(ConfigError::Invalid("practicum.timeout_secs must be > 0"));
    }
    if Url::parse(&cfg.practicum.endpoint).is_err() {
        return Err(ConfigError::Invalid("practicum.endpoint must be a valid URL"));
    }

    Ok(())
}

/// Example settings file with every key spelled out.
pub fn example() -> &'static str {
    r#"app:
  retry_period_secs: 600

practicum:
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"
  token: "YOUR_PRACTICUM_TOKEN"
  timeout_secs: 30

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  chat_id: "123456789"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.retry_period(), Duration::from_secs(600));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn defaults_with_env_secrets() {
        let cfg = load_with(
            None,
            env(&[
                (ENV_PRACTICUM_TOKEN, "p"),
                (ENV_TELEGRAM_TOKEN, "t"),
                (ENV_TELEGRAM_CHAT_ID, "42"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.practicum.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.app.retry_period_secs, DEFAULT_RETRY_PERIOD_SECS);
        assert_eq!(cfg.practicum.token, "p");
        assert_eq!(cfg.telegram.bot_token, "t");
        assert_eq!(cfg.telegram.chat_id, "42");
    }

    #[test]
    fn missing_secrets_are_all_named() {
        let err = load_with(None, env(&[(ENV_TELEGRAM_TOKEN, "t")])).unwrap_err();
        match err {
            ConfigError::MissingSecrets(keys) => {
                assert_eq!(keys, vec![ENV_PRACTICUM_TOKEN, ENV_TELEGRAM_CHAT_ID])
            }
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn blank_env_value_counts_as_missing() {
        let err = load_with(
            None,
            env(&[
                (ENV_PRACTICUM_TOKEN, "p"),
                (ENV_TELEGRAM_TOKEN, "  "),
                (ENV_TELEGRAM_CHAT_ID, "42"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(ENV_TELEGRAM_TOKEN));
    }

    #[test]
    fn invalid_retry_period_and_endpoint() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.retry_period_secs = 0;
        match validate(&cfg).unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("retry_period_secs")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.practicum.timeout_secs = 0;
        match validate(&cfg).unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("timeout_secs")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.practicum.endpoint = "not a url".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_from_file_env_overrides() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load_with(Some(&p), env(&[(ENV_TELEGRAM_CHAT_ID, "@reviews")])).unwrap();
        assert_eq!(cfg.telegram.chat_id, "@reviews");
        assert_eq!(cfg.practicum.token, "YOUR_PRACTICUM_TOKEN");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, "app:\n  retry_period_secs: 30\n").unwrap();
        let cfg = load_with(
            Some(&p),
            env(&[
                (ENV_PRACTICUM_TOKEN, "p"),
                (ENV_TELEGRAM_TOKEN, "t"),
                (ENV_TELEGRAM_CHAT_ID, "1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.app.retry_period_secs, 30);
        assert_eq!(cfg.practicum.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.practicum.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
