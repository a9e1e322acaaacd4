//! Homework API client and answer validation.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::{FetchError, ShapeError};

pub const KEY_HOMEWORKS: &str = "homeworks";
pub const KEY_CURRENT_DATE: &str = "current_date";

/// Source of homework status answers. The poller only talks to this trait.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetch the raw answer for every status change since `from_date`.
    async fn get_api_answer(&self, from_date: i64) -> Result<Value, FetchError>;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(token: String, endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid homework API endpoint: {}", endpoint))?;
        let http = Client::builder()
            .user_agent("homework-bot/0.1")
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn build_request(&self, from_date: i64) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
    }

    fn request_error(&self, source: reqwest::Error) -> FetchError {
        FetchError::Request {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn get_api_answer(&self, from_date: i64) -> Result<Value, FetchError> {
        let request = self
            .build_request(from_date)
            .map_err(|e| self.request_error(e))?;
        debug!(url = %request.url(), from_date, "requesting homework statuses");

        let res = self
            .http
            .execute(request)
            .await
            .map_err(|e| self.request_error(e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Answer {
                endpoint: self.endpoint.to_string(),
                status,
            });
        }

        let body = res.text().await.map_err(|e| self.request_error(e))?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// A validated API answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiAnswer {
    /// Homework records as reported, newest first.
    pub homeworks: Vec<Value>,
    /// Server time of the answer; the next query window starts here.
    pub current_date: i64,
}

impl ApiAnswer {
    pub fn latest(&self) -> Option<&Value> {
        self.homeworks.first()
    }
}

/// Check that the decoded answer is an object carrying a `homeworks` list
/// and an integer `current_date`.
pub fn check_response(response: &Value) -> Result<ApiAnswer, ShapeError> {
    let map = response.as_object().ok_or(ShapeError::TypeMismatch {
        what: "API answer",
        expected: "an object",
        found: json_kind(response),
    })?;

    let missing: Vec<&'static str> = [KEY_HOMEWORKS, KEY_CURRENT_DATE]
        .into_iter()
        .filter(|key| !map.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ShapeError::MissingKeys(missing));
    }

    let homeworks = &map[KEY_HOMEWORKS];
    let homeworks = homeworks.as_array().ok_or(ShapeError::TypeMismatch {
        what: KEY_HOMEWORKS,
        expected: "a list",
        found: json_kind(homeworks),
    })?;

    let current_date = &map[KEY_CURRENT_DATE];
    let current_date = current_date.as_i64().ok_or(ShapeError::TypeMismatch {
        what: KEY_CURRENT_DATE,
        expected: "an integer timestamp",
        found: json_kind(current_date),
    })?;

    Ok(ApiAnswer {
        homeworks: homeworks.clone(),
        current_date,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
