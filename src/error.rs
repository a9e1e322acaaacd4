//! Error kinds for each stage of a poll cycle.
use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised while talking to the homework API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("endpoint {endpoint} is unavailable, HTTP status {status}")]
    Answer { endpoint: String, status: StatusCode },
    #[error("API answer is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The decoded answer does not have the expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{what} must be {expected}, got {found}")]
    TypeMismatch {
        what: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("API answer is missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
}

/// A homework record cannot be turned into a verdict.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UndocumentedStatusError {
    #[error("undocumented status: homework record has no `{0}` field")]
    MissingField(&'static str),
    #[error("undocumented status: unknown homework status {0:?}")]
    UnknownStatus(String),
}

/// Anything that aborts a single cycle. None of these stop the loop.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Status(#[from] UndocumentedStatusError),
}
