//! Homework review statuses and the verdict messages sent for them.
use serde_json::Value;

use crate::error::UndocumentedStatusError;

pub const FIELD_NAME: &str = "homework_name";
pub const FIELD_STATUS: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "approved" => Some(HomeworkStatus::Approved),
            "reviewing" => Some(HomeworkStatus::Reviewing),
            "rejected" => Some(HomeworkStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// Build the verdict message for one homework record.
pub fn parse_status(homework: &Value) -> Result<String, UndocumentedStatusError> {
    let name = homework
        .get(FIELD_NAME)
        .ok_or(UndocumentedStatusError::MissingField(FIELD_NAME))?;
    let raw_status = homework
        .get(FIELD_STATUS)
        .ok_or(UndocumentedStatusError::MissingField(FIELD_STATUS))?;

    let status = raw_status
        .as_str()
        .and_then(HomeworkStatus::parse)
        .ok_or_else(|| UndocumentedStatusError::UnknownStatus(display_value(raw_status)))?;

    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        display_value(name),
        status.verdict()
    ))
}

// Strings are shown bare, anything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
