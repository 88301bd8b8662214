//! REST access to the scheduling server.
//!
//! `ScheduleApi` is the seam the event manager talks through; `ApiClient`
//! is the blocking HTTP implementation.

mod client;
mod retry;

pub use client::ApiClient;
pub use retry::{retry_request, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::event::EventPayload;
use crate::models::user::{UserInfo, UserSelection};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("{0}")]
    Server(String),

    #[error("Event id is required for deletion")]
    MissingId,

    #[error("Malformed server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// `status` field of every server reply. Anything but `success` is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    #[default]
    #[serde(other)]
    Error,
}

/// Reply of `save-event`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created: Option<bool>,
    /// Series the server created or kept for a recurring event
    #[serde(default, deserialize_with = "loose_series_id", skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
}

impl SaveResponse {
    pub fn success(id: i64) -> Self {
        Self {
            status: ResponseStatus::Success,
            id: Some(id),
            message: None,
            created: None,
            series_id: None,
        }
    }

    pub fn with_series(mut self, series_id: impl Into<String>) -> Self {
        self.series_id = Some(series_id.into());
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            id: None,
            message: Some(message.into()),
            created: None,
            series_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Reply of `delete-event` and `switch-user`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LoadEventsResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub users: Vec<UserInfo>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Operations the client performs against the server.
#[cfg_attr(test, mockall::automock)]
pub trait ScheduleApi {
    /// Create (no id) or replace (with id) an event.
    fn save_event(&self, payload: &EventPayload) -> Result<SaveResponse, ApiError>;

    /// Delete one event, or its whole series when `delete_recurring` is set.
    fn delete_event(&self, id: Option<i64>, delete_recurring: bool) -> Result<StatusResponse, ApiError>;

    /// Raw event records in `[date_from, date_to]`. Failures are logged and
    /// read as an empty week.
    fn load_events(&self, date_from: NaiveDate, date_to: NaiveDate) -> Vec<Value>;

    fn check_connection(&self) -> bool;

    fn list_users(&self) -> Result<Vec<UserInfo>, ApiError>;

    fn switch_user(&self, selection: &UserSelection) -> Result<StatusResponse, ApiError>;
}

/// First and last day of a displayed range.
pub fn week_range(days: &[NaiveDate]) -> Option<(NaiveDate, NaiveDate)> {
    match (days.first(), days.last()) {
        (Some(first), Some(last)) => Some((*first, *last)),
        _ => None,
    }
}

/// Events of a displayed week; only the first and last day are used.
pub fn load_events_for_week<A: ScheduleApi + ?Sized>(api: &A, days: &[NaiveDate]) -> Vec<Value> {
    match week_range(days) {
        Some((from, to)) => api.load_events(from, to),
        None => {
            log::warn!("No week days given, nothing to load");
            Vec::new()
        }
    }
}

fn loose_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn loose_series_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
