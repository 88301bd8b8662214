// Settings module
// Connection settings and the small set of persisted client preferences

use serde::{Deserialize, Serialize};

use crate::models::user::UserSelection;

/// Application configuration, read from `settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scheme, host and port of the scheduling server
    pub server_url: String,
    /// Path prefix of the event endpoints
    pub api_base: String,
    /// Id of the signed-in user; decides which events are editable
    pub user_id: Option<i64>,
    /// Optional `name=value` cookie of an already established session
    pub session_cookie: Option<String>,
    /// First hour shown when night hours are hidden
    pub min_hour: u32,
    /// Last hour shown when night hours are hidden
    pub max_hour: u32,
    /// Per-request timeout; `None` waits for the server indefinitely
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            api_base: "/api".to_string(),
            user_id: None,
            session_cookie: None,
            min_hour: 7,
            max_hour: 20,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err("server_url must start with http:// or https://".to_string());
        }

        if self.min_hour > 23 || self.max_hour > 23 {
            return Err("Visible hours must be between 0 and 23".to_string());
        }

        if self.min_hour > self.max_hour {
            return Err("min_hour cannot be after max_hour".to_string());
        }

        Ok(())
    }
}

/// Values the browser build kept in `localStorage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientPrefs {
    /// Last duration typed into the event dialog (`H:MM`)
    pub last_duration: String,
    /// Wide-column layout toggle
    pub mobile_view_expanded: bool,
    /// Whose schedule is being viewed
    pub selected_user_id: UserSelection,
}

impl Default for ClientPrefs {
    fn default() -> Self {
        Self {
            last_duration: "1:00".to_string(),
            mobile_view_expanded: false,
            selected_user_id: UserSelection::SelfView,
        }
    }
}
