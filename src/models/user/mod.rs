// User module
// Users whose schedules can be viewed, and the current selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry of the server's user list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
}

/// Whose schedule is on screen. Serialized as `"self"` or the user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum UserSelection {
    #[default]
    SelfView,
    User(i64),
}

impl UserSelection {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            UserSelection::SelfView => None,
            UserSelection::User(id) => Some(*id),
        }
    }
}

impl fmt::Display for UserSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserSelection::SelfView => write!(f, "self"),
            UserSelection::User(id) => write!(f, "{}", id),
        }
    }
}

impl From<UserSelection> for String {
    fn from(selection: UserSelection) -> Self {
        selection.to_string()
    }
}

impl TryFrom<String> for UserSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() || value == "self" {
            return Ok(UserSelection::SelfView);
        }
        value
            .parse()
            .map(UserSelection::User)
            .map_err(|_| format!("Invalid user selection '{}'", value))
    }
}
