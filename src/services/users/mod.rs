// User switching
// Whose schedule is displayed, and the list of users that can be picked

use crate::models::user::{UserInfo, UserSelection};
use crate::services::api::{ApiError, ScheduleApi};

/// Emitted after a successful switch; the displayed week must be reloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanged {
    pub selection: UserSelection,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub struct UserManager {
    users: Vec<UserInfo>,
    selection: UserSelection,
    current_user_info: Option<String>,
}

impl UserManager {
    pub fn new(selection: UserSelection) -> Self {
        Self {
            users: Vec::new(),
            selection,
            current_user_info: None,
        }
    }

    pub fn load_users(&mut self, api: &impl ScheduleApi) -> Result<&[UserInfo], ApiError> {
        match api.list_users() {
            Ok(users) => {
                log::info!("Loaded {} users", users.len());
                self.users = users;
                Ok(&self.users)
            }
            Err(e) => {
                log::error!("Failed to load users: {}", e);
                Err(e)
            }
        }
    }

    pub fn switch(&mut self, api: &impl ScheduleApi, selection: UserSelection) -> Result<UserChanged, ApiError> {
        let response = api.switch_user(&selection)?;

        if !response.is_success() {
            let message = response.message.unwrap_or_default();
            log::error!("Failed to switch user: {}", message);
            return Err(ApiError::Server(message));
        }

        self.selection = selection;
        self.current_user_info = response.message.clone();
        log::info!("Viewing schedule of {}", selection);

        Ok(UserChanged {
            selection,
            message: response.message,
        })
    }

    pub fn users(&self) -> &[UserInfo] {
        &self.users
    }

    pub fn selection(&self) -> UserSelection {
        self.selection
    }

    pub fn current_user_info(&self) -> Option<&str> {
        self.current_user_info.as_deref()
    }

    pub fn is_viewing_other_user(&self) -> bool {
        self.selection != UserSelection::SelfView
    }

    /// Owner to record on events created while viewing someone else.
    pub fn target_user_id(&self) -> Option<i64> {
        self.selection.user_id()
    }

    pub fn label_for(&self, selection: UserSelection) -> String {
        match selection {
            UserSelection::SelfView => "My schedule".to_string(),
            UserSelection::User(id) => self
                .users
                .iter()
                .find(|u| u.id == id)
                .map(|u| u.username.clone())
                .unwrap_or_else(|| format!("User {}", id)),
        }
    }
}
