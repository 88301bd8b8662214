/// Dialog and control state that lives outside the services.
#[derive(Debug, Default)]
pub struct AppState {
    /// Weekday picker next to the event dialog
    pub show_days_popup: bool,
    /// Error shown inside the event dialog until it is edited or closed
    pub dialog_error: Option<String>,
    /// Users could not be listed; the picker is hidden
    pub users_unavailable: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close_dialog(&mut self) {
        self.show_days_popup = false;
        self.dialog_error = None;
    }
}
