//! Confirmation dialog for deleting events.
//!
//! Recurring events offer a second choice: remove only the clicked
//! occurrence or the whole series.

use egui::{Context, RichText};

use super::SchedulerApp;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    DeleteEvent { event_id: i64, event_text: String },
    DeleteRecurringEvent { event_id: i64, event_text: String },
}

impl ConfirmAction {
    pub fn title(&self) -> &'static str {
        match self {
            ConfirmAction::DeleteEvent { .. } => "Delete Event",
            ConfirmAction::DeleteRecurringEvent { .. } => "Delete Recurring Event",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ConfirmAction::DeleteEvent { event_text, .. } => {
                format!("Delete \"{}\"?\n\nThis action cannot be undone.", event_text)
            }
            ConfirmAction::DeleteRecurringEvent { event_text, .. } => {
                format!(
                    "\"{}\" repeats every week.\n\nDelete the whole series or only this event?",
                    event_text
                )
            }
        }
    }

    pub fn confirm_text(&self) -> &'static str {
        match self {
            ConfirmAction::DeleteEvent { .. } => "Delete",
            ConfirmAction::DeleteRecurringEvent { .. } => "Delete series",
        }
    }

    /// Label of the secondary confirm button, if the action has one.
    pub fn alternative_text(&self) -> Option<&'static str> {
        match self {
            ConfirmAction::DeleteEvent { .. } => None,
            ConfirmAction::DeleteRecurringEvent { .. } => Some("Only this event"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    Confirmed,
    /// The secondary button was chosen
    ConfirmedAlternative,
    Cancelled,
    /// Dialog is still open
    Pending,
}

#[derive(Debug, Default)]
pub struct ConfirmDialogState {
    pending_action: Option<ConfirmAction>,
}

impl ConfirmDialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, action: ConfirmAction) {
        self.pending_action = Some(action);
    }

    pub fn is_open(&self) -> bool {
        self.pending_action.is_some()
    }

    /// Render the dialog. The action stays pending until `take_action`.
    pub fn render(&mut self, ctx: &Context) -> ConfirmResult {
        let Some(action) = &self.pending_action else {
            return ConfirmResult::Pending;
        };

        let mut result = ConfirmResult::Pending;

        egui::Window::new(action.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(300.0);
                ui.set_max_width(400.0);

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new("⚠").size(24.0).color(egui::Color32::from_rgb(220, 150, 50)));
                    ui.vertical(|ui| {
                        ui.label(action.message());
                    });
                });

                ui.add_space(15.0);
                ui.separator();
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let confirm_button = egui::Button::new(
                            RichText::new(action.confirm_text()).color(egui::Color32::WHITE),
                        )
                        .fill(egui::Color32::from_rgb(180, 60, 60));

                        if ui.add(confirm_button).clicked() {
                            result = ConfirmResult::Confirmed;
                        }

                        if let Some(alternative) = action.alternative_text() {
                            ui.add_space(6.0);
                            if ui.button(alternative).clicked() {
                                result = ConfirmResult::ConfirmedAlternative;
                            }
                        }

                        ui.add_space(10.0);
                        if ui.button("Cancel").clicked() {
                            result = ConfirmResult::Cancelled;
                        }
                    });
                });

                ui.add_space(5.0);
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            result = ConfirmResult::Cancelled;
        }

        if result == ConfirmResult::Cancelled {
            self.pending_action = None;
        }

        result
    }

    pub fn take_action(&mut self) -> Option<ConfirmAction> {
        self.pending_action.take()
    }
}

impl SchedulerApp {
    pub(super) fn handle_confirm_dialog(&mut self, ctx: &Context) {
        let delete_series = match self.confirm_dialog.render(ctx) {
            ConfirmResult::Confirmed => true,
            ConfirmResult::ConfirmedAlternative => false,
            ConfirmResult::Cancelled | ConfirmResult::Pending => return,
        };

        if let Some(action) = self.confirm_dialog.take_action() {
            self.execute_confirmed_action(action, delete_series);
        }
    }

    fn execute_confirmed_action(&mut self, action: ConfirmAction, delete_series: bool) {
        let (event_id, event_text, recurring) = match action {
            ConfirmAction::DeleteEvent { event_id, event_text } => (event_id, event_text, false),
            ConfirmAction::DeleteRecurringEvent { event_id, event_text } => {
                (event_id, event_text, delete_series)
            }
        };

        match self.events.delete_event(event_id, recurring) {
            Ok(()) => {
                log::info!("Deleted event {} (series: {})", event_id, recurring);
                self.toast_manager.success(format!("Deleted \"{}\"", event_text));
                self.events.close_modal();
                self.state.close_dialog();
                if recurring {
                    // Other occurrences in this week are gone on the server too.
                    self.events.reload_current_week();
                }
            }
            Err(e) => {
                log::error!("Failed to delete event {}: {}", event_id, e);
                self.toast_manager.error(format!("Failed to delete event: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurring_delete_offers_single_occurrence() {
        let action = ConfirmAction::DeleteRecurringEvent {
            event_id: 4,
            event_text: "Standup".to_string(),
        };
        assert_eq!(action.confirm_text(), "Delete series");
        assert_eq!(action.alternative_text(), Some("Only this event"));

        let single = ConfirmAction::DeleteEvent {
            event_id: 4,
            event_text: "Standup".to_string(),
        };
        assert_eq!(single.alternative_text(), None);
    }

    #[test]
    fn test_take_action_clears_pending() {
        let mut dialog = ConfirmDialogState::new();
        dialog.request(ConfirmAction::DeleteEvent {
            event_id: 1,
            event_text: "x".to_string(),
        });
        assert!(dialog.is_open());
        assert!(dialog.take_action().is_some());
        assert!(!dialog.is_open());
    }
}
