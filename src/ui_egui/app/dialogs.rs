use super::confirm::ConfirmAction;
use super::SchedulerApp;
use crate::services::event_manager::{EventError, ModalState, SaveReport};
use crate::ui_egui::event_dialog::{render_event_dialog, render_event_view, EventDialogAction};

impl SchedulerApp {
    pub(super) fn handle_dialogs(&mut self, ctx: &egui::Context) {
        let action = match self.events.modal() {
            ModalState::Closed => return,
            ModalState::Viewing(event) => {
                if render_event_view(ctx, event) {
                    self.events.close_modal();
                }
                return;
            }
            ModalState::Editing(_) => {
                let error = self.state.dialog_error.clone();
                let Some(form) = self.events.form_mut() else {
                    return;
                };
                let before = form.clone();
                let action = render_event_dialog(ctx, form, &mut self.state.show_days_popup, error.as_deref());
                if *form != before {
                    self.state.dialog_error = None;
                }
                action
            }
        };

        match action {
            EventDialogAction::None => {}
            EventDialogAction::Save => self.save_event(),
            EventDialogAction::Delete => self.request_delete(),
            EventDialogAction::Close => {
                self.events.close_modal();
                self.state.close_dialog();
            }
        }
    }

    pub(super) fn save_event(&mut self) {
        let result = self.events.save();
        self.report_save(result);
    }

    /// Toast the outcome; failures keep the dialog open with the message.
    pub(super) fn report_save(&mut self, result: Result<SaveReport, EventError>) {
        match result {
            Ok(report) if report.is_complete() => {
                let saved = report.saved_ids().len();
                if saved > 1 {
                    self.toast_manager.success(format!("Saved {} events", saved));
                } else {
                    self.toast_manager.success("Event saved");
                }
                self.remember_duration();
                self.state.close_dialog();
            }
            Ok(report) => {
                let failed: Vec<String> = report
                    .failures()
                    .iter()
                    .map(|step| step.date.clone())
                    .collect();
                self.toast_manager.warning(format!(
                    "Saved {} of {} events, failed: {}",
                    report.saved_ids().len(),
                    report.steps.len(),
                    failed.join(", ")
                ));
                self.remember_duration();
                self.state.close_dialog();
            }
            Err(EventError::Validation(errors)) => {
                self.state.dialog_error = Some(errors.join("\n"));
            }
            Err(e) => {
                log::error!("Failed to save event: {}", e);
                self.state.dialog_error = Some(e.to_string());
                self.toast_manager.error(format!("Failed to save event: {}", e));
            }
        }
    }

    fn request_delete(&mut self) {
        let Some(original) = self.events.form().and_then(|form| form.original()) else {
            return;
        };
        let Some(event_id) = original.id else {
            return;
        };

        let event_text = if original.text.trim().is_empty() {
            original.time.clone()
        } else {
            original.text.clone()
        };

        self.confirm_dialog.request(if original.is_recurring {
            ConfirmAction::DeleteRecurringEvent { event_id, event_text }
        } else {
            ConfirmAction::DeleteEvent { event_id, event_text }
        });
    }

    fn remember_duration(&mut self) {
        let duration = self.events.last_duration().to_string();
        if self.prefs.last_duration != duration {
            self.prefs.last_duration = duration;
            self.save_prefs();
        }
    }
}
