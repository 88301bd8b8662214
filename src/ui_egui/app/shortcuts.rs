use super::SchedulerApp;
use crate::services::event_manager::Shortcut;
use crate::ui_egui::drag::DragManager;

impl SchedulerApp {
    pub(super) fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        // The confirm dialog handles its own Escape.
        if self.confirm_dialog.is_open() {
            return;
        }

        let (escape, save, left, right, today) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.modifiers.command && i.key_pressed(egui::Key::T),
            )
        });

        if escape {
            if DragManager::is_active(ctx) {
                DragManager::cancel(ctx);
            } else {
                self.events.handle_shortcut(Shortcut::Escape);
                self.state.close_dialog();
            }
        }

        if save {
            if let Some(result) = self.events.handle_shortcut(Shortcut::Save) {
                self.report_save(result);
            }
        }

        // Arrow keys edit text while a dialog is open.
        if self.events.is_modal_open() || ctx.wants_keyboard_input() {
            return;
        }

        if left {
            self.navigate_previous();
        }
        if right {
            self.navigate_next();
        }
        if today {
            self.jump_to_today();
        }
    }
}
