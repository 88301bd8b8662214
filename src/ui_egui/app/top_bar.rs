use super::SchedulerApp;
use crate::models::user::UserSelection;
use egui::RichText;

impl SchedulerApp {
    pub(super) fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("week_navigation").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("◀").on_hover_text("Previous week").clicked() {
                    self.navigate_previous();
                }
                if ui.button("Today").clicked() {
                    self.jump_to_today();
                }
                if ui.button("▶").on_hover_text("Next week").clicked() {
                    self.navigate_next();
                }

                ui.separator();
                ui.label(RichText::new(self.controller.week_range_label()).strong());
                ui.separator();

                if ui.button(self.controller.toggle_hours_label()).clicked() {
                    self.toggle_hours();
                }

                let mut expanded = self.prefs.mobile_view_expanded;
                if ui.checkbox(&mut expanded, "Wide columns").changed() {
                    self.prefs.mobile_view_expanded = expanded;
                    self.save_prefs();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let reload_hint = format!("Reload week from {}", self.settings.server_url);
                    if ui.button("⟳").on_hover_text(reload_hint).clicked() {
                        self.reload_week();
                    }
                    self.render_user_picker(ui);
                });
            });
        });
    }

    fn render_user_picker(&mut self, ui: &mut egui::Ui) {
        if self.state.users_unavailable {
            return;
        }

        let current = self.users.selection();
        let mut selected = current;

        egui::ComboBox::from_id_source("user_picker")
            .selected_text(self.users.label_for(current))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, UserSelection::SelfView, self.users.label_for(UserSelection::SelfView));
                for user in self.users.users() {
                    ui.selectable_value(&mut selected, UserSelection::User(user.id), user.username.as_str());
                }
            });

        if let Some(info) = self.users.current_user_info() {
            ui.label(RichText::new(info).weak());
        }

        if selected != current {
            self.switch_user(selected);
        }
    }

    pub(super) fn switch_user(&mut self, selection: UserSelection) {
        match self.users.switch(self.events.api(), selection) {
            Ok(changed) => {
                self.prefs.selected_user_id = changed.selection;
                self.save_prefs();
                self.reload_week();
                self.toast_manager
                    .info(changed.message.unwrap_or_else(|| self.users.label_for(changed.selection)));
            }
            Err(e) => {
                log::error!("Failed to switch to {}: {}", selection, e);
                self.toast_manager.error(format!("Could not switch user: {}", e));
            }
        }
    }
}
