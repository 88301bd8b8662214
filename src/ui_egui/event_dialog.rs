use chrono::Weekday;
use egui::{Color32, RichText};

use crate::models::event::{EventColor, EventDto};
use crate::services::event_manager::EventForm;
use crate::ui_egui::views::EventPalette;
use crate::utils::date::day_short_name;

const FORM_LABEL_WIDTH: f32 = 90.0;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventDialogAction {
    #[default]
    None,
    Save,
    Delete,
    Close,
}

/// Editor window for a new or existing event.
pub fn render_event_dialog(
    ctx: &egui::Context,
    form: &mut EventForm,
    show_days: &mut bool,
    error_message: Option<&str>,
) -> EventDialogAction {
    let mut action = EventDialogAction::None;
    let mut dialog_open = true;

    egui::Window::new(if form.is_editing() { "Edit Event" } else { "New Event" })
        .open(&mut dialog_open)
        .collapsible(false)
        .resizable(false)
        .default_width(360.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(form.time_info()).strong());
            ui.add_space(8.0);

            ui.add(
                egui::TextEdit::multiline(&mut form.text)
                    .hint_text("What is happening?")
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
            ui.add_space(6.0);

            labeled_row(ui, "Start minute", |ui| {
                ui.add(egui::TextEdit::singleline(&mut form.start_minutes).desired_width(40.0));
                ui.label(RichText::new(form.time()).weak());
            });

            labeled_row(ui, "Duration", |ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut form.duration)
                        .hint_text("H:MM")
                        .desired_width(60.0),
                );
            });
            if let Some(duration_error) = form.duration_error() {
                ui.label(RichText::new(duration_error).color(Color32::from_rgb(200, 60, 60)).small());
            }

            labeled_row(ui, "Color", |ui| {
                let is_dark = ui.visuals().dark_mode;
                for color in EventColor::ALL {
                    let swatch = EventPalette::for_color(color, is_dark).fill;
                    ui.radio_value(
                        &mut form.color,
                        color,
                        RichText::new(color.label()).color(swatch).strong(),
                    );
                }
            });

            ui.checkbox(&mut form.is_recurring, "Repeat weekly");

            if !form.is_editing() {
                if ui.button(form.days_button_label()).clicked() {
                    *show_days = !*show_days;
                }
            }

            if let Some(message) = error_message {
                ui.add_space(6.0);
                ui.label(RichText::new(message).color(Color32::from_rgb(200, 60, 60)));
            }

            ui.add_space(10.0);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    action = EventDialogAction::Save;
                }
                if ui.button("Cancel").clicked() {
                    action = EventDialogAction::Close;
                }
                if form.is_editing() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE))
                            .fill(Color32::from_rgb(180, 60, 60));
                        if ui.add(delete).clicked() {
                            action = EventDialogAction::Delete;
                        }
                    });
                }
            });
        });

    if *show_days && !form.is_editing() {
        render_days_popup(ctx, form, show_days);
    }

    if !dialog_open {
        action = EventDialogAction::Close;
    }
    action
}

/// Weekday picker for saving one copy per selected day.
fn render_days_popup(ctx: &egui::Context, form: &mut EventForm, show_days: &mut bool) {
    let mut open = true;
    egui::Window::new("Days")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            for day in WEEKDAYS {
                let mut selected = form.is_day_selected(day);
                if ui.checkbox(&mut selected, day_short_name(day)).changed() {
                    form.toggle_day(day);
                }
            }
            ui.separator();
            if ui.button("Done").clicked() {
                *show_days = false;
            }
        });

    if !open {
        *show_days = false;
    }
}

/// Read-only card for events owned by someone else. Returns true when closed.
pub fn render_event_view(ctx: &egui::Context, event: &EventDto) -> bool {
    let mut open = true;
    let mut close = false;

    egui::Window::new("Event")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(format!("{} {}", event.date, event.time)).strong());
            ui.add_space(6.0);
            ui.label(event.text.as_str());
            ui.add_space(6.0);
            ui.label(RichText::new("Created by another user, editing is disabled.").weak().small());
            ui.separator();
            if ui.button("Close").clicked() {
                close = true;
            }
        });

    close || !open
}

fn labeled_row(ui: &mut egui::Ui, label: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.horizontal(|ui| {
        ui.add_sized([FORM_LABEL_WIDTH, 20.0], egui::Label::new(label));
        add_contents(ui);
    });
}
