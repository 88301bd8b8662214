mod confirm;
mod dialogs;
mod lifecycle;
mod navigation;
mod shortcuts;
mod state;
mod toast;
mod top_bar;

use self::confirm::ConfirmDialogState;
use self::state::AppState;
use self::toast::ToastManager;
use crate::models::settings::{ClientPrefs, Settings};
use crate::services::api::ApiClient;
use crate::services::event_manager::EventManager;
use crate::services::schedule::ScheduleController;
use crate::services::settings::SettingsService;
use crate::services::timeline::TimelineManager;
use crate::services::users::UserManager;

pub struct SchedulerApp {
    settings_service: SettingsService,
    /// Server and hour window, read once at startup
    settings: Settings,
    /// Persisted UI choices, written on change and on exit
    prefs: ClientPrefs,
    controller: ScheduleController,
    events: EventManager<ApiClient>,
    users: UserManager,
    timeline: TimelineManager,
    state: AppState,
    toast_manager: ToastManager,
    confirm_dialog: ConfirmDialogState,
}

impl eframe::App for SchedulerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.handle_update(ctx, frame);
    }

    fn on_exit(&mut self, gl: Option<&eframe::glow::Context>) {
        self.handle_exit(gl);
    }
}
