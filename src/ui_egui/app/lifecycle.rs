use super::confirm::ConfirmDialogState;
use super::state::AppState;
use super::toast::ToastManager;
use super::SchedulerApp;
use crate::models::event::ViewerContext;
use crate::models::settings::Settings;
use crate::models::user::UserSelection;
use crate::services::api::{ApiClient, ApiError};
use crate::services::event_manager::{EventError, EventManager, MoveReport};
use crate::services::schedule::ScheduleController;
use crate::services::settings::SettingsService;
use crate::services::timeline::TimelineManager;
use crate::services::users::UserManager;
use crate::ui_egui::views::week_view::WeekView;
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;

impl SchedulerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Result<Self, ApiError> {
        let settings_service = resolve_settings_service();
        let settings = load_settings_or_default(&settings_service);
        let prefs = settings_service.load_prefs();
        log::info!(
            "Using server {} with hours {}-{}",
            settings.server_url,
            settings.min_hour,
            settings.max_hour
        );

        let api = ApiClient::new(&settings)?;
        let viewer = ViewerContext::new(settings.user_id);
        let mut events = EventManager::new(api, viewer, prefs.last_duration.clone());
        events.init();

        let controller = ScheduleController::new(Local::now().date_naive(), settings.min_hour, settings.max_hour);
        let mut timeline = TimelineManager::new();
        timeline.init();

        let mut app = Self {
            settings_service,
            settings,
            prefs,
            controller,
            events,
            users: UserManager::default(),
            timeline,
            state: AppState::new(),
            toast_manager: ToastManager::new(),
            confirm_dialog: ConfirmDialogState::new(),
        };

        app.load_users();
        app.reload_week();
        Ok(app)
    }

    /// List users and restore the persisted selection.
    fn load_users(&mut self) {
        if self.users.load_users(self.events.api()).is_err() {
            self.state.users_unavailable = true;
            return;
        }

        let saved = self.prefs.selected_user_id;
        if saved == UserSelection::SelfView {
            return;
        }

        let known = saved
            .user_id()
            .is_some_and(|id| self.users.users().iter().any(|u| u.id == id));
        if !known {
            log::warn!("Saved user selection {} is not available, showing own schedule", saved);
            self.prefs.selected_user_id = UserSelection::SelfView;
            return;
        }

        if let Err(e) = self.users.switch(self.events.api(), saved) {
            log::warn!("Could not restore user selection {}: {}", saved, e);
            self.prefs.selected_user_id = UserSelection::SelfView;
        }
    }

    pub(super) fn save_prefs(&mut self) {
        if let Err(e) = self.settings_service.save_prefs(&self.prefs) {
            log::error!("Failed to save preferences: {}", e);
        }
    }

    pub(super) fn handle_update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.handle_keyboard_shortcuts(ctx);

        let today = Local::now().date_naive();
        if today != self.controller.today() {
            self.controller.set_today(today);
            self.timeline.invalidate();
        }

        self.render_top_bar(ctx);

        let target_user_id = self.users.target_user_id();
        let outcome = egui::CentralPanel::default()
            .show(ctx, |ui| {
                WeekView::show(
                    ui,
                    &self.controller,
                    &mut self.events,
                    &mut self.timeline,
                    target_user_id,
                    self.prefs.mobile_view_expanded,
                )
            })
            .inner;

        if let Some(result) = outcome.move_result {
            self.report_move(result);
        }

        self.handle_dialogs(ctx);
        self.handle_confirm_dialog(ctx);

        if self.events.tick(now) {
            ctx.request_repaint();
        }

        // Render toasts last so they appear on top.
        self.toast_manager.render(ctx, ctx.style().visuals.dark_mode);

        let wakeup = self
            .events
            .next_wakeup(now)
            .map_or(self.timeline.next_wakeup(now), |d| d.min(self.timeline.next_wakeup(now)));
        ctx.request_repaint_after(wakeup);
    }

    fn report_move(&mut self, result: Result<MoveReport, EventError>) {
        match result {
            Ok(report) if report.is_complete() => {
                self.toast_manager.success("Event moved");
            }
            Ok(report) => {
                let reason = report
                    .steps
                    .iter()
                    .find_map(|step| step.result.as_ref().err().cloned())
                    .unwrap_or_default();
                self.toast_manager.error(format!("Move incomplete: {}", reason));
                self.reload_week();
            }
            Err(e) => {
                log::error!("Failed to move event: {}", e);
                self.toast_manager.error(format!("Failed to move event: {}", e));
            }
        }
    }

    pub(super) fn handle_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.timeline.destroy();
        self.save_prefs();
        log::info!("Week scheduler closed");
    }
}

fn resolve_settings_service() -> SettingsService {
    match SettingsService::from_project_dirs() {
        Ok(service) => service,
        Err(e) => {
            log::warn!("No config directory ({}), using working directory", e);
            SettingsService::new(PathBuf::from("."))
        }
    }
}

fn load_settings_or_default(settings_service: &SettingsService) -> Settings {
    match settings_service.get() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Failed to load settings: {}. Using defaults.", err);
            Settings::default()
        }
    }
}
