use super::SchedulerApp;

impl SchedulerApp {
    pub(super) fn navigate_previous(&mut self) {
        self.controller.prev_week();
        self.reload_week();
    }

    pub(super) fn navigate_next(&mut self) {
        self.controller.next_week();
        self.reload_week();
    }

    pub(super) fn jump_to_today(&mut self) {
        self.controller.set_today(chrono::Local::now().date_naive());
        self.controller.go_to_today();
        self.reload_week();
    }

    pub(super) fn toggle_hours(&mut self) {
        self.controller.toggle_hours();
        // Overlays follow on the next frame when the grid is laid out again.
        self.timeline.invalidate();
    }

    /// Fetch the displayed week again, e.g. after switching user.
    pub(super) fn reload_week(&mut self) {
        let week = self.controller.week().clone();
        let placed = self.events.set_current_week(week);
        log::debug!("Week {} loaded, {} overlays placed", self.controller.week_range_label(), placed);
        self.timeline.invalidate();
    }
}
