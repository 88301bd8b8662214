//! Orchestrates loading, editing, moving and deleting events.
//!
//! The manager owns the overlay layer and the event store for the displayed
//! week and talks to the server through [`ScheduleApi`]. Every operation
//! that issues more than one request returns a per-step report.

mod form;

pub use form::{EventForm, FormMode};

use chrono::NaiveDate;
use egui::Pos2;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::event::{EventDto, ViewerContext};
use crate::services::api::{load_events_for_week, week_range, ApiError, ScheduleApi};
use crate::services::event_store::EventStore;
use crate::services::overlay::{OverlayClick, OverlayManager};
use crate::services::schedule::{ScheduleGrid, Week};
use crate::utils::debounce::Debouncer;

/// Delay before overlays follow a changed layout.
pub const LAYOUT_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Error)]
pub enum EventError {
    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Event manager is not initialized")]
    NotReady,

    #[error("No event is open in the editor")]
    NoActiveEvent,

    #[error("Event {0} is not loaded")]
    UnknownEvent(i64),

    #[error("Event {0} belongs to another user")]
    ReadOnly(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Editing(EventForm),
    Viewing(EventDto),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Escape,
    Save,
}

/// Outcome of one save request.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveStep {
    pub date: String,
    pub result: Result<i64, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub steps: Vec<SaveStep>,
}

impl SaveReport {
    pub fn saved_ids(&self) -> Vec<i64> {
        self.steps.iter().filter_map(|s| s.result.as_ref().ok().copied()).collect()
    }

    pub fn failures(&self) -> Vec<&SaveStep> {
        self.steps.iter().filter(|s| s.result.is_err()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveAction {
    /// Save the event at its new slot
    CreateCopy { date: String, time: String },
    DeleteOriginal(i64),
    /// Roll back a copy whose original could not be deleted
    Compensate(i64),
    /// Delete every member of the series `event_id` belongs to
    DeleteSeries { event_id: i64, series_id: Option<String> },
    Regenerate { date: String, time: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveStep {
    pub action: MoveAction,
    /// New event id for saves, `None` for deletes
    pub result: Result<Option<i64>, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveReport {
    pub steps: Vec<MoveStep>,
}

impl MoveReport {
    pub fn is_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.result.is_ok())
    }

    pub fn created_ids(&self) -> Vec<i64> {
        self.steps
            .iter()
            .filter_map(|s| s.result.as_ref().ok().copied().flatten())
            .collect()
    }

    fn push(&mut self, action: MoveAction, result: Result<Option<i64>, String>) {
        self.steps.push(MoveStep { action, result });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerSnapshot {
    pub initialized: bool,
    pub overlay_count: usize,
    pub current_week_start: Option<NaiveDate>,
}

pub struct EventManager<A: ScheduleApi> {
    api: A,
    overlays: OverlayManager,
    store: EventStore,
    state: ManagerState,
    modal: ModalState,
    current_week: Option<Week>,
    grid: ScheduleGrid,
    layout_refresh: Debouncer,
    last_duration: String,
}

impl<A: ScheduleApi> EventManager<A> {
    pub fn new(api: A, viewer: ViewerContext, last_duration: impl Into<String>) -> Self {
        Self {
            api,
            overlays: OverlayManager::new(),
            store: EventStore::new(viewer),
            state: ManagerState::Uninitialized,
            modal: ModalState::Closed,
            current_week: None,
            grid: ScheduleGrid::default(),
            layout_refresh: Debouncer::new(LAYOUT_DEBOUNCE),
            last_duration: last_duration.into(),
        }
    }

    /// Check the server and become ready. An unreachable server is not fatal.
    pub fn init(&mut self) {
        if self.state == ManagerState::Ready {
            return;
        }

        self.state = ManagerState::Initializing;
        if !self.api.check_connection() {
            log::warn!("Server is unreachable, working offline");
        }
        self.state = ManagerState::Ready;
        log::info!("Event manager initialized");
    }

    pub fn is_ready(&self) -> bool {
        self.state == ManagerState::Ready
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    fn ensure_ready(&self, action: &str) -> bool {
        if self.is_ready() {
            true
        } else {
            log::warn!("Event manager is not initialized, ignoring {}", action);
            false
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayManager {
        &mut self.overlays
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    pub fn grid(&self) -> &ScheduleGrid {
        &self.grid
    }

    pub fn viewer(&self) -> ViewerContext {
        self.store.viewer()
    }

    pub fn current_week(&self) -> Option<&Week> {
        self.current_week.as_ref()
    }

    /// Duration last entered in the dialog (`H:MM`).
    pub fn last_duration(&self) -> &str {
        &self.last_duration
    }

    /// Replace overlays with the events of `days`. Returns how many were placed.
    pub fn load_events_for_week(&mut self, days: &[NaiveDate]) -> usize {
        if !self.is_ready() {
            log::warn!("Event manager is not initialized, initializing before load");
            self.init();
        }

        let Some((from, to)) = week_range(days) else {
            log::warn!("No week days given, nothing to load");
            return 0;
        };

        self.overlays.clear_all();

        let events: Vec<EventDto> = load_events_for_week(&self.api, days)
            .iter()
            .map(|raw| self.store.normalize(raw))
            .collect();

        self.store.set_events(events.clone());

        let mut placed = 0;
        for event in events {
            if self.overlays.create_from_data(&self.grid, event).is_some() {
                placed += 1;
            }
        }

        log::info!("Placed {} overlays for {} - {}", placed, from, to);
        placed
    }

    pub fn reload_current_week(&mut self) -> usize {
        match self.current_week.as_ref().map(Week::dates) {
            Some(days) => self.load_events_for_week(&days),
            None => 0,
        }
    }

    /// Show another week. A laid-out grid moves to the new dates first so the
    /// loaded events find their cells.
    pub fn set_current_week(&mut self, week: Week) -> usize {
        let days = week.dates();
        if !self.grid.is_empty() && self.grid.days() != days.as_slice() {
            self.grid = ScheduleGrid::layout(&week, self.grid.hours(), self.grid.metrics());
            self.layout_refresh.cancel();
        }
        self.current_week = Some(week);
        self.load_events_for_week(&days)
    }

    /// Take a new grid layout. A different set of cells is applied at once;
    /// a pure resize waits for the layout debounce.
    pub fn set_grid(&mut self, grid: ScheduleGrid, now: Instant) {
        if grid == self.grid {
            return;
        }

        let same_cells = grid.same_cells(&self.grid);
        self.grid = grid;

        if same_cells {
            self.notify_layout_changed(now);
        } else {
            self.overlays.update_positions(&self.grid);
            self.restore_missing_overlays();
            self.layout_refresh.cancel();
        }
    }

    /// Stored events that gained a visible cell get their overlay back.
    fn restore_missing_overlays(&mut self) {
        let missing: Vec<EventDto> = self
            .store
            .all_events()
            .into_iter()
            .filter(|e| e.id.is_some_and(|id| !self.overlays.exists(id)))
            .filter(|e| OverlayManager::find_cell_for_event(&self.grid, e).is_some())
            .cloned()
            .collect();

        for event in missing {
            self.overlays.create_from_data(&self.grid, event);
        }
    }

    pub fn notify_layout_changed(&mut self, now: Instant) {
        self.layout_refresh.trigger(now);
    }

    /// Apply a pending layout refresh. Returns true when overlays moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.layout_refresh.poll(now) {
            self.overlays.update_positions(&self.grid);
            true
        } else {
            false
        }
    }

    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.layout_refresh.remaining(now)
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal != ModalState::Closed
    }

    pub fn form(&self) -> Option<&EventForm> {
        match &self.modal {
            ModalState::Editing(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut EventForm> {
        match &mut self.modal {
            ModalState::Editing(form) => Some(form),
            _ => None,
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::Closed;
        self.store.set_current_event(None);
    }

    /// Open the editor for a new event in the clicked cell.
    pub fn handle_cell_click(&mut self, date: NaiveDate, hour: u32, target_user_id: Option<i64>) -> bool {
        if !self.ensure_ready("cell click") {
            return false;
        }

        self.store.set_current_event(None);
        self.modal = ModalState::Editing(EventForm::for_cell(
            date,
            hour,
            &self.last_duration,
            target_user_id,
        ));
        true
    }

    /// Editable events open the editor, others the read-only view.
    pub fn handle_overlay_click(&mut self, click: OverlayClick) -> bool {
        if !self.ensure_ready("overlay click") {
            return false;
        }

        let event = click.event;
        self.store.set_current_event(Some(&event));

        if !event.can_edit {
            log::info!("Editing disabled: event {:?} was created by another user", event.id);
            self.modal = ModalState::Viewing(event);
            return true;
        }

        match EventForm::for_event(&event) {
            Some(form) => {
                self.modal = ModalState::Editing(form);
                true
            }
            None => {
                log::warn!("Cannot edit event {:?} with date '{}'", event.id, event.date);
                false
            }
        }
    }

    /// Route a click on the grid. Overlays take precedence over cells.
    pub fn handle_pointer_click(&mut self, pos: Pos2, target_user_id: Option<i64>) -> bool {
        if let Some(click) = self.overlays.click(pos) {
            return self.handle_overlay_click(click);
        }

        let cell = self.grid.cell_at(pos).map(|c| (c.date, c.hour));
        match cell {
            Some((date, hour)) => self.handle_cell_click(date, hour, target_user_id),
            None => false,
        }
    }

    /// Save the open form. Validation errors abort before any request.
    pub fn save(&mut self) -> Result<SaveReport, EventError> {
        if !self.ensure_ready("save") {
            return Err(EventError::NotReady);
        }

        let form = self.form().cloned().ok_or(EventError::NoActiveEvent)?;
        let event = form.to_dto(self.store.viewer());

        let errors = event.validate();
        if !errors.is_empty() {
            return Err(EventError::Validation(errors));
        }

        self.last_duration = form.duration.trim().to_string();

        if !form.selected_days.is_empty() && !form.is_editing() {
            let report = self.save_for_days(&event, &form.target_dates());
            self.close_modal();
            return Ok(report);
        }

        let response = self.api.save_event(&event.to_api_format()).map_err(|e| {
            log::error!("Network error while saving: {}", e);
            EventError::Api(e)
        })?;

        if !response.is_success() {
            let message = response.message.unwrap_or_default();
            log::error!("Save failed: {}", message);
            return Err(EventError::Server(message));
        }

        let series_id = response.series_id.clone();
        let id = response.id.or(event.id).ok_or_else(|| {
            log::error!("Server accepted the event but returned no id");
            EventError::Server("Server returned no event id".to_string())
        })?;

        if let Some(old_id) = form.editing_id() {
            self.overlays.remove(old_id);
            self.store.remove_event(old_id);
        }

        self.place_saved(event.clone(), id, series_id);
        self.close_modal();

        Ok(SaveReport {
            steps: vec![SaveStep {
                date: event.date,
                result: Ok(id),
            }],
        })
    }

    /// One independent create per date; failures do not stop the others.
    fn save_for_days(&mut self, event: &EventDto, dates: &[NaiveDate]) -> SaveReport {
        let mut report = SaveReport::default();

        for date in dates {
            let mut copy = event.clone();
            copy.id = None;
            copy.date = date.format("%Y-%m-%d").to_string();

            let result = match self.api.save_event(&copy.to_api_format()) {
                Ok(response) if response.is_success() => match response.id {
                    Some(id) => {
                        self.place_saved(copy.clone(), id, response.series_id);
                        Ok(id)
                    }
                    None => Err("Server returned no event id".to_string()),
                },
                Ok(response) => Err(response.message.unwrap_or_default()),
                Err(e) => Err(e.to_string()),
            };

            if let Err(message) = &result {
                log::error!("Failed to save event for {}: {}", copy.date, message);
            }

            report.steps.push(SaveStep {
                date: copy.date,
                result,
            });
        }

        report
    }

    /// Register a record the server accepted. A series id from the reply
    /// replaces the local one for recurring events.
    fn place_saved(&mut self, mut event: EventDto, id: i64, series_id: Option<String>) {
        event.id = Some(id);
        event.can_edit = true;
        if event.is_recurring {
            event.series_id = series_id.or(event.series_id);
        } else {
            event.series_id = None;
        }
        self.store.set_event(event.clone());
        self.overlays.create_from_data(&self.grid, event);
    }

    /// Delete the event open in the editor.
    pub fn delete_current(&mut self, delete_recurring: bool) -> Result<i64, EventError> {
        let id = self.form().and_then(EventForm::editing_id).ok_or_else(|| {
            log::error!("No event id to delete");
            EventError::NoActiveEvent
        })?;

        self.delete_event(id, delete_recurring)?;
        Ok(id)
    }

    /// Single request; only the overlay of `id` is removed.
    pub fn delete_event(&mut self, id: i64, delete_recurring: bool) -> Result<(), EventError> {
        if !self.ensure_ready("delete") {
            return Err(EventError::NotReady);
        }

        let response = self.api.delete_event(Some(id), delete_recurring).map_err(|e| {
            log::error!("Network error while deleting: {}", e);
            EventError::Api(e)
        })?;

        if !response.is_success() {
            let message = response.message.unwrap_or_default();
            log::error!("Delete failed: {}", message);
            return Err(EventError::Server(message));
        }

        self.overlays.remove(id);
        self.store.remove_event(id);

        if self.form().and_then(EventForm::editing_id) == Some(id) {
            self.close_modal();
        }

        Ok(())
    }

    /// Move an event to another slot.
    ///
    /// Single events are copied to the target and the original deleted; if
    /// that delete fails the copy is deleted again. A recurring series is
    /// deleted and regenerated one member at a time, stopping at the first
    /// failed save.
    pub fn move_event(&mut self, id: i64, date: NaiveDate, hour: u32, minute: u32) -> Result<MoveReport, EventError> {
        if !self.ensure_ready("move") {
            return Err(EventError::NotReady);
        }

        let event = self
            .store
            .get_event(id)
            .or_else(|| self.overlays.find_by_id(id).map(|o| &o.event))
            .cloned()
            .ok_or(EventError::UnknownEvent(id))?;

        if !event.can_edit {
            return Err(EventError::ReadOnly(id));
        }

        let target = event.at_slot(date, hour, minute);
        let errors = target.validate();
        if !errors.is_empty() {
            return Err(EventError::Validation(errors));
        }

        if event.is_recurring {
            self.move_series(&event, date, hour, minute)
        } else {
            Ok(self.move_single(&event, target))
        }
    }

    fn move_single(&mut self, original: &EventDto, target: EventDto) -> MoveReport {
        let mut report = MoveReport::default();
        let Some(original_id) = original.id else {
            return report;
        };

        let mut copy = target;
        copy.id = None;
        let create = MoveAction::CreateCopy {
            date: copy.date.clone(),
            time: copy.time.clone(),
        };

        let new_id = match self.api.save_event(&copy.to_api_format()) {
            Ok(response) if response.is_success() => match response.id {
                Some(id) => id,
                None => {
                    report.push(create, Err("Server returned no event id".to_string()));
                    return report;
                }
            },
            Ok(response) => {
                report.push(create, Err(response.message.unwrap_or_default()));
                return report;
            }
            Err(e) => {
                log::error!("Failed to save moved event: {}", e);
                report.push(create, Err(e.to_string()));
                return report;
            }
        };
        report.push(create, Ok(Some(new_id)));

        let deleted: Result<Option<i64>, String> = match self.api.delete_event(Some(original_id), false) {
            Ok(response) if response.is_success() => Ok(None),
            Ok(response) => Err(response.message.unwrap_or_default()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(message) = deleted {
            log::error!("Failed to delete original event {}: {}", original_id, message);
            report.push(MoveAction::DeleteOriginal(original_id), Err(message));

            let rollback = match self.api.delete_event(Some(new_id), false) {
                Ok(response) if response.is_success() => Ok(None),
                Ok(response) => Err(response.message.unwrap_or_default()),
                Err(e) => Err(e.to_string()),
            };
            if let Err(message) = &rollback {
                log::error!("Compensating delete of event {} failed: {}", new_id, message);
            }
            report.push(MoveAction::Compensate(new_id), rollback);
            return report;
        }
        report.push(MoveAction::DeleteOriginal(original_id), Ok(None));

        self.overlays.remove(original_id);
        self.store.remove_event(original_id);
        self.place_saved(copy, new_id, None);

        report
    }

    fn move_series(&mut self, event: &EventDto, date: NaiveDate, hour: u32, minute: u32) -> Result<MoveReport, EventError> {
        let event_id = event.id.ok_or(EventError::NoActiveEvent)?;
        let origin = event.parsed_date().ok_or_else(|| {
            EventError::Validation(vec![format!("Invalid event date '{}'", event.date)])
        })?;
        let offset = date - origin;

        // Without a known series only the dragged member can be regenerated.
        let mut members: Vec<EventDto> = match event.series_id.as_deref() {
            Some(series_id) => self
                .store
                .events_by_series(series_id)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        if !members.iter().any(|m| m.id == event.id) {
            members.push(event.clone());
        }

        let mut report = MoveReport::default();
        let delete = MoveAction::DeleteSeries {
            event_id,
            series_id: event.series_id.clone(),
        };

        let deleted: Result<Option<i64>, String> = match self.api.delete_event(Some(event_id), true) {
            Ok(response) if response.is_success() => Ok(None),
            Ok(response) => Err(response.message.unwrap_or_default()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(message) = deleted {
            log::error!("Failed to delete series of event {}: {}", event_id, message);
            report.push(delete, Err(message));
            return Ok(report);
        }
        report.push(delete, Ok(None));

        for member in &members {
            if let Some(member_id) = member.id {
                self.overlays.remove(member_id);
                self.store.remove_event(member_id);
            }
        }

        let mut series_id = event.series_id.clone();
        for member in members {
            let Some(member_date) = member.parsed_date() else {
                log::warn!("Skipping series member with unreadable date '{}'", member.date);
                continue;
            };

            let mut copy = member.at_slot(member_date + offset, hour, minute);
            copy.id = None;
            copy.series_id = series_id.clone();

            let action = MoveAction::Regenerate {
                date: copy.date.clone(),
                time: copy.time.clone(),
            };

            let result = match self.api.save_event(&copy.to_api_format()) {
                Ok(response) if response.is_success() => match response.id {
                    Some(id) => Ok((id, response.series_id)),
                    None => Err("Server returned no event id".to_string()),
                },
                Ok(response) => Err(response.message.unwrap_or_default()),
                Err(e) => Err(e.to_string()),
            };

            match result {
                Ok((new_id, returned_series)) => {
                    if series_id.is_none() {
                        series_id = returned_series.clone();
                    }
                    self.place_saved(copy, new_id, returned_series);
                    report.push(action, Ok(Some(new_id)));
                }
                Err(message) => {
                    log::error!("Regenerating series of event {} stopped at {}: {}", event_id, copy.date, message);
                    report.push(action, Err(message));
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Keyboard shortcuts. Save only acts while the editor is open.
    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> Option<Result<SaveReport, EventError>> {
        match shortcut {
            Shortcut::Escape => {
                if self.is_modal_open() {
                    self.close_modal();
                }
                None
            }
            Shortcut::Save => {
                if self.form().is_some() {
                    Some(self.save())
                } else {
                    None
                }
            }
        }
    }

    pub fn state_snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            initialized: self.is_ready(),
            overlay_count: self.overlays.count(),
            current_week_start: self.current_week.as_ref().map(|w| w.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventColor;
    use crate::services::api::{MockScheduleApi, SaveResponse, StatusResponse};
    use crate::services::schedule::{GridMetrics, ScheduleController};
    use mockall::{predicate, Sequence};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn connected_api() -> MockScheduleApi {
        let mut api = MockScheduleApi::new();
        api.expect_check_connection().returning(|| true);
        api
    }

    fn ready_manager(api: MockScheduleApi) -> EventManager<MockScheduleApi> {
        let controller = ScheduleController::with_default_hours(date(2024, 6, 3));
        let grid = ScheduleGrid::layout(controller.week(), &controller.visible_hours(), GridMetrics::default());

        let mut manager = EventManager::new(api, ViewerContext::new(Some(1)), "1:00");
        manager.set_grid(grid, Instant::now());
        manager.current_week = Some(controller.week().clone());
        manager.init();
        manager
    }

    fn raw_event(id: i64, date: &str, time: &str) -> serde_json::Value {
        json!({"id": id, "date": date, "time": time, "duration": 1, "created_by": 1})
    }

    #[test]
    fn test_save_new_event_creates_overlay() {
        let mut api = connected_api();
        api.expect_save_event()
            .withf(|payload| {
                payload.id.is_none()
                    && payload.date == "2024-06-03"
                    && payload.time == "09:15"
                    && payload.duration == 1.5
                    && payload.color == EventColor::Green
            })
            .times(1)
            .returning(|_| Ok(SaveResponse::success(42)));

        let mut manager = ready_manager(api);
        assert!(manager.handle_cell_click(date(2024, 6, 3), 9, None));
        {
            let form = manager.form_mut().unwrap();
            form.start_minutes = "15".to_string();
            form.duration = "1:30".to_string();
            form.color = EventColor::Green;
        }

        let report = manager.save().unwrap();
        assert_eq!(report.saved_ids(), vec![42]);
        assert_eq!(manager.overlays().count(), 1);
        assert!(!manager.is_modal_open());
        assert_eq!(manager.last_duration(), "1:30");

        let cell = manager.grid().cell_rect(date(2024, 6, 3), 9).unwrap();
        let overlay = manager.overlays().find_by_id(42).unwrap();
        assert_eq!(overlay.rect.top(), cell.top() + cell.height() / 4.0);
        assert_eq!(overlay.rect.left(), cell.left());
        assert_eq!(overlay.rect.height(), cell.height() * 1.5);
        assert!(manager.store().get_event(42).is_some());
    }

    #[test]
    fn test_validation_error_makes_no_request() {
        let mut api = connected_api();
        api.expect_save_event().times(0);

        let mut manager = ready_manager(api);
        manager.handle_cell_click(date(2024, 6, 3), 9, None);
        manager.form_mut().unwrap().start_minutes = "58".to_string();

        let result = manager.save();
        assert!(matches!(result, Err(EventError::Validation(ref errors)) if errors.len() == 1));
        assert!(manager.is_modal_open());
        assert_eq!(manager.last_duration(), "1:00");
    }

    #[test]
    fn test_server_error_leaves_state_unchanged() {
        let mut api = connected_api();
        api.expect_save_event()
            .returning(|_| Ok(SaveResponse::error("Slot is taken")));

        let mut manager = ready_manager(api);
        manager.handle_cell_click(date(2024, 6, 3), 9, None);

        let result = manager.save();
        assert!(matches!(result, Err(EventError::Server(ref m)) if m == "Slot is taken"));
        assert_eq!(manager.overlays().count(), 0);
        assert!(manager.is_modal_open());
    }

    #[test]
    fn test_edit_replaces_old_overlay() {
        let mut api = connected_api();
        api.expect_load_events()
            .returning(|_, _| vec![raw_event(7, "2024-06-04", "10:00")]);
        api.expect_save_event()
            .withf(|payload| payload.id == Some(7) && payload.text == "updated")
            .times(1)
            .returning(|_| Ok(SaveResponse::success(7)));

        let mut manager = ready_manager(api);
        manager.reload_current_week();

        let rect = manager.overlays().find_by_id(7).unwrap().rect;
        assert!(manager.handle_pointer_click(rect.center(), None));
        manager.form_mut().unwrap().text = "updated".to_string();
        manager.save().unwrap();

        assert_eq!(manager.overlays().count(), 1);
        assert_eq!(manager.overlays().find_by_id(7).unwrap().event.text, "updated");
    }

    #[test]
    fn test_multi_day_save_keeps_partial_success() {
        let mut api = connected_api();
        let mut seq = Sequence::new();
        api.expect_save_event()
            .withf(|p| p.date == "2024-06-03")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(10)));
        api.expect_save_event()
            .withf(|p| p.date == "2024-06-05")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ApiError::Status(500)));
        api.expect_save_event()
            .withf(|p| p.date == "2024-06-07" && p.id.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(12)));

        let mut manager = ready_manager(api);
        manager.handle_cell_click(date(2024, 6, 4), 8, None);
        {
            let form = manager.form_mut().unwrap();
            form.toggle_day(chrono::Weekday::Mon);
            form.toggle_day(chrono::Weekday::Wed);
            form.toggle_day(chrono::Weekday::Fri);
        }

        let report = manager.save().unwrap();
        assert_eq!(report.saved_ids(), vec![10, 12]);
        assert_eq!(report.failures().len(), 1);
        assert!(!report.is_complete());
        assert_eq!(manager.overlays().count(), 2);
    }

    #[test]
    fn test_delete_recurring_removes_only_that_overlay() {
        let mut api = connected_api();
        api.expect_load_events().returning(|_, _| {
            vec![
                json!({"id": 1, "date": "2024-06-03", "time": "09:00", "is_recurring": true, "series_id": "s", "created_by": 1}),
                json!({"id": 2, "date": "2024-06-04", "time": "09:00", "is_recurring": true, "series_id": "s", "created_by": 1}),
                raw_event(3, "2024-06-05", "12:00"),
            ]
        });
        api.expect_delete_event()
            .with(predicate::eq(Some(1)), predicate::eq(true))
            .times(1)
            .returning(|_, _| Ok(StatusResponse::success()));

        let mut manager = ready_manager(api);
        assert_eq!(manager.reload_current_week(), 3);

        manager.delete_event(1, true).unwrap();
        assert!(!manager.overlays().exists(1));
        assert!(manager.overlays().exists(2));
        assert!(manager.overlays().exists(3));
    }

    #[test]
    fn test_move_single_saves_then_deletes() {
        let mut api = connected_api();
        let mut seq = Sequence::new();
        api.expect_load_events()
            .returning(|_, _| vec![raw_event(5, "2024-06-03", "09:00")]);
        api.expect_save_event()
            .withf(|p| p.id.is_none() && p.date == "2024-06-04" && p.time == "11:00")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(6)));
        api.expect_delete_event()
            .with(predicate::eq(Some(5)), predicate::eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(StatusResponse::success()));

        let mut manager = ready_manager(api);
        manager.reload_current_week();

        let report = manager.move_event(5, date(2024, 6, 4), 11, 0).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.steps.len(), 2);
        assert!(!manager.overlays().exists(5));
        assert_eq!(manager.overlays().find_by_id(6).unwrap().event.date, "2024-06-04");
    }

    #[test]
    fn test_move_single_compensates_failed_delete() {
        let mut api = connected_api();
        let mut seq = Sequence::new();
        api.expect_load_events()
            .returning(|_, _| vec![raw_event(5, "2024-06-03", "09:00")]);
        api.expect_save_event()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(6)));
        api.expect_delete_event()
            .with(predicate::eq(Some(5)), predicate::eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ApiError::Status(500)));
        api.expect_delete_event()
            .with(predicate::eq(Some(6)), predicate::eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(StatusResponse::success()));

        let mut manager = ready_manager(api);
        manager.reload_current_week();

        let report = manager.move_event(5, date(2024, 6, 4), 11, 0).unwrap();
        assert!(!report.is_complete());
        assert_eq!(
            report.steps.last().unwrap(),
            &MoveStep {
                action: MoveAction::Compensate(6),
                result: Ok(None),
            }
        );
        assert!(manager.overlays().exists(5));
        assert!(!manager.overlays().exists(6));
    }

    #[test]
    fn test_move_series_regenerates_members_until_failure() {
        let mut api = connected_api();
        let mut seq = Sequence::new();
        api.expect_load_events().returning(|_, _| {
            vec![
                json!({"id": 1, "date": "2024-06-03", "time": "09:00", "is_recurring": true, "series_id": "s", "created_by": 1}),
                json!({"id": 2, "date": "2024-06-05", "time": "09:00", "is_recurring": true, "series_id": "s", "created_by": 1}),
                json!({"id": 3, "date": "2024-06-07", "time": "09:00", "is_recurring": true, "series_id": "s", "created_by": 1}),
            ]
        });
        api.expect_delete_event()
            .with(predicate::eq(Some(1)), predicate::eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(StatusResponse::success()));
        api.expect_save_event()
            .withf(|p| p.date == "2024-06-04" && p.time == "10:30" && p.series_id.as_deref() == Some("s"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(11)));
        api.expect_save_event()
            .withf(|p| p.date == "2024-06-06")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::error("conflict")));

        let mut manager = ready_manager(api);
        manager.reload_current_week();

        let report = manager.move_event(1, date(2024, 6, 4), 10, 30).unwrap();
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.created_ids(), vec![11]);
        assert!(!report.is_complete());
        assert_eq!(manager.overlays().count(), 1);
        assert!(manager.overlays().exists(11));
    }

    #[test]
    fn test_move_fresh_recurring_event_moves_whole_series() {
        let mut api = connected_api();
        let mut seq = Sequence::new();
        api.expect_save_event()
            .withf(|p| p.id.is_none() && p.is_recurring && p.date == "2024-06-03")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(42)));
        api.expect_delete_event()
            .with(predicate::eq(Some(42)), predicate::eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(StatusResponse::success()));
        api.expect_save_event()
            .withf(|p| p.id.is_none() && p.is_recurring && p.date == "2024-06-04" && p.time == "11:00")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(43).with_series("fresh")));

        let mut manager = ready_manager(api);
        manager.handle_cell_click(date(2024, 6, 3), 9, None);
        manager.form_mut().unwrap().is_recurring = true;
        manager.save().unwrap();
        assert_eq!(manager.store().get_event(42).unwrap().series_id, None);

        let report = manager.move_event(42, date(2024, 6, 4), 11, 0).unwrap();
        assert!(report.is_complete());
        assert_eq!(
            report.steps[0].action,
            MoveAction::DeleteSeries {
                event_id: 42,
                series_id: None
            }
        );
        assert!(!manager.overlays().exists(42));
        assert_eq!(manager.store().get_event(43).unwrap().series_id.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_saved_series_id_is_used_when_moving() {
        let mut api = connected_api();
        let mut seq = Sequence::new();
        api.expect_save_event()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(42).with_series("abc")));
        api.expect_delete_event()
            .with(predicate::eq(Some(42)), predicate::eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(StatusResponse::success()));
        api.expect_save_event()
            .withf(|p| p.date == "2024-06-05" && p.series_id.as_deref() == Some("abc"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SaveResponse::success(50)));

        let mut manager = ready_manager(api);
        manager.handle_cell_click(date(2024, 6, 3), 9, None);
        manager.form_mut().unwrap().is_recurring = true;
        manager.save().unwrap();

        let stored = manager.store().get_event(42).unwrap();
        assert_eq!(stored.series_id.as_deref(), Some("abc"));

        let report = manager.move_event(42, date(2024, 6, 5), 9, 0).unwrap();
        assert_eq!(report.created_ids(), vec![50]);
        assert_eq!(manager.store().get_event(50).unwrap().series_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_week_has_no_overlays() {
        let mut api = connected_api();
        api.expect_load_events().times(1).returning(|_, _| Vec::new());

        let mut manager = ready_manager(api);
        assert_eq!(manager.reload_current_week(), 0);
        assert_eq!(manager.overlays().count(), 0);
    }

    #[test]
    fn test_events_outside_grid_are_skipped() {
        let mut api = connected_api();
        api.expect_load_events().returning(|_, _| {
            vec![
                raw_event(1, "2024-06-03", "09:00"),
                raw_event(2, "2024-06-03", "23:00"),
            ]
        });

        let mut manager = ready_manager(api);
        assert_eq!(manager.reload_current_week(), 1);
        assert_eq!(manager.store().len(), 2);
    }

    #[test]
    fn test_foreign_event_opens_view_modal() {
        let mut api = connected_api();
        api.expect_load_events().returning(|_, _| {
            vec![json!({"id": 9, "date": "2024-06-03", "time": "09:00", "created_by": 2})]
        });

        let mut manager = ready_manager(api);
        manager.reload_current_week();

        let rect = manager.overlays().find_by_id(9).unwrap().rect;
        manager.handle_pointer_click(rect.center(), None);
        assert!(matches!(manager.modal(), ModalState::Viewing(event) if event.id == Some(9)));
        assert!(matches!(manager.move_event(9, date(2024, 6, 4), 9, 0), Err(EventError::ReadOnly(9))));
    }

    #[test]
    fn test_clicks_ignored_before_init() {
        let api = MockScheduleApi::new();
        let mut manager = EventManager::new(api, ViewerContext::new(Some(1)), "1:00");
        assert!(!manager.handle_cell_click(date(2024, 6, 3), 9, None));
        assert!(!manager.is_modal_open());
    }

    #[test]
    fn test_unreachable_server_still_initializes() {
        let mut api = MockScheduleApi::new();
        api.expect_check_connection().times(1).returning(|| false);

        let mut manager = EventManager::new(api, ViewerContext::new(Some(1)), "1:00");
        manager.init();
        manager.init();
        assert!(manager.state_snapshot().initialized);
        assert_eq!(manager.viewer(), ViewerContext::new(Some(1)));
    }

    #[test]
    fn test_shortcuts() {
        let mut api = connected_api();
        api.expect_save_event().times(0);

        let mut manager = ready_manager(api);
        assert!(manager.handle_shortcut(Shortcut::Save).is_none());

        manager.handle_cell_click(date(2024, 6, 3), 9, None);
        manager.handle_shortcut(Shortcut::Escape);
        assert!(!manager.is_modal_open());
    }

    #[test]
    fn test_layout_refresh_is_debounced() {
        let api = connected_api();
        let mut manager = ready_manager(api);
        let start = Instant::now();

        let week = manager.current_week().unwrap().clone();
        let hours: Vec<u32> = manager.grid().hours().to_vec();
        let wider = ScheduleGrid::layout(&week, &hours, GridMetrics::fit_width(2000.0, false));

        manager.set_grid(wider, start);
        assert!(!manager.tick(start + Duration::from_millis(100)));
        assert!(manager.tick(start + LAYOUT_DEBOUNCE));
        assert!(!manager.tick(start + LAYOUT_DEBOUNCE * 2));
    }

    #[test]
    fn test_set_current_week_reloads() {
        let mut api = connected_api();
        api.expect_load_events()
            .with(predicate::eq(date(2024, 6, 10)), predicate::eq(date(2024, 6, 16)))
            .times(1)
            .returning(|_, _| Vec::new());

        let mut manager = ready_manager(api);
        manager.set_current_week(Week::containing(date(2024, 6, 12)));
        assert_eq!(manager.state_snapshot().current_week_start, Some(date(2024, 6, 10)));
    }

    #[test]
    fn test_week_change_places_overlays_on_new_dates() {
        let mut api = connected_api();
        api.expect_load_events()
            .returning(|_, _| vec![raw_event(8, "2024-06-12", "10:15"), raw_event(9, "2024-06-16", "08:00")]);

        let mut manager = ready_manager(api);
        let metrics = manager.grid().metrics();

        assert_eq!(manager.set_current_week(Week::containing(date(2024, 6, 12))), 2);
        assert_eq!(manager.grid().days().first(), Some(&date(2024, 6, 10)));
        assert_eq!(manager.grid().metrics(), metrics);

        let cell = manager.grid().cell_rect(date(2024, 6, 12), 10).unwrap();
        let overlay = manager.overlays().find_by_id(8).unwrap();
        assert_eq!(overlay.rect.top(), cell.top() + cell.height() / 4.0);
    }
}
