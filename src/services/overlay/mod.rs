//! Positioned event boxes on top of the week grid.
//!
//! Each overlay keeps a copy of its event so clicks can be routed without
//! going back to the store.

use chrono::NaiveDate;
use egui::{pos2, vec2, Pos2, Rect};
use std::collections::HashMap;

use crate::models::event::EventDto;
use crate::services::schedule::{GridCell, ScheduleGrid};

/// Share of the cell width an overlay occupies.
pub const OVERLAY_WIDTH_RATIO: f32 = 0.9;
/// Events shorter than this (hours) are drawn compact.
pub const SHORT_EVENT_HOURS: f64 = 1.5;

/// Box of an event starting `minutes` into `cell` and lasting `duration` hours.
pub fn calculate_event_position(cell: Rect, duration: f64, minutes: i32) -> Rect {
    let top = cell.top() + cell.height() / 60.0 * minutes as f32;
    let height = cell.height() * duration as f32;
    Rect::from_min_size(
        pos2(cell.left(), top),
        vec2(cell.width() * OVERLAY_WIDTH_RATIO, height),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub event: EventDto,
    pub rect: Rect,
    pub hovered: bool,
    /// False while the event's cell is hidden (night hours collapsed).
    pub visible: bool,
}

impl Overlay {
    pub fn is_short(&self) -> bool {
        self.event.duration < SHORT_EVENT_HOURS
    }
}

/// Event data handed to the click router.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayClick {
    pub event: EventDto,
    pub rect: Rect,
}

#[derive(Debug, Default)]
pub struct OverlayManager {
    overlays: HashMap<i64, Overlay>,
    /// Creation order; later overlays are drawn on top.
    order: Vec<i64>,
    unkeyed: Vec<Overlay>,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, cell: Rect, event: EventDto) -> &Overlay {
        let rect = calculate_event_position(cell, event.duration, event.minutes());
        let overlay = Overlay {
            event,
            rect,
            hovered: false,
            visible: true,
        };

        match overlay.event.id {
            Some(id) => {
                self.order.retain(|existing| *existing != id);
                self.order.push(id);
                self.overlays.insert(id, overlay);
                &self.overlays[&id]
            }
            None => {
                self.unkeyed.push(overlay);
                &self.unkeyed[self.unkeyed.len() - 1]
            }
        }
    }

    /// Place an overlay in the event's cell; events without a visible cell are skipped.
    pub fn create_from_data(&mut self, grid: &ScheduleGrid, event: EventDto) -> Option<&Overlay> {
        let cell = match Self::find_cell_for_event(grid, &event) {
            Some(cell) => cell.rect,
            None => {
                log::warn!(
                    "No cell found for event {:?} on {} at {}",
                    event.id,
                    event.date,
                    event.time
                );
                return None;
            }
        };

        Some(self.create(cell, event))
    }

    /// Cell of the event's date whose hour equals the event's hour.
    pub fn find_cell_for_event<'a>(grid: &'a ScheduleGrid, event: &EventDto) -> Option<&'a GridCell> {
        let date = event.parsed_date()?;
        let hour = u32::try_from(event.hours()).ok()?;
        grid.cell(date, hour)
    }

    pub fn remove(&mut self, id: i64) -> bool {
        if self.overlays.remove(&id).is_some() {
            self.order.retain(|existing| *existing != id);
            true
        } else {
            log::warn!("Overlay with id {} not found", id);
            false
        }
    }

    pub fn clear_all(&mut self) {
        self.overlays.clear();
        self.order.clear();
        self.unkeyed.clear();
    }

    /// Recompute geometry against the current grid. Overlays whose cell is
    /// not laid out keep their last rectangle and are hidden.
    pub fn update_positions(&mut self, grid: &ScheduleGrid) {
        for overlay in self.overlays.values_mut().chain(self.unkeyed.iter_mut()) {
            match Self::find_cell_for_event(grid, &overlay.event) {
                Some(cell) => {
                    overlay.rect =
                        calculate_event_position(cell.rect, overlay.event.duration, overlay.event.minutes());
                    overlay.visible = true;
                }
                None => overlay.visible = false,
            }
        }
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Overlay> {
        self.overlays.get(&id)
    }

    /// Overlays bucketed into the given date and hour.
    pub fn find_by_date_hour(&self, date: NaiveDate, hour: u32) -> Vec<&Overlay> {
        self.iter()
            .filter(|o| o.event.parsed_date() == Some(date) && o.event.hours() == hour as i32)
            .collect()
    }

    pub fn exists(&self, id: i64) -> bool {
        self.overlays.contains_key(&id)
    }

    /// Number of overlays registered by id.
    pub fn count(&self) -> usize {
        self.overlays.len()
    }

    /// All overlays in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.order
            .iter()
            .filter_map(|id| self.overlays.get(id))
            .chain(self.unkeyed.iter())
    }

    /// Id of the topmost visible overlay under `pos`.
    pub fn hit_test(&self, pos: Pos2) -> Option<i64> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.overlays.get(id))
            .find(|o| o.visible && o.rect.contains(pos))
            .and_then(|o| o.event.id)
    }

    pub fn click(&self, pos: Pos2) -> Option<OverlayClick> {
        let id = self.hit_test(pos)?;
        self.overlays.get(&id).map(|o| OverlayClick {
            event: o.event.clone(),
            rect: o.rect,
        })
    }

    /// Track the hovered overlay; returns its id.
    pub fn set_hover(&mut self, pos: Option<Pos2>) -> Option<i64> {
        let hovered = pos.and_then(|p| self.hit_test(p));
        for (id, overlay) in self.overlays.iter_mut() {
            overlay.hovered = Some(*id) == hovered;
        }
        hovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::ViewerContext;
    use crate::services::schedule::{GridMetrics, Week};
    use serde_json::json;

    fn event(id: i64, date: &str, time: &str, duration: f64) -> EventDto {
        EventDto::from_value(
            &json!({"id": id, "date": date, "time": time, "duration": duration}),
            ViewerContext::new(Some(1)),
            None,
        )
    }

    fn grid(hours: &[u32]) -> ScheduleGrid {
        let week = Week::containing(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        ScheduleGrid::layout(&week, hours, GridMetrics::default())
    }

    #[test]
    fn test_position_offsets_by_minutes() {
        let cell = Rect::from_min_size(pos2(100.0, 200.0), vec2(120.0, 60.0));
        let rect = calculate_event_position(cell, 1.5, 15);

        assert_eq!(rect.top(), 215.0);
        assert_eq!(rect.left(), 100.0);
        assert_eq!(rect.width(), 108.0);
        assert_eq!(rect.height(), 90.0);
    }

    #[test]
    fn test_create_from_data_uses_hour_bucket() {
        let grid = grid(&[8, 9, 10]);
        let mut manager = OverlayManager::new();

        let overlay = manager
            .create_from_data(&grid, event(1, "2024-06-03", "09:30", 1.0))
            .unwrap();
        let cell = grid.cell_rect(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), 9).unwrap();
        assert_eq!(overlay.rect.top(), cell.top() + cell.height() / 2.0);
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_missing_cell_is_skipped() {
        let grid = grid(&[8, 9]);
        let mut manager = OverlayManager::new();

        assert!(manager.create_from_data(&grid, event(1, "2024-06-03", "22:00", 1.0)).is_none());
        assert!(manager.create_from_data(&grid, event(2, "2024-07-01", "08:00", 1.0)).is_none());
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_one_overlay_per_id() {
        let grid = grid(&[8, 9]);
        let mut manager = OverlayManager::new();

        manager.create_from_data(&grid, event(1, "2024-06-03", "08:00", 1.0));
        manager.create_from_data(&grid, event(1, "2024-06-04", "09:00", 1.0));

        assert_eq!(manager.count(), 1);
        assert_eq!(manager.iter().count(), 1);
        assert_eq!(manager.find_by_id(1).unwrap().event.date, "2024-06-04");
    }

    #[test]
    fn test_remove_and_clear() {
        let grid = grid(&[8, 9]);
        let mut manager = OverlayManager::new();
        manager.create_from_data(&grid, event(1, "2024-06-03", "08:00", 1.0));
        manager.create_from_data(&grid, event(2, "2024-06-03", "09:00", 1.0));

        assert!(manager.remove(1));
        assert!(!manager.remove(1));
        assert!(manager.exists(2));

        manager.clear_all();
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_hit_test_prefers_latest_overlay() {
        let grid = grid(&[8, 9]);
        let mut manager = OverlayManager::new();
        manager.create_from_data(&grid, event(1, "2024-06-03", "08:00", 2.0));
        manager.create_from_data(&grid, event(2, "2024-06-03", "09:00", 1.0));

        let cell = grid.cell_rect(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), 9).unwrap();
        assert_eq!(manager.hit_test(cell.center() - vec2(10.0, 0.0)), Some(2));
        assert_eq!(manager.hit_test(pos2(0.0, 0.0)), None);

        let click = manager.click(cell.center() - vec2(10.0, 0.0)).unwrap();
        assert_eq!(click.event.id, Some(2));
    }

    #[test]
    fn test_update_positions_hides_overlays_without_cell() {
        let all_hours: Vec<u32> = (0..24).collect();
        let full = grid(&all_hours);
        let mut manager = OverlayManager::new();
        manager.create_from_data(&full, event(1, "2024-06-03", "05:00", 1.0));
        let before = manager.find_by_id(1).unwrap().rect;

        manager.update_positions(&grid(&[7, 8]));
        let overlay = manager.find_by_id(1).unwrap();
        assert!(!overlay.visible);
        assert_eq!(overlay.rect, before);

        manager.update_positions(&full);
        assert!(manager.find_by_id(1).unwrap().visible);
    }

    #[test]
    fn test_find_by_date_hour_and_hover() {
        let grid = grid(&[8, 9]);
        let mut manager = OverlayManager::new();
        manager.create_from_data(&grid, event(1, "2024-06-03", "08:15", 0.5));

        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(manager.find_by_date_hour(date, 8).len(), 1);
        assert!(manager.find_by_date_hour(date, 9).is_empty());

        let rect = manager.find_by_id(1).unwrap().rect;
        assert_eq!(manager.set_hover(Some(rect.center())), Some(1));
        assert!(manager.find_by_id(1).unwrap().hovered);
        assert!(manager.find_by_id(1).unwrap().is_short());
        assert_eq!(manager.set_hover(None), None);
        assert!(!manager.find_by_id(1).unwrap().hovered);
    }
}
