use chrono::{Datelike, Local, Weekday};
use egui::{Align2, CursorIcon, FontId, Id, Pos2, Rect, Sense, Stroke, Vec2};
use std::time::Instant;

use super::palette::{EventPalette, TimeGridPalette};
use crate::services::api::ScheduleApi;
use crate::services::event_manager::{EventError, EventManager, MoveReport};
use crate::services::overlay::Overlay;
use crate::services::schedule::{GridMetrics, ScheduleController, ScheduleGrid, WeekDay};
use crate::services::timeline::{TimeLine, TimelineManager};
use crate::ui_egui::drag::{DragContext, DragManager};
use crate::utils::time::format_hhmm;

const OVERLAY_ROUNDING: f32 = 4.0;
const OVERLAY_PADDING: f32 = 4.0;

/// What happened in the grid this frame that the app has to report.
#[derive(Default)]
pub struct WeekViewOutcome {
    pub move_result: Option<Result<MoveReport, EventError>>,
}

pub struct WeekView;

impl WeekView {
    pub fn show<A: ScheduleApi>(
        ui: &mut egui::Ui,
        controller: &ScheduleController,
        events: &mut EventManager<A>,
        timeline: &mut TimelineManager,
        target_user_id: Option<i64>,
        expanded: bool,
    ) -> WeekViewOutcome {
        let now = Instant::now();
        let palette = TimeGridPalette::from_visuals(ui.visuals());
        let mut outcome = WeekViewOutcome::default();

        let metrics = GridMetrics::fit_width(ui.available_width(), expanded);
        if metrics != events.grid().metrics() && !events.grid().is_empty() {
            timeline.on_resize(now);
        }
        let grid = ScheduleGrid::layout(controller.week(), &controller.visible_hours(), metrics);
        events.set_grid(grid, now);

        let scroll = egui::ScrollArea::both()
            .id_source("week_view_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let size = events.grid().size();
                let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
                let origin = rect.min;
                let to_grid = |pos: Pos2| pos - origin.to_vec2();
                let to_screen = |r: Rect| r.translate(origin.to_vec2());

                Self::paint_cells(ui, events.grid(), controller, &palette, origin);
                Self::paint_headers(ui, events.grid(), controller, &palette, origin);
                Self::paint_hour_labels(ui, events.grid(), &palette, origin);

                let pointer = response.hover_pos().map(to_grid);
                let dragging = DragManager::is_active(ui.ctx());

                let hovered_overlay = if dragging {
                    events.overlays_mut().set_hover(None)
                } else {
                    events.overlays_mut().set_hover(pointer)
                };

                if hovered_overlay.is_some() {
                    ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
                } else if let Some(cell) = pointer.and_then(|p| events.grid().cell_at(p)) {
                    if !dragging {
                        ui.painter()
                            .rect_filled(to_screen(cell.rect), 0.0, palette.hover_overlay);
                    }
                }

                let is_dark = ui.visuals().dark_mode;
                for overlay in events.overlays().iter().filter(|o| o.visible) {
                    Self::paint_overlay(ui, overlay, to_screen(overlay.rect), is_dark);
                }

                // Check drag_started before clicked so a press that moves is a drag.
                if response.drag_started() {
                    let press = ui
                        .input(|i| i.pointer.press_origin())
                        .or(response.interact_pointer_pos())
                        .map(to_grid);
                    let picked = press.and_then(|p| {
                        let id = events.overlays().hit_test(p)?;
                        let overlay = events.overlays().find_by_id(id)?;
                        DragContext::from_overlay(overlay, p)
                    });
                    if let Some(drag) = picked {
                        log::debug!("Dragging event {}", drag.event_id);
                        DragManager::begin(ui.ctx(), drag);
                    }
                }

                if response.dragged() {
                    if let Some(pos) = response.interact_pointer_pos().map(to_grid) {
                        DragManager::update_hover(ui.ctx(), events.grid().cell_at(pos), pos);
                    }
                }

                if let Some(drag) = DragManager::active(ui.ctx()) {
                    ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
                    if let (Some(target), Some(_)) = (drag.hovered_rect, drag.drop_target()) {
                        ui.painter()
                            .rect_filled(to_screen(target), 0.0, palette.drop_target);
                    }
                    if let Some(preview) = drag.preview_rect() {
                        if let Some(overlay) = events.overlays().find_by_id(drag.event_id) {
                            ui.painter().rect_stroke(
                                to_screen(preview),
                                OVERLAY_ROUNDING,
                                Stroke::new(2.0, EventPalette::for_color(overlay.event.color, is_dark).border),
                            );
                        }
                    }
                }

                if response.drag_stopped() {
                    if let Some(drag) = DragManager::finish(ui.ctx()) {
                        if let Some((date, hour)) = drag.drop_target() {
                            outcome.move_result =
                                Some(events.move_event(drag.event_id, date, hour, drag.minute));
                        }
                    }
                } else if response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos().map(to_grid) {
                        events.handle_pointer_click(pos, target_user_id);
                    }
                }

                if timeline.needs_update(now) {
                    timeline.update(now, Local::now().naive_local(), controller, events.grid());
                }
                if let Some(lines) = timeline.lines().filter(|l| l.visible) {
                    Self::paint_time_line(ui, &lines.week_line, 1.0, palette.week_line, origin);
                    if let Some(day_line) = &lines.day_line {
                        Self::paint_time_line(ui, day_line, 3.0, palette.day_line, origin);
                    }
                }
            });

        let offset_id = Id::new("week_view_scroll_offset");
        let previous = ui.ctx().memory(|mem| mem.data.get_temp::<Vec2>(offset_id));
        if previous.is_some_and(|prev| prev != scroll.state.offset) {
            timeline.on_scroll(now);
        }
        ui.ctx()
            .memory_mut(|mem| mem.data.insert_temp(offset_id, scroll.state.offset));

        outcome
    }

    fn paint_cells(
        ui: &egui::Ui,
        grid: &ScheduleGrid,
        controller: &ScheduleController,
        palette: &TimeGridPalette,
        origin: Pos2,
    ) {
        let painter = ui.painter();
        let offset = origin.to_vec2();

        for cell in grid.cells() {
            let rect = cell.rect.translate(offset);
            let bg = if cell.date == controller.today() {
                palette.today_bg
            } else if matches!(cell.date.weekday(), Weekday::Sat | Weekday::Sun) {
                palette.weekend_bg
            } else {
                palette.regular_bg
            };
            painter.rect_filled(rect, 0.0, bg);
            painter.line_segment(
                [rect.left_bottom(), rect.right_bottom()],
                Stroke::new(1.0, palette.hour_line),
            );
            painter.line_segment(
                [rect.right_top(), rect.right_bottom()],
                Stroke::new(1.0, palette.divider),
            );
        }
    }

    fn paint_headers(
        ui: &egui::Ui,
        grid: &ScheduleGrid,
        controller: &ScheduleController,
        palette: &TimeGridPalette,
        origin: Pos2,
    ) {
        let offset = origin.to_vec2();
        let metrics = grid.metrics();

        let corner = Rect::from_min_size(origin, Vec2::new(metrics.time_column_width, metrics.header_height));
        ui.painter().rect_filled(corner, 0.0, palette.header_bg);

        for (col, date) in grid.days().iter().enumerate() {
            let day = WeekDay::new(*date);
            let rect = grid.header_rect(col).translate(offset);
            let is_today = controller.is_today(&day);

            ui.painter().rect_filled(rect, 0.0, palette.header_bg);
            if is_today {
                ui.painter().line_segment(
                    [rect.left_bottom(), rect.right_bottom()],
                    Stroke::new(2.0, palette.day_line),
                );
            }
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                day.header_label(),
                FontId::proportional(13.0),
                if is_today { palette.today_text } else { palette.header_text },
            );

            ui.interact(rect, Id::new(("week_header", day.day_id)), Sense::hover())
                .on_hover_text(day.tooltip());
        }
    }

    fn paint_hour_labels(ui: &egui::Ui, grid: &ScheduleGrid, palette: &TimeGridPalette, origin: Pos2) {
        let painter = ui.painter();
        let metrics = grid.metrics();

        for hour in grid.hours() {
            let Some(row) = grid.row_rect(*hour) else {
                continue;
            };
            let label_rect = Rect::from_min_size(
                row.min + origin.to_vec2(),
                Vec2::new(metrics.time_column_width, row.height()),
            );
            painter.rect_filled(label_rect, 0.0, palette.hour_bg);
            painter.text(
                label_rect.right_top() + Vec2::new(-6.0, 4.0),
                Align2::RIGHT_TOP,
                format_hhmm(*hour, 0),
                FontId::monospace(11.0),
                palette.hour_text,
            );
        }
    }

    fn paint_overlay(ui: &egui::Ui, overlay: &Overlay, rect: Rect, is_dark: bool) {
        let mut colors = EventPalette::for_color(overlay.event.color, is_dark);
        if !overlay.event.can_edit {
            colors = colors.read_only();
        }
        if overlay.hovered {
            colors = colors.hovered();
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, OVERLAY_ROUNDING, colors.fill);
        painter.rect_stroke(rect, OVERLAY_ROUNDING, Stroke::new(1.0, colors.border));

        let inner = rect.shrink(OVERLAY_PADDING);
        let label = if overlay.is_short() {
            format!("{} {}", overlay.event.time, overlay.event.text)
        } else {
            format!("{}\n{}", overlay.event.time, overlay.event.text)
        };
        let galley = painter.layout(
            label,
            FontId::proportional(12.0),
            colors.text,
            inner.width().max(1.0),
        );
        painter.galley(inner.min, galley, colors.text);
    }

    fn paint_time_line(ui: &egui::Ui, line: &TimeLine, width: f32, color: egui::Color32, origin: Pos2) {
        let y = origin.y + line.y;
        ui.painter().line_segment(
            [
                Pos2::new(origin.x + line.x_start, y),
                Pos2::new(origin.x + line.x_end, y),
            ],
            Stroke::new(width, color),
        );
    }
}
