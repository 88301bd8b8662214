//! "Now" indicator drawn across the week grid.

use chrono::{NaiveDateTime, Timelike};
use egui::Rect;
use std::time::{Duration, Instant};

use crate::services::schedule::{ScheduleController, ScheduleGrid};
use crate::utils::debounce::Debouncer;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
pub const SCROLL_DEBOUNCE: Duration = Duration::from_millis(50);

/// Horizontal segment at `y`, relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeLine {
    pub y: f32,
    pub x_start: f32,
    pub x_end: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineLines {
    /// Thin line over every day column
    pub week_line: TimeLine,
    /// Thick line over today's column
    pub day_line: Option<TimeLine>,
    pub visible: bool,
}

/// Whether the indicator is shown at `hour:minute`. The edges of the
/// default window stay lit so the line does not vanish at 20:xx or 6:xx.
pub fn is_line_visible(controller: &ScheduleController, hour: u32, minute: u32) -> bool {
    controller.should_show_hour(hour) || (hour == 20 && minute > 0) || (hour == 6 && minute < 59)
}

/// Lines for `now`, or `None` when today is not in the displayed week or the
/// current hour has no row.
pub fn compute_lines(now: NaiveDateTime, controller: &ScheduleController, grid: &ScheduleGrid) -> Option<TimelineLines> {
    let today = now.date();
    if !controller.week().contains(today) {
        return None;
    }

    let hour = now.hour();
    let minute = now.minute();

    let row = grid.row_rect(hour)?;
    let y = (row.top() + minute as f32 / 60.0 * row.height()).round();

    let metrics = grid.metrics();
    let week_line = TimeLine {
        y,
        x_start: metrics.time_column_width.round(),
        x_end: grid.size().x.round(),
    };

    let day_line = grid.column_rect(today).map(|column: Rect| TimeLine {
        y,
        x_start: column.left().round(),
        x_end: column.right().round(),
    });

    Some(TimelineLines {
        week_line,
        day_line,
        visible: is_line_visible(controller, hour, minute),
    })
}

/// Decides when the indicator has to be recomputed.
#[derive(Debug)]
pub struct TimelineManager {
    lines: Option<TimelineLines>,
    last_update: Option<Instant>,
    interval: Duration,
    resize: Debouncer,
    scroll: Debouncer,
    initialized: bool,
}

impl TimelineManager {
    pub fn new() -> Self {
        Self {
            lines: None,
            last_update: None,
            interval: REFRESH_INTERVAL,
            resize: Debouncer::new(RESIZE_DEBOUNCE),
            scroll: Debouncer::new(SCROLL_DEBOUNCE),
            initialized: false,
        }
    }

    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.last_update = None;
    }

    /// Force a recompute on the next frame (week change, hours toggle).
    pub fn invalidate(&mut self) {
        self.last_update = None;
    }

    pub fn on_resize(&mut self, now: Instant) {
        self.resize.trigger(now);
    }

    pub fn on_scroll(&mut self, now: Instant) {
        self.scroll.trigger(now);
    }

    pub fn needs_update(&mut self, now: Instant) -> bool {
        if !self.initialized {
            return false;
        }

        // Poll both so neither stays pending.
        let resized = self.resize.poll(now);
        let scrolled = self.scroll.poll(now);

        let due = match self.last_update {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };

        due || resized || scrolled
    }

    pub fn update(
        &mut self,
        now: Instant,
        local_now: NaiveDateTime,
        controller: &ScheduleController,
        grid: &ScheduleGrid,
    ) {
        self.lines = compute_lines(local_now, controller, grid);
        self.last_update = Some(now);
    }

    pub fn lines(&self) -> Option<&TimelineLines> {
        self.lines.as_ref()
    }

    /// How long the frame loop may sleep before the next recompute.
    pub fn next_wakeup(&self, now: Instant) -> Duration {
        let periodic = match self.last_update {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
        };

        [self.resize.remaining(now), self.scroll.remaining(now)]
            .into_iter()
            .flatten()
            .fold(periodic, Duration::min)
    }

    pub fn destroy(&mut self) {
        self.lines = None;
        self.resize.cancel();
        self.scroll.cancel();
        self.initialized = false;
    }
}

impl Default for TimelineManager {
    fn default() -> Self {
        Self::new()
    }
}
