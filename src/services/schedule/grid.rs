use chrono::NaiveDate;
use egui::{pos2, vec2, Pos2, Rect, Vec2};
use std::collections::HashMap;

use super::Week;
use crate::utils::time::format_hhmm;

/// Pixel sizes of the week grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub time_column_width: f32,
    pub header_height: f32,
    pub column_width: f32,
    pub row_height: f32,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            time_column_width: 56.0,
            header_height: 32.0,
            column_width: 120.0,
            row_height: 48.0,
        }
    }
}

impl GridMetrics {
    pub const MIN_COLUMN_WIDTH: f32 = 80.0;
    pub const EXPANDED_COLUMN_WIDTH: f32 = 220.0;

    /// Spread seven day columns over `available_width`. The expanded layout
    /// uses fixed wide columns and scrolls horizontally instead.
    pub fn fit_width(available_width: f32, expanded: bool) -> Self {
        let base = Self::default();
        let column_width = if expanded {
            Self::EXPANDED_COLUMN_WIDTH
        } else {
            ((available_width - base.time_column_width) / 7.0).max(Self::MIN_COLUMN_WIDTH)
        };

        Self {
            column_width,
            ..base
        }
    }
}

/// One (date, hour) cell; `rect` is relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub date: NaiveDate,
    pub hour: u32,
    pub rect: Rect,
}

impl GridCell {
    /// `HH:00`
    pub fn base_time(&self) -> String {
        format_hhmm(self.hour, 0)
    }
}

/// Laid-out cells for the visible hours of a week.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleGrid {
    cells: Vec<GridCell>,
    index: HashMap<(NaiveDate, u32), usize>,
    days: Vec<NaiveDate>,
    hours: Vec<u32>,
    metrics: GridMetrics,
}

impl ScheduleGrid {
    pub fn layout(week: &Week, hours: &[u32], metrics: GridMetrics) -> Self {
        let days = week.dates();
        let mut cells = Vec::with_capacity(days.len() * hours.len());
        let mut index = HashMap::with_capacity(days.len() * hours.len());

        for (col, date) in days.iter().enumerate() {
            for (row, hour) in hours.iter().enumerate() {
                let min = pos2(
                    metrics.time_column_width + col as f32 * metrics.column_width,
                    metrics.header_height + row as f32 * metrics.row_height,
                );
                let rect = Rect::from_min_size(min, vec2(metrics.column_width, metrics.row_height));

                index.insert((*date, *hour), cells.len());
                cells.push(GridCell {
                    date: *date,
                    hour: *hour,
                    rect,
                });
            }
        }

        Self {
            cells,
            index,
            days,
            hours: hours.to_vec(),
            metrics,
        }
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn metrics(&self) -> GridMetrics {
        self.metrics
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, date: NaiveDate, hour: u32) -> Option<&GridCell> {
        self.index.get(&(date, hour)).map(|i| &self.cells[*i])
    }

    pub fn cell_rect(&self, date: NaiveDate, hour: u32) -> Option<Rect> {
        self.cell(date, hour).map(|c| c.rect)
    }

    /// Cell under a position relative to the grid origin.
    pub fn cell_at(&self, pos: Pos2) -> Option<&GridCell> {
        let m = &self.metrics;
        if pos.x < m.time_column_width || pos.y < m.header_height {
            return None;
        }

        let col = ((pos.x - m.time_column_width) / m.column_width).floor() as usize;
        let row = ((pos.y - m.header_height) / m.row_height).floor() as usize;

        let date = self.days.get(col)?;
        let hour = self.hours.get(row)?;
        self.cell(*date, *hour)
    }

    /// Same days and hours, whatever the pixel sizes.
    pub fn same_cells(&self, other: &ScheduleGrid) -> bool {
        self.days == other.days && self.hours == other.hours
    }

    pub fn column_rect(&self, date: NaiveDate) -> Option<Rect> {
        let col = self.days.iter().position(|d| *d == date)?;
        let m = &self.metrics;
        Some(Rect::from_min_size(
            pos2(m.time_column_width + col as f32 * m.column_width, m.header_height),
            vec2(m.column_width, self.hours.len() as f32 * m.row_height),
        ))
    }

    pub fn header_rect(&self, col: usize) -> Rect {
        let m = &self.metrics;
        Rect::from_min_size(
            pos2(m.time_column_width + col as f32 * m.column_width, 0.0),
            vec2(m.column_width, m.header_height),
        )
    }

    /// Row band of an hour, spanning the time column and every day.
    pub fn row_rect(&self, hour: u32) -> Option<Rect> {
        let row = self.hours.iter().position(|h| *h == hour)?;
        let m = &self.metrics;
        Some(Rect::from_min_size(
            pos2(0.0, m.header_height + row as f32 * m.row_height),
            vec2(self.size().x, m.row_height),
        ))
    }

    pub fn size(&self) -> Vec2 {
        let m = &self.metrics;
        vec2(
            m.time_column_width + self.days.len() as f32 * m.column_width,
            m.header_height + self.hours.len() as f32 * m.row_height,
        )
    }
}
