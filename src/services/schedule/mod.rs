//! Week model, navigation and the visible hour window.

mod grid;

pub use grid::{GridCell, GridMetrics, ScheduleGrid};

use chrono::{Datelike, Duration, NaiveDate};

use crate::utils::date::{day_name, day_short_name, format_naive, iso, monday_of};
use crate::utils::time::day_id;

pub const DEFAULT_MIN_HOUR: u32 = 7;
pub const DEFAULT_MAX_HOUR: u32 = 20;
pub const HOURS_PER_DAY: u32 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_id: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    pub day_of_month: u32,
}

impl WeekDay {
    pub fn new(date: NaiveDate) -> Self {
        let weekday = date.weekday();
        Self {
            date,
            day_id: day_id(weekday),
            name: day_name(weekday),
            short_name: day_short_name(weekday),
            day_of_month: date.day(),
        }
    }

    pub fn iso(&self) -> String {
        iso(self.date)
    }

    /// Column header, e.g. `3, Mon`
    pub fn header_label(&self) -> String {
        format!("{}, {}", self.day_of_month, self.short_name)
    }

    pub fn tooltip(&self) -> String {
        format!("{} {}", self.name, self.iso())
    }
}

/// Seven consecutive days starting on `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Week {
    pub start: NaiveDate,
    pub days: Vec<WeekDay>,
}

impl Week {
    pub fn starting(start: NaiveDate) -> Self {
        let days = (0..7).map(|i| WeekDay::new(start + Duration::days(i))).collect();
        Self { start, days }
    }

    /// The Monday-based week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self::starting(monday_of(date))
    }

    pub fn end(&self) -> NaiveDate {
        self.days.last().map(|d| d.date).unwrap_or(self.start)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.day_index(date).is_some()
    }

    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.days.iter().position(|d| d.date == date)
    }

    pub fn shifted(&self, days: i64) -> Self {
        Self::starting(self.start + Duration::days(days))
    }

    /// `dd.mm.yyyy-dd.mm.yyyy`
    pub fn range_label(&self) -> String {
        format!("{}-{}", format_naive(self.start), format_naive(self.end()))
    }
}

/// Displayed week plus the night-hours toggle.
#[derive(Debug, Clone)]
pub struct ScheduleController {
    week: Week,
    today: NaiveDate,
    show_all_hours: bool,
    min_hour: u32,
    max_hour: u32,
}

impl ScheduleController {
    pub fn new(today: NaiveDate, min_hour: u32, max_hour: u32) -> Self {
        Self {
            week: Week::containing(today),
            today,
            show_all_hours: false,
            min_hour,
            max_hour,
        }
    }

    pub fn with_default_hours(today: NaiveDate) -> Self {
        Self::new(today, DEFAULT_MIN_HOUR, DEFAULT_MAX_HOUR)
    }

    pub fn week(&self) -> &Week {
        &self.week
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Advance the notion of today (the app calls this once per frame).
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn change_week(&mut self, days_offset: i64) -> &Week {
        self.week = self.week.shifted(days_offset);
        log::info!("Showing week {}", self.week.range_label());
        &self.week
    }

    pub fn next_week(&mut self) -> &Week {
        self.change_week(7)
    }

    pub fn prev_week(&mut self) -> &Week {
        self.change_week(-7)
    }

    pub fn go_to_today(&mut self) -> &Week {
        self.week = Week::containing(self.today);
        &self.week
    }

    pub fn toggle_hours(&mut self) {
        self.show_all_hours = !self.show_all_hours;
    }

    pub fn show_all_hours(&self) -> bool {
        self.show_all_hours
    }

    pub fn min_hour(&self) -> u32 {
        self.min_hour
    }

    pub fn max_hour(&self) -> u32 {
        self.max_hour
    }

    pub fn should_show_hour(&self, hour: u32) -> bool {
        self.show_all_hours || (self.min_hour..=self.max_hour).contains(&hour)
    }

    pub fn visible_hours(&self) -> Vec<u32> {
        (0..HOURS_PER_DAY).filter(|h| self.should_show_hour(*h)).collect()
    }

    pub fn week_range_label(&self) -> String {
        self.week.range_label()
    }

    pub fn is_today(&self, day: &WeekDay) -> bool {
        day.date == self.today
    }

    pub fn toggle_hours_label(&self) -> &'static str {
        if self.show_all_hours {
            "Hide night hours"
        } else {
            "Show all hours"
        }
    }
}
