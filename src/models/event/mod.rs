// Event module
// Normalized schedule event shared by the grid, the overlay layer and the API

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::time::{day_id, format_hhmm};

/// Duration (hours) used when a record does not carry one
pub const DEFAULT_DURATION: f64 = 1.0;
/// Latest start minute accepted inside an hour cell
pub const MAX_START_MINUTES: i32 = 55;

/// Fixed palette an event can be painted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    #[default]
    Blue,
    Yellow,
    Green,
}

impl EventColor {
    pub const ALL: [EventColor; 3] = [EventColor::Blue, EventColor::Yellow, EventColor::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Yellow => "yellow",
            EventColor::Green => "green",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventColor::Blue => "Blue",
            EventColor::Yellow => "Yellow",
            EventColor::Green => "Green",
        }
    }

    /// Unknown or empty names fall back to blue.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "yellow" => EventColor::Yellow,
            "green" => EventColor::Green,
            _ => EventColor::Blue,
        }
    }
}

/// The user looking at the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerContext {
    pub user_id: Option<i64>,
}

impl ViewerContext {
    pub fn new(user_id: Option<i64>) -> Self {
        Self { user_id }
    }

    pub fn owns(&self, created_by: Option<i64>) -> bool {
        matches!((self.user_id, created_by), (Some(viewer), Some(owner)) if viewer == owner)
    }
}

/// Normalized event record.
///
/// Every record held by the store or the overlay layer goes through this type,
/// so downstream code never has to deal with missing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDto {
    pub id: Option<i64>,
    pub series_id: Option<String>,
    pub date: String,
    pub time: String,
    pub text: String,
    pub color: EventColor,
    pub duration: f64,
    pub is_recurring: bool,
    pub created_by: Option<i64>,
    pub user_id: Option<i64>,
    pub target_user_id: Option<i64>,
    pub can_edit: bool,
    pub start_minutes: u32,
}

/// Fields sent to `save-event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub id: Option<i64>,
    pub date: String,
    pub time: String,
    pub text: String,
    pub color: EventColor,
    pub is_recurring: bool,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<i64>,
}

impl EventDto {
    /// Normalize a loosely shaped record (server JSON or any partial object).
    ///
    /// `can_edit_override` wins over a `canEdit` key in the input, which in
    /// turn wins over comparing `created_by` with the viewer.
    pub fn from_value(value: &Value, viewer: ViewerContext, can_edit_override: Option<bool>) -> Self {
        let empty = Map::new();
        let map = value.as_object().unwrap_or(&empty);

        let is_recurring = loose_bool(map.get("is_recurring")).unwrap_or(false);
        let created_by = loose_i64(map.get("created_by"));
        let time = loose_string(map.get("time")).unwrap_or_default();

        let can_edit = can_edit_override
            .or_else(|| loose_bool(map.get("canEdit").or_else(|| map.get("can_edit"))))
            .unwrap_or_else(|| viewer.owns(created_by));

        let mut event = Self {
            id: loose_i64(map.get("id")),
            series_id: loose_string(map.get("series_id")).filter(|s| !s.is_empty()),
            date: loose_string(map.get("date")).unwrap_or_default(),
            time,
            text: loose_string(map.get("text")).unwrap_or_default(),
            color: loose_string(map.get("color"))
                .map(|c| EventColor::parse(&c))
                .unwrap_or_default(),
            duration: loose_f64(map.get("duration")).unwrap_or(DEFAULT_DURATION),
            is_recurring,
            created_by,
            user_id: loose_i64(map.get("user_id")),
            target_user_id: loose_i64(map.get("target_user_id")),
            can_edit,
            start_minutes: 0,
        };

        event.start_minutes = loose_i64(map.get("startMinutes").or_else(|| map.get("start_minutes")))
            .map(|m| m.max(0) as u32)
            .unwrap_or_else(|| event.minutes().max(0) as u32);

        if !event.is_recurring {
            event.series_id = None;
        }

        event
    }

    /// Create a builder for constructing events with optional fields
    pub fn builder() -> EventBuilder {
        EventBuilder::new()
    }

    /// Hour part of `time`; unparsable values read as 0.
    pub fn hours(&self) -> i32 {
        self.time
            .split(':')
            .next()
            .and_then(|part| part.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Minute part of `time`; unparsable or absent values read as 0.
    pub fn minutes(&self) -> i32 {
        self.time
            .split(':')
            .nth(1)
            .and_then(|part| part.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Human-readable validation errors, empty when the event can be saved.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let minutes = self.minutes();
        if !(0..=MAX_START_MINUTES).contains(&minutes) {
            errors.push(format!("Minutes must be between 0 and {}", MAX_START_MINUTES));
        }

        if self.duration.is_nan() || self.duration <= 0.0 {
            errors.push("Duration must be greater than 0".to_string());
        }

        if self.time.is_empty() || !self.time.contains(':') {
            errors.push("Invalid time format".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Project the fields the server cares about.
    pub fn to_api_format(&self) -> EventPayload {
        EventPayload {
            id: self.id,
            date: self.date.clone(),
            time: self.time.clone(),
            text: self.text.clone(),
            color: self.color,
            is_recurring: self.is_recurring,
            duration: self.duration,
            series_id: if self.is_recurring {
                self.series_id.clone()
            } else {
                None
            },
            target_user_id: self.target_user_id,
        }
    }

    /// `HH:00` of the cell this event belongs to.
    pub fn base_time(&self) -> String {
        format_hhmm(self.hours().max(0) as u32, 0)
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn day_id(&self) -> Option<&'static str> {
        self.parsed_date().map(|date| day_id(date.weekday()))
    }

    /// Move the event to another slot, keeping everything else.
    pub fn at_slot(&self, date: NaiveDate, hour: u32, minute: u32) -> Self {
        let mut moved = self.clone();
        moved.date = date.format("%Y-%m-%d").to_string();
        moved.time = format_hhmm(hour, minute);
        moved.start_minutes = minute;
        moved
    }
}

/// Builder for creating events with optional fields
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    id: Option<i64>,
    series_id: Option<String>,
    date: Option<String>,
    time: Option<String>,
    text: String,
    color: EventColor,
    duration: Option<f64>,
    is_recurring: bool,
    created_by: Option<i64>,
    target_user_id: Option<i64>,
    can_edit: bool,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn series_id(mut self, series_id: impl Into<String>) -> Self {
        self.series_id = Some(series_id.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn color(mut self, color: EventColor) -> Self {
        self.color = color;
        self
    }

    pub fn duration(mut self, hours: f64) -> Self {
        self.duration = Some(hours);
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }

    pub fn created_by(mut self, user_id: i64) -> Self {
        self.created_by = Some(user_id);
        self
    }

    pub fn target_user(mut self, user_id: Option<i64>) -> Self {
        self.target_user_id = user_id;
        self
    }

    pub fn can_edit(mut self, can_edit: bool) -> Self {
        self.can_edit = can_edit;
        self
    }

    /// Build and validate the event
    pub fn build(self) -> Result<EventDto, Vec<String>> {
        let date = self.date.ok_or_else(|| vec!["Event date is required".to_string()])?;
        let time = self.time.unwrap_or_default();

        let mut event = EventDto {
            id: self.id,
            series_id: if self.is_recurring { self.series_id } else { None },
            date,
            time,
            text: self.text,
            color: self.color,
            duration: self.duration.unwrap_or(DEFAULT_DURATION),
            is_recurring: self.is_recurring,
            created_by: self.created_by,
            user_id: None,
            target_user_id: self.target_user_id,
            can_edit: self.can_edit,
            start_minutes: 0,
        };
        event.start_minutes = event.minutes().max(0) as u32;

        let errors = event.validate();
        if errors.is_empty() {
            Ok(event)
        } else {
            Err(errors)
        }
    }
}

fn loose_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn loose_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}
