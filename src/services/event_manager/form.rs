use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::event::{EventColor, EventDto, ViewerContext};
use crate::utils::date::{day_name, format_naive, monday_of};
use crate::utils::time::{decimal_to_time, format_hhmm, time_to_decimal, validate_duration_input};

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit { original: EventDto },
}

/// Field values of the event dialog.
///
/// Text fields hold what the user typed; conversion happens in `to_dto`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventForm {
    pub mode: FormMode,
    pub date: NaiveDate,
    pub hour: u32,
    pub text: String,
    pub start_minutes: String,
    pub duration: String,
    pub color: EventColor,
    pub is_recurring: bool,
    pub selected_days: Vec<Weekday>,
    pub target_user_id: Option<i64>,
}

impl EventForm {
    /// New event in an empty cell.
    pub fn for_cell(date: NaiveDate, hour: u32, last_duration: &str, target_user_id: Option<i64>) -> Self {
        Self {
            mode: FormMode::Create,
            date,
            hour,
            text: String::new(),
            start_minutes: "0".to_string(),
            duration: last_duration.to_string(),
            color: EventColor::Blue,
            is_recurring: false,
            selected_days: Vec::new(),
            target_user_id,
        }
    }

    /// Edit an existing event; `None` when its date cannot be read.
    pub fn for_event(event: &EventDto) -> Option<Self> {
        let date = event.parsed_date()?;
        Some(Self {
            mode: FormMode::Edit {
                original: event.clone(),
            },
            date,
            hour: event.hours().max(0) as u32,
            text: event.text.clone(),
            start_minutes: event.minutes().to_string(),
            duration: decimal_to_time(event.duration),
            color: event.color,
            is_recurring: event.is_recurring,
            selected_days: Vec::new(),
            target_user_id: event.target_user_id,
        })
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn original(&self) -> Option<&EventDto> {
        match &self.mode {
            FormMode::Edit { original } => Some(original),
            FormMode::Create => None,
        }
    }

    pub fn editing_id(&self) -> Option<i64> {
        self.original().and_then(|e| e.id)
    }

    /// Minute offset as typed; blank or garbage reads as 0.
    pub fn minutes(&self) -> i32 {
        self.start_minutes.trim().parse().unwrap_or(0)
    }

    pub fn time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minutes())
    }

    pub fn duration_error(&self) -> Option<String> {
        validate_duration_input(self.duration.trim()).err()
    }

    pub fn to_dto(&self, viewer: ViewerContext) -> EventDto {
        let original = self.original();
        let minutes = self.minutes();

        EventDto {
            id: original.and_then(|e| e.id),
            series_id: if self.is_recurring {
                original.and_then(|e| e.series_id.clone())
            } else {
                None
            },
            date: self.date.format("%Y-%m-%d").to_string(),
            time: self.time(),
            text: self.text.clone(),
            color: self.color,
            duration: time_to_decimal(&self.duration),
            is_recurring: self.is_recurring,
            created_by: original.and_then(|e| e.created_by).or(viewer.user_id),
            user_id: original.and_then(|e| e.user_id),
            target_user_id: self.target_user_id,
            can_edit: true,
            start_minutes: minutes.max(0) as u32,
        }
    }

    pub fn toggle_day(&mut self, day: Weekday) {
        if let Some(pos) = self.selected_days.iter().position(|d| *d == day) {
            self.selected_days.remove(pos);
        } else {
            self.selected_days.push(day);
            self.selected_days.sort_by_key(|d| d.num_days_from_monday());
        }
    }

    pub fn is_day_selected(&self, day: Weekday) -> bool {
        self.selected_days.contains(&day)
    }

    /// Dates of the selected weekdays in the week of `date`.
    pub fn target_dates(&self) -> Vec<NaiveDate> {
        let monday = monday_of(self.date);
        self.selected_days
            .iter()
            .map(|day| monday + Duration::days(day.num_days_from_monday() as i64))
            .collect()
    }

    /// Dialog heading, e.g. `Monday, 03.06.2024 09:00`
    pub fn time_info(&self) -> String {
        let time = match self.original() {
            Some(original) => original.time.clone(),
            None => format_hhmm(self.hour, 0),
        };
        format!("{}, {} {}", day_name(self.date.weekday()), format_naive(self.date), time)
    }

    pub fn days_button_label(&self) -> String {
        if self.selected_days.is_empty() {
            "Days".to_string()
        } else {
            format!("Days ({})", self.selected_days.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_new_form_defaults() {
        let form = EventForm::for_cell(monday(), 9, "1:30", Some(4));
        assert_eq!(form.time(), "09:00");
        assert_eq!(form.color, EventColor::Blue);
        assert_eq!(form.target_user_id, Some(4));
        assert_eq!(form.time_info(), "Monday, 03.06.2024 09:00");
        assert_eq!(form.days_button_label(), "Days");

        let dto = form.to_dto(ViewerContext::new(Some(1)));
        assert_eq!(dto.duration, 1.5);
        assert_eq!(dto.created_by, Some(1));
        assert_eq!(dto.id, None);
    }

    #[test]
    fn test_edit_form_keeps_identity() {
        let original = EventDto::from_value(
            &json!({
                "id": 5, "date": "2024-06-04", "time": "14:20", "duration": 2.25,
                "is_recurring": true, "series_id": "s-1", "created_by": 1, "text": "gym"
            }),
            ViewerContext::new(Some(1)),
            None,
        );

        let mut form = EventForm::for_event(&original).unwrap();
        assert_eq!(form.duration, "2:15");
        assert_eq!(form.start_minutes, "20");
        form.start_minutes = "35".to_string();

        let dto = form.to_dto(ViewerContext::new(Some(1)));
        assert_eq!(dto.id, Some(5));
        assert_eq!(dto.time, "14:35");
        assert_eq!(dto.series_id.as_deref(), Some("s-1"));

        form.is_recurring = false;
        assert_eq!(form.to_dto(ViewerContext::new(Some(1))).series_id, None);
    }

    #[test]
    fn test_target_dates_follow_week_of_form() {
        let mut form = EventForm::for_cell(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(), 8, "1:00", None);
        form.toggle_day(Weekday::Fri);
        form.toggle_day(Weekday::Mon);
        form.toggle_day(Weekday::Sun);
        form.toggle_day(Weekday::Sun);

        assert_eq!(form.days_button_label(), "Days (2)");
        assert_eq!(
            form.target_dates(),
            vec![monday(), NaiveDate::from_ymd_opt(2024, 6, 7).unwrap()]
        );
    }

    #[test]
    fn test_garbage_minutes_read_as_zero() {
        let mut form = EventForm::for_cell(monday(), 9, "1:00", None);
        form.start_minutes = "abc".to_string();
        assert_eq!(form.time(), "09:00");

        form.duration = "1:75".to_string();
        assert!(form.duration_error().is_some());
    }
}
