// Property-based tests for duration conversion and overlay placement
// Checks the time helpers and the grid geometry with random inputs

use chrono::{Datelike, NaiveDate, Weekday};
use egui::{Pos2, Rect, Vec2};
use proptest::prelude::*;
use serde_json::json;
use week_scheduler::models::event::{EventDto, ViewerContext, MAX_START_MINUTES};
use week_scheduler::services::overlay::{calculate_event_position, OVERLAY_WIDTH_RATIO};
use week_scheduler::utils::date::monday_of;
use week_scheduler::utils::time::{decimal_to_time, format_hhmm, time_to_decimal, validate_duration_input};

fn event_at(time: &str, duration: f64) -> EventDto {
    EventDto::from_value(
        &json!({"date": "2024-06-03", "time": time, "duration": duration}),
        ViewerContext::default(),
        None,
    )
}

proptest! {
    /// Property: hours() and minutes() read back every HH:MM start time
    #[test]
    fn prop_start_time_round_trip(hour in 0..24u32, minute in 0..60u32) {
        let time = format_hhmm(hour, minute);
        let event = event_at(&time, 1.0);

        prop_assert_eq!(event.hours(), hour as i32);
        prop_assert_eq!(event.minutes(), minute as i32);
        prop_assert_eq!(format_hhmm(event.hours() as u32, event.minutes() as u32), time);
    }

    /// Property: validation fails exactly for a bad minute, a non-positive duration or a missing colon
    #[test]
    fn prop_validate_matches_rules(
        hour in 0..24i32,
        minute in -15..60i32,
        duration in -3.0f64..6.0,
        with_colon in any::<bool>(),
    ) {
        let time = if with_colon {
            format!("{:02}:{:02}", hour, minute)
        } else {
            format!("{:02}{:02}", hour, minute)
        };
        let event = event_at(&time, duration);

        let bad_minute = with_colon && !(0..=MAX_START_MINUTES).contains(&minute);
        let expected = bad_minute || duration <= 0.0 || !with_colon;
        prop_assert_eq!(!event.validate().is_empty(), expected, "time {} duration {}", time, duration);
        prop_assert_eq!(event.is_valid(), !expected);
    }

    /// Property: any typed H:MM duration survives conversion to decimal hours and back
    #[test]
    fn prop_duration_text_is_stable(hours in 0..24u32, minutes in 0..60u32) {
        let typed = format!("{}:{:02}", hours, minutes);
        prop_assert_eq!(decimal_to_time(time_to_decimal(&typed)), typed);
    }

    /// Property: well-formed durations are always accepted while typing
    #[test]
    fn prop_valid_durations_pass_validation(hours in 0..=24u32, minutes in 0..60u32) {
        let typed = format!("{}:{:02}", hours, minutes);
        prop_assert!(validate_duration_input(&typed).is_ok());
    }

    /// Property: minutes above 59 are always rejected
    #[test]
    fn prop_minute_overflow_rejected(hours in 0..=24u32, minutes in 60..100u32) {
        let typed = format!("{}:{}", hours, minutes);
        prop_assert!(validate_duration_input(&typed).is_err());
    }

    /// Property: the week of any date starts on the Monday at most six days before it
    #[test]
    fn prop_monday_of_is_start_of_week(offset in 0..3650i64) {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset);
        let monday = monday_of(date);

        prop_assert_eq!(monday.weekday(), Weekday::Mon);
        prop_assert!(monday <= date);
        prop_assert!((date - monday).num_days() < 7);
    }

    /// Property: an overlay starts inside its cell and scales with the duration
    #[test]
    fn prop_overlay_stays_in_column(
        x in 0.0f32..1000.0,
        y in 0.0f32..1000.0,
        minutes in 0..=55i32,
        quarter_hours in 1..32u32,
    ) {
        let cell = Rect::from_min_size(Pos2::new(x, y), Vec2::new(120.0, 48.0));
        let duration = quarter_hours as f64 / 4.0;
        let rect = calculate_event_position(cell, duration, minutes);

        prop_assert!(rect.top() >= cell.top() && rect.top() < cell.bottom());
        prop_assert!(rect.left() >= cell.left());
        prop_assert!((rect.width() - cell.width() * OVERLAY_WIDTH_RATIO).abs() < 0.01);
        prop_assert!((rect.height() - cell.height() * duration as f32).abs() < 0.01);
    }
}

#[cfg(test)]
mod additional_tests {
    use super::*;

    #[test]
    fn test_bare_hours_and_blank_input() {
        assert_eq!(time_to_decimal("2"), 2.0);
        assert_eq!(time_to_decimal(""), 1.0);
        assert_eq!(decimal_to_time(1.999), "2:00");
    }
}
