//! Time-of-day and duration helpers.
//!
//! Durations are edited as `H:MM` and stored as decimal hours.

use chrono::Weekday;

/// Duration used when an input cannot be read at all.
pub const FALLBACK_DURATION_HOURS: f64 = 1.0;

/// `H:MM` (or a bare number of hours) to decimal hours.
pub fn time_to_decimal(input: &str) -> f64 {
    let input = input.trim();
    if input.is_empty() {
        return FALLBACK_DURATION_HOURS;
    }

    if let Some((hours, minutes)) = input.split_once(':') {
        let hours: f64 = hours.trim().parse().unwrap_or(0.0);
        let minutes: f64 = minutes.trim().parse().unwrap_or(0.0);
        return hours + minutes / 60.0;
    }

    match input.parse::<f64>() {
        Ok(hours) if hours != 0.0 => hours,
        _ => FALLBACK_DURATION_HOURS,
    }
}

/// Decimal hours to `H:MM`, rounding to whole minutes.
pub fn decimal_to_time(hours: f64) -> String {
    let whole = hours.floor();
    let minutes = ((hours - whole) * 60.0).round() as i64;
    let whole = whole as i64;

    if minutes == 60 {
        return format!("{}:00", whole + 1);
    }

    format!("{}:{:02}", whole, minutes)
}

/// Check a duration field while it is being typed.
///
/// Empty input is allowed so the field can be cleared and re-entered.
pub fn validate_duration_input(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }

    let colon_count = value.matches(':').count();
    if colon_count > 1 || !value.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return Err("Use hours:minutes format (for example 1:30)".to_string());
    }

    if let Some((hours, minutes)) = value.split_once(':') {
        let hours: u32 = hours.parse().unwrap_or(0);
        let minutes: u32 = minutes.parse().unwrap_or(0);

        if minutes > 59 {
            return Err("Minutes cannot exceed 59".to_string());
        }
        if hours > 24 {
            return Err("Hours cannot exceed 24".to_string());
        }
    }

    Ok(())
}

pub fn format_hhmm(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

/// `HH:00` of the hour a time string falls into.
pub fn to_base_time(time: &str) -> String {
    let hour: u32 = time
        .split(':')
        .next()
        .and_then(|part| part.trim().parse().ok())
        .unwrap_or(0);
    format_hhmm(hour, 0)
}

/// Short identifier of a weekday (`mon` .. `sun`).
pub fn day_id(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}
