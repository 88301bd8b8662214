use std::fmt::Display;
use std::thread;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Run `request` up to `max_retries` times, doubling `delay` after each
/// failure. The error of the last attempt is returned.
pub fn retry_request<T, E, F>(mut request: F, max_retries: u32, delay: Duration) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = max_retries.max(1);
    let mut delay = delay;
    let mut attempt = 1;

    loop {
        match request() {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                log::warn!(
                    "Attempt {} failed, retrying in {}ms: {}",
                    attempt,
                    delay.as_millis(),
                    err
                );
                thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_first_success() {
        let mut calls = 0;
        let result: Result<u32, String> = retry_request(
            || {
                calls += 1;
                if calls < 2 {
                    Err("boom".to_string())
                } else {
                    Ok(7)
                }
            },
            3,
            Duration::from_millis(1),
        );

        assert_eq!(result, Ok(7));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_returns_last_error_after_all_attempts() {
        let mut calls = 0;
        let result: Result<(), String> = retry_request(
            || {
                calls += 1;
                Err(format!("failure {}", calls))
            },
            3,
            Duration::from_millis(1),
        );

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_zero_retries_still_runs_once() {
        let mut calls = 0;
        let _: Result<(), &str> = retry_request(
            || {
                calls += 1;
                Err("nope")
            },
            0,
            Duration::ZERO,
        );
        assert_eq!(calls, 1);
    }
}
