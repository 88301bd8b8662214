//! Trailing-edge debounce driven by the frame loop.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restart the wait; repeated triggers keep pushing the deadline out.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once after the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending deadline, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(150));

        debouncer.trigger(start);
        assert!(!debouncer.poll(start + Duration::from_millis(100)));
        assert!(debouncer.poll(start + Duration::from_millis(150)));
        assert!(!debouncer.poll(start + Duration::from_millis(300)));
    }

    #[test]
    fn test_retrigger_extends_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(150));

        debouncer.trigger(start);
        debouncer.trigger(start + Duration::from_millis(100));
        assert!(!debouncer.poll(start + Duration::from_millis(200)));
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(200)),
            Some(Duration::from_millis(50))
        );
        assert!(debouncer.poll(start + Duration::from_millis(250)));
    }
}
