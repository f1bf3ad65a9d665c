use std::time::{Duration, Instant};

/// Cancellable one-shot timer. Every `arm` pushes the deadline out again, so
/// only the last input inside the window fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    armed: bool,
    /// `None` while armed means the window is too long to ever elapse.
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: false,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn arm(&mut self, now: Instant) {
        self.armed = true;
        self.deadline = now.checked_add(self.window);
    }

    pub fn cancel(&mut self) {
        self.armed = false;
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarms and returns `true` once the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.armed && now >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.arm(start);
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(299)));
        assert!(debouncer.fire_if_due(start + Duration::from_millis(300)));
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn rearming_restarts_the_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.arm(start);
        debouncer.arm(start + Duration::from_millis(200));
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(400)));
        assert!(debouncer.fire_if_due(start + Duration::from_millis(500)));
    }

    #[test]
    fn cancel_disarms() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.arm(start);
        debouncer.cancel();
        assert!(!debouncer.is_armed());
        assert!(!debouncer.fire_if_due(start + Duration::from_secs(1)));
    }

    #[test]
    fn unbounded_window_stays_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::MAX);
        debouncer.arm(start);
        assert!(debouncer.is_armed());
        assert_eq!(debouncer.deadline(), None);
        assert!(!debouncer.fire_if_due(start + Duration::from_secs(3600)));
        debouncer.cancel();
        assert!(!debouncer.is_armed());
    }
}
