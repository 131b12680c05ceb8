use std::time::{Duration, Instant};

const FALLBACK_MILLIHERTZ: u32 = 60_000;

/// What the event loop should do about a paced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Idle,
    Due,
    WaitUntil(Instant),
}

/// Holds frame requests back to the display refresh interval when nothing
/// presents to the window (and so no vsync blocks the loop).
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    due: Option<Instant>,
}

impl FramePacer {
    /// Interval from a monitor refresh rate, 60 Hz when unknown or zero.
    pub fn from_refresh_rate(millihertz: Option<u32>) -> Self {
        let millihertz = millihertz
            .filter(|&mhz| mhz > 0)
            .unwrap_or(FALLBACK_MILLIHERTZ);
        Self {
            interval: Duration::from_secs_f64(1000.0 / millihertz as f64),
            due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Make a frame due one interval after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    /// A due frame is reported once, then the pacer is idle again.
    pub fn poll(&mut self, now: Instant) -> Pace {
        match self.due {
            None => Pace::Idle,
            Some(due) if now >= due => {
                self.due = None;
                Pace::Due
            }
            Some(due) => Pace::WaitUntil(due),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_follows_refresh_rate() {
        let pacer = FramePacer::from_refresh_rate(Some(144_000));
        assert!((pacer.interval().as_secs_f64() - 1.0 / 144.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_refresh_rate_falls_back_to_60hz() {
        for rate in [None, Some(0)] {
            let pacer = FramePacer::from_refresh_rate(rate);
            assert!((pacer.interval().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn frames_wait_for_the_interval() {
        let mut pacer = FramePacer::from_refresh_rate(None);
        let start = Instant::now();
        assert_eq!(pacer.poll(start), Pace::Idle);

        pacer.schedule(start);
        let due = start + pacer.interval();
        assert_eq!(pacer.poll(start), Pace::WaitUntil(due));
        assert_eq!(pacer.poll(due), Pace::Due);
        assert_eq!(pacer.poll(due), Pace::Idle);
    }

    #[test]
    fn back_to_back_requests_are_not_delivered_immediately() {
        let mut pacer = FramePacer::from_refresh_rate(Some(60_000));
        let start = Instant::now();
        let mut now = start;
        let mut delivered = 0;
        // Simulate a loop that re-requests as soon as a frame is delivered.
        pacer.schedule(now);
        for _ in 0..1000 {
            match pacer.poll(now) {
                Pace::Due => {
                    delivered += 1;
                    pacer.schedule(now);
                }
                Pace::WaitUntil(t) => now = t,
                Pace::Idle => break,
            }
        }
        let elapsed = now - start;
        assert!(delivered as f64 <= elapsed.as_secs_f64() * 60.0 + 1.0);
    }

    #[test]
    fn cancel_clears_pending_frame() {
        let mut pacer = FramePacer::from_refresh_rate(None);
        let now = Instant::now();
        pacer.schedule(now);
        pacer.cancel();
        assert_eq!(pacer.poll(now + Duration::from_secs(1)), Pace::Idle);
    }
}
