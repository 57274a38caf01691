// ▶️ Playback - auto-advance the year window on a fixed tick

use crate::filter::YearRange;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    running: bool,
    period: Duration,
    step: i32,
}

impl Playback {
    pub fn new(period: Duration) -> Self {
        Playback {
            running: false,
            period,
            step: 1,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Play/Stop button
    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Next window for a timer tick, or `None` when stopped.
    ///
    /// Both bounds advance by one year; once either bound reaches the upper
    /// limit the window is clamped there and playback stops itself.
    pub fn tick(&mut self, current: YearRange) -> Option<YearRange> {
        if !self.running {
            return None;
        }
        let next = current.shifted(self.step);
        if next.at_upper_bound() {
            self.running = false;
        }
        Some(next)
    }
}

impl Default for Playback {
    fn default() -> Self {
        Playback::new(Duration::from_millis(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::MAX_YEAR;

    #[test]
    fn test_stopped_playback_does_nothing() {
        let mut playback = Playback::default();
        assert_eq!(playback.tick(YearRange::default()), None);
    }

    #[test]
    fn test_tick_advances_both_bounds() {
        let mut playback = Playback::default();
        playback.toggle();
        let next = playback.tick(YearRange::new(100, 200).unwrap()).unwrap();
        assert_eq!((next.from(), next.to()), (101, 201));
        assert!(playback.is_running());
    }

    #[test]
    fn test_stops_at_upper_bound() {
        let mut playback = Playback::default();
        playback.toggle();

        let mut range = YearRange::new(2000, 2020).unwrap();
        let mut ticks = 0;
        while let Some(next) = playback.tick(range) {
            range = next;
            ticks += 1;
            assert!(range.to() <= MAX_YEAR);
        }

        assert_eq!(ticks, 4);
        assert_eq!((range.from(), range.to()), (2004, MAX_YEAR));
        assert!(!playback.is_running());
    }

    #[test]
    fn test_cancel_mid_run() {
        let mut playback = Playback::default();
        playback.toggle();
        let range = playback.tick(YearRange::new(0, 10).unwrap()).unwrap();
        playback.stop();
        assert_eq!(playback.tick(range), None);
        assert_eq!((range.from(), range.to()), (1, 11));
    }
}
