use std::time::Duration;

use stagectl_core::{frame_duration, BarChange};
use tokio::time::{sleep_until, Instant};

/// Absolute-deadline frame clock.
///
/// Deadlines are accumulated from the start instant, so time spent writing a
/// frame does not push later frames back.
#[derive(Debug)]
pub struct FrameClock {
    deadline: Instant,
    frame_duration: Duration,
}

impl FrameClock {
    /// Start now with the tempo of the given bar change
    pub fn start(bar_change: &BarChange) -> Self {
        Self {
            deadline: Instant::now(),
            frame_duration: frame_duration(bar_change),
        }
    }

    /// Switch tempo for the current and following frames
    pub fn set_bar_change(&mut self, bar_change: &BarChange) {
        self.frame_duration = frame_duration(bar_change);
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Sleep until the current frame is due
    pub async fn wait(&self) {
        sleep_until(self.deadline).await;
    }

    /// Move the deadline to the next frame
    pub fn advance(&mut self) {
        self.deadline += self.frame_duration;
    }

    /// How far behind schedule the clock currently is
    pub fn lag(&self) -> Duration {
        Instant::now().saturating_duration_since(self.deadline)
    }
}
