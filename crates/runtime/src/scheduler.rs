use std::time::Duration;

/// Emitted once each time the countdown runs out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderRequested;

/// Countdown that decides when the next map render is due.
///
/// `countdown == None` means no render is pending. The scheduler is owned by
/// one overlay session and disarmed when the overlay goes inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderScheduler {
    timeout: Duration,
    countdown: Option<Duration>,
}

impl RenderScheduler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            countdown: None,
        }
    }

    /// Arms the countdown with the full re-render timeout.
    pub fn arm(&mut self) {
        self.countdown = Some(self.timeout);
    }

    /// Arms the countdown with an explicit delay; zero fires on the next tick.
    pub fn arm_with(&mut self, delay: Duration) {
        self.countdown = Some(delay);
    }

    pub fn disarm(&mut self) {
        self.countdown = None;
    }

    pub fn is_armed(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.countdown
    }

    /// Advances the countdown by `dt`.
    ///
    /// Returns `Some` exactly once per expiry; the countdown is cleared at the
    /// same time so a later tick stays silent until re-armed.
    pub fn tick(&mut self, dt: Duration) -> Option<RenderRequested> {
        let remaining = self.countdown?.saturating_sub(dt);
        if remaining.is_zero() {
            self.countdown = None;
            return Some(RenderRequested);
        }
        self.countdown = Some(remaining);
        None
    }
}
