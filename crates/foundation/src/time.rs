use std::time::Duration;

/// Overlay time in seconds, accumulated from host frame deltas.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64); // seconds

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn advanced_by(self, dt: Duration) -> Self {
        Time(self.0 + dt.as_secs_f64())
    }

    /// Saturates at zero when `earlier` is actually later.
    pub fn elapsed_since(self, earlier: Time) -> Duration {
        Duration::from_secs_f64((self.0 - earlier.0).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::Time;
    use std::time::Duration;

    #[test]
    fn advances_by_frame_delta() {
        let t = Time::ZERO.advanced_by(Duration::from_millis(250));
        assert_eq!(t, Time(0.25));
        assert_eq!(t.elapsed_since(Time::ZERO), Duration::from_millis(250));
    }

    #[test]
    fn elapsed_never_negative() {
        assert_eq!(Time(1.0).elapsed_since(Time(2.0)), Duration::ZERO);
    }
}
