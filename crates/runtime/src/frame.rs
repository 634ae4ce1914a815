use std::time::Duration;

use foundation::time::Time;

/// Per-frame metadata delivered by the host tick.
///
/// The host guarantees no interval, only that `time` never goes backwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Time elapsed since the previous frame.
    pub dt: Duration,
    /// Overlay time at the end of this frame.
    pub time: Time,
}

impl Frame {
    pub fn first(dt: Duration) -> Self {
        Self {
            index: 0,
            dt,
            time: Time::ZERO.advanced_by(dt),
        }
    }

    pub fn next(self, dt: Duration) -> Self {
        Self {
            index: self.index + 1,
            dt,
            time: self.time.advanced_by(dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;
    use std::time::Duration;

    #[test]
    fn next_accumulates_variable_deltas() {
        let f0 = Frame::first(Duration::from_millis(500));
        let f1 = f0.next(Duration::from_millis(250));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(0.75));
        assert_eq!(f1.dt, Duration::from_millis(250));
    }
}
