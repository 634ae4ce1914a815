use std::time::Duration;

use layers::symbology::SeverityPalette;
use streaming::protocol::DisplaySide;
use streaming::sync::FetchMode;

/// Map bitmap dimensions in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl MapSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How a new map replaces the old one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionStyle {
    /// Renderer-provided frame sequence played through a ring of slots.
    Crossfade,
    /// Single destination map revealed by an animated clip region.
    Wipe,
}

impl TransitionStyle {
    pub fn fetch_mode(self) -> FetchMode {
        match self {
            TransitionStyle::Crossfade => FetchMode::FrameSequence,
            TransitionStyle::Wipe => FetchMode::SingleMap,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub side: DisplaySide,
    /// Countdown armed after every finished transition.
    pub rerender_timeout: Duration,
    /// Countdown armed on activation. Zero requests a map on the first frame.
    pub activation_delay: Duration,
    pub poll_delay: Duration,
    pub transition: TransitionStyle,
    pub wipe_duration: Duration,
    pub wipe_min_half_width: f64,
    /// Length of the sequence the renderer pre-renders for the crossfade.
    pub crossfade_duration: Duration,
    pub crossfade_fps: u32,
    pub crossfade_slots: usize,
    /// Opacity of preloaded slots; kept above zero so showing them does not pop.
    pub crossfade_hidden_opacity: f32,
    pub arc_map_size: MapSize,
    pub rose_map_size: MapSize,
    pub palette: SeverityPalette,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            side: DisplaySide::Left,
            rerender_timeout: Duration::from_millis(2500),
            activation_delay: Duration::ZERO,
            poll_delay: Duration::from_millis(200),
            transition: TransitionStyle::Wipe,
            wipe_duration: Duration::from_millis(5000),
            wipe_min_half_width: 20.0,
            crossfade_duration: Duration::from_millis(1500),
            crossfade_fps: 15,
            crossfade_slots: 5,
            crossfade_hidden_opacity: 0.01,
            arc_map_size: MapSize::new(756, 492),
            rose_map_size: MapSize::new(678, 500),
            palette: SeverityPalette::default(),
        }
    }
}

impl OverlayConfig {
    pub fn crossfade_frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.crossfade_fps.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{OverlayConfig, TransitionStyle};
    use std::time::Duration;
    use streaming::sync::FetchMode;

    #[test]
    fn style_selects_fetch_mode() {
        assert_eq!(TransitionStyle::Wipe.fetch_mode(), FetchMode::SingleMap);
        assert_eq!(TransitionStyle::Crossfade.fetch_mode(), FetchMode::FrameSequence);
    }

    #[test]
    fn frame_interval_never_divides_by_zero() {
        let mut cfg = OverlayConfig::default();
        assert_eq!(cfg.crossfade_frame_interval(), Duration::from_secs(1) / 15);
        cfg.crossfade_fps = 0;
        assert_eq!(cfg.crossfade_frame_interval(), Duration::from_secs(1));
    }
}
