use streaming::protocol::DisplaySettings;

use crate::config::{MapSize, OverlayConfig};

const METERS_PER_NM: f64 = 1852.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    Arc,
    RoseNav,
    RoseIls,
    RoseVor,
    Plan,
}

impl DisplayMode {
    pub fn shows_terrain(self) -> bool {
        !matches!(self, DisplayMode::Plan)
    }

    pub fn is_arc(self) -> bool {
        matches!(self, DisplayMode::Arc)
    }
}

/// Externally sourced inputs the overlay reacts to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DisplayInputs {
    /// Terrain display selected by the crew for this side.
    pub active: bool,
    pub mode: DisplayMode,
    pub range_nm: f64,
    pub gear_down: bool,
}

impl Default for DisplayInputs {
    fn default() -> Self {
        Self {
            active: false,
            mode: DisplayMode::Arc,
            range_nm: 20.0,
            gear_down: false,
        }
    }
}

impl DisplayInputs {
    /// Whether a terrain overlay should exist at all.
    pub fn overlay_active(&self) -> bool {
        self.active && self.mode.shows_terrain() && self.range_nm > 0.0
    }

    pub fn map_size(&self, config: &OverlayConfig) -> MapSize {
        if self.mode.is_arc() {
            config.arc_map_size
        } else {
            config.rose_map_size
        }
    }

    /// ARC spans the range over the full map height, ROSE over half of it.
    pub fn meter_per_pixel(&self, config: &OverlayConfig) -> u32 {
        let size = self.map_size(config);
        let pixels = if self.mode.is_arc() {
            size.height as f64
        } else {
            size.height as f64 / 2.0
        };
        if pixels <= 0.0 {
            return 0;
        }
        (self.range_nm * METERS_PER_NM / pixels).round().max(0.0) as u32
    }

    pub fn display_settings(&self, config: &OverlayConfig) -> DisplaySettings {
        let size = self.map_size(config);
        DisplaySettings {
            active: self.overlay_active(),
            map_width: size.width,
            map_height: size.height,
            meter_per_pixel: self.meter_per_pixel(config),
            map_transition_time_seconds: config.crossfade_duration.as_secs_f64(),
            map_transition_fps: config.crossfade_fps,
            arc_mode: self.mode.is_arc(),
            gear_down: self.gear_down,
        }
    }
}
