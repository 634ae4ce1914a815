//! Synthetic renderer state behind the HTTP routes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use foundation::elevation::ELEVATION_NO_DATA;
use streaming::protocol::{AircraftPosition, DisplaySettings, DisplaySide, TerrainRange};

/// Terrain within this height below the aircraft is shown as caution.
const CAUTION_MARGIN_FT: f64 = 2000.0;
/// Terrain within this height below the aircraft is shown as warning.
const WARNING_MARGIN_FT: f64 = 500.0;
/// Elevation spread a single map covers.
const MAP_RELIEF_FT: f64 = 1500.0;

#[derive(Debug, Clone)]
struct Job {
    requested_at: Instant,
    settings: DisplaySettings,
    range: TerrainRange,
}

#[derive(Debug, Default)]
struct Display {
    settings: Option<DisplaySettings>,
    jobs: HashMap<i64, Job>,
}

#[derive(Debug)]
pub struct RenderFarm {
    latency: Duration,
    position: Option<AircraftPosition>,
    displays: HashMap<DisplaySide, Display>,
    last_token: i64,
    /// Finished jobs kept per display for late fetches.
    retained_jobs: usize,
}

impl RenderFarm {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            position: None,
            displays: HashMap::new(),
            last_token: 0,
            retained_jobs: 4,
        }
    }

    pub fn update_position(&mut self, position: AircraftPosition) {
        self.position = Some(position);
    }

    pub fn update_settings(&mut self, side: DisplaySide, settings: DisplaySettings) {
        let display = self.displays.entry(side).or_default();
        if !settings.active {
            display.jobs.clear();
        }
        display.settings = Some(settings);
    }

    /// Starts a job and returns its token, or `-1` while the display has no
    /// active settings.
    pub fn trigger(&mut self, side: DisplaySide, now: Instant, wall_clock_ms: i64) -> i64 {
        let range = synthetic_range(self.position.as_ref());
        let display = self.displays.entry(side).or_default();
        let Some(settings) = display.settings.filter(|s| s.active) else {
            return -1;
        };

        let token = next_token(self.last_token, wall_clock_ms);
        self.last_token = token;
        display.jobs.insert(
            token,
            Job {
                requested_at: now,
                settings,
                range,
            },
        );
        while display.jobs.len() > self.retained_jobs {
            let Some(oldest) = display.jobs.keys().min().copied() else {
                break;
            };
            display.jobs.remove(&oldest);
        }
        token
    }

    pub fn is_ready(&self, side: DisplaySide, token: i64, now: Instant) -> bool {
        self.job(side, token)
            .is_some_and(|job| job_ready(job.requested_at, now, self.latency))
    }

    /// Destination map of a finished job.
    pub fn map(&self, side: DisplaySide, token: i64, now: Instant) -> Option<Vec<u8>> {
        let job = self.ready_job(side, token, now)?;
        let frames = frame_count(&job.settings);
        Some(synthetic_map(side, token, &job.settings, frames - 1))
    }

    /// Full transition sequence of a finished job, destination last.
    pub fn frames(&self, side: DisplaySide, token: i64, now: Instant) -> Option<Vec<Vec<u8>>> {
        let job = self.ready_job(side, token, now)?;
        let frames = (0..frame_count(&job.settings))
            .map(|i| synthetic_map(side, token, &job.settings, i))
            .collect();
        Some(frames)
    }

    pub fn range(&self, side: DisplaySide, token: i64) -> Option<TerrainRange> {
        self.job(side, token).map(|job| job.range)
    }

    fn job(&self, side: DisplaySide, token: i64) -> Option<&Job> {
        self.displays.get(&side)?.jobs.get(&token)
    }

    fn ready_job(&self, side: DisplaySide, token: i64, now: Instant) -> Option<&Job> {
        self.job(side, token)
            .filter(|job| job_ready(job.requested_at, now, self.latency))
    }
}

/// Tokens are wall-clock milliseconds, forced strictly increasing.
pub fn next_token(previous: i64, wall_clock_ms: i64) -> i64 {
    wall_clock_ms.max(previous + 1)
}

pub fn job_ready(requested_at: Instant, now: Instant, latency: Duration) -> bool {
    now.saturating_duration_since(requested_at) >= latency
}

/// Frames in the pre-rendered transition; never fewer than one.
pub fn frame_count(settings: &DisplaySettings) -> u32 {
    let frames = settings.map_transition_time_seconds * f64::from(settings.map_transition_fps);
    if frames.is_finite() && frames >= 1.0 {
        frames.round() as u32
    } else {
        1
    }
}

/// Ground elevation below a position: a smooth synthetic relief.
pub fn ground_elevation_ft(latitude: f64, longitude: f64) -> f64 {
    let relief = (latitude.to_radians() * 40.0).sin() * (longitude.to_radians() * 40.0).cos();
    (relief.abs() * 9000.0).floor()
}

/// Elevation bounds and alert flags for the area around `position`.
pub fn synthetic_range(position: Option<&AircraftPosition>) -> TerrainRange {
    let Some(position) = position else {
        return TerrainRange {
            min_elevation: Some(ELEVATION_NO_DATA),
            max_elevation: Some(ELEVATION_NO_DATA),
            ..TerrainRange::default()
        };
    };
    let min = ground_elevation_ft(position.latitude, position.longitude);
    let max = min + MAP_RELIEF_FT;
    let clearance = |elevation: f64| position.altitude - elevation;

    TerrainRange {
        min_elevation: Some(min),
        max_elevation: Some(max),
        min_elevation_is_warning: clearance(min) < WARNING_MARGIN_FT,
        min_elevation_is_caution: clearance(min) < CAUTION_MARGIN_FT,
        max_elevation_is_warning: clearance(max) < WARNING_MARGIN_FT,
        max_elevation_is_caution: clearance(max) < CAUTION_MARGIN_FT,
    }
}

/// Stand-in image bytes: a header naming the job, then one shade per row.
pub fn synthetic_map(side: DisplaySide, token: i64, settings: &DisplaySettings, frame: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(20 + settings.map_height as usize);
    bytes.extend_from_slice(side.as_query().as_bytes());
    bytes.extend_from_slice(&token.to_be_bytes());
    bytes.extend_from_slice(&frame.to_be_bytes());
    bytes.extend_from_slice(&(settings.map_width as u16).to_be_bytes());
    bytes.extend_from_slice(&(settings.map_height as u16).to_be_bytes());
    bytes.extend((0..settings.map_height).map(|row| (row.wrapping_add(frame * 16) % 256) as u8));
    bytes
}
