//! Wire types for the external terrain renderer API.
//!
//! The renderer listens on local loopback and exposes:
//! - position and display-settings updates (client → renderer, fire-and-forget)
//! - the render trigger, readiness poll and result fetches (one render cycle)
//!
//! Bodies are camelCase JSON; map images travel as base64 text.

use base64::Engine as _;
use foundation::bitmap::Bitmap;
use foundation::elevation::{ELEVATION_NO_DATA, ElevationBand, ElevationBands};
use serde::{Deserialize, Serialize};

pub mod paths {
    pub const POSITION: &str = "/api/v1/terrain/position";
    pub const DISPLAY_SETTINGS: &str = "/api/v1/terrain/displaysettings";
    pub const RENDER_MAP: &str = "/api/v1/terrain/renderMap";
    pub const MAP_AVAILABLE: &str = "/api/v1/terrain/ndMapAvailable";
    pub const ND_MAP: &str = "/api/v1/terrain/ndmap";
    pub const ND_MAPS: &str = "/api/v1/terrain/ndmaps";
    pub const TERRAIN_RANGE: &str = "/api/v1/terrain/terrainRange";
}

/// Which navigation display a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplaySide {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl DisplaySide {
    pub fn as_query(self) -> &'static str {
        match self {
            DisplaySide::Left => "L",
            DisplaySide::Right => "R",
        }
    }

    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "L" | "l" => Some(DisplaySide::Left),
            "R" | "r" => Some(DisplaySide::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// True heading in degrees.
    pub heading: f64,
    /// Feet above mean sea level.
    pub altitude: f64,
    /// Feet per minute.
    pub vertical_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub active: bool,
    pub map_width: u32,
    pub map_height: u32,
    pub meter_per_pixel: u32,
    pub map_transition_time_seconds: f64,
    pub map_transition_fps: u32,
    pub arc_mode: bool,
    pub gear_down: bool,
}

/// Elevation metadata for one render job.
///
/// Missing bounds deserialize as `None`; both missing and the
/// [`ELEVATION_NO_DATA`] sentinel mean "no valid range".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainRange {
    #[serde(default)]
    pub min_elevation: Option<f64>,
    #[serde(default)]
    pub max_elevation: Option<f64>,
    #[serde(default)]
    pub min_elevation_is_warning: bool,
    #[serde(default)]
    pub min_elevation_is_caution: bool,
    #[serde(default)]
    pub max_elevation_is_warning: bool,
    #[serde(default)]
    pub max_elevation_is_caution: bool,
}

fn valid_bound(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != ELEVATION_NO_DATA)
}

impl TerrainRange {
    pub fn no_data() -> Self {
        Self {
            min_elevation: Some(ELEVATION_NO_DATA),
            max_elevation: Some(ELEVATION_NO_DATA),
            ..Self::default()
        }
    }

    /// Converts the metadata into readout bands.
    ///
    /// If either bound is invalid, both bands become "no data".
    pub fn bands(&self) -> ElevationBands {
        match (
            valid_bound(self.min_elevation),
            valid_bound(self.max_elevation),
        ) {
            (Some(min), Some(max)) => ElevationBands::new(
                ElevationBand::new(
                    min,
                    self.min_elevation_is_warning,
                    self.min_elevation_is_caution,
                ),
                ElevationBand::new(
                    max,
                    self.max_elevation_is_warning,
                    self.max_elevation_is_caution,
                ),
            ),
            _ => ElevationBands::no_data(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    NotAnInteger(String),
    Base64(String),
    Json(String),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::NotAnInteger(body) => write!(f, "expected integer token, got {body:?}"),
            WireError::Base64(msg) => write!(f, "invalid base64 map payload: {msg}"),
            WireError::Json(msg) => write!(f, "invalid json payload: {msg}"),
        }
    }
}

impl std::error::Error for WireError {}

/// Parses the `renderMap` body. Negative values are returned as-is; the
/// caller decides that they mean failure.
pub fn parse_render_token(body: &str) -> Result<i64, WireError> {
    let trimmed = body.trim().trim_matches('"');
    trimmed
        .parse::<i64>()
        .map_err(|_| WireError::NotAnInteger(trimmed.to_string()))
}

/// Anything other than `true` is "not ready yet".
pub fn parse_availability(body: &str) -> bool {
    body.trim().trim_matches('"').eq_ignore_ascii_case("true")
}

/// Decodes one base64 image, tolerating a JSON string wrapper and a
/// `data:` URL prefix.
pub fn decode_map(body: &str) -> Result<Bitmap, WireError> {
    let mut text = body.trim();
    if text.starts_with('"') {
        text = text.trim_matches('"');
    }
    if let Some((_, payload)) = text.split_once("base64,") {
        text = payload;
    }
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map(Bitmap::new)
        .map_err(|e| WireError::Base64(e.to_string()))
}

/// Decodes the JSON array of base64 frames served for the crossfade.
pub fn decode_map_frames(body: &str) -> Result<Vec<Bitmap>, WireError> {
    let frames: Vec<String> =
        serde_json::from_str(body).map_err(|e| WireError::Json(e.to_string()))?;
    frames.iter().map(|f| decode_map(f)).collect()
}

pub fn encode_map(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
