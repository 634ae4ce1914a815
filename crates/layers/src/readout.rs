use foundation::elevation::{ElevationBand, ElevationBands, Severity};

use crate::symbology::SeverityPalette;

pub const READOUT_LABEL: &str = "TERR";

/// One boxed value of the elevation readout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadoutValue {
    /// Hundreds of feet, zero-padded to three digits; `None` without data.
    pub digits: Option<String>,
    pub severity: Severity,
    pub color: [f32; 4],
    pub boxed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationReadout {
    pub label: &'static str,
    pub lower: ReadoutValue,
    pub upper: ReadoutValue,
}

/// Three zero-padded digits; below sea level the sign precedes them.
fn hundreds(value: i64) -> String {
    if value < 0 {
        format!("-{:03}", value.unsigned_abs())
    } else {
        format!("{value:03}")
    }
}

/// Lower bound: rounded down to the hundred below.
pub fn lower_bound_digits(altitude_ft: f64) -> String {
    hundreds((altitude_ft / 100.0).floor() as i64)
}

/// Upper bound: rounded up to the hundred above.
pub fn upper_bound_digits(altitude_ft: f64) -> String {
    hundreds((altitude_ft / 100.0).ceil() as i64)
}

fn value(band: &ElevationBand, digits: fn(f64) -> String, palette: &SeverityPalette) -> ReadoutValue {
    ReadoutValue {
        digits: band.has_data().then(|| digits(band.altitude())),
        severity: band.severity(),
        color: palette.color(band.severity()),
        boxed: true,
    }
}

impl ElevationReadout {
    pub fn from_bands(bands: &ElevationBands, palette: &SeverityPalette) -> Self {
        Self {
            label: READOUT_LABEL,
            lower: value(&bands.min, lower_bound_digits, palette),
            upper: value(&bands.max, upper_bound_digits, palette),
        }
    }

    pub fn has_data(&self) -> bool {
        self.lower.digits.is_some() && self.upper.digits.is_some()
    }
}
