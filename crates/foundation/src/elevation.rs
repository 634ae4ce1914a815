/// Altitude reported by the renderer when it has no terrain range.
pub const ELEVATION_NO_DATA: f64 = 32767.0;

/// Severity of terrain relative to the aircraft.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    Normal,
    Caution,
    Warning,
    /// No valid elevation; nothing is displayed.
    #[default]
    NoData,
}

impl Severity {
    /// Warning wins over caution, caution over normal.
    pub fn from_flags(is_warning: bool, is_caution: bool) -> Self {
        if is_warning {
            Severity::Warning
        } else if is_caution {
            Severity::Caution
        } else {
            Severity::Normal
        }
    }
}

/// A minimum or maximum terrain altitude with its severity.
///
/// `altitude` is `+inf` exactly when `severity` is [`Severity::NoData`];
/// the constructors are the only way to build one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ElevationBand {
    altitude: f64,
    severity: Severity,
}

impl ElevationBand {
    pub fn new(altitude_ft: f64, is_warning: bool, is_caution: bool) -> Self {
        if !altitude_ft.is_finite() {
            return Self::no_data();
        }
        Self {
            altitude: altitude_ft,
            severity: Severity::from_flags(is_warning, is_caution),
        }
    }

    pub const fn no_data() -> Self {
        Self {
            altitude: f64::INFINITY,
            severity: Severity::NoData,
        }
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn has_data(&self) -> bool {
        self.severity != Severity::NoData
    }
}

impl Default for ElevationBand {
    fn default() -> Self {
        Self::no_data()
    }
}

/// The lower and upper bound shown in the readout.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ElevationBands {
    pub min: ElevationBand,
    pub max: ElevationBand,
}

impl ElevationBands {
    pub fn new(min: ElevationBand, max: ElevationBand) -> Self {
        Self { min, max }
    }

    pub const fn no_data() -> Self {
        Self {
            min: ElevationBand::no_data(),
            max: ElevationBand::no_data(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ElevationBand, Severity};

    #[test]
    fn warning_takes_precedence() {
        assert_eq!(Severity::from_flags(true, true), Severity::Warning);
        assert_eq!(Severity::from_flags(true, false), Severity::Warning);
        assert_eq!(Severity::from_flags(false, true), Severity::Caution);
        assert_eq!(Severity::from_flags(false, false), Severity::Normal);
    }

    #[test]
    fn infinite_altitude_means_no_data() {
        let band = ElevationBand::new(f64::INFINITY, true, false);
        assert_eq!(band.severity(), Severity::NoData);
        assert!(!band.has_data());

        let nan = ElevationBand::new(f64::NAN, false, true);
        assert_eq!(nan, ElevationBand::no_data());

        let ok = ElevationBand::new(500.0, false, false);
        assert_eq!(ok.altitude(), 500.0);
        assert!(ok.has_data());
    }
}
