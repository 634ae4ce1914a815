use foundation::elevation::Severity;

/// RGBA colors used for severity-coded readout values.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SeverityPalette {
    pub normal: [f32; 4],
    pub caution: [f32; 4],
    pub warning: [f32; 4],
    pub no_data: [f32; 4],
}

impl SeverityPalette {
    pub const fn new(
        normal: [f32; 4],
        caution: [f32; 4],
        warning: [f32; 4],
        no_data: [f32; 4],
    ) -> Self {
        Self {
            normal,
            caution,
            warning,
            no_data,
        }
    }

    pub fn color(&self, severity: Severity) -> [f32; 4] {
        match severity {
            Severity::Normal => self.normal,
            Severity::Caution => self.caution,
            Severity::Warning => self.warning,
            Severity::NoData => self.no_data,
        }
    }
}

impl Default for SeverityPalette {
    fn default() -> Self {
        // Navigation display green / amber / red; no data is transparent.
        Self::new(
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 0.6, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0, 0.0],
        )
    }
}
