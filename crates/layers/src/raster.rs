use std::fmt::Write as _;

use foundation::bitmap::Bitmap;

/// Closed polygon in map pixel space (origin top-left, y down).
///
/// `path` is the SVG-style description handed to the drawing leaf. It can
/// carry a trailing no-op marker so two equal polygons still compare as
/// distinct descriptions; the marker never changes the drawn geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    points: Vec<[f64; 2]>,
    path: String,
}

const PATH_MARKER: &str = " Z";

impl ClipPath {
    pub fn polygon(points: Vec<[f64; 2]>) -> Self {
        let mut path = String::new();
        for (i, [x, y]) in points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                path.push(' ');
            }
            let _ = write!(path, "{cmd}{x:.0},{y:.0}");
        }
        path.push_str(" Z");
        Self { points, path }
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self::polygon(vec![[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]])
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn has_marker(&self) -> bool {
        self.path.ends_with(" Z Z")
    }

    /// Same geometry, description extended by a trailing close command.
    pub fn with_marker(mut self) -> Self {
        self.path.push_str(PATH_MARKER);
        self
    }

    /// Shoelace area in square pixels.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let [x0, y0] = self.points[i];
                let [x1, y1] = self.points[(i + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        twice.abs() / 2.0
    }
}

/// One bitmap in the layered overlay graphic.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub bitmap: Bitmap,
    /// 0.0 transparent .. 1.0 opaque.
    pub opacity: f32,
    pub clip: Option<ClipPath>,
}

impl MapLayer {
    pub fn opaque(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            opacity: 1.0,
            clip: None,
        }
    }

    pub fn with_opacity(bitmap: Bitmap, opacity: f32) -> Self {
        Self {
            bitmap,
            opacity: opacity.clamp(0.0, 1.0),
            clip: None,
        }
    }

    pub fn clipped(bitmap: Bitmap, clip: ClipPath) -> Self {
        Self {
            bitmap,
            opacity: 1.0,
            clip: Some(clip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClipPath;

    #[test]
    fn rect_path_and_area() {
        let r = ClipPath::rect(756.0, 492.0);
        assert_eq!(r.path(), "M0,0 L756,0 L756,492 L0,492 Z");
        assert_eq!(r.area(), 756.0 * 492.0);
    }

    #[test]
    fn marker_keeps_geometry() {
        let tri = ClipPath::polygon(vec![[10.0, 100.0], [0.0, 0.0], [20.0, 0.0]]);
        let marked = tri.clone().with_marker();
        assert_ne!(marked.path(), tri.path());
        assert_eq!(marked.points(), tri.points());
        assert_eq!(marked.area(), tri.area());
        assert!(marked.has_marker());
        assert!(!tri.has_marker());
    }

    #[test]
    fn degenerate_polygon_has_no_area() {
        assert_eq!(ClipPath::polygon(vec![[0.0, 0.0], [5.0, 5.0]]).area(), 0.0);
    }
}
