use std::time::Duration;

use foundation::bitmap::Bitmap;
use layers::raster::{ClipPath, MapLayer};
use streaming::sync::MapPayload;

use super::{TransitionAnimator, TransitionCompleted};
use crate::config::MapSize;

/// Clip region of the wipe at progress `ratio = elapsed / duration`.
///
/// - up to 0.5: a chevron from the bottom-centre apex to the top edge,
///   widening from `min_half_width` to the full half width;
/// - up to 1.0: the top band grows down to `(ratio - 0.5) * 2` of the height,
///   still closing at the bottom-centre apex;
/// - from 1.0: exactly the full map rectangle.
///
/// The revealed area never shrinks as `ratio` grows.
pub fn wipe_shape(ratio: f64, size: MapSize, min_half_width: f64) -> ClipPath {
    let w = size.width as f64;
    let h = size.height as f64;
    let cx = w / 2.0;

    if ratio >= 1.0 {
        return ClipPath::rect(w, h);
    }

    if ratio <= 0.5 {
        let t = (ratio / 0.5).clamp(0.0, 1.0);
        let floor = min_half_width.clamp(0.0, cx);
        let half = floor + (cx - floor) * t;
        return ClipPath::polygon(vec![[cx, h], [cx - half, 0.0], [cx + half, 0.0]]);
    }

    let y = h * ((ratio - 0.5) * 2.0).clamp(0.0, 1.0);
    ClipPath::polygon(vec![[0.0, 0.0], [w, 0.0], [w, y], [cx, h], [0.0, y]])
}

/// Reveals the destination map through an animated clip region.
#[derive(Debug)]
pub struct WipeAnimator {
    duration: Duration,
    min_half_width: f64,
    size: MapSize,
    destination: Option<Bitmap>,
    elapsed: Duration,
    clip: Option<ClipPath>,
    active: bool,
}

impl WipeAnimator {
    pub fn new(duration: Duration, min_half_width: f64) -> Self {
        Self {
            duration,
            min_half_width,
            size: MapSize::new(0, 0),
            destination: None,
            elapsed: Duration::ZERO,
            clip: None,
            active: false,
        }
    }

    pub fn clip(&self) -> Option<&ClipPath> {
        self.clip.as_ref()
    }

    fn ratio(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
    }

    fn finish(&mut self) -> Option<TransitionCompleted> {
        self.active = false;
        self.destination = None;
        Some(TransitionCompleted)
    }
}

impl TransitionAnimator for WipeAnimator {
    fn start(&mut self, payload: &MapPayload, size: MapSize) {
        self.size = size;
        self.destination = payload.destination().cloned();
        self.elapsed = Duration::ZERO;
        self.clip = Some(wipe_shape(0.0, size, self.min_half_width));
        self.active = true;
    }

    fn tick(&mut self, dt: Duration) -> Option<TransitionCompleted> {
        if !self.active {
            return None;
        }
        if self.destination.is_none() {
            return self.finish();
        }

        self.elapsed += dt;
        let ratio = self.ratio();
        let shape = wipe_shape(ratio, self.size, self.min_half_width);

        if ratio >= 1.0 {
            if self.clip.as_ref() == Some(&shape) {
                return None;
            }
            self.clip = Some(shape);
            return self.finish();
        }

        // Rounded coordinates can repeat the previous description although
        // progress was made; the marker keeps successive descriptions apart.
        let shape = match &self.clip {
            Some(prev) if prev.path() == shape.path() => shape.with_marker(),
            _ => shape,
        };
        self.clip = Some(shape);
        None
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn layers(&self) -> Vec<MapLayer> {
        match (&self.destination, &self.clip) {
            (Some(map), Some(clip)) if self.active => {
                vec![MapLayer::clipped(map.clone(), clip.clone())]
            }
            _ => Vec::new(),
        }
    }

    fn cancel(&mut self) {
        self.active = false;
        self.destination = None;
        self.clip = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: MapSize = MapSize::new(756, 492);
    const DURATION: Duration = Duration::from_millis(5000);

    fn started() -> WipeAnimator {
        let mut a = WipeAnimator::new(DURATION, 20.0);
        a.start(&MapPayload::Single(Bitmap::new(vec![7u8])), SIZE);
        a
    }

    #[test]
    fn revealed_area_never_shrinks() {
        let mut prev = 0.0;
        for step in 0..=1200 {
            let ratio = step as f64 / 1000.0;
            let area = wipe_shape(ratio, SIZE, 20.0).area();
            assert!(area + 1e-6 >= prev, "area shrank at ratio {ratio}: {prev} -> {area}");
            prev = area;
        }
        assert_eq!(prev, 756.0 * 492.0);
    }

    #[test]
    fn chevron_starts_at_minimum_width_and_opens_fully_at_half() {
        let start = wipe_shape(0.0, SIZE, 20.0);
        assert_eq!(start.points(), &[[378.0, 492.0], [358.0, 0.0], [398.0, 0.0]]);

        let half = wipe_shape(0.5, SIZE, 20.0);
        assert_eq!(half.points(), &[[378.0, 492.0], [0.0, 0.0], [756.0, 0.0]]);
        assert_eq!(half.area(), 756.0 * 492.0 / 2.0);
    }

    #[test]
    fn second_stage_grows_down_from_the_top() {
        let shape = wipe_shape(0.75, SIZE, 20.0);
        assert_eq!(
            shape.points(),
            &[[0.0, 0.0], [756.0, 0.0], [756.0, 246.0], [378.0, 492.0], [0.0, 246.0]]
        );
    }

    #[test]
    fn final_shape_is_exactly_the_full_rectangle() {
        let mut a = started();
        let mut completions = 0;
        for _ in 0..400 {
            if a.tick(Duration::from_millis(16)).is_some() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(a.clip(), Some(&ClipPath::rect(756.0, 492.0)));
        assert!(!a.is_active());
        assert!(a.layers().is_empty());
    }

    #[test]
    fn overshooting_frame_completes_immediately() {
        let mut a = started();
        assert_eq!(a.tick(Duration::from_secs(60)), Some(TransitionCompleted));
        assert_eq!(a.tick(Duration::from_secs(60)), None);
    }

    #[test]
    fn successive_descriptions_differ_even_without_visible_change() {
        let mut a = started();
        let mut prev = a.clip().unwrap().path().to_string();
        for _ in 0..50 {
            // 1 ms steps move the chevron by well under a pixel.
            a.tick(Duration::from_millis(1));
            let path = a.clip().unwrap().path().to_string();
            assert_ne!(path, prev);
            prev = path;
        }
    }

    #[test]
    fn marker_does_not_change_geometry() {
        let mut a = started();
        a.tick(Duration::from_millis(1));
        let clip = a.clip().unwrap().clone();
        assert!(clip.has_marker());
        assert_eq!(clip.points(), wipe_shape(0.001 / 5.0, SIZE, 20.0).points());
    }

    #[test]
    fn layers_clip_the_destination_while_running() {
        let mut a = started();
        a.tick(Duration::from_millis(1000));
        let layers = a.layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].bitmap, Bitmap::new(vec![7u8]));
        assert!(layers[0].clip.is_some());
    }

    #[test]
    fn missing_destination_completes_on_first_tick() {
        let mut a = WipeAnimator::new(DURATION, 20.0);
        a.start(&MapPayload::Frames(Vec::new()), SIZE);
        assert_eq!(a.tick(Duration::ZERO), Some(TransitionCompleted));
    }
}
