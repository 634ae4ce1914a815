use std::time::Duration;

use foundation::bitmap::Bitmap;
use layers::raster::MapLayer;
use streaming::sync::MapPayload;

use super::{TransitionAnimator, TransitionCompleted};
use crate::config::MapSize;

/// Bitmap assigned to one display slot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SlotAssignment {
    /// Position in the frame sequence.
    pub frame: usize,
    pub opacity: f32,
}

/// Plays a renderer-provided frame sequence through a fixed ring of slots.
///
/// The frame at the logical index is fully opaque; the following frames are
/// already loaded into the other slots at a barely visible opacity so that
/// promoting them next tick does not flicker. Frames advance at a fixed rate
/// independent of the host frame rate.
#[derive(Debug)]
pub struct CrossfadeAnimator {
    frame_interval: Duration,
    slot_count: usize,
    hidden_opacity: f32,
    frames: Vec<Bitmap>,
    index: usize,
    since_last_frame: Duration,
    active: bool,
}

impl CrossfadeAnimator {
    pub fn new(frame_interval: Duration, slot_count: usize, hidden_opacity: f32) -> Self {
        Self {
            frame_interval,
            slot_count: slot_count.max(1),
            hidden_opacity,
            frames: Vec::new(),
            index: 0,
            since_last_frame: Duration::ZERO,
            active: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Slot `(index + i) % slots` holds frame `index + i`; frames past the
    /// end of the sequence leave their slot empty.
    pub fn slot_assignments(&self) -> Vec<Option<SlotAssignment>> {
        let mut slots = vec![None; self.slot_count];
        if !self.active {
            return slots;
        }
        for i in 0..self.slot_count {
            let frame = self.index + i;
            if frame >= self.frames.len() {
                break;
            }
            let opacity = if i == 0 { 1.0 } else { self.hidden_opacity };
            slots[frame % self.slot_count] = Some(SlotAssignment { frame, opacity });
        }
        slots
    }

    fn finish(&mut self) -> Option<TransitionCompleted> {
        self.active = false;
        self.frames.clear();
        Some(TransitionCompleted)
    }
}

impl TransitionAnimator for CrossfadeAnimator {
    fn start(&mut self, payload: &MapPayload, _size: MapSize) {
        self.frames = match payload {
            MapPayload::Frames(frames) => frames.clone(),
            MapPayload::Single(map) => vec![map.clone()],
        };
        self.index = 0;
        self.since_last_frame = Duration::ZERO;
        self.active = true;
    }

    fn tick(&mut self, dt: Duration) -> Option<TransitionCompleted> {
        if !self.active {
            return None;
        }
        if self.index + 1 >= self.frames.len() {
            return self.finish();
        }

        self.since_last_frame += dt;
        while self.since_last_frame >= self.frame_interval {
            self.since_last_frame -= self.frame_interval;
            self.index += 1;
            if self.index + 1 >= self.frames.len() {
                return self.finish();
            }
            if self.frame_interval.is_zero() {
                break;
            }
        }
        None
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn layers(&self) -> Vec<MapLayer> {
        self.slot_assignments()
            .into_iter()
            .flatten()
            .map(|slot| MapLayer::with_opacity(self.frames[slot.frame].clone(), slot.opacity))
            .collect()
    }

    fn cancel(&mut self) {
        self.active = false;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INTERVAL: Duration = Duration::from_millis(50);

    fn frames(n: u8) -> MapPayload {
        MapPayload::Frames((0..n).map(|i| Bitmap::new(vec![i])).collect())
    }

    fn started(n: u8) -> CrossfadeAnimator {
        let mut a = CrossfadeAnimator::new(INTERVAL, 5, 0.01);
        a.start(&frames(n), MapSize::new(10, 10));
        a
    }

    #[test]
    fn preloads_following_frames_into_ring() {
        let a = started(10);
        assert_eq!(
            a.slot_assignments(),
            vec![
                Some(SlotAssignment { frame: 0, opacity: 1.0 }),
                Some(SlotAssignment { frame: 1, opacity: 0.01 }),
                Some(SlotAssignment { frame: 2, opacity: 0.01 }),
                Some(SlotAssignment { frame: 3, opacity: 0.01 }),
                Some(SlotAssignment { frame: 4, opacity: 0.01 }),
            ]
        );
    }

    #[test]
    fn ring_wraps_as_index_advances() {
        let mut a = started(10);
        for _ in 0..3 {
            assert_eq!(a.tick(INTERVAL), None);
        }
        assert_eq!(a.index(), 3);
        let slots = a.slot_assignments();
        assert_eq!(slots[3], Some(SlotAssignment { frame: 3, opacity: 1.0 }));
        assert_eq!(slots[0], Some(SlotAssignment { frame: 5, opacity: 0.01 }));
        assert_eq!(slots[2], Some(SlotAssignment { frame: 7, opacity: 0.01 }));
    }

    #[test]
    fn slots_past_the_sequence_are_suppressed() {
        let mut a = started(6);
        for _ in 0..3 {
            a.tick(INTERVAL);
        }
        // index 3: frames 3, 4, 5 exist; two slots stay empty.
        let filled: Vec<usize> = a
            .slot_assignments()
            .into_iter()
            .flatten()
            .map(|s| s.frame)
            .collect();
        assert_eq!(filled.len(), 3);
        assert!(filled.iter().all(|f| *f < 6));
        assert_eq!(a.layers().len(), 3);
    }

    #[test]
    fn advances_at_its_own_rate() {
        let mut a = started(10);
        // Four 16 ms host frames are one 50 ms animation frame.
        for _ in 0..3 {
            a.tick(Duration::from_millis(16));
        }
        assert_eq!(a.index(), 0);
        a.tick(Duration::from_millis(16));
        assert_eq!(a.index(), 1);
    }

    #[test]
    fn each_frame_is_opaque_at_most_once_and_completion_fires_once() {
        let mut a = started(8);
        let mut opaque_frames = Vec::new();
        let mut completions = 0;
        for _ in 0..100 {
            if let Some(slot) = a.slot_assignments().into_iter().flatten().find(|s| s.opacity == 1.0) {
                if opaque_frames.last() != Some(&slot.frame) {
                    opaque_frames.push(slot.frame);
                }
            }
            if a.tick(INTERVAL).is_some() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(opaque_frames, (0..7).collect::<Vec<_>>());
        assert!(!a.is_active());
    }

    #[test]
    fn large_host_delta_skips_ahead_but_completes_once() {
        let mut a = started(8);
        assert_eq!(a.tick(Duration::from_secs(10)), Some(TransitionCompleted));
        assert_eq!(a.tick(Duration::from_secs(10)), None);
    }

    #[test]
    fn single_frame_completes_on_first_tick() {
        let mut a = CrossfadeAnimator::new(INTERVAL, 5, 0.01);
        a.start(&MapPayload::Single(Bitmap::new(vec![1u8])), MapSize::new(1, 1));
        assert_eq!(a.tick(Duration::ZERO), Some(TransitionCompleted));
        assert!(a.layers().is_empty());
    }

    #[test]
    fn cancel_stops_without_completion() {
        let mut a = started(8);
        a.cancel();
        assert_eq!(a.tick(Duration::from_secs(1)), None);
        assert!(a.slot_assignments().iter().all(Option::is_none));
    }
}
