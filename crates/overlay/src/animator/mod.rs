//! Transition animations between the displayed map and a new one.
//!
//! Both strategies share one contract: `start` with the fetched payload,
//! `tick` once per host frame, and exactly one [`TransitionCompleted`] per
//! started transition.

pub mod crossfade;
pub mod wipe;

pub use crossfade::*;
pub use wipe::*;

use std::time::Duration;

use layers::raster::MapLayer;
use streaming::sync::MapPayload;

use crate::config::{MapSize, OverlayConfig, TransitionStyle};

/// Returned by [`TransitionAnimator::tick`] exactly once per transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransitionCompleted;

pub trait TransitionAnimator: Send {
    /// Starts a transition, replacing any transition still running.
    fn start(&mut self, payload: &MapPayload, size: MapSize);

    /// Advances by one host frame.
    fn tick(&mut self, dt: Duration) -> Option<TransitionCompleted>;

    fn is_active(&self) -> bool;

    /// Layers drawn over the displayed map while active, bottom first.
    fn layers(&self) -> Vec<MapLayer>;

    /// Stops without completing.
    fn cancel(&mut self);
}

pub fn animator_for(config: &OverlayConfig) -> Box<dyn TransitionAnimator> {
    match config.transition {
        TransitionStyle::Crossfade => Box::new(CrossfadeAnimator::new(
            config.crossfade_frame_interval(),
            config.crossfade_slots,
            config.crossfade_hidden_opacity,
        )),
        TransitionStyle::Wipe => Box::new(WipeAnimator::new(
            config.wipe_duration,
            config.wipe_min_half_width,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::bitmap::Bitmap;

    fn run_to_completion(animator: &mut dyn TransitionAnimator, dt: Duration) -> usize {
        let mut completions = 0;
        for _ in 0..10_000 {
            if animator.tick(dt).is_some() {
                completions += 1;
            }
        }
        completions
    }

    #[test]
    fn both_strategies_complete_exactly_once() {
        for style in [TransitionStyle::Crossfade, TransitionStyle::Wipe] {
            let config = OverlayConfig {
                transition: style,
                ..OverlayConfig::default()
            };
            let mut animator = animator_for(&config);
            let frames: Vec<Bitmap> = (0..8u8).map(|i| Bitmap::new(vec![i])).collect();
            animator.start(&MapPayload::Frames(frames), config.arc_map_size);
            assert!(animator.is_active());

            let completions = run_to_completion(animator.as_mut(), Duration::from_millis(16));
            assert_eq!(completions, 1, "{style:?}");
            assert!(!animator.is_active());
        }
    }

    #[test]
    fn idle_animator_never_completes() {
        let mut animator = animator_for(&OverlayConfig::default());
        assert_eq!(run_to_completion(animator.as_mut(), Duration::from_millis(16)), 0);
        assert!(animator.layers().is_empty());
    }
}
