//! Terrain overlay for the navigation display.
//!
//! Requests terrain maps from the external renderer, double-buffers them in
//! an immutable [`MapVisualizationState`] snapshot and animates each new map
//! in with one of two [`TransitionAnimator`] strategies.

pub mod animator;
pub mod config;
pub mod inputs;
pub mod state;
pub mod view;

pub use animator::*;
pub use config::*;
pub use inputs::*;
pub use state::*;
pub use view::*;
