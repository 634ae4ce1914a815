use std::time::Duration;

use foundation::bitmap::Bitmap;
use foundation::elevation::ElevationBands;
use foundation::ids::RenderToken;
use foundation::time::Time;

/// Immutable snapshot of what the overlay holds and shows.
///
/// Never mutated in place: every update below returns a new snapshot derived
/// from `self`, and the view publishes it with a single assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct MapVisualizationState {
    /// Newest map received; fading in while a transition runs.
    pub current_map: Option<Bitmap>,
    /// Map fully visible on screen; drawn underneath during a transition.
    pub last_map: Option<Bitmap>,
    /// Render job `current_map` came from.
    pub current_token: Option<RenderToken>,
    pub transition_in_progress: bool,
    pub transition_started_at: Option<Time>,
    pub current_elevation_bands: ElevationBands,
    /// Bands of `last_map`; this pair is the displayed readout.
    pub last_elevation_bands: ElevationBands,
    /// `None` while no render is pending.
    pub rerender_countdown: Option<Duration>,
}

/// Why a render result was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleResult {
    TransitionInProgress,
    NotNewer {
        token: RenderToken,
        current: RenderToken,
    },
}

impl std::fmt::Display for StaleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleResult::TransitionInProgress => write!(f, "a transition is already running"),
            StaleResult::NotNewer { token, current } => {
                write!(f, "token {token} is not newer than {current}")
            }
        }
    }
}

impl std::error::Error for StaleResult {}

impl Default for MapVisualizationState {
    fn default() -> Self {
        Self::initial()
    }
}

impl MapVisualizationState {
    /// State of a freshly activated overlay.
    pub fn initial() -> Self {
        Self {
            current_map: None,
            last_map: None,
            current_token: None,
            transition_in_progress: false,
            transition_started_at: None,
            current_elevation_bands: ElevationBands::no_data(),
            last_elevation_bands: ElevationBands::no_data(),
            rerender_countdown: None,
        }
    }

    pub fn with_countdown(&self, countdown: Option<Duration>) -> Self {
        Self {
            rerender_countdown: countdown,
            ..self.clone()
        }
    }

    /// Accepts a freshly fetched map and starts its transition.
    ///
    /// Rejected while another transition runs or when `token` is not newer
    /// than the token of the map already held.
    pub fn begin_transition(
        &self,
        token: RenderToken,
        map: Bitmap,
        bands: ElevationBands,
        now: Time,
    ) -> Result<Self, StaleResult> {
        if self.transition_in_progress {
            return Err(StaleResult::TransitionInProgress);
        }
        if let Some(current) = self.current_token
            && !token.is_newer_than(Some(current))
        {
            return Err(StaleResult::NotNewer { token, current });
        }
        Ok(Self {
            current_map: Some(map),
            current_token: Some(token),
            transition_in_progress: true,
            transition_started_at: Some(now),
            current_elevation_bands: bands,
            ..self.clone()
        })
    }

    /// Promotes the current map and bands to the displayed ones.
    ///
    /// Map and readout move together, so the readout never describes a map
    /// that is still fading in.
    pub fn finish_transition(&self) -> Self {
        if !self.transition_in_progress {
            return self.clone();
        }
        Self {
            last_map: self.current_map.clone(),
            last_elevation_bands: self.current_elevation_bands,
            transition_in_progress: false,
            transition_started_at: None,
            ..self.clone()
        }
    }

    pub fn displayed_map(&self) -> Option<&Bitmap> {
        self.last_map.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::elevation::ElevationBand;
    use pretty_assertions::assert_eq;

    fn bands(min: f64, max: f64) -> ElevationBands {
        ElevationBands::new(
            ElevationBand::new(min, false, false),
            ElevationBand::new(max, false, true),
        )
    }

    fn map(tag: u8) -> Bitmap {
        Bitmap::new(vec![tag])
    }

    #[test]
    fn updates_return_new_snapshots() {
        let s0 = MapVisualizationState::initial();
        let s1 = s0
            .begin_transition(RenderToken::new(7), map(1), bands(500.0, 9500.0), Time(0.1))
            .unwrap();
        assert_eq!(s0, MapVisualizationState::initial());
        assert!(s1.transition_in_progress);
        assert_eq!(s1.transition_started_at, Some(Time(0.1)));
        assert_eq!(s1.current_token, Some(RenderToken::new(7)));
    }

    #[test]
    fn readout_is_promoted_only_when_transition_finishes() {
        let s1 = MapVisualizationState::initial()
            .begin_transition(RenderToken::new(1), map(1), bands(500.0, 9500.0), Time(0.0))
            .unwrap();
        assert_eq!(s1.last_elevation_bands, ElevationBands::no_data());
        assert_eq!(s1.last_map, None);

        let s2 = s1.finish_transition();
        assert!(!s2.transition_in_progress);
        assert_eq!(s2.transition_started_at, None);
        assert_eq!(s2.last_elevation_bands, bands(500.0, 9500.0));
        assert!(s2.last_map.as_ref().unwrap().same_buffer(s2.current_map.as_ref().unwrap()));
    }

    #[test]
    fn previous_map_stays_displayed_during_next_transition() {
        let shown = MapVisualizationState::initial()
            .begin_transition(RenderToken::new(1), map(1), bands(0.0, 100.0), Time(0.0))
            .unwrap()
            .finish_transition();
        let next = shown
            .begin_transition(RenderToken::new(2), map(2), bands(200.0, 300.0), Time(3.0))
            .unwrap();
        assert_eq!(next.displayed_map(), Some(&map(1)));
        assert_eq!(next.last_elevation_bands, bands(0.0, 100.0));
        assert_eq!(next.current_map, Some(map(2)));
    }

    #[test]
    fn finishing_twice_is_a_no_op() {
        let done = MapVisualizationState::initial()
            .begin_transition(RenderToken::new(1), map(1), bands(0.0, 100.0), Time(0.0))
            .unwrap()
            .finish_transition();
        assert_eq!(done.finish_transition(), done);
    }

    #[test]
    fn rejects_results_while_transitioning() {
        let s1 = MapVisualizationState::initial()
            .begin_transition(RenderToken::new(1), map(1), bands(0.0, 1.0), Time(0.0))
            .unwrap();
        let err = s1
            .begin_transition(RenderToken::new(2), map(2), bands(0.0, 1.0), Time(0.5))
            .unwrap_err();
        assert_eq!(err, StaleResult::TransitionInProgress);
    }

    #[test]
    fn rejects_late_results_from_older_render_jobs() {
        let s = MapVisualizationState::initial()
            .begin_transition(RenderToken::new(9), map(9), bands(0.0, 1.0), Time(0.0))
            .unwrap()
            .finish_transition();
        for old in [RenderToken::new(3), RenderToken::new(9)] {
            let err = s
                .begin_transition(old, map(3), bands(0.0, 1.0), Time(1.0))
                .unwrap_err();
            assert_eq!(
                err,
                StaleResult::NotNewer {
                    token: old,
                    current: RenderToken::new(9)
                }
            );
        }
    }

    #[test]
    fn countdown_is_copied_forward() {
        let s = MapVisualizationState::initial().with_countdown(Some(Duration::from_secs(2)));
        let t = s
            .begin_transition(RenderToken::new(1), map(1), bands(0.0, 1.0), Time(0.0))
            .unwrap();
        assert_eq!(t.rerender_countdown, Some(Duration::from_secs(2)));
    }
}
