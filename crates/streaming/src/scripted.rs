//! In-process renderer with scripted answers.
//!
//! Used by tests and by hosts running without the external renderer. Every
//! call is recorded so callers can assert on the protocol that was driven.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use foundation::bitmap::Bitmap;
use foundation::ids::RenderToken;
use parking_lot::Mutex;

use crate::client::{BoxFuture, RendererError, TerrainRenderer};
use crate::protocol::{AircraftPosition, DisplaySettings, DisplaySide, TerrainRange};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScriptCalls {
    pub triggers: u32,
    pub polls: u32,
    pub map_fetches: u32,
    pub frame_fetches: u32,
    pub range_fetches: u32,
    pub positions: Vec<AircraftPosition>,
    pub settings: Vec<(DisplaySide, DisplaySettings)>,
}

#[derive(Debug)]
struct Script {
    tokens: VecDeque<i64>,
    next_token: i64,
    not_ready_polls: u32,
    remaining_not_ready: HashMap<RenderToken, u32>,
    frames_per_map: usize,
    range: TerrainRange,
    latency: Duration,
    unreachable: bool,
    calls: ScriptCalls,
}

#[derive(Debug)]
pub struct ScriptedRenderer {
    script: Mutex<Script>,
}

impl Default for ScriptedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                tokens: VecDeque::new(),
                next_token: 1,
                not_ready_polls: 0,
                remaining_not_ready: HashMap::new(),
                frames_per_map: 6,
                range: TerrainRange::no_data(),
                latency: Duration::ZERO,
                unreachable: false,
                calls: ScriptCalls::default(),
            }),
        }
    }

    /// Wire tokens handed out by `renderMap`, in order. Once exhausted the
    /// renderer counts up from the last positive one.
    pub fn with_tokens(self, tokens: impl IntoIterator<Item = i64>) -> Self {
        {
            let mut s = self.script.lock();
            s.tokens = tokens.into_iter().collect();
            if let Some(max) = s.tokens.iter().copied().max() {
                s.next_token = s.next_token.max(max + 1);
            }
        }
        self
    }

    /// Number of `false` answers before each job reports ready.
    pub fn with_not_ready_polls(self, polls: u32) -> Self {
        self.script.lock().not_ready_polls = polls;
        self
    }

    pub fn with_range(self, range: TerrainRange) -> Self {
        self.set_range(range);
        self
    }

    pub fn with_frames_per_map(self, frames: usize) -> Self {
        self.script.lock().frames_per_map = frames;
        self
    }

    /// Delay applied to every call.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.script.lock().latency = latency;
        self
    }

    pub fn set_range(&self, range: TerrainRange) {
        self.script.lock().range = range;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.script.lock().unreachable = unreachable;
    }

    pub fn calls(&self) -> ScriptCalls {
        self.script.lock().calls.clone()
    }

    /// The single map served for `token`.
    pub fn map_for(token: RenderToken) -> Bitmap {
        Bitmap::new(token.get().to_be_bytes().to_vec())
    }

    /// Frame `index` of the transition sequence served for `token`.
    pub fn frame_for(token: RenderToken, index: usize) -> Bitmap {
        let mut bytes = token.get().to_be_bytes().to_vec();
        bytes.extend_from_slice(&(index as u32).to_be_bytes());
        Bitmap::new(bytes)
    }

    async fn answer<T>(
        &self,
        record: impl FnOnce(&mut Script) -> T,
    ) -> Result<T, RendererError> {
        let latency = self.script.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let mut s = self.script.lock();
        if s.unreachable {
            return Err(RendererError::Transport("connection refused".to_string()));
        }
        Ok(record(&mut s))
    }
}

impl TerrainRenderer for ScriptedRenderer {
    fn update_position(&self, position: AircraftPosition) -> BoxFuture<'_, Result<(), RendererError>> {
        Box::pin(self.answer(move |s| s.calls.positions.push(position)))
    }

    fn push_display_settings(
        &self,
        side: DisplaySide,
        settings: DisplaySettings,
    ) -> BoxFuture<'_, Result<(), RendererError>> {
        Box::pin(self.answer(move |s| s.calls.settings.push((side, settings))))
    }

    fn trigger_render(&self, _side: DisplaySide) -> BoxFuture<'_, Result<i64, RendererError>> {
        Box::pin(self.answer(|s| {
            s.calls.triggers += 1;
            let raw = s.tokens.pop_front().unwrap_or_else(|| {
                let t = s.next_token;
                s.next_token += 1;
                t
            });
            if let Some(token) = RenderToken::from_wire(raw) {
                let polls = s.not_ready_polls;
                s.remaining_not_ready.insert(token, polls);
            }
            raw
        }))
    }

    fn is_map_available(
        &self,
        _side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<bool, RendererError>> {
        Box::pin(self.answer(move |s| {
            s.calls.polls += 1;
            match s.remaining_not_ready.get_mut(&token) {
                Some(0) => true,
                Some(left) => {
                    *left -= 1;
                    false
                }
                None => false,
            }
        }))
    }

    fn fetch_map(
        &self,
        _side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<Bitmap, RendererError>> {
        Box::pin(self.answer(move |s| {
            s.calls.map_fetches += 1;
            Self::map_for(token)
        }))
    }

    fn fetch_map_frames(
        &self,
        _side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<Vec<Bitmap>, RendererError>> {
        Box::pin(self.answer(move |s| {
            s.calls.frame_fetches += 1;
            (0..s.frames_per_map)
                .map(|i| Self::frame_for(token, i))
                .collect()
        }))
    }

    fn fetch_terrain_range(
        &self,
        _side: DisplaySide,
        _token: RenderToken,
    ) -> BoxFuture<'_, Result<TerrainRange, RendererError>> {
        Box::pin(self.answer(|s| {
            s.calls.range_fetches += 1;
            s.range
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::ScriptedRenderer;
    use crate::client::{RendererError, TerrainRenderer};
    use crate::protocol::DisplaySide;
    use foundation::ids::RenderToken;

    #[tokio::test]
    async fn job_becomes_ready_after_scripted_polls() {
        let r = ScriptedRenderer::new()
            .with_tokens([7])
            .with_not_ready_polls(2);
        let raw = r.trigger_render(DisplaySide::Left).await.unwrap();
        assert_eq!(raw, 7);

        let token = RenderToken::new(7);
        assert!(!r.is_map_available(DisplaySide::Left, token).await.unwrap());
        assert!(!r.is_map_available(DisplaySide::Left, token).await.unwrap());
        assert!(r.is_map_available(DisplaySide::Left, token).await.unwrap());
        assert_eq!(r.calls().polls, 3);

        let next = r.trigger_render(DisplaySide::Left).await.unwrap();
        assert_eq!(next, 8);
    }

    #[tokio::test]
    async fn unknown_token_is_never_ready() {
        let r = ScriptedRenderer::new();
        let ready = r
            .is_map_available(DisplaySide::Right, RenderToken::new(99))
            .await
            .unwrap();
        assert!(!ready);
    }

    #[tokio::test]
    async fn unreachable_renderer_fails_with_transport_error() {
        let r = ScriptedRenderer::new();
        r.set_unreachable(true);
        let err = r.trigger_render(DisplaySide::Left).await.unwrap_err();
        assert!(matches!(err, RendererError::Transport(_)));
        assert_eq!(r.calls().triggers, 0);
    }

    #[tokio::test]
    async fn frames_are_distinct_per_index() {
        let r = ScriptedRenderer::new().with_frames_per_map(3);
        let frames = r
            .fetch_map_frames(DisplaySide::Left, RenderToken::new(4))
            .await
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert_ne!(frames[0], frames[1]);
        assert_eq!(frames[2], ScriptedRenderer::frame_for(RenderToken::new(4), 2));
    }
}
