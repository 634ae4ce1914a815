//! One render cycle against the renderer: trigger, poll until ready, fetch.
//!
//! Cycles run as tokio tasks. Cancellation is cooperative: a cycle carries a
//! [`SessionGuard`] and checks it before every poll retry, before fetching
//! and before handing its outcome back. Nothing is aborted
//! mid-flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use foundation::bitmap::Bitmap;
use foundation::elevation::ElevationBands;
use foundation::ids::RenderToken;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{RendererError, TerrainRenderer};
use crate::protocol::DisplaySide;

/// Generation counter shared by a view and the cycles it spawned.
///
/// Every activation and every deactivation bumps the generation, so guards
/// handed out earlier stop being current.
#[derive(Debug, Clone, Default)]
pub struct ActivationEpoch(Arc<AtomicU64>);

impl ActivationEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> SessionGuard {
        let generation = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        SessionGuard {
            epoch: Arc::clone(&self.0),
            generation,
        }
    }

    pub fn end(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    epoch: Arc<AtomicU64>,
    generation: u64,
}

impl SessionGuard {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.generation
    }
}

/// Which map payload a cycle fetches.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// `ndmap`: one destination bitmap.
    SingleMap,
    /// `ndmaps`: the pre-rendered transition sequence.
    FrameSequence,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapPayload {
    Single(Bitmap),
    Frames(Vec<Bitmap>),
}

impl MapPayload {
    /// The bitmap that is fully visible once the transition ends.
    pub fn destination(&self) -> Option<&Bitmap> {
        match self {
            MapPayload::Single(map) => Some(map),
            MapPayload::Frames(frames) => frames.last(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub token: RenderToken,
    pub payload: MapPayload,
    pub bands: ElevationBands,
    pub poll_attempts: u32,
}

/// Why a cycle produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleAbandoned {
    InvalidToken(i64),
    Cancelled,
    Transport(RendererError),
}

impl std::fmt::Display for CycleAbandoned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleAbandoned::InvalidToken(raw) => write!(f, "renderer refused render ({raw})"),
            CycleAbandoned::Cancelled => write!(f, "overlay deactivated"),
            CycleAbandoned::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CycleAbandoned {}

impl From<RendererError> for CycleAbandoned {
    fn from(err: RendererError) -> Self {
        CycleAbandoned::Transport(err)
    }
}

pub type RenderOutcome = Result<RenderResult, CycleAbandoned>;

/// Drives render cycles for one display side.
pub struct RenderSyncClient {
    renderer: Arc<dyn TerrainRenderer>,
    side: DisplaySide,
    poll_delay: Duration,
    fetch_mode: FetchMode,
}

impl RenderSyncClient {
    pub fn new(
        renderer: Arc<dyn TerrainRenderer>,
        side: DisplaySide,
        poll_delay: Duration,
        fetch_mode: FetchMode,
    ) -> Self {
        Self {
            renderer,
            side,
            poll_delay,
            fetch_mode,
        }
    }

    /// Runs one full cycle. Never retries beyond the readiness poll.
    pub async fn run_cycle(&self, guard: &SessionGuard) -> RenderOutcome {
        let raw = self.renderer.trigger_render(self.side).await?;
        let token = RenderToken::from_wire(raw).ok_or(CycleAbandoned::InvalidToken(raw))?;
        debug!("render triggered for {:?}: token {token}", self.side);

        let poll_attempts = self.wait_until_ready(guard, token).await?;
        if !guard.is_current() {
            return Err(CycleAbandoned::Cancelled);
        }

        let (payload, range) = tokio::join!(
            self.fetch_payload(token),
            self.renderer.fetch_terrain_range(self.side, token)
        );
        let payload = payload?;
        let range = range?;
        if !guard.is_current() {
            return Err(CycleAbandoned::Cancelled);
        }

        Ok(RenderResult {
            token,
            payload,
            bands: range.bands(),
            poll_attempts,
        })
    }

    /// Polls after each `poll_delay` until the job is ready or the session
    /// ends. Returns the number of polls issued.
    async fn wait_until_ready(
        &self,
        guard: &SessionGuard,
        token: RenderToken,
    ) -> Result<u32, CycleAbandoned> {
        let mut attempts = 0u32;
        loop {
            tokio::time::sleep(self.poll_delay).await;
            if !guard.is_current() {
                return Err(CycleAbandoned::Cancelled);
            }
            attempts += 1;
            if self.renderer.is_map_available(self.side, token).await? {
                return Ok(attempts);
            }
        }
    }

    async fn fetch_payload(&self, token: RenderToken) -> Result<MapPayload, RendererError> {
        match self.fetch_mode {
            FetchMode::SingleMap => self
                .renderer
                .fetch_map(self.side, token)
                .await
                .map(MapPayload::Single),
            FetchMode::FrameSequence => self
                .renderer
                .fetch_map_frames(self.side, token)
                .await
                .map(MapPayload::Frames),
        }
    }

    /// Spawns a cycle on `handle`; the outcome is sent on `tx` only while the
    /// guard's session is still current.
    pub fn spawn_cycle(
        self: &Arc<Self>,
        handle: &Handle,
        guard: SessionGuard,
        tx: mpsc::UnboundedSender<RenderOutcome>,
    ) -> JoinHandle<()> {
        let client = Arc::clone(self);
        handle.spawn(async move {
            let outcome = client.run_cycle(&guard).await;
            match &outcome {
                Ok(result) => debug!(
                    "render {} ready after {} polls",
                    result.token, result.poll_attempts
                ),
                Err(CycleAbandoned::Cancelled) => {
                    debug!("render cycle stopped: overlay deactivated")
                }
                Err(CycleAbandoned::InvalidToken(raw)) => {
                    debug!("render cycle abandoned: invalid token {raw}")
                }
                Err(CycleAbandoned::Transport(err)) => warn!("render cycle dropped: {err}"),
            }
            if guard.is_current() {
                let _ = tx.send(outcome);
            }
        })
    }
}
