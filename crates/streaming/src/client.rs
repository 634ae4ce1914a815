//! The seam between the overlay and the external terrain renderer.
//!
//! `TerrainRenderer` is the only way the overlay talks to the renderer. The
//! production implementation is [`HttpTerrainRenderer`]; tests and offline
//! hosts use [`crate::scripted::ScriptedRenderer`].

use std::future::Future;
use std::pin::Pin;

use foundation::bitmap::Bitmap;
use foundation::ids::RenderToken;
use tracing::debug;

use crate::protocol::{
    AircraftPosition, DisplaySettings, DisplaySide, TerrainRange, WireError, decode_map,
    decode_map_frames, parse_availability, parse_render_token, paths,
};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Renderer call failures. None of these are fatal to the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    Transport(String),
    Status { path: &'static str, status: u16 },
    Decode(String),
}

impl std::fmt::Display for RendererError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererError::Transport(msg) => write!(f, "renderer unreachable: {msg}"),
            RendererError::Status { path, status } => {
                write!(f, "renderer returned {status} for {path}")
            }
            RendererError::Decode(msg) => write!(f, "renderer payload rejected: {msg}"),
        }
    }
}

impl std::error::Error for RendererError {}

impl From<WireError> for RendererError {
    fn from(err: WireError) -> Self {
        RendererError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for RendererError {
    fn from(err: reqwest::Error) -> Self {
        RendererError::Transport(err.to_string())
    }
}

/// Calls the overlay makes against the renderer.
///
/// Methods return boxed futures so the trait stays dyn-compatible.
pub trait TerrainRenderer: Send + Sync {
    fn update_position(&self, position: AircraftPosition) -> BoxFuture<'_, Result<(), RendererError>>;

    fn push_display_settings(
        &self,
        side: DisplaySide,
        settings: DisplaySettings,
    ) -> BoxFuture<'_, Result<(), RendererError>>;

    /// Returns the raw wire token; negative means the renderer refused.
    fn trigger_render(&self, side: DisplaySide) -> BoxFuture<'_, Result<i64, RendererError>>;

    fn is_map_available(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<bool, RendererError>>;

    fn fetch_map(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<Bitmap, RendererError>>;

    /// The pre-rendered transition sequence, last frame being the new map.
    fn fetch_map_frames(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<Vec<Bitmap>, RendererError>>;

    fn fetch_terrain_range(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<TerrainRange, RendererError>>;
}

/// Where the renderer listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererEndpoint {
    pub base_url: String,
}

impl RendererEndpoint {
    pub const DEFAULT_URL: &'static str = "http://127.0.0.1:8380";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for RendererEndpoint {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL)
    }
}

pub struct HttpTerrainRenderer {
    http: reqwest::Client,
    endpoint: RendererEndpoint,
}

impl HttpTerrainRenderer {
    pub fn new(endpoint: RendererEndpoint) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: RendererEndpoint) -> Self {
        Self { http, endpoint }
    }

    async fn get_text(
        &self,
        path: &'static str,
        side: DisplaySide,
        token: Option<RenderToken>,
    ) -> Result<String, RendererError> {
        let mut req = self
            .http
            .get(self.endpoint.url(path))
            .query(&[("display", side.as_query())]);
        if let Some(token) = token {
            req = req.query(&[("timestamp", token.to_string())]);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(RendererError::Status {
                path,
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    fn check_status(path: &'static str, resp: &reqwest::Response) -> Result<(), RendererError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RendererError::Status {
                path,
                status: resp.status().as_u16(),
            })
        }
    }
}

impl TerrainRenderer for HttpTerrainRenderer {
    fn update_position(&self, position: AircraftPosition) -> BoxFuture<'_, Result<(), RendererError>> {
        Box::pin(async move {
            let resp = self
                .http
                .patch(self.endpoint.url(paths::POSITION))
                .json(&position)
                .send()
                .await?;
            Self::check_status(paths::POSITION, &resp)
        })
    }

    fn push_display_settings(
        &self,
        side: DisplaySide,
        settings: DisplaySettings,
    ) -> BoxFuture<'_, Result<(), RendererError>> {
        Box::pin(async move {
            let resp = self
                .http
                .put(self.endpoint.url(paths::DISPLAY_SETTINGS))
                .query(&[("display", side.as_query())])
                .json(&settings)
                .send()
                .await?;
            Self::check_status(paths::DISPLAY_SETTINGS, &resp)
        })
    }

    fn trigger_render(&self, side: DisplaySide) -> BoxFuture<'_, Result<i64, RendererError>> {
        Box::pin(async move {
            let body = self.get_text(paths::RENDER_MAP, side, None).await?;
            Ok(parse_render_token(&body)?)
        })
    }

    fn is_map_available(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<bool, RendererError>> {
        Box::pin(async move {
            let body = self
                .get_text(paths::MAP_AVAILABLE, side, Some(token))
                .await?;
            Ok(parse_availability(&body))
        })
    }

    fn fetch_map(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<Bitmap, RendererError>> {
        Box::pin(async move {
            let body = self.get_text(paths::ND_MAP, side, Some(token)).await?;
            let map = decode_map(&body)?;
            debug!("fetched map for token {token}: {} bytes", map.len());
            Ok(map)
        })
    }

    fn fetch_map_frames(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<Vec<Bitmap>, RendererError>> {
        Box::pin(async move {
            let body = self.get_text(paths::ND_MAPS, side, Some(token)).await?;
            let frames = decode_map_frames(&body)?;
            debug!("fetched {} transition frames for token {token}", frames.len());
            Ok(frames)
        })
    }

    fn fetch_terrain_range(
        &self,
        side: DisplaySide,
        token: RenderToken,
    ) -> BoxFuture<'_, Result<TerrainRange, RendererError>> {
        Box::pin(async move {
            let body = self
                .get_text(paths::TERRAIN_RANGE, side, Some(token))
                .await?;
            serde_json::from_str(&body).map_err(|e| RendererError::Decode(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RendererEndpoint, RendererError};
    use crate::protocol::{WireError, paths};

    #[test]
    fn endpoint_joins_paths_without_double_slash() {
        let ep = RendererEndpoint::new("http://127.0.0.1:8380/");
        assert_eq!(
            ep.url(paths::RENDER_MAP),
            "http://127.0.0.1:8380/api/v1/terrain/renderMap"
        );
        assert_eq!(RendererEndpoint::default().base_url, "http://127.0.0.1:8380");
    }

    #[test]
    fn wire_errors_become_decode_errors() {
        let err: RendererError = WireError::NotAnInteger("busy".into()).into();
        assert!(matches!(err, RendererError::Decode(_)));
        assert_eq!(
            RendererError::Status { path: paths::ND_MAP, status: 404 }.to_string(),
            "renderer returned 404 for /api/v1/terrain/ndmap"
        );
    }
}
