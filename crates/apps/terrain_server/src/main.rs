mod render_farm;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, put};
use axum::{Json, Router};
use clap::Parser;
use parking_lot::Mutex;
use serde::Deserialize;
use streaming::protocol::{encode_map, paths, AircraftPosition, DisplaySettings, DisplaySide};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::render_farm::RenderFarm;

#[derive(Parser, Debug)]
#[command(author, version, about = "Development stand-in for the terrain map renderer")]
struct Args {
    /// Listen address
    #[arg(long, env = "TERRAIN_ADDR", default_value = "127.0.0.1:8380")]
    addr: SocketAddr,

    /// Time a render job takes before ndMapAvailable reports true
    #[arg(long, default_value_t = 600)]
    latency_ms: u64,
}

#[derive(Clone)]
struct AppState {
    farm: Arc<Mutex<RenderFarm>>,
}

#[derive(Debug, Deserialize)]
struct DisplayQuery {
    display: DisplaySide,
}

#[derive(Debug, Deserialize)]
struct JobQuery {
    display: DisplaySide,
    timestamp: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let state = AppState {
        farm: Arc::new(Mutex::new(RenderFarm::new(Duration::from_millis(
            args.latency_ms,
        )))),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route(paths::POSITION, patch(update_position))
        .route(paths::DISPLAY_SETTINGS, put(update_settings))
        .route(paths::RENDER_MAP, get(render_map))
        .route(paths::MAP_AVAILABLE, get(map_available))
        .route(paths::ND_MAP, get(nd_map))
        .route(paths::ND_MAPS, get(nd_maps))
        .route(paths::TERRAIN_RANGE, get(terrain_range))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("terrain renderer listening on http://{}", args.addr);
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn update_position(
    State(state): State<AppState>,
    Json(position): Json<AircraftPosition>,
) -> StatusCode {
    state.farm.lock().update_position(position);
    StatusCode::OK
}

async fn update_settings(
    State(state): State<AppState>,
    Query(query): Query<DisplayQuery>,
    Json(settings): Json<DisplaySettings>,
) -> StatusCode {
    debug!("display {:?} settings: {settings:?}", query.display);
    state.farm.lock().update_settings(query.display, settings);
    StatusCode::OK
}

async fn render_map(State(state): State<AppState>, Query(query): Query<DisplayQuery>) -> String {
    let token = state
        .farm
        .lock()
        .trigger(query.display, Instant::now(), wall_clock_ms());
    debug!("render requested for {:?}: {token}", query.display);
    token.to_string()
}

async fn map_available(State(state): State<AppState>, Query(query): Query<JobQuery>) -> String {
    let ready = state
        .farm
        .lock()
        .is_ready(query.display, query.timestamp, Instant::now());
    ready.to_string()
}

async fn nd_map(State(state): State<AppState>, Query(query): Query<JobQuery>) -> Response {
    let map = state
        .farm
        .lock()
        .map(query.display, query.timestamp, Instant::now());
    match map {
        Some(bytes) => (StatusCode::OK, encode_map(&bytes)).into_response(),
        None => (StatusCode::NOT_FOUND, "no such map").into_response(),
    }
}

async fn nd_maps(State(state): State<AppState>, Query(query): Query<JobQuery>) -> Response {
    let frames = state
        .farm
        .lock()
        .frames(query.display, query.timestamp, Instant::now());
    match frames {
        Some(frames) => {
            let encoded: Vec<String> = frames.iter().map(|f| encode_map(f)).collect();
            Json(encoded).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such map").into_response(),
    }
}

async fn terrain_range(State(state): State<AppState>, Query(query): Query<JobQuery>) -> Response {
    let range = state.farm.lock().range(query.display, query.timestamp);
    match range {
        Some(range) => Json(range).into_response(),
        None => (StatusCode::NOT_FOUND, "no such job").into_response(),
    }
}
