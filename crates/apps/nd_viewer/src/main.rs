//! Headless navigation-display host for the terrain overlay.
//!
//! Drives a `TerrainMapView` at a fixed frame rate against the renderer at
//! `TERRAIN_RENDERER_URL` (or an in-process scripted renderer with
//! `--offline`), forwards a synthetic aircraft position and logs every
//! change of the elevation readout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use layers::readout::{ElevationReadout, ReadoutValue};
use overlay::config::{OverlayConfig, TransitionStyle};
use overlay::inputs::{DisplayInputs, DisplayMode};
use overlay::view::TerrainMapView;
use streaming::client::{HttpTerrainRenderer, RendererEndpoint, TerrainRenderer};
use streaming::protocol::{AircraftPosition, DisplaySide, TerrainRange};
use streaming::scripted::ScriptedRenderer;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless terrain overlay host")]
struct Args {
    /// Base URL of the terrain renderer
    #[arg(long, env = "TERRAIN_RENDERER_URL", default_value = RendererEndpoint::DEFAULT_URL)]
    renderer_url: String,

    /// Display side: L or R
    #[arg(long, default_value = "L", value_parser = parse_side)]
    side: DisplaySide,

    #[arg(long, value_enum, default_value_t = Style::Wipe)]
    style: Style,

    #[arg(long, value_enum, default_value_t = Mode::Arc)]
    mode: Mode,

    /// Display range in nautical miles
    #[arg(long, default_value_t = 20.0)]
    range_nm: f64,

    /// Host frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    seconds: Option<u64>,

    /// Use an in-process scripted renderer instead of HTTP
    #[arg(long)]
    offline: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Style {
    Wipe,
    Crossfade,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Arc,
    Rose,
    Plan,
}

fn parse_side(value: &str) -> Result<DisplaySide, String> {
    DisplaySide::from_query(value).ok_or_else(|| format!("unknown display side {value:?}"))
}

impl From<Style> for TransitionStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Wipe => TransitionStyle::Wipe,
            Style::Crossfade => TransitionStyle::Crossfade,
        }
    }
}

impl From<Mode> for DisplayMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Arc => DisplayMode::Arc,
            Mode::Rose => DisplayMode::RoseNav,
            Mode::Plan => DisplayMode::Plan,
        }
    }
}

const POSITION_INTERVAL: Duration = Duration::from_secs(1);

/// A slow descending orbit south of Innsbruck.
fn synthetic_position(elapsed: Duration) -> AircraftPosition {
    let t = elapsed.as_secs_f64();
    let angle = (t / 240.0) * std::f64::consts::TAU;
    AircraftPosition {
        latitude: 47.20 + 0.15 * angle.sin(),
        longitude: 11.40 + 0.22 * angle.cos(),
        heading: (angle.to_degrees() + 90.0).rem_euclid(360.0),
        altitude: (14_000.0 - t * 10.0).max(6_000.0),
        vertical_speed: if t * 10.0 < 8_000.0 { -600.0 } else { 0.0 },
    }
}

fn describe_value(value: &ReadoutValue) -> String {
    match &value.digits {
        Some(digits) => format!("{digits} {:?}", value.severity),
        None => "---".to_string(),
    }
}

fn describe_readout(readout: &ElevationReadout) -> String {
    format!(
        "{} {} / {}",
        readout.label,
        describe_value(&readout.lower),
        describe_value(&readout.upper)
    )
}

fn offline_renderer() -> ScriptedRenderer {
    ScriptedRenderer::new()
        .with_not_ready_polls(2)
        .with_latency(Duration::from_millis(20))
        .with_range(TerrainRange {
            min_elevation: Some(1_900.0),
            max_elevation: Some(9_400.0),
            max_elevation_is_caution: true,
            ..TerrainRange::default()
        })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let renderer: Arc<dyn TerrainRenderer> = if args.offline {
        info!("using scripted renderer");
        Arc::new(offline_renderer())
    } else {
        info!("using renderer at {}", args.renderer_url);
        Arc::new(HttpTerrainRenderer::new(RendererEndpoint::new(
            args.renderer_url.clone(),
        )))
    };

    let config = OverlayConfig {
        side: args.side,
        transition: args.style.into(),
        ..OverlayConfig::default()
    };
    let mut view = TerrainMapView::new(config, renderer, Handle::current());
    view.set_inputs(DisplayInputs {
        active: true,
        mode: args.mode.into(),
        range_nm: args.range_nm,
        gear_down: false,
    });

    let frame_interval = Duration::from_secs(1) / args.fps.max(1);
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let run_for = args.seconds.map(Duration::from_secs);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let started = Instant::now();
    let mut last_frame = started;
    let mut last_position: Option<Instant> = None;
    let mut last_readout = String::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }
        let now = Instant::now();
        let elapsed = now.duration_since(started);
        if run_for.is_some_and(|limit| elapsed >= limit) {
            break;
        }

        if last_position.is_none_or(|at| now.duration_since(at) >= POSITION_INTERVAL) {
            view.forward_position(synthetic_position(elapsed));
            last_position = Some(now);
        }

        view.update(now.duration_since(last_frame));
        last_frame = now;
        for event in view.drain_events() {
            debug!("frame {} {:?}: {}", event.frame_index, event.kind, event.message);
        }

        if let Some(readout) = view.compose().readout {
            let text = describe_readout(&readout);
            if text != last_readout {
                info!("{text}");
                last_readout = text;
            }
        }
    }

    view.set_inputs(DisplayInputs::default());
    info!("metrics: {:?}", view.metrics().snapshot());
    // Let the final settings push leave before the runtime shuts down.
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::elevation::{ElevationBand, ElevationBands};
    use layers::symbology::SeverityPalette;
    use pretty_assertions::assert_eq;

    #[test]
    fn readout_description_shows_digits_and_severity() {
        let bands = ElevationBands::new(
            ElevationBand::new(1_234.0, false, false),
            ElevationBand::new(9_450.0, true, true),
        );
        let readout = ElevationReadout::from_bands(&bands, &SeverityPalette::default());
        assert_eq!(describe_readout(&readout), "TERR 012 Normal / 095 Warning");

        let empty = ElevationReadout::from_bands(&ElevationBands::no_data(), &SeverityPalette::default());
        assert_eq!(describe_readout(&empty), "TERR --- / ---");
    }

    #[test]
    fn synthetic_flight_descends_to_a_floor() {
        let start = synthetic_position(Duration::ZERO);
        assert_eq!(start.altitude, 14_000.0);
        assert!(start.vertical_speed < 0.0);

        let late = synthetic_position(Duration::from_secs(3_600));
        assert_eq!(late.altitude, 6_000.0);
        assert_eq!(late.vertical_speed, 0.0);
        assert!((0.0..360.0).contains(&late.heading));
    }

    #[test]
    fn cli_maps_onto_overlay_types() {
        let args = Args::parse_from(["nd_viewer", "--side", "R", "--style", "crossfade", "--mode", "rose"]);
        assert_eq!(args.side, DisplaySide::Right);
        assert_eq!(TransitionStyle::from(args.style), TransitionStyle::Crossfade);
        assert_eq!(DisplayMode::from(args.mode), DisplayMode::RoseNav);
        assert!(!args.offline);
        assert!(parse_side("X").is_err());
    }
}
