//! `waymark simulate`: drive a headless overlay with a scripted walk.
//!
//! A provider thread replays a circular walk through the simulated location
//! and bearing providers while the overlay's async loop applies the events.
//! One status line is printed per step.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;
use waymark::bearing::BearingSource;
use waymark::camera::HeadlessCamera;
use waymark::config::OverlayConfig;
use waymark::geo::LatLng;
use waymark::marker::PixmapSurface;
use waymark::overlay::{OverlayStatus, SharedOverlayStatus};
use waymark::sim::{ScriptedWalk, SimulatedBearingProvider, SimulatedLocationProvider};
use waymark::tracking::TrackingMode;
use waymark::OverlayView;

use super::config::load_config;
use super::display_path;
use crate::error::CliError;

/// Raw compass accuracy reported for simulated azimuth samples.
const SIMULATED_COMPASS_ACCURACY_DEG: f64 = 3.0;

/// Arguments for `waymark simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Number of walk steps to replay
    #[arg(long, default_value_t = 24)]
    pub steps: usize,

    /// Tracking mode (none, follow, follow-with-bearing); overrides the config
    #[arg(long)]
    pub tracking: Option<TrackingMode>,

    /// Bearing source (none, gps, compass); overrides the config
    #[arg(long)]
    pub bearing: Option<BearingSource>,

    /// Save the final overlay frame as PNG
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Configuration file to use instead of the default
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wall-clock delay between replayed steps in milliseconds
    #[arg(long, default_value_t = 50)]
    pub interval_ms: u64,

    /// Walk center latitude
    #[arg(long, default_value_t = 53.5511, allow_hyphen_values = true)]
    pub lat: f64,

    /// Walk center longitude
    #[arg(long, default_value_t = 9.9937, allow_hyphen_values = true)]
    pub lon: f64,

    /// Walk radius in meters
    #[arg(long, default_value_t = 60.0)]
    pub radius: f64,

    /// Map zoom level
    #[arg(long, default_value_t = 17.0)]
    pub zoom: f64,

    /// Width and height of the headless view in pixels
    #[arg(long, default_value_t = 512)]
    pub size: u32,
}

/// Run the simulation.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let config = effective_config(load_config(args.config.as_deref())?, &args);
    let center = LatLng::new(args.lat, args.lon);

    let location = SimulatedLocationProvider::new();
    let bearing = SimulatedBearingProvider::from_config(&config);
    let location_feed = location.feed();
    let bearing_feed = bearing.feed();

    let camera = HeadlessCamera::new(center, args.zoom, args.size, args.size);
    let surface = PixmapSurface::new(args.size, args.size)?;

    let mut view = OverlayView::builder()
        .with_config(config.clone())
        .with_location_provider(location)
        .with_bearing_provider(bearing)
        .with_camera(camera.clone())
        .with_surface(surface.clone())
        .attach()?;

    println!(
        "Simulating {} steps around {} (radius {} m)",
        args.steps, center, args.radius
    );
    println!(
        "  tracking: {}  bearing: {}  render mode: {}",
        config.overlay.tracking_mode,
        config.overlay.bearing_source,
        view.render_mode()
    );
    println!();

    let walk = ScriptedWalk::new(center, args.radius, args.steps.clamp(8, 64));
    let steps = args.steps;
    let interval = Duration::from_millis(args.interval_ms.max(1));
    let status = view.status_handle();
    let cancel = CancellationToken::new();
    let producer_cancel = cancel.clone();

    let producer = thread::Builder::new()
        .name("waymark-sim".to_string())
        .spawn(move || {
            for step in walk.steps(steps) {
                location_feed.push(step.fix);
                bearing_feed.push_fix(&step.fix);
                bearing_feed.push_azimuth(
                    step.azimuth_degrees,
                    SIMULATED_COMPASS_ACCURACY_DEG,
                    Instant::now(),
                    step.fix.timestamp_ms,
                );
                thread::sleep(interval);
                println!("{}", format_status(step.index, &status));
            }
            producer_cancel.cancel();
        })
        .map_err(|e| CliError::Runtime(format!("failed to spawn provider thread: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| CliError::Runtime(format!("failed to start runtime: {}", e)))?;
    let result = runtime.block_on(view.run(cancel));

    producer
        .join()
        .map_err(|_| CliError::Runtime("provider thread panicked".to_string()))?;
    result?;

    let final_status = view.status_handle().snapshot();
    println!();
    println!("Summary:");
    println!("  state redraws:    {}", final_status.redraw_count);
    println!("  animation frames: {}", final_status.animation_frames);
    println!("  camera moves:     {}", camera.move_count());
    println!("  camera bearing:   {:.1}°", camera.bearing());

    if let Some(path) = &args.snapshot {
        surface.save_png(path).map_err(|error| CliError::FileWrite {
            path: path.clone(),
            error,
        })?;
        println!("  snapshot:         {}", display_path(path));
    }

    view.detach();
    info!("Simulation finished");
    Ok(())
}

/// Configuration with the overlay enabled and command-line overrides applied.
fn effective_config(config: OverlayConfig, args: &SimulateArgs) -> OverlayConfig {
    let mut config = config.with_enabled(true);
    if let Some(mode) = args.tracking {
        config = config.with_tracking_mode(mode);
    }
    if let Some(source) = args.bearing {
        config = config.with_bearing_source(source);
    }
    config
}

fn format_status(step: usize, status: &SharedOverlayStatus) -> String {
    let OverlayStatus {
        state,
        render_mode,
        marker,
        redraw_count,
        follow_suspended,
        ..
    } = status.snapshot();

    let fix = state
        .last_fix
        .map(|fix| format!("{:.5}, {:.5}", fix.latitude, fix.longitude))
        .unwrap_or_else(|| "-".to_string());
    let heading = state
        .active_bearing()
        .map(|reading| format!("{:5.1}° {}", reading.heading_degrees, reading.source))
        .unwrap_or_else(|| "    -".to_string());

    format!(
        "step {:>3}  fix {}  heading {}  mode {:<17}  marker {:<8}  rot {:5.1}°  redraws {:>3}{}",
        step,
        fix,
        heading,
        render_mode,
        marker.variant,
        marker.displayed_rotation_degrees,
        redraw_count,
        if follow_suspended { "  (follow suspended)" } else { "" }
    )
}
