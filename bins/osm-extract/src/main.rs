//! osm-extract: draw, measure and extract road networks for a polygon.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use osm_extractor_cli::output::{format_area, format_count, format_duration, format_length, format_lon_lat, Status};
use osm_extractor_cli::progress::{finish_error, finish_success, set_stage, spinner, stage_bar};
use osm_extractor_client::prelude::*;
use osm_extractor_geo::{
    closed_ring, compute_summary_with, parse_vertices, Coordinate, DrawConfig,
    EarthModel, Feature, Geometry, MapView, Measurements, PolygonAuthor, TapOutcome,
};
use osm_extractor_telemetry::{metrics, LogFormat, TelemetryConfig};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

#[derive(Parser)]
#[command(name = "osm-extract")]
#[command(about = "Draw, measure and extract OSM road networks for a polygon")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print collected metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure a polygon (vertex list, Polygon geometry or Feature)
    Measure {
        /// Input file, `-` for stdin
        path: PathBuf,
        /// Earth model for area and perimeter
        #[arg(long, value_enum, default_value_t = EarthModelArg::Spherical)]
        earth_model: EarthModelArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a list of taps through the polygon author
    Draw {
        /// File with `[[lng, lat], ...]` taps, `-` for stdin
        path: PathBuf,
        /// Snap-to-close radius around the first vertex
        #[arg(long, default_value_t = osm_extractor_geo::DEFAULT_SNAP_RADIUS_KM)]
        snap_radius_km: f64,
        /// Earth model for area and perimeter
        #[arg(long, value_enum, default_value_t = EarthModelArg::Spherical)]
        earth_model: EarthModelArg,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch the road network preview for a polygon
    Preview {
        /// Input file, `-` for stdin
        path: PathBuf,
        /// Worker base URL (defaults to OSM_EXTRACTOR_API_URL)
        #[arg(long)]
        api_url: Option<String>,
        /// Print the roads as GeoJSON
        #[arg(long)]
        json: bool,
    },
    /// Run an extraction session and print the download reference
    Extract {
        /// Input file, `-` for stdin
        path: PathBuf,
        /// Worker base URL (defaults to OSM_EXTRACTOR_API_URL)
        #[arg(long)]
        api_url: Option<String>,
        /// Print the final session snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EarthModelArg {
    Spherical,
    Ellipsoidal,
}

impl From<EarthModelArg> for EarthModel {
    fn from(arg: EarthModelArg) -> Self {
        match arg {
            EarthModelArg::Spherical => Self::Spherical,
            EarthModelArg::Ellipsoidal => Self::Ellipsoidal,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json { LogFormat::Json } else { LogFormat::Compact };
    osm_extractor_telemetry::init_with_config(
        TelemetryConfig::default()
            .with_verbosity(cli.verbose, cli.quiet)
            .with_format(format),
    )?;

    let result = match cli.command {
        Commands::Measure { path, earth_model, json } => measure(&path, earth_model.into(), json),
        Commands::Draw {
            path,
            snap_radius_km,
            earth_model,
            json,
        } => draw(&path, snap_radius_km, earth_model.into(), json),
        Commands::Preview { path, api_url, json } => preview(&path, api_url, json).await,
        Commands::Extract { path, api_url, json } => extract(&path, api_url, json).await,
    };

    if cli.metrics {
        eprintln!("{}", serde_json::to_string_pretty(&metrics().export_json())?);
    }
    result
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn read_polygon(path: &Path) -> anyhow::Result<Vec<Coordinate>> {
    let vertices = parse_vertices(&read_input(path)?)
        .with_context(|| format!("parsing polygon from {}", path.display()))?;
    debug!(vertices = vertices.len(), "Polygon loaded");
    Ok(vertices)
}

fn polygon_feature(vertices: &[Coordinate]) -> anyhow::Result<Feature> {
    if vertices.len() < 3 {
        bail!(
            "a polygon needs at least 3 vertices, got {}",
            format_count(vertices.len(), "vertex", "vertices")
        );
    }
    Ok(Feature::new(Geometry::Polygon {
        coordinates: vec![closed_ring(vertices)],
    }))
}

fn measure(path: &Path, model: EarthModel, json: bool) -> anyhow::Result<()> {
    let vertices = read_polygon(path)?;
    let Some(summary) = compute_summary_with(&vertices, true, model) else {
        bail!(
            "cannot measure {}: fewer than 3 vertices or degenerate ring",
            format_count(vertices.len(), "vertex", "vertices")
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    Status::header("Polygon");
    Status::field("Vertices", &summary.vertex_count.to_string());
    Status::field("Area", &format_area(&summary.area_km2));
    Status::field("Perimeter", &format_length(&summary.perimeter_km));
    Status::field(
        "South-west",
        &format_lon_lat(summary.bbox.min_lon, summary.bbox.min_lat),
    );
    Status::field(
        "North-east",
        &format_lon_lat(summary.bbox.max_lon, summary.bbox.max_lat),
    );
    Ok(())
}

fn draw(path: &Path, snap_radius_km: f64, model: EarthModel, json: bool) -> anyhow::Result<()> {
    let taps: Vec<Coordinate> = serde_json::from_str(&read_input(path)?)
        .with_context(|| format!("parsing taps from {}", path.display()))?;

    let mut author = PolygonAuthor::with_config(DrawConfig { snap_radius_km });
    let mut measurements = Measurements::new(model);
    author.start_drawing();

    for (i, tap) in taps.iter().enumerate() {
        let outcome = author.handle_tap(*tap);
        measurements.refresh(author.vertices(), author.is_closed());
        if json {
            continue;
        }
        let live = measurements
            .metrics()
            .map(|m| format!(" (area {})", format_area(&m.area_km2)))
            .unwrap_or_default();
        let line = format!("tap {:>3} at {}", i + 1, format_lon_lat(tap.longitude, tap.latitude));
        match outcome {
            TapOutcome::Appended => Status::info(&format!("{line}: vertex {}{live}", author.vertices().len())),
            TapOutcome::Closed => Status::success(&format!("{line}: closed polygon{live}")),
            TapOutcome::Ignored => Status::warning(&format!("{line}: ignored")),
        }
    }

    let summary = measurements.summary().cloned();
    let view = summary.as_ref().map(|s| {
        let mut view = MapView::default();
        view.fly_to(s.bbox.center());
        view
    });

    if json {
        let output = json!({
            "closed": author.is_closed(),
            "vertex_count": author.vertices().len(),
            "metrics": measurements.metrics(),
            "summary": summary,
            "polygon": author.polygon_geojson(),
            "view": view,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match summary {
        Some(summary) => {
            Status::header("Closed polygon");
            Status::field("Vertices", &summary.vertex_count.to_string());
            Status::field("Area", &format_area(&summary.area_km2));
            Status::field("Perimeter", &format_length(&summary.perimeter_km));
            if let Some(view) = view {
                Status::field(
                    "Centre",
                    &format_lon_lat(view.center.longitude, view.center.latitude),
                );
            }
        }
        None => Status::warning(&format!(
            "polygon not closed after {}",
            format_count(taps.len(), "tap", "taps")
        )),
    }
    Ok(())
}

fn client_for(api_url: Option<String>) -> anyhow::Result<ExtractorClient> {
    let config = match api_url {
        Some(url) => ClientConfig::default()
            .with_base_url(url)
            .with_environment(Environment::from_env()),
        None => ClientConfig::from_env()?,
    };
    debug!(base_url = %config.base_url, environment = ?config.environment, "Client configured");
    Ok(ExtractorClient::with_config(config)?)
}

async fn preview(path: &Path, api_url: Option<String>, json: bool) -> anyhow::Result<()> {
    let polygon = polygon_feature(&read_polygon(path)?)?;
    let client = client_for(api_url)?;

    let pb = spinner("Loading preview...");
    let started = Instant::now();
    let roads = match client.preview().roads(&polygon).await {
        Ok(roads) => roads,
        Err(e) => {
            finish_error(&pb, "Preview failed");
            return Err(e).context("fetching road preview");
        }
    };
    finish_success(
        &pb,
        &format!(
            "{} in {}",
            format_count(roads.len(), "road", "roads"),
            format_duration(started.elapsed())
        ),
    );

    if json {
        println!("{}", serde_json::to_string(&roads)?);
    }
    Ok(())
}

async fn extract(path: &Path, api_url: Option<String>, json: bool) -> anyhow::Result<()> {
    let polygon = polygon_feature(&read_polygon(path)?)?;
    let client = client_for(api_url)?;
    let mut session = client.extraction_session()?;
    let mut updates = session.subscribe();

    let pb = stage_bar();
    let started = Instant::now();
    session.start(&polygon)?;

    let last = loop {
        let snapshot = updates.borrow_and_update().clone();
        let progress = &snapshot.progress;
        set_stage(&pb, progress.stage.label(), progress.progress, progress.message.as_deref());
        if !progress.stage.is_in_flight() {
            break snapshot;
        }
        if updates.changed().await.is_err() {
            break session.snapshot();
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&last)?);
    }

    match (last.progress.stage, last.download_reference) {
        (ExtractionStage::Complete, Some(reference)) => {
            finish_success(&pb, &format!("Extracted in {}", format_duration(started.elapsed())));
            if !json {
                println!("{reference}");
            }
            Ok(())
        }
        (ExtractionStage::Complete, None) => {
            finish_success(&pb, "Extraction complete");
            Status::warning("worker finished without a download reference");
            Ok(())
        }
        (stage, _) => {
            let message = last.progress.message.unwrap_or_else(|| stage.label().to_string());
            finish_error(&pb, &message);
            bail!("extraction failed: {message}")
        }
    }
}
