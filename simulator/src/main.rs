mod recording;
mod telemetry;
mod trip;

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trip::TripGenerator;

/// Records a synthetic refrigerated-truck trip as JSON files the dashboard
/// can load through its telemetry, alerts and track URLs.
#[derive(Debug, Parser)]
#[command(name = "simulator", version)]
struct Args {
    #[arg(long, env = "DEVICE_ID", default_value = "truck_01")]
    device_id: String,

    #[arg(long, env = "SAMPLES", default_value_t = 288)]
    samples: usize,

    #[arg(long, env = "INTERVAL_SECS", default_value_t = 300)]
    interval_secs: i64,

    /// First sample time (RFC 3339). By default the trip ends now.
    #[arg(long, env = "START")]
    start: Option<DateTime<Utc>>,

    /// Seed for a reproducible trip.
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    #[arg(long, env = "OUTPUT_DIR", default_value = "recordings")]
    output_dir: PathBuf,

    #[arg(long, env = "ORIGIN_LAT", default_value_t = 60.17, allow_hyphen_values = true)]
    origin_lat: f64,

    #[arg(long, env = "ORIGIN_LON", default_value_t = 24.94, allow_hyphen_values = true)]
    origin_lon: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !(-90.0..=90.0).contains(&args.origin_lat) || !(-180.0..=180.0).contains(&args.origin_lon) {
        bail!(
            "origin ({}, {}) is not a valid coordinate",
            args.origin_lat,
            args.origin_lon
        );
    }

    let (start, interval) = trip_schedule(args.samples, args.interval_secs, args.start, Utc::now())?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        "Recording {} samples for {} every {}s starting {}",
        args.samples,
        args.device_id,
        args.interval_secs,
        start.to_rfc3339()
    );

    let mut generator = TripGenerator::new(
        rng,
        args.device_id.clone(),
        start,
        interval,
        (args.origin_lat, args.origin_lon),
    );
    let trip = generator.generate(args.samples);

    let paths = recording::write_recording(&args.output_dir, &args.device_id, &trip)?;

    info!("Point the dashboard at the recording with:");
    for (var, path) in [
        (telemetry_var(&args.device_id), &paths.telemetry),
        ("ALERTS_URL".to_string(), &paths.alerts),
        ("TRACK_URL".to_string(), &paths.track),
    ] {
        let absolute = std::fs::canonicalize(path)
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        info!("  {}=file://{}", var, absolute.display());
    }

    Ok(())
}

/// First sample time and sample interval, checked so the whole trip stays
/// within the representable time range.
fn trip_schedule(
    samples: usize,
    interval_secs: i64,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> anyhow::Result<(DateTime<Utc>, Duration)> {
    if interval_secs <= 0 {
        bail!("interval must be positive, got {}s", interval_secs);
    }
    let interval = Duration::try_seconds(interval_secs)
        .with_context(|| format!("interval of {}s is too long", interval_secs))?;
    let steps = i32::try_from(samples).context("too many samples")?;
    let span = interval
        .checked_mul(steps)
        .with_context(|| format!("{} samples every {}s is too long a trip", samples, interval_secs))?;

    let start = match start {
        Some(start) => start,
        None => now
            .checked_sub_signed(span)
            .with_context(|| format!("a trip of {} samples cannot end now", samples))?,
    };
    if start.checked_add_signed(span).is_none() {
        bail!("trip starting {} runs past the supported time range", start.to_rfc3339());
    }
    Ok((start, interval))
}

fn telemetry_var(device_id: &str) -> String {
    format!("TELEMETRY_URL_{}", device_id.to_uppercase())
}
