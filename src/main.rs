//! pano-stitch - Brightness-matched panorama compositing.
//!
//! This binary builds panoramas from a manifest, merges band images and
//! inspects manifests.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pano_stitch::{
    config::{Cli, Command, InspectConfig, MergeConfig, StitchConfig},
    grid::Rect,
    job::{write_png, BatchOptions, BatchRunner, Manifest},
    matcher::ByteComposite,
    raster::{decode_raster, merge_bands, raster_to_bytes, Raster},
    supply::{CachedSupplier, FsImageSupplier},
    JobError, SupplyError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Stitch(config) => run_stitch(config).await,
        Command::Merge(config) => run_merge(config).await,
        Command::Inspect(config) => run_inspect(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "pano_stitch=debug"
    } else {
        "pano_stitch=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Stitch Command
// =============================================================================

async fn run_stitch(config: StitchConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let jobs = match Manifest::load(&config.manifest).await.and_then(|m| m.jobs()) {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if jobs.is_empty() {
        warn!("Manifest {} lists no panoramas", config.manifest.display());
        return ExitCode::SUCCESS;
    }

    let match_config = config.match_config();
    info!("Configuration:");
    info!("  Manifest: {}", config.manifest.display());
    info!("  Tiles: {} (*.{})", config.tiles_dir.display(), config.tile_ext);
    info!("  Output: {}", config.output_dir.display());
    info!(
        "  Matching: {:?}, {:?} neighbors, {:?} extrapolation{}",
        match_config.strategy,
        match_config.neighbor_policy,
        match_config.extrapolation,
        if match_config.monotone { ", monotone" } else { "" }
    );
    info!("  Concurrency: {} job(s), {} cached tiles", config.jobs, config.cache_tiles);

    let supplier = Arc::new(CachedSupplier::with_capacity(
        FsImageSupplier::new(&config.tiles_dir, config.tile_ext.clone()),
        config.cache_tiles,
    ));
    let options = BatchOptions::new(&config.output_dir)
        .with_jobs(config.jobs)
        .with_config(match_config);
    let runner = BatchRunner::new(supplier.clone(), options);

    let report = runner.run(jobs).await;

    let stats = supplier.cache_stats().await;
    info!(
        "Tile cache: {} hit(s), {} miss(es), {}/{} entries",
        stats.hits, stats.misses, stats.entries, stats.capacity
    );
    info!(
        "Built {} of {} panorama(s)",
        report.succeeded.len(),
        report.total()
    );
    for failed in &report.failed {
        error!("  {}: {}", failed.name, failed.error);
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// =============================================================================
// Merge Command
// =============================================================================

async fn run_merge(config: MergeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match merge(&config).await {
        Ok(()) => {
            info!("Wrote {}", config.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn merge(config: &MergeConfig) -> Result<(), JobError> {
    let mut bands: [Option<Raster>; 3] = [None, None, None];
    for (slot, path) in bands.iter_mut().zip(config.bands()) {
        let Some(path) = path else { continue };
        let data = tokio::fs::read(path).await.map_err(|e| {
            JobError::from(SupplyError::Io {
                id: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        *slot = Some(decode_raster(&data)?);
    }

    let [red, green, blue] = &bands;
    let merged = merge_bands([red.as_ref(), green.as_ref(), blue.as_ref()])?;
    let (height, width, _) = merged.dim();
    let composite = ByteComposite {
        bytes: raster_to_bytes(&merged),
        rect: Rect::new(0, 0, width as u32, height as u32),
    };
    write_png(&composite, &config.output).await
}

// =============================================================================
// Inspect Command
// =============================================================================

async fn run_inspect(config: InspectConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    let jobs = match Manifest::load(&config.manifest).await.and_then(|m| m.jobs()) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let layout: Vec<_> = jobs
        .iter()
        .map(|job| {
            let mut xs: Vec<u32> = job.tiles.iter().map(|t| t.origin.x).collect();
            let mut ys: Vec<u32> = job.tiles.iter().map(|t| t.origin.y).collect();
            xs.sort_unstable();
            xs.dedup();
            ys.sort_unstable();
            ys.dedup();
            serde_json::json!({
                "name": job.name,
                "tiles": job.tiles.len(),
                "grid": { "rows": ys.len(), "cols": xs.len() },
                "missing": (ys.len() * xs.len()).saturating_sub(job.tiles.len()),
                "rect": job.bounding_rect(),
                "x_origins": xs,
                "y_origins": ys,
            })
        })
        .collect();

    match serde_json::to_string_pretty(&layout) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
