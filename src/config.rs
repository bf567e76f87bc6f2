//! Command-line configuration for pano-stitch.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `PANO_` prefix
//! - Defaults for everything except the inputs
//!
//! # Example
//!
//! ```ignore
//! use pano_stitch::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.into_command() {
//!     Command::Stitch(config) => println!("manifest: {}", config.manifest.display()),
//!     _ => {}
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `PANO_MANIFEST` - Manifest JSON describing the panoramas
//! - `PANO_TILES_DIR` - Directory holding the tile images
//! - `PANO_OUTPUT_DIR` - Directory receiving `<name>.png` (default: .)
//! - `PANO_TILE_EXT` - Tile file extension (default: png)
//! - `PANO_STRATEGY` - `curve` or `brightness` (default: curve)
//! - `PANO_NEIGHBOR_POLICY` - `prefer-left` or `average` (default: prefer-left)
//! - `PANO_EXTRAPOLATION` - `clamp` or `linear` (default: clamp)
//! - `PANO_JOBS` - Panoramas built concurrently (default: 4)
//! - `PANO_CACHE_TILES` - Decoded tiles kept in memory (default: 64)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::job::DEFAULT_CONCURRENT_JOBS;
use crate::matcher::{Extrapolation, MatchConfig, NeighborPolicy, Strategy};
use crate::supply::DEFAULT_SUPPLY_CACHE_ENTRIES;

// =============================================================================
// Default Values
// =============================================================================

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Default tile file extension.
pub const DEFAULT_TILE_EXT: &str = "png";

/// Upper bound on concurrent panoramas.
pub const MAX_CONCURRENT_JOBS: usize = 256;

// =============================================================================
// CLI Arguments
// =============================================================================

/// pano-stitch - Brightness-matched panorama compositing.
///
/// Assembles panoramas from overlapping frames placed at known origins,
/// reconciling brightness differences between neighboring frames.
#[derive(Parser, Debug, Clone)]
#[command(name = "pano-stitch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build every panorama listed in a manifest.
    Stitch(StitchConfig),

    /// Combine single-color band images into one RGB image.
    Merge(MergeConfig),

    /// Print the grid layout of each panorama in a manifest as JSON.
    Inspect(InspectConfig),
}

// =============================================================================
// Stitch
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct StitchConfig {
    // =========================================================================
    // Inputs and Outputs
    // =========================================================================
    /// Manifest JSON describing the panoramas.
    #[arg(short, long, env = "PANO_MANIFEST")]
    pub manifest: PathBuf,

    /// Directory holding the tile images.
    #[arg(short, long, env = "PANO_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Directory receiving one `<name>.png` per panorama.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "PANO_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Tile file extension, without the dot.
    #[arg(long, default_value = DEFAULT_TILE_EXT, env = "PANO_TILE_EXT")]
    pub tile_ext: String,

    // =========================================================================
    // Matching
    // =========================================================================
    /// Brightness matching strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Curve, env = "PANO_STRATEGY")]
    pub strategy: Strategy,

    /// Which already-matched neighbors a tile is fitted against.
    #[arg(long, value_enum, default_value_t = NeighborPolicy::PreferLeft, env = "PANO_NEIGHBOR_POLICY")]
    pub neighbor_policy: NeighborPolicy,

    /// Curve behavior outside the values seen in an overlap.
    #[arg(long, value_enum, default_value_t = Extrapolation::Clamp, env = "PANO_EXTRAPOLATION")]
    pub extrapolation: Extrapolation,

    /// Force value curves to be non-decreasing.
    #[arg(long, default_value_t = false)]
    pub monotone: bool,

    /// Match in CIE Lab, stretching lightness to its full range.
    #[arg(long, default_value_t = false)]
    pub lab: bool,

    // =========================================================================
    // Resources
    // =========================================================================
    /// Panoramas built concurrently.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENT_JOBS, env = "PANO_JOBS")]
    pub jobs: usize,

    /// Decoded tiles kept in memory across panoramas.
    #[arg(long, default_value_t = DEFAULT_SUPPLY_CACHE_ENTRIES, env = "PANO_CACHE_TILES")]
    pub cache_tiles: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl StitchConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.jobs == 0 || self.jobs > MAX_CONCURRENT_JOBS {
            return Err(format!("jobs must be between 1 and {}", MAX_CONCURRENT_JOBS));
        }
        if self.cache_tiles == 0 {
            return Err("cache_tiles must be greater than 0".to_string());
        }
        if self.tile_ext.starts_with('.') {
            return Err("tile_ext must not start with a dot".to_string());
        }
        if self.lab && self.strategy == Strategy::Brightness {
            return Err("--lab only applies to the curve strategy".to_string());
        }
        Ok(())
    }

    /// Matcher options selected on the command line.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::default()
            .with_strategy(self.strategy)
            .with_neighbor_policy(self.neighbor_policy)
            .with_extrapolation(self.extrapolation)
            .with_monotone(self.monotone)
            .with_lab(self.lab)
    }
}

// =============================================================================
// Merge
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct MergeConfig {
    /// Red band image.
    #[arg(short, long)]
    pub red: Option<PathBuf>,

    /// Green band image.
    #[arg(short, long)]
    pub green: Option<PathBuf>,

    /// Blue band image.
    #[arg(short, long)]
    pub blue: Option<PathBuf>,

    /// Output PNG path.
    pub output: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bands().iter().all(Option::is_none) {
            return Err("At least one of --red, --green or --blue is required".to_string());
        }
        Ok(())
    }

    /// Band paths in red, green, blue order.
    pub fn bands(&self) -> [Option<&PathBuf>; 3] {
        [self.red.as_ref(), self.green.as_ref(), self.blue.as_ref()]
    }
}

// =============================================================================
// Inspect
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// Manifest JSON describing the panoramas.
    #[arg(short, long, env = "PANO_MANIFEST")]
    pub manifest: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
