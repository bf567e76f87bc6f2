//! Tile grid layer.
//!
//! Tiles arrive as rasters with known top-left origins. This module lays them
//! out on a dense row/column index derived from the distinct origin values
//! and answers the geometric questions the matchers need.
//!
//! ```text
//!   x-origins:   0        96       192
//!             ┌────────┬────────┬────────┐
//!   y: 0      │ (0,0)  │ (1,0)  │ (2,0)  │
//!             ├────────┼────────┼────────┤
//!   y: 72     │ (0,1)  │  None  │ (2,1)  │
//!             └────────┴────────┴────────┘
//! ```
//!
//! # Components
//!
//! - [`TileSet`]: collects tiles by origin, rejecting duplicates
//! - [`TileGrid`]: the laid-out grid with edge extraction and replacement
//! - [`Edge`]: the four directions a tile can overlap a neighbor
//! - [`Origin`], [`Rect`]: composite-space placement

mod edge;
mod geometry;
mod tile_grid;
mod tile_set;

pub use edge::Edge;
pub use geometry::{Origin, Rect};
pub use tile_grid::TileGrid;
pub use tile_set::TileSet;
