//! Structured diagnostics emitted by the grid and the matchers.
//!
//! The compositing core never logs directly. Every noteworthy event is
//! described by a [`Diagnostic`] and handed to a [`DiagnosticSink`] supplied
//! by the caller. The binary uses [`TracingSink`]; tests use [`MemorySink`]
//! to assert on what happened.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::grid::{Edge, Origin};

// =============================================================================
// Events
// =============================================================================

/// One event observed while building or compositing a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A tile was accepted into a tile set.
    TileAdded {
        origin: Origin,
        shape: (usize, usize, usize),
    },

    /// A grid was laid out from the accepted tiles.
    GridBuilt { rows: usize, cols: usize },

    /// Adjacent tiles do not actually overlap along an edge.
    DegenerateOverlap {
        col: usize,
        row: usize,
        edge: Edge,
        overlap: i64,
    },

    /// A tile was rescaled to match a predecessor.
    TileAdjusted {
        col: usize,
        row: usize,
        candidates: usize,
    },

    /// No usable overlap was found; the tile keeps its original data.
    TileKept { col: usize, row: usize },

    /// A replacement changed the shape of a cell.
    ShapeChanged {
        col: usize,
        row: usize,
        old: (usize, usize, usize),
        new: (usize, usize, usize),
    },

    /// Ratios that were NaN or infinite were dropped from a brightness estimate.
    NonFiniteRatios {
        col: usize,
        row: usize,
        discarded: usize,
    },

    /// A grid cell had no tile when compositing.
    MissingTile { col: usize, row: usize },

    /// The composite canvas was allocated.
    CompositeBuilt {
        width: usize,
        height: usize,
        channels: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TileAdded { origin, shape } => {
                write!(f, "added tile at ({}, {}) with shape {:?}", origin.x, origin.y, shape)
            }
            Diagnostic::GridBuilt { rows, cols } => {
                write!(f, "created grid with shape ({}, {})", rows, cols)
            }
            Diagnostic::DegenerateOverlap {
                col,
                row,
                edge,
                overlap,
            } => write!(
                f,
                "no usable {} overlap at ({}, {}): computed {}",
                edge, col, row, overlap
            ),
            Diagnostic::TileAdjusted {
                col,
                row,
                candidates,
            } => write!(
                f,
                "adjusted tile ({}, {}) from {} candidate(s)",
                col, row, candidates
            ),
            Diagnostic::TileKept { col, row } => {
                write!(f, "kept tile ({}, {}) unchanged", col, row)
            }
            Diagnostic::ShapeChanged { col, row, old, new } => write!(
                f,
                "replacement at ({}, {}) changed shape {:?} -> {:?}",
                col, row, old, new
            ),
            Diagnostic::NonFiniteRatios {
                col,
                row,
                discarded,
            } => write!(
                f,
                "discarded {} non-finite ratio(s) at ({}, {})",
                discarded, col, row
            ),
            Diagnostic::MissingTile { col, row } => {
                write!(f, "blank tile at ({}, {})", col, row)
            }
            Diagnostic::CompositeBuilt {
                width,
                height,
                channels,
            } => write!(f, "result shape ({}, {}, {})", height, width, channels),
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver for [`Diagnostic`] events.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: Diagnostic);
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Forwards events to `tracing`.
///
/// Anything that signals degraded output (missing tiles, shape changes,
/// degenerate overlaps) is logged at `warn`, everything else at `debug`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    job: Option<String>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self { job: None }
    }

    /// Tag every event with a job name.
    pub fn for_job(name: impl Into<String>) -> Self {
        Self {
            job: Some(name.into()),
        }
    }
}

impl DiagnosticSink for TracingSink {
    fn record(&self, event: Diagnostic) {
        let job = self.job.as_deref().unwrap_or("unnamed");
        match event {
            Diagnostic::DegenerateOverlap { .. }
            | Diagnostic::ShapeChanged { .. }
            | Diagnostic::MissingTile { .. } => warn!(job, "{}", event),
            _ => debug!(job, "{}", event),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: Diagnostic) {}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in order.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of recorded events matching a predicate.
    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Default sink for components built without an explicit one.
pub fn default_sink() -> SharedSink {
    Arc::new(TracingSink::new())
}
