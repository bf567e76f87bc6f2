//! Grid layout and overlap extraction through the public API.

use std::str::FromStr;
use std::sync::Arc;

use ndarray::s;

use pano_stitch::diagnostics::{Diagnostic, MemorySink};
use pano_stitch::error::GridError;
use pano_stitch::grid::{Edge, Origin, Rect, TileGrid, TileSet};
use pano_stitch::matcher::composite_grid;

use super::test_utils::constant_tile;

#[test]
fn test_shape_counts_distinct_origins() {
    let grid = TileGrid::from_tiles(vec![
        (Origin::new(0, 0), constant_tile(4, 4, 1, 0.0)),
        (Origin::new(3, 0), constant_tile(4, 4, 1, 0.0)),
        (Origin::new(7, 0), constant_tile(4, 4, 1, 0.0)),
        (Origin::new(0, 3), constant_tile(4, 4, 1, 0.0)),
    ])
    .unwrap();

    assert_eq!(grid.shape(), (2, 3));
    assert!(grid.is_missing(1, 1));
    assert!(grid.is_missing(2, 1));
    assert!(grid.is_missing(9, 9));
}

#[test]
fn test_missing_fourth_cell_composites_zero() {
    let sink = Arc::new(MemorySink::new());
    let grid = TileGrid::from_tiles_with_sink(
        vec![
            (Origin::new(0, 0), constant_tile(4, 4, 3, 0.0)),
            (Origin::new(4, 0), constant_tile(4, 4, 3, 0.0)),
            (Origin::new(0, 4), constant_tile(4, 4, 3, 0.0)),
        ],
        sink.clone(),
    )
    .unwrap();

    let composite = composite_grid(&grid).unwrap();
    assert_eq!(composite.raster.dim(), (8, 8, 3));
    assert_eq!(composite.rect, Rect::new(0, 0, 8, 8));
    assert!(composite.raster.slice(s![4.., 4.., ..]).iter().all(|&v| v == 0.0));
    assert_eq!(sink.count(|e| matches!(e, Diagnostic::MissingTile { .. })), 1);
}

#[test]
fn test_edges_agree_across_boundary() {
    let grid = TileGrid::from_tiles(vec![
        (Origin::new(0, 0), constant_tile(3, 4, 1, 1.0)),
        (Origin::new(3, 0), constant_tile(3, 4, 1, 2.0)),
    ])
    .unwrap();

    let right = grid.edge(0, 0, Edge::Right).unwrap().unwrap();
    let left = grid.edge(1, 0, Edge::Left).unwrap().unwrap();
    assert_eq!(right.dim(), (3, 1, 1));
    assert_eq!(left.dim(), (3, 1, 1));
    assert!(right.iter().all(|&v| v == 1.0));
    assert!(left.iter().all(|&v| v == 2.0));
}

#[test]
fn test_irregular_neighbor_extent() {
    // The right tile is shorter, so the overlap is limited to its rows.
    let grid = TileGrid::from_tiles(vec![
        (Origin::new(0, 0), constant_tile(6, 5, 1, 1.0)),
        (Origin::new(3, 0), constant_tile(4, 5, 1, 2.0)),
    ])
    .unwrap();

    let right = grid.edge(0, 0, Edge::Right).unwrap().unwrap();
    let left = grid.edge(1, 0, Edge::Left).unwrap().unwrap();
    assert_eq!(right.dim(), (4, 2, 1));
    assert_eq!(left.dim(), right.dim());
}

#[test]
fn test_boundary_edges_are_none() {
    let grid = TileGrid::from_tiles(vec![
        (Origin::new(0, 0), constant_tile(4, 4, 1, 0.0)),
        (Origin::new(3, 0), constant_tile(4, 4, 1, 0.0)),
    ])
    .unwrap();

    for edge in [Edge::Left, Edge::Top, Edge::Bottom] {
        assert!(grid.edge(0, 0, edge).unwrap().is_none());
    }
    assert!(grid.edge(1, 0, Edge::Right).unwrap().is_none());
}

#[test]
fn test_invalid_edge_requests() {
    let grid = TileGrid::from_tiles(vec![(Origin::new(0, 0), constant_tile(2, 2, 1, 0.0))]).unwrap();
    assert!(matches!(
        grid.edge(3, 0, Edge::Left),
        Err(GridError::InvalidEdge { col: 3, row: 0, .. })
    ));
    assert!(matches!(Edge::from_str("diagonal"), Err(GridError::InvalidEdge { .. })));
    assert_eq!(Edge::from_str("left").unwrap(), Edge::Left);
}

#[test]
fn test_tile_set_rejects_duplicates() {
    let mut tiles = TileSet::new();
    tiles.add(constant_tile(2, 2, 1, 0.0), Origin::new(5, 5)).unwrap();
    let err = tiles
        .add(constant_tile(2, 2, 1, 0.0), Origin::new(5, 5))
        .unwrap_err();
    assert!(matches!(err, GridError::DuplicateOrigin(Origin { x: 5, y: 5 })));
    assert_eq!(tiles.len(), 1);
}

#[test]
fn test_replace_and_scale() {
    let mut grid = TileGrid::from_tiles(vec![
        (Origin::new(0, 0), constant_tile(2, 2, 1, 1.0)),
        (Origin::new(2, 0), constant_tile(2, 2, 1, 1.0)),
        (Origin::new(0, 2), constant_tile(2, 2, 1, 1.0)),
    ])
    .unwrap();

    grid.scale(1, 0, 3.0);
    assert!(grid.tile(1, 0).unwrap().iter().all(|&v| v == 3.0));

    grid.scale(1, 1, 3.0);
    assert!(grid.is_missing(1, 1));
    assert!(grid.replace(1, 1, constant_tile(2, 2, 1, 0.0)).is_err());
    assert!(grid.replace(0, 1, constant_tile(0, 2, 1, 0.0)).is_err());
}
