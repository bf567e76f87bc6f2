//! Matching behavior through the public API.

use std::sync::Arc;

use ndarray::{s, Array3};

use pano_stitch::diagnostics::{Diagnostic, MemorySink, NullSink};
use pano_stitch::grid::Origin;
use pano_stitch::matcher::{
    stitch_tiles, BrightnessMatcher, Extrapolation, MatchConfig, NeighborPolicy, Strategy,
    TileMatcher, ValueMapper,
};
use pano_stitch::raster::Raster;

use super::test_utils::{constant_tile, ramp_tile};

/// 3x3 tiles of 4 rows x 6 cols overlapping by 2 columns and 1 row, each
/// with its own gain on a shared ramp.
fn ramp_grid(skip: Option<(u32, u32)>) -> Vec<(Origin, Raster)> {
    let mut tiles = Vec::new();
    for iy in 0..3u32 {
        for ix in 0..3u32 {
            if Some((ix, iy)) == skip {
                continue;
            }
            let gain = 1.0 + 0.25 * (ix + 2 * iy) as f64;
            let tile = ramp_tile(4, 6, 3, 10.0 + ix as f64 * 40.0, 10.0).mapv(|v| v * gain);
            tiles.push((Origin::new(ix * 4, iy * 3), tile));
        }
    }
    tiles
}

fn curve_composite(tiles: Vec<(Origin, Raster)>, config: MatchConfig) -> Raster {
    let mut matcher = TileMatcher::with_sink("ramp", Arc::new(NullSink)).with_config(config);
    for (origin, tile) in tiles {
        matcher.add(tile, origin).unwrap();
    }
    matcher.composite().unwrap().raster
}

#[test]
fn test_identity_mapper() {
    let sample = ramp_tile(3, 5, 3, 0.0, 7.5);
    let mapper = ValueMapper::fit(sample.view(), sample.view(), &MatchConfig::default()).unwrap();
    assert_eq!(mapper.adjusted(&sample), sample);
}

#[test]
fn test_constant_source_is_finite() {
    let source = constant_tile(2, 3, 1, 4.0);
    let target = ramp_tile(2, 3, 1, 10.0, 5.0);
    let mapper = ValueMapper::fit(source.view(), target.view(), &MatchConfig::default()).unwrap();

    let adjusted = mapper.adjusted(&ramp_tile(2, 3, 1, -100.0, 100.0));
    assert!(adjusted.iter().all(|v| v.is_finite()));
    assert!(adjusted.iter().all(|&v| v == 15.0));
}

#[test]
fn test_single_tile_composites_to_itself() {
    let tile = ramp_tile(5, 7, 3, 1.0, 2.0);
    let mut matcher = TileMatcher::new("single");
    matcher.add(tile.clone(), Origin::new(0, 0)).unwrap();

    let composite = matcher.composite().unwrap();
    assert_eq!(composite.raster, tile);
    assert_eq!((composite.rect.width, composite.rect.height), (7, 5));
}

#[test]
fn test_gains_are_removed_across_grid() {
    let composite = curve_composite(ramp_grid(None), MatchConfig::default());

    // Every tile now agrees with the anchor's ramp on the shared columns.
    assert_eq!(composite.dim(), (10, 14, 3));
    let anchor = ramp_tile(4, 6, 3, 10.0, 10.0);
    assert_eq!(composite.slice(s![0..3, 0..4, ..]), anchor.slice(s![0..3, 0..4, ..]));
    for y in 0..10 {
        assert!((composite[[y, 4, 0]] - 50.0).abs() < 1e-9, "row {}", y);
    }
}

#[test]
fn test_missing_interior_cell() {
    let sink = Arc::new(MemorySink::new());
    let mut matcher = TileMatcher::with_sink("holey", sink.clone());
    for (origin, tile) in ramp_grid(Some((1, 1))) {
        matcher.add(tile, origin).unwrap();
    }

    let composite = matcher.composite().unwrap();
    assert_eq!(composite.raster.dim(), (10, 14, 3));
    assert_eq!(
        sink.count(|e| *e == Diagnostic::MissingTile { col: 1, row: 1 }),
        1
    );
}

#[test]
fn test_output_is_deterministic() {
    let first = curve_composite(ramp_grid(Some((2, 0))), MatchConfig::default());
    let second = curve_composite(ramp_grid(Some((2, 0))), MatchConfig::default());
    assert_eq!(first, second);
}

#[test]
fn test_clamp_extrapolation_flattens_beyond_overlap() {
    // The right tile's overlap only shows values 0 and 10; beyond that the
    // clamped curve holds the last target.
    let left = Array3::from_shape_fn((1, 4, 1), |(_, x, _)| x as f64 * 100.0);
    let right = Array3::from_shape_fn((1, 4, 1), |(_, x, _)| x as f64 * 10.0);
    let tiles = vec![(Origin::new(0, 0), left), (Origin::new(2, 0), right)];

    let clamped = curve_composite(tiles.clone(), MatchConfig::default());
    assert_eq!(clamped.slice(s![0, .., 0]).to_vec(), vec![0.0, 100.0, 200.0, 300.0, 300.0, 300.0]);

    let linear = curve_composite(
        tiles,
        MatchConfig::default().with_extrapolation(Extrapolation::Linear),
    );
    assert_eq!(linear.slice(s![0, .., 0]).to_vec(), vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0]);
}

#[test]
fn test_average_policy_blends_neighbors() {
    // (1,0) abuts the anchor without overlapping it, so it keeps its 30.
    // (1,1) then overlaps a left neighbor at 10 and a top neighbor at 30.
    let tiles = vec![
        (Origin::new(0, 0), constant_tile(4, 3, 1, 10.0)),
        (Origin::new(3, 0), constant_tile(4, 4, 1, 30.0)),
        (Origin::new(0, 3), constant_tile(4, 4, 1, 10.0)),
        (Origin::new(3, 3), constant_tile(4, 4, 1, 50.0)),
    ];

    let prefer_left = curve_composite(tiles.clone(), MatchConfig::default());
    assert_eq!(prefer_left[[1, 5, 0]], 30.0);
    assert_eq!(prefer_left[[6, 6, 0]], 10.0);

    let average = curve_composite(
        tiles,
        MatchConfig::default().with_neighbor_policy(NeighborPolicy::Average),
    );
    assert_eq!(average[[6, 6, 0]], 20.0);
}

#[test]
fn test_brightness_bytes_span_range() {
    let mut matcher = BrightnessMatcher::new("gain");
    for (origin, tile) in ramp_grid(None) {
        matcher.add(tile, origin).unwrap();
    }

    let composite = matcher.composite().unwrap();
    assert_eq!(composite.bytes.dim(), (10, 14, 3));
    assert_eq!(composite.bytes.iter().min(), Some(&0));
    assert_eq!(composite.bytes.iter().max(), Some(&255));
}

#[test]
fn test_stitch_tiles_dispatches() {
    let tiles = || {
        vec![
            (Origin::new(0, 0), constant_tile(2, 4, 3, 80.0)),
            (Origin::new(2, 0), constant_tile(2, 4, 3, 40.0)),
        ]
    };

    let curve = stitch_tiles("curve", tiles(), &MatchConfig::default(), Arc::new(NullSink)).unwrap();
    assert!(curve.bytes.iter().all(|&b| b == 80));

    let config = MatchConfig::default().with_strategy(Strategy::Brightness);
    let gain = stitch_tiles("gain", tiles(), &config, Arc::new(NullSink)).unwrap();
    // Matched to a constant composite, which rescales to black
    assert!(gain.bytes.iter().all(|&b| b == 0));
}
