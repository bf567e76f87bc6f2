//! Manifests, jobs and batch runs.

use std::sync::Arc;

use ndarray::Array3;

use pano_stitch::error::{JobError, SupplyError};
use pano_stitch::job::{run_job, BatchOptions, BatchRunner, Manifest};
use pano_stitch::matcher::MatchConfig;
use pano_stitch::raster::decode_raster;
use pano_stitch::supply::CachedSupplier;

use super::test_utils::{constant_frame, scratch_dir, MockSupplier};

const MANIFEST: &str = r#"{
    "one_based": true,
    "panoramas": [
        { "name": "good", "tiles": [
            { "id": "a", "x": 1, "y": 1, "w": 8, "h": 6 },
            { "id": "b", "x": 7, "y": 1, "w": 8, "h": 6 }
        ] },
        { "name": "broken", "tiles": [
            { "id": "a", "x": 1, "y": 1 },
            { "id": "missing", "x": 7, "y": 1 }
        ] }
    ],
    "records": [
        { "id": "c", "x": 1, "y": 1, "group": "0100" },
        { "id": "a", "x": 1, "y": 6, "group": "0100" },
        { "id": "lonely", "x": 1, "y": 1, "group": "0101" }
    ]
}"#;

fn supplier() -> MockSupplier {
    MockSupplier::new()
        .with_image("a", constant_frame(6, 8, 200))
        .with_image("b", constant_frame(6, 8, 100))
        .with_image("c", constant_frame(6, 8, 50))
}

#[tokio::test]
async fn test_manifest_jobs() {
    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();
    let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["good", "broken", "pano_0100"]);
    assert_eq!(jobs[0].bounding_rect().width, 14);
}

#[tokio::test]
async fn test_run_job_matches_frames() {
    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();
    let composite = run_job(&jobs[0], &supplier(), &MatchConfig::default())
        .await
        .unwrap();

    assert_eq!(composite.bytes.dim(), (6, 14, 3));
    assert!(composite.bytes.iter().all(|&b| b == 200));
}

#[tokio::test]
async fn test_run_job_in_lab_keeps_colors() {
    // Black and white rows span the whole lightness range
    let rows: [[u8; 3]; 6] = [
        [0, 0, 0],
        [255, 255, 255],
        [100, 101, 102],
        [200, 201, 202],
        [200, 60, 30],
        [40, 120, 220],
    ];
    let frame = Array3::from_shape_fn((6, 8, 3), |(y, _, c)| rows[y][c]);
    let supplier = MockSupplier::new()
        .with_image("a", frame.clone())
        .with_image("b", frame);

    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();
    let config = MatchConfig::default().with_lab(true);
    let composite = run_job(&jobs[0], &supplier, &config).await.unwrap();

    assert_eq!(composite.bytes.dim(), (6, 14, 3));
    for ((y, x, c), &byte) in composite.bytes.indexed_iter() {
        let expected = rows[y][c] as i32;
        assert!(
            (byte as i32 - expected).abs() <= 2,
            "pixel ({}, {}) channel {}: {} vs {}",
            x,
            y,
            c,
            byte,
            expected
        );
    }
}

#[tokio::test]
async fn test_run_job_with_16bit_frames() {
    let ramp = Array3::from_shape_fn((6, 8, 3), |(_, x, _)| x as u16 * 6_250);
    let supplier = MockSupplier::new()
        .with_image16("a", ramp.clone())
        .with_image16("b", ramp);

    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();
    let composite = run_job(&jobs[0], &supplier, &MatchConfig::default())
        .await
        .unwrap();

    // The anchor keeps its ramp, scaled from 16 to 8 bits
    for x in 0..6 {
        let expected = (x as f64 * 6_250.0 / 257.0).round() as u8;
        assert_eq!(composite.bytes[[0, x, 0]], expected);
    }
    let mut distinct: Vec<u8> = composite.bytes.iter().copied().collect();
    distinct.sort_unstable();
    distinct.dedup();
    assert!(distinct.len() > 6, "{:?}", distinct);
    assert!(!distinct.contains(&255));
}

#[tokio::test]
async fn test_failed_job_does_not_stop_batch() {
    let output_dir = scratch_dir("batch");
    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();
    let runner = BatchRunner::new(
        Arc::new(supplier()),
        BatchOptions::new(&output_dir).with_jobs(2),
    );

    let report = runner.run(jobs).await;
    assert_eq!(report.total(), 3);
    assert!(!report.is_success());

    let succeeded: Vec<&str> = report.succeeded.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(succeeded, vec!["good", "pano_0100"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "broken");
    assert!(matches!(
        report.failed[0].error,
        JobError::Supply(SupplyError::NotFound(_))
    ));

    let written = std::fs::read(output_dir.join("good.png")).unwrap();
    let raster = decode_raster(&written).unwrap();
    assert_eq!(raster.dim(), (6, 14, 3));
    assert!(raster.iter().all(|&v| v == 200.0));
    assert!(!output_dir.join("broken.png").exists());
}

#[tokio::test]
async fn test_undecodable_tile_fails_job() {
    let output_dir = scratch_dir("undecodable");
    let supplier = supplier().with_bytes("b", b"definitely not a png");
    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();

    let report = BatchRunner::new(Arc::new(supplier), BatchOptions::new(&output_dir))
        .run(jobs[..1].to_vec())
        .await;
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0].error,
        JobError::Supply(SupplyError::Raster(_))
    ));
}

#[tokio::test]
async fn test_cache_shared_across_jobs() {
    let output_dir = scratch_dir("cached");
    let cached = Arc::new(CachedSupplier::new(supplier()));
    let jobs = Manifest::from_json(MANIFEST).unwrap().jobs().unwrap();
    let good: Vec<_> = jobs.into_iter().filter(|j| j.name != "broken").collect();

    let runner = BatchRunner::new(
        cached.clone(),
        BatchOptions::new(&output_dir).with_jobs(1),
    );
    let report = runner.run(good).await;
    assert!(report.is_success());

    // "a" appears in both panoramas but is decoded once
    assert_eq!(cached.inner().fetch_count(), 3);
    let stats = cached.cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 3);
}
