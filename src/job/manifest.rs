//! JSON manifest describing which tiles make up which panorama.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::grid::{Origin, Rect};

/// One source frame and where it sits in its panorama.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Identifier passed to the image supplier
    pub id: String,

    pub x: u32,
    pub y: u32,

    /// Declared frame size, used only for layout previews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,

    /// Capture group; consecutive records sharing it form one panorama
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl TileRecord {
    pub fn new(id: impl Into<String>, x: u32, y: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w: None,
            h: None,
            group: None,
        }
    }

    pub fn with_size(mut self, w: u32, h: u32) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// An explicitly named panorama.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanoramaSpec {
    pub name: String,
    pub tiles: Vec<TileRecord>,
}

/// Top-level manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Coordinates count from 1 rather than 0
    #[serde(default)]
    pub one_based: bool,

    #[serde(default)]
    pub panoramas: Vec<PanoramaSpec>,

    /// Flat records, grouped with [`group_records`]
    #[serde(default)]
    pub records: Vec<TileRecord>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, JobError> {
        serde_json::from_str(text).map_err(|e| JobError::Manifest(e.to_string()))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| JobError::Manifest(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Every panorama in the manifest, with zero-based origins.
    ///
    /// Explicit panoramas come first, then the groups found in `records`.
    pub fn jobs(&self) -> Result<Vec<PanoramaJob>, JobError> {
        let grouped = group_records(self.records.iter().cloned())
            .into_iter()
            .map(|tiles| {
                let group = tiles[0].group.clone().unwrap_or_default();
                PanoramaSpec {
                    name: format!("pano_{}", group),
                    tiles,
                }
            });

        self.panoramas
            .iter()
            .cloned()
            .chain(grouped)
            .map(|spec| PanoramaJob::from_spec(spec, self.one_based))
            .collect()
    }
}

/// Split records into runs of equal `group`, dropping runs of a single
/// record. Records are expected to arrive ordered by group.
pub fn group_records<I>(records: I) -> Vec<Vec<TileRecord>>
where
    I: IntoIterator<Item = TileRecord>,
{
    let mut groups = Vec::new();
    let mut current: Vec<TileRecord> = Vec::new();

    for record in records {
        if current.first().is_some_and(|first| first.group != record.group) {
            if current.len() > 1 {
                groups.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
        current.push(record);
    }
    if current.len() > 1 {
        groups.push(current);
    }
    groups
}

// =============================================================================
// Panorama Job
// =============================================================================

/// A tile to fetch and where to place it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobTile {
    pub id: String,
    pub origin: Origin,
    pub size: Option<(u32, u32)>,
}

/// One panorama to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanoramaJob {
    pub name: String,
    pub tiles: Vec<JobTile>,
}

impl PanoramaJob {
    pub fn new(name: impl Into<String>, tiles: Vec<JobTile>) -> Self {
        Self {
            name: name.into(),
            tiles,
        }
    }

    /// Convert a manifest entry, shifting one-based coordinates to zero.
    pub fn from_spec(spec: PanoramaSpec, one_based: bool) -> Result<Self, JobError> {
        let base = u32::from(one_based);
        let tiles = spec
            .tiles
            .into_iter()
            .map(|record| {
                let (Some(x), Some(y)) = (record.x.checked_sub(base), record.y.checked_sub(base))
                else {
                    return Err(JobError::Manifest(format!(
                        "tile {} in {} has coordinate ({}, {}) below origin {}",
                        record.id, spec.name, record.x, record.y, base
                    )));
                };
                Ok(JobTile {
                    id: record.id,
                    origin: Origin::new(x, y),
                    size: record.w.zip(record.h),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: spec.name,
            tiles,
        })
    }

    /// Area from `(0, 0)` to the furthest declared tile extent.
    pub fn bounding_rect(&self) -> Rect {
        self.tiles.iter().fold(Rect::default(), |rect, tile| {
            let (width, height) = tile.size.unwrap_or((0, 0));
            rect.union(&Rect::new(tile.origin.x, tile.origin.y, width, height))
        })
    }
}
