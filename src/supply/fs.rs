//! Tile images read from a local directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SupplyError;

use super::ImageSupplier;

/// Reads `<dir>/<id>.<extension>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsImageSupplier {
    dir: PathBuf,
    extension: String,
}

impl FsImageSupplier {
    /// `extension` is given without the leading dot.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an identifier resolves to.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let mut file = id.to_string();
        if !self.extension.is_empty() {
            file.push('.');
            file.push_str(&self.extension);
        }
        self.dir.join(file)
    }
}

#[async_trait]
impl ImageSupplier for FsImageSupplier {
    async fn fetch_bytes(&self, id: &str) -> Result<Bytes, SupplyError> {
        let path = self.path_for(id);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SupplyError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(SupplyError::Io {
                id: id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
