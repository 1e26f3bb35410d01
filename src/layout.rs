// src/layout.rs

use crate::period::Period;
use anyhow::{Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// On-disk working tree:
///
/// ```text
/// <data>/                       extracts
/// <data>/downloads/             reference cache
/// <data>/downloads/hud/         per-period source spreadsheets
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    data_dir: PathBuf,
    downloads_dir: PathBuf,
    hud_dir: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let downloads_dir = data_dir.join("downloads");
        let hud_dir = downloads_dir.join("hud");
        Self {
            data_dir,
            downloads_dir,
            hud_dir,
        }
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Cache path for the reference feed: its URL file name with a `.csv` extension.
    pub fn reference_cache(&self, file_name: &str) -> PathBuf {
        self.downloads_dir
            .join(Path::new(file_name).with_extension("csv"))
    }

    pub fn crosswalk_source(&self, period: &Period) -> PathBuf {
        self.hud_dir.join(period.crosswalk_file_name())
    }

    pub fn extract_path(&self, period: &Period) -> PathBuf {
        self.data_dir.join(period.extract_file_name())
    }

    /// Create every working directory that is missing. Safe to call repeatedly.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.data_dir, &self.downloads_dir, &self.hud_dir] {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(())
    }

    /// Delete the downloads tree. Extracts in the data root are untouched.
    pub fn remove_downloads(&self) -> Result<()> {
        remove_tree(&self.downloads_dir)
    }
}

/// Remove a file or a directory tree. A path that is already gone is not an error.
fn remove_tree(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("inspecting {}", path.display())),
    };

    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}
