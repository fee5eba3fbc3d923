//! Emptying the build and distribution roots.
//!
//! The roots themselves survive; only their contents go. A root that does
//! not exist yet counts as already clean.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("cannot remove {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level entries removed from each root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub dev: usize,
    pub dist: usize,
}

/// Remove everything inside `dir`. Returns the number of top-level entries
/// removed.
pub fn empty_dir(dir: &Path) -> Result<usize, CleanError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| CleanError::Io { path, source }
    };
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        // DirEntry::file_type does not follow symlinks: a link to a folder
        // is unlinked, never descended into.
        let is_dir = entry.file_type().map_err(io_err(&path))?.is_dir();
        if is_dir {
            fs::remove_dir_all(&path).map_err(io_err(&path))?;
        } else {
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
        removed += 1;
    }
    Ok(removed)
}

pub fn clean(dev: &Path, dist: &Path) -> Result<CleanReport, CleanError> {
    let report = CleanReport {
        dev: empty_dir(dev)?,
        dist: empty_dir(dist)?,
    };
    tracing::debug!(dev = report.dev, dist = report.dist, "cleaned");
    Ok(report)
}
