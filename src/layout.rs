//! Project layout discovery.
//!
//! Every stage works over the same two-level tree: variants, then sizes.
//!
//! ```text
//! src/
//! ├── global/                      # Shared by every size
//! │   ├── assets/                  # Copied into every bundle
//! │   ├── styles/*.css             # Prepended to every screen.css
//! │   └── scripts/**/*.js          # Prepended to every scripts.min.js
//! └── variants/
//!     ├── susan/                   # Variant
//!     │   ├── 300x250/             # Size
//!     │   │   ├── index.html       # Template (exactly one)
//!     │   │   ├── banner.css
//!     │   │   ├── banner.js
//!     │   │   └── assets/
//!     │   │       ├── logo.png
//!     │   │       └── sprites/     # Sprite sources, never copied
//!     │   └── tablet/
//!     └── thomas/
//!         └── 728x90/
//! ```
//!
//! Folder names are listed in sorted order so repeated runs visit pairs
//! identically. The archiver re-discovers pairs from the build output rather
//! than reusing the build stage's list: what it zips is whatever is on disk.

use crate::types::{Pair, Selection};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("cannot list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("variant {variant:?} not found in {root}")]
    UnknownVariant { variant: String, root: PathBuf },
    #[error("nothing matches variant={variant:?} size={size:?} in {root}")]
    NothingSelected {
        variant: Option<String>,
        size: Option<String>,
        root: PathBuf,
    },
}

/// Names of the immediate subdirectories of `dir`, sorted.
///
/// Files are skipped. Fails if `dir` is missing or is not a directory.
pub fn list_folders(dir: &Path) -> Result<Vec<String>, LayoutError> {
    let io_err = |source| LayoutError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let meta = fs::metadata(dir).map_err(io_err)?;
    if !meta.is_dir() {
        return Err(LayoutError::NotADirectory(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Every (variant, size) under `root`, restricted by `selection`.
///
/// - A selected variant must exist.
/// - A selected size drops variants that do not have it.
/// - A non-trivial selection matching nothing is an error; an empty tree
///   with no selection is not.
pub fn discover_pairs(root: &Path, selection: &Selection) -> Result<Vec<Pair>, LayoutError> {
    let variants = match &selection.variant {
        Some(variant) => {
            if !root.join(variant).is_dir() {
                return Err(LayoutError::UnknownVariant {
                    variant: variant.clone(),
                    root: root.to_path_buf(),
                });
            }
            vec![variant.clone()]
        }
        None => list_folders(root)?,
    };

    let mut pairs = Vec::new();
    for variant in variants {
        let sizes = list_folders(&root.join(&variant))?;
        pairs.extend(
            sizes
                .into_iter()
                .filter(|size| selection.size.as_ref().is_none_or(|s| s == size))
                .map(|size| Pair::new(variant.clone(), size)),
        );
    }

    if pairs.is_empty() && !selection.is_all() {
        return Err(LayoutError::NothingSelected {
            variant: selection.variant.clone(),
            size: selection.size.clone(),
            root: root.to_path_buf(),
        });
    }
    Ok(pairs)
}

/// Every pair currently present under `root`; a missing root is empty.
pub fn discover_existing_pairs(root: &Path) -> Result<Vec<Pair>, LayoutError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    discover_pairs(root, &Selection::all())
}

/// Files directly inside `dir` with the given extension, sorted by name.
///
/// A missing `dir` yields an empty list.
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, std::io::Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir)?.map(|e| e.map(|e| e.path()));
    sorted_matching(entries, |p| {
        p.is_file()
            && p.extension()
                .map(|e| e.eq_ignore_ascii_case(ext))
                .unwrap_or(false)
    })
}

/// Keep the paths accepted by `keep`, sorted; the first entry error aborts.
pub(crate) fn sorted_matching<I, F>(entries: I, keep: F) -> Result<Vec<PathBuf>, std::io::Error>
where
    I: IntoIterator<Item = Result<PathBuf, std::io::Error>>,
    F: Fn(&Path) -> bool,
{
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
