//! Asset merging and stylesheet/script concatenation.
//!
//! Both halves of the build that only move bytes around live here. Global
//! sources always come first so a pair can override them: a pair asset with
//! the same relative path replaces the global one, and pair CSS rules follow
//! the global rules in the cascade.
//!
//! ```text
//! src/global/assets/**          ─┐
//! src/variants/v/s/assets/**    ─┴─▶ dev/v/s/assets/**    (minus assets/sprites/)
//! src/global/styles/*.css       ─┐
//! src/variants/v/s/*.css        ─┴─▶ dev/v/s/screen.css
//! src/global/scripts/**/*.js    ─┐
//! src/variants/v/s/*.js         ─┴─▶ dev/v/s/scripts.min.js
//! ```
//!
//! Concatenation is a straight join with `\n` between files; nothing is
//! minified despite the default script name.

use crate::fsio::{copy_file, write_synced};
use crate::layout::files_with_extension;
use crate::sprite::SPRITE_SOURCE_DIR;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> AssetError + '_ {
    move |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One concatenated output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concatenated {
    pub path: PathBuf,
    /// Inputs in the order they were joined.
    pub parts: Vec<PathBuf>,
    pub bytes: u64,
}

// ============================================================================
// Merge
// ============================================================================

/// Copy every file below `src` into `dst`, keeping relative paths.
///
/// Directories for which `skip` returns true are not descended into. A
/// missing `src` copies nothing.
fn copy_tree(src: &Path, dst: &Path, skip: impl Fn(&Path) -> bool) -> Result<usize, AssetError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    let walker = WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && skip(e.path())));
    for entry in walker {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        // WalkDir yields paths rooted at `src`.
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        copy_file(entry.path(), &target).map_err(io_err(&target))?;
        copied += 1;
    }
    Ok(copied)
}

/// Merge global and pair assets into `<out_dir>/assets/`.
///
/// Global files are copied first, then the pair's, so pair files win on a
/// name clash. The pair's sprite sources are never copied. Files already in
/// the destination are left alone unless overwritten. Returns the number of
/// copy operations.
pub fn merge_assets(global_dir: &Path, pair_dir: &Path, out_dir: &Path) -> Result<usize, AssetError> {
    let dst = out_dir.join("assets");
    let global = copy_tree(&global_dir.join("assets"), &dst, |_| false)?;
    let sprites = pair_dir.join(SPRITE_SOURCE_DIR);
    let own = copy_tree(&pair_dir.join("assets"), &dst, |p| p == sprites)?;
    tracing::debug!(global, own, dst = %dst.display(), "assets merged");
    Ok(global + own)
}

// ============================================================================
// Concatenation
// ============================================================================

/// Every `*.<ext>` file below `dir`, sorted by relative path.
fn files_recursive(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, AssetError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let matches = entry
            .path()
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if entry.file_type().is_file() && matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn concat_into(parts: Vec<PathBuf>, out: &Path) -> Result<Concatenated, AssetError> {
    let mut joined = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            joined.push(b'\n');
        }
        joined.extend(std::fs::read(part).map_err(io_err(part))?);
    }
    write_synced(out, &joined).map_err(io_err(out))?;
    Ok(Concatenated {
        path: out.to_path_buf(),
        parts,
        bytes: joined.len() as u64,
    })
}

/// `<global>/styles/*.css` then `<pair>/*.css`, joined into `out`.
///
/// `out` is written even when there is nothing to join.
pub fn concat_styles(global_dir: &Path, pair_dir: &Path, out: &Path) -> Result<Concatenated, AssetError> {
    let styles = global_dir.join("styles");
    let mut parts = files_with_extension(&styles, "css").map_err(io_err(&styles))?;
    parts.extend(files_with_extension(pair_dir, "css").map_err(io_err(pair_dir))?);
    concat_into(parts, out)
}

/// `<global>/scripts/**/*.js` then `<pair>/*.js`, joined into `out`.
pub fn concat_scripts(global_dir: &Path, pair_dir: &Path, out: &Path) -> Result<Concatenated, AssetError> {
    let mut parts = files_recursive(&global_dir.join("scripts"), "js")?;
    parts.extend(files_with_extension(pair_dir, "js").map_err(io_err(pair_dir))?);
    concat_into(parts, out)
}
