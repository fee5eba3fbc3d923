//! Delivery archives.
//!
//! One zip per pair folder found under the build root, written flat into the
//! distribution root:
//!
//! ```text
//! dev/susan/300x250/**  ──▶  dist/Acme Spring susan 300x250 v1.2.0.zip
//! ```
//!
//! Pairs are re-discovered from disk rather than taken from the build stage,
//! so the archive reflects exactly what is in `dev/`. Entry paths are
//! relative to the pair folder (`index.html`, `assets/logo.png`), entries are
//! added in sorted order and every timestamp is pinned to 1980-01-01, so the
//! same build always produces the same bytes.

use crate::metadata::Metadata;
use crate::types::Pair;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("zip error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// One member of a written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, `/`-separated; directories end in `/`.
    pub name: String,
    pub size: u64,
    pub compressed: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub pair: Pair,
    /// Archive file name.
    pub name: String,
    pub path: PathBuf,
    pub entries: Vec<ArchiveEntry>,
    /// Sum of uncompressed file sizes.
    pub total: u64,
    /// Size of the zip on disk.
    pub bytes: u64,
}

fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Entry options for a deflate level; level 0 stores members uncompressed.
fn entry_options(compression_level: u32) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().last_modified_time(DateTime::default());
    match compression_level {
        0 => options.compression_method(CompressionMethod::Stored),
        level => options
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level))),
    }
}

/// Zip `<dev_root>/<variant>/<size>/` into `dist_root`.
///
/// The archive is written under a hidden `.partial` name and renamed into
/// place once complete; on failure the partial file is removed, so `dist/`
/// only ever holds finished archives.
pub fn archive_pair(
    pair: &Pair,
    dev_root: &Path,
    dist_root: &Path,
    metadata: &Metadata,
    compression_level: u32,
) -> Result<ArchiveReport, ArchiveError> {
    let src = pair.dir_in(dev_root);
    let name = metadata.archive_name(&pair.variant, &pair.size);
    let path = dist_root.join(&name);
    let partial = dist_root.join(format!(".{name}.partial"));

    fs::create_dir_all(dist_root).map_err(io_err(dist_root))?;
    if let Err(err) = write_archive(&src, &partial, entry_options(compression_level)) {
        if let Err(cleanup) = fs::remove_file(&partial) {
            tracing::debug!(file = %partial.display(), error = %cleanup, "partial archive not removed");
        }
        return Err(err);
    }
    fs::rename(&partial, &path).map_err(io_err(&path))?;

    let entries = read_entries(&path)?;
    let total = entries.iter().map(|e| e.size).sum();
    let bytes = fs::metadata(&path).map_err(io_err(&path))?.len();
    tracing::info!(archive = %path.display(), entries = entries.len(), bytes, "archive written");

    Ok(ArchiveReport {
        pair: pair.clone(),
        name,
        path,
        entries,
        total,
        bytes,
    })
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError {
    let path = path.to_path_buf();
    move |source| ArchiveError::Io { path, source }
}

/// Write every entry under `src`, sorted, to a fresh zip at `out`.
fn write_archive(src: &Path, out: &Path, options: SimpleFileOptions) -> Result<(), ArchiveError> {
    let zip_err = |source: zip::result::ZipError| ArchiveError::Zip {
        path: out.to_path_buf(),
        source,
    };

    let file = File::create(out).map_err(io_err(out))?;
    let mut zip = ZipWriter::new(file);
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let member = entry_name(rel);
        if entry.file_type().is_dir() {
            zip.add_directory(member, options).map_err(zip_err)?;
        } else {
            zip.start_file(member, options).map_err(zip_err)?;
            let mut input = File::open(entry.path()).map_err(io_err(entry.path()))?;
            io::copy(&mut input, &mut zip).map_err(io_err(entry.path()))?;
        }
    }

    let file = zip.finish().map_err(zip_err)?;
    file.sync_all().map_err(io_err(out))
}

/// Member sizes of an existing archive, in archive order.
pub fn read_entries(path: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let zip_err = |source: zip::result::ZipError| ArchiveError::Zip {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(zip_err)?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let member = archive.by_index(i).map_err(zip_err)?;
        entries.push(ArchiveEntry {
            name: member.name().to_string(),
            size: member.size(),
            compressed: member.compressed_size(),
            is_dir: member.is_dir(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_metadata;
    use std::io::Read;
    use tempfile::TempDir;

    fn built_pair(dev: &Path) -> Pair {
        let pair = Pair::new("susan", "300x250");
        let dir = pair.dir_in(dev);
        fs::create_dir_all(dir.join("assets/img")).unwrap();
        fs::write(dir.join("index.html"), "<html>".repeat(200)).unwrap();
        fs::write(dir.join("screen.css"), "body{}").unwrap();
        fs::write(dir.join("assets/img/bg.jpg"), [0u8; 64]).unwrap();
        pair
    }

    #[test]
    fn archive_is_named_after_metadata_and_pair() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let dist = tmp.path().join("dist");
        let pair = built_pair(&dev);

        let report = archive_pair(&pair, &dev, &dist, &sample_metadata(), 9).unwrap();
        assert_eq!(report.name, "Acme Spring susan 300x250 v1.2.0.zip");
        assert_eq!(report.path, dist.join(&report.name));
        assert!(report.bytes > 0);
        assert_eq!(report.bytes, fs::metadata(&report.path).unwrap().len());
    }

    #[test]
    fn entries_are_relative_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let pair = built_pair(&dev);

        let report =
            archive_pair(&pair, &dev, &tmp.path().join("dist"), &sample_metadata(), 9).unwrap();
        let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "assets/",
                "assets/img/",
                "assets/img/bg.jpg",
                "index.html",
                "screen.css"
            ]
        );
        assert_eq!(report.total, 1200 + 6 + 64);
    }

    #[test]
    fn archive_contents_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let pair = built_pair(&dev);
        let report =
            archive_pair(&pair, &dev, &tmp.path().join("dist"), &sample_metadata(), 9).unwrap();

        let mut archive = ZipArchive::new(File::open(&report.path).unwrap()).unwrap();
        let mut css = String::new();
        archive
            .by_name("screen.css")
            .unwrap()
            .read_to_string(&mut css)
            .unwrap();
        assert_eq!(css, "body{}");
    }

    #[test]
    fn repetitive_content_compresses() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let pair = built_pair(&dev);
        let report =
            archive_pair(&pair, &dev, &tmp.path().join("dist"), &sample_metadata(), 9).unwrap();
        let html = report
            .entries
            .iter()
            .find(|e| e.name == "index.html")
            .unwrap();
        assert!(html.compressed < html.size);
    }

    #[test]
    fn rezipping_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let dist = tmp.path().join("dist");
        let pair = built_pair(&dev);

        let first = archive_pair(&pair, &dev, &dist, &sample_metadata(), 6).unwrap();
        let a = fs::read(&first.path).unwrap();
        let second = archive_pair(&pair, &dev, &dist, &sample_metadata(), 6).unwrap();
        let b = fs::read(&second.path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overwrites_previous_archive() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let dist = tmp.path().join("dist");
        let pair = built_pair(&dev);
        fs::create_dir_all(&dist).unwrap();
        let name = sample_metadata().archive_name("susan", "300x250");
        fs::write(dist.join(&name), "stale").unwrap();

        let report = archive_pair(&pair, &dev, &dist, &sample_metadata(), 9).unwrap();
        assert_eq!(read_entries(&report.path).unwrap().len(), 5);
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 1);
    }

    #[test]
    fn level_zero_stores_members() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let pair = built_pair(&dev);

        let report =
            archive_pair(&pair, &dev, &tmp.path().join("dist"), &sample_metadata(), 0).unwrap();
        let files: Vec<&ArchiveEntry> = report.entries.iter().filter(|e| !e.is_dir).collect();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|e| e.compressed == e.size));

        let mut archive = ZipArchive::new(File::open(&report.path).unwrap()).unwrap();
        let mut css = String::new();
        archive
            .by_name("screen.css")
            .unwrap()
            .read_to_string(&mut css)
            .unwrap();
        assert_eq!(css, "body{}");
    }

    #[test]
    fn every_accepted_level_archives() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let dist = tmp.path().join("dist");
        let pair = built_pair(&dev);

        for level in 0..=9 {
            let report = archive_pair(&pair, &dev, &dist, &sample_metadata(), level)
                .unwrap_or_else(|e| panic!("level {level}: {e}"));
            assert_eq!(report.entries.len(), 5);
        }
    }

    #[cfg(unix)]
    #[test]
    fn failed_archive_leaves_nothing_in_dist() {
        let tmp = TempDir::new().unwrap();
        let dev = tmp.path().join("dev");
        let dist = tmp.path().join("dist");
        let pair = built_pair(&dev);
        std::os::unix::fs::symlink(
            tmp.path().join("missing.png"),
            pair.dir_in(&dev).join("assets/broken.png"),
        )
        .unwrap();

        let err = archive_pair(&pair, &dev, &dist, &sample_metadata(), 9).unwrap_err();
        assert!(matches!(err, ArchiveError::Io { .. }));
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 0);
    }
}
