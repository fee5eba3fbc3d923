//! Durable file writes.
//!
//! Everything a later stage reads back (sprites, bundles, templates) goes
//! through [`write_synced`]: the bytes are written, flushed and fsynced
//! before the call returns, so a stage that has returned has its output on
//! disk. The archiver's directory scan depends on this.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write `content` to `path`, creating parent directories, then fsync.
pub fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    file.flush()?;
    file.sync_all()
}

/// Copy `src` to `dst`, creating parent directories. Returns bytes copied.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)
}
