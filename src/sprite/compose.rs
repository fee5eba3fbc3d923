//! Decoding sources, blitting the sheet, encoding the PNG.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, WebP) | `image::ImageReader` |
//! | Blit | `image::imageops::replace` onto a transparent RGBA canvas |
//! | Encode | `PngEncoder` with `CompressionType::Best` + adaptive filtering |
//!
//! The encode step is the compression pass: lossless, maximum deflate
//! effort, per-row filter selection.

use super::SpriteError;
use super::packer::Layout;
use crate::layout::sorted_matching;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::path::{Path, PathBuf};

/// Extensions treated as sprite sources; anything else in the folder is
/// ignored.
pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub fn is_sprite_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// Sprite sources directly inside `dir`, sorted. Missing `dir` is empty.
pub fn list_sources(dir: &Path) -> Result<Vec<PathBuf>, SpriteError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir)?.map(|e| e.map(|e| e.path()));
    Ok(sorted_matching(entries, |p| p.is_file() && is_sprite_source(p))?)
}

/// Decode one source image to RGBA.
pub fn load_source(path: &Path) -> Result<RgbaImage, SpriteError> {
    let decode_err = |e: image::ImageError| SpriteError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(decode_err)?;
    Ok(image.to_rgba8())
}

/// Blit `images` (same order as `layout.items`) onto a transparent sheet.
pub fn compose(layout: &Layout, images: &[RgbaImage]) -> RgbaImage {
    let mut sheet = RgbaImage::new(layout.width, layout.height);
    for (item, image) in layout.items.iter().zip(images) {
        image::imageops::replace(&mut sheet, image, i64::from(item.x), i64::from(item.y));
    }
    sheet
}

/// Encode the sheet as a maximally compressed PNG.
pub fn encode_png(sheet: &RgbaImage) -> Result<Vec<u8>, SpriteError> {
    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive)
        .write_image(
            sheet.as_raw(),
            sheet.width(),
            sheet.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| SpriteError::Encode(e.to_string()))?;
    Ok(bytes)
}
