//! Sprite sheet generation.
//!
//! Stage 1 of the pipeline, run on demand (`makesprites`). For one pair:
//!
//! 1. Decode every image in `<pair>/assets/sprites/`
//! 2. Pack them into one sheet ([`packer`])
//! 3. Composite and encode a compressed PNG ([`compose`])
//! 4. Render the position rules ([`stylesheet`])
//! 5. Write `<pair>/assets/<image_name>` and `<pair>/<css_name>`
//!
//! Both artifacts are written back into the *source* folder: the build stage
//! then picks the image up as an ordinary asset and the stylesheet as an
//! ordinary per-size stylesheet. The two files are only written after both
//! have been produced in memory, so a failure never leaves one without the
//! other.

pub mod compose;
pub mod packer;
pub mod stylesheet;

use crate::config::SpritesConfig;
use crate::fsio::write_synced;
use packer::Block;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sprite sources, relative to a pair folder. Never copied into bundles.
pub const SPRITE_SOURCE_DIR: &str = "assets/sprites";

#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("sprite sources {first:?} and {second:?} both map to class .{class}")]
    DuplicateName {
        class: String,
        first: String,
        second: String,
    },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Settings for one sprite run; built from `[sprites]`.
#[derive(Debug, Clone)]
pub struct SpriteOptions {
    pub padding: u32,
    pub image_name: String,
    pub css_name: String,
    pub class_prefix: String,
}

impl From<&SpritesConfig> for SpriteOptions {
    fn from(config: &SpritesConfig) -> Self {
        Self {
            padding: config.padding,
            image_name: config.image_name.clone(),
            css_name: config.css_name.clone(),
            class_prefix: config.class_prefix.clone(),
        }
    }
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self::from(&SpritesConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `assets/sprites/` does not exist.
    NoSourceDir,
    /// `assets/sprites/` holds no images.
    NoImages,
    /// The size is never sprited (see `pipeline::SPRITELESS_SIZE`).
    ExcludedSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteOutcome {
    Written {
        image: PathBuf,
        stylesheet: PathBuf,
        count: usize,
        width: u32,
        height: u32,
        /// Encoded PNG size.
        bytes: u64,
    },
    Skipped(SkipReason),
}

/// Build the sprite sheet for the pair folder `pair_dir`.
pub fn build_sprite(pair_dir: &Path, options: &SpriteOptions) -> Result<SpriteOutcome, SpriteError> {
    let source_dir = pair_dir.join(SPRITE_SOURCE_DIR);
    if !source_dir.is_dir() {
        tracing::warn!(dir = %source_dir.display(), "no sprite folder, skipping");
        return Ok(SpriteOutcome::Skipped(SkipReason::NoSourceDir));
    }

    let sources = compose::list_sources(&source_dir)?;
    if sources.is_empty() {
        tracing::warn!(dir = %source_dir.display(), "sprite folder has no images, skipping");
        return Ok(SpriteOutcome::Skipped(SkipReason::NoImages));
    }

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    let mut blocks = Vec::with_capacity(sources.len());
    let mut images = Vec::with_capacity(sources.len());
    for path in &sources {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let class = stylesheet::class_name(&options.class_prefix, &name);
        if let Some(first) = seen.insert(class.clone(), name.clone()) {
            return Err(SpriteError::DuplicateName {
                class,
                first,
                second: name,
            });
        }
        let image = compose::load_source(path)?;
        tracing::debug!(file = %path.display(), w = image.width(), h = image.height(), "sprite source");
        blocks.push(Block::new(name, image.width(), image.height()));
        images.push(image);
    }

    let layout = packer::pack(&blocks, options.padding);
    let sheet = compose::compose(&layout, &images);
    let png = compose::encode_png(&sheet)?;
    let image_url = format!("assets/{}", options.image_name);
    let css = stylesheet::render_stylesheet(&layout, &image_url, &options.class_prefix);

    let image_path = pair_dir.join("assets").join(&options.image_name);
    let css_path = pair_dir.join(&options.css_name);
    write_synced(&image_path, &png)?;
    write_synced(&css_path, css.as_bytes())?;

    tracing::info!(
        dir = %pair_dir.display(),
        count = blocks.len(),
        width = layout.width,
        height = layout.height,
        "sprite sheet written"
    );
    Ok(SpriteOutcome::Written {
        image: image_path,
        stylesheet: css_path,
        count: blocks.len(),
        width: layout.width,
        height: layout.height,
        bytes: png.len() as u64,
    })
}
