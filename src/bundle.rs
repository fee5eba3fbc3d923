//! Per-pair build: merge, concatenate, inject.
//!
//! Produces `<dev>/<variant>/<size>/` from the pair's sources plus the
//! global folder. Tokens are derived before anything is written, so a
//! malformed size name fails without leaving a half-built folder behind.

use crate::assets::{self, AssetError, Concatenated};
use crate::config::{BuildConfig, ProjectPaths};
use crate::inject::{self, InjectError, References, Tokens};
use crate::metadata::Metadata;
use crate::types::Pair;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Inject(#[from] InjectError),
}

/// What one pair's build wrote.
#[derive(Debug, Clone)]
pub struct PairBuild {
    pub pair: Pair,
    pub out_dir: PathBuf,
    /// Asset copy operations (global + pair).
    pub assets: usize,
    pub stylesheet: Concatenated,
    pub script: Concatenated,
    pub template: PathBuf,
}

pub fn build_pair(
    pair: &Pair,
    paths: &ProjectPaths,
    build: &BuildConfig,
    metadata: &Metadata,
) -> Result<PairBuild, BundleError> {
    let src_dir = pair.dir_in(&paths.variants);
    let out_dir = pair.dir_in(&paths.dev);
    let tokens = Tokens::for_pair(metadata, pair, build.strict_sizes)?;

    let assets = assets::merge_assets(&paths.global, &src_dir, &out_dir)?;
    let stylesheet =
        assets::concat_styles(&paths.global, &src_dir, &out_dir.join(&build.stylesheet))?;
    let script = assets::concat_scripts(&paths.global, &src_dir, &out_dir.join(&build.script))?;

    let refs = References {
        stylesheet: build.stylesheet.clone(),
        script: build.script.clone(),
    };
    let template = inject::inject_template(&src_dir, &out_dir, &refs, &tokens)?;

    tracing::info!(pair = %pair, assets, "pair built");
    Ok(PairBuild {
        pair: pair.clone(),
        out_dir,
        assets,
        stylesheet,
        script,
        template,
    })
}
