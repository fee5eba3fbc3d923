//! Stage graph and per-pair fan-out.
//!
//! ```text
//! makesprites            (standalone, on demand)
//! clean ──▶ build ──▶ zip
//! ```
//!
//! Asking for a stage runs its dependencies first, each exactly once
//! ([`plan`]). Within a stage every pair is an independent unit of work
//! executed on the rayon pool; the stage settles when all units have, and
//! the first failing unit fails the stage and stops the run. Units of one
//! stage write disjoint folders, so nothing is locked.
//!
//! Metadata and configuration are loaded once by the caller and handed in
//! through [`Context`]; stages only read them.

use crate::archive::{self, ArchiveError, ArchiveReport};
use crate::bundle::{self, BundleError, PairBuild};
use crate::clean::{self, CleanError, CleanReport};
use crate::config::{ConfigError, PipelineConfig, ProjectPaths};
use crate::inject;
use crate::layout::{LayoutError, discover_existing_pairs, discover_pairs};
use crate::metadata::Metadata;
use crate::naming::{parse_size, pixel_dimensions};
use crate::sprite::{self, SkipReason, SpriteError, SpriteOptions, SpriteOutcome};
use crate::types::{Pair, Selection};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size folder that never gets a sprite sheet.
pub const SPRITELESS_SIZE: &str = "tablet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Clean,
    MakeSprites,
    Build,
    Zip,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Clean, Stage::MakeSprites, Stage::Build, Stage::Zip];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::MakeSprites => "makesprites",
            Stage::Build => "build",
            Stage::Zip => "zip",
        }
    }

    /// Stages that must have settled before this one starts.
    pub fn dependencies(self) -> &'static [Stage] {
        match self {
            Stage::Clean | Stage::MakeSprites => &[],
            Stage::Build => &[Stage::Clean],
            Stage::Zip => &[Stage::Build],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stages to run for `target`, dependencies first, each once.
pub fn plan(target: Stage) -> Vec<Stage> {
    fn visit(stage: Stage, order: &mut Vec<Stage>) {
        if order.contains(&stage) {
            return;
        }
        for &dep in stage.dependencies() {
            visit(dep, order);
        }
        order.push(stage);
    }
    let mut order = Vec::new();
    visit(target, &mut order);
    order
}

/// Failure of one pair's unit of work.
#[derive(Error, Debug)]
pub enum PairError {
    #[error(transparent)]
    Sprite(#[from] SpriteError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("clean failed: {0}")]
    Clean(#[from] CleanError),
    #[error("{stage} failed: {source}")]
    Discover {
        stage: Stage,
        #[source]
        source: LayoutError,
    },
    #[error("{stage} failed for {pair}: {source}")]
    Pair {
        stage: Stage,
        pair: Pair,
        #[source]
        source: PairError,
    },
}

/// Immutable inputs shared by every stage.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub paths: ProjectPaths,
    pub config: PipelineConfig,
    pub metadata: Metadata,
    /// Restricts `makesprites`; the other stages always cover every pair.
    pub selection: Selection,
}

impl Context {
    pub fn new(
        root: &Path,
        config: PipelineConfig,
        metadata: Metadata,
        selection: Selection,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            paths: config.paths.resolve(root),
            config,
            metadata,
            selection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSprite {
    pub pair: Pair,
    pub outcome: SpriteOutcome,
}

/// What a settled stage produced, per pair where applicable.
#[derive(Debug, Clone)]
pub enum StageReport {
    Clean(CleanReport),
    Sprites(Vec<PairSprite>),
    Build(Vec<PairBuild>),
    Zip(Vec<ArchiveReport>),
}

impl StageReport {
    pub fn stage(&self) -> Stage {
        match self {
            StageReport::Clean(_) => Stage::Clean,
            StageReport::Sprites(_) => Stage::MakeSprites,
            StageReport::Build(_) => Stage::Build,
            StageReport::Zip(_) => Stage::Zip,
        }
    }
}

/// Run one unit per pair on the pool; settle once all are done.
fn fan_out<T, F>(stage: Stage, pairs: &[Pair], unit: F) -> Result<Vec<T>, PipelineError>
where
    T: Send,
    F: Fn(&Pair) -> Result<T, PairError> + Sync,
{
    pairs
        .par_iter()
        .map(|pair| {
            unit(pair).map_err(|source| PipelineError::Pair {
                stage,
                pair: pair.clone(),
                source,
            })
        })
        .collect()
}

fn discover(stage: Stage) -> impl FnOnce(LayoutError) -> PipelineError {
    move |source| PipelineError::Discover { stage, source }
}

fn make_sprites(ctx: &Context) -> Result<Vec<PairSprite>, PipelineError> {
    let stage = Stage::MakeSprites;
    let pairs = discover_pairs(&ctx.paths.variants, &ctx.selection).map_err(discover(stage))?;
    let options = SpriteOptions::from(&ctx.config.sprites);
    fan_out(stage, &pairs, |pair| {
        let outcome = if pair.size == SPRITELESS_SIZE {
            tracing::debug!(pair = %pair, "size excluded from sprites");
            SpriteOutcome::Skipped(SkipReason::ExcludedSize)
        } else {
            sprite::build_sprite(&pair.dir_in(&ctx.paths.variants), &options)?
        };
        Ok(PairSprite {
            pair: pair.clone(),
            outcome,
        })
    })
}

fn build(ctx: &Context) -> Result<Vec<PairBuild>, PipelineError> {
    let stage = Stage::Build;
    let pairs = discover_pairs(&ctx.paths.variants, &Selection::all()).map_err(discover(stage))?;
    fan_out(stage, &pairs, |pair| {
        Ok(bundle::build_pair(
            pair,
            &ctx.paths,
            &ctx.config.build,
            &ctx.metadata,
        )?)
    })
}

fn zip(ctx: &Context) -> Result<Vec<ArchiveReport>, PipelineError> {
    let stage = Stage::Zip;
    let pairs = discover_existing_pairs(&ctx.paths.dev).map_err(discover(stage))?;
    fan_out(stage, &pairs, |pair| {
        Ok(archive::archive_pair(
            pair,
            &ctx.paths.dev,
            &ctx.paths.dist,
            &ctx.metadata,
            ctx.config.archive.compression_level,
        )?)
    })
}

/// Run a single stage, ignoring its dependencies.
///
/// Refuses to start when the output roots overlap the sources.
pub fn run_stage(ctx: &Context, stage: Stage) -> Result<StageReport, PipelineError> {
    ctx.paths.check_outputs(&ctx.root)?;
    tracing::info!(stage = %stage, "stage started");
    let report = match stage {
        Stage::Clean => StageReport::Clean(clean::clean(&ctx.paths.dev, &ctx.paths.dist)?),
        Stage::MakeSprites => StageReport::Sprites(make_sprites(ctx)?),
        Stage::Build => StageReport::Build(build(ctx)?),
        Stage::Zip => StageReport::Zip(zip(ctx)?),
    };
    tracing::info!(stage = %stage, "stage settled");
    Ok(report)
}

/// Run `target` and its dependencies in order.
///
/// `on_stage` sees each report as soon as its stage settles. All reports
/// are returned as well, in execution order.
pub fn run(
    ctx: &Context,
    target: Stage,
    mut on_stage: impl FnMut(Stage, &StageReport),
) -> Result<Vec<StageReport>, PipelineError> {
    let mut reports = Vec::new();
    for stage in plan(target) {
        let report = run_stage(ctx, stage)?;
        on_stage(stage, &report);
        reports.push(report);
    }
    Ok(reports)
}

// ============================================================================
// check
// ============================================================================

/// Findings of a dry run over the sources.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub pairs: Vec<Pair>,
    /// Would fail `build`.
    pub problems: Vec<String>,
    /// Would build, but look suspicious.
    pub warnings: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Validate the source tree without writing anything.
///
/// Every pair is inspected; findings are collected rather than stopping at
/// the first one.
pub fn check(ctx: &Context) -> Result<CheckReport, PipelineError> {
    let pairs = discover_pairs(&ctx.paths.variants, &Selection::all())
        .map_err(discover(Stage::Build))?;
    let mut report = CheckReport::default();
    if let Err(err) = ctx.paths.check_outputs(&ctx.root) {
        report.problems.push(err.to_string());
    }

    for pair in &pairs {
        let dir = pair.dir_in(&ctx.paths.variants);
        if let Err(err) = inject::find_template(&dir) {
            report.problems.push(format!("{pair}: {err}"));
        }

        if parse_size(&pair.size).is_none() {
            let message = format!("{pair}: size {:?} is not <width>x<height>", pair.size);
            if ctx.config.build.strict_sizes {
                report.problems.push(message);
            } else {
                report.warnings.push(message);
            }
        } else if pixel_dimensions(&pair.size).is_none() {
            report
                .warnings
                .push(format!("{pair}: size {:?} has non-numeric dimensions", pair.size));
        }

        let sprites = dir.join(sprite::SPRITE_SOURCE_DIR);
        if pair.size != SPRITELESS_SIZE && !sprites.is_dir() {
            report
                .warnings
                .push(format!("{pair}: no {} folder", sprite::SPRITE_SOURCE_DIR));
        }
    }

    report.pairs = pairs;
    Ok(report)
}
