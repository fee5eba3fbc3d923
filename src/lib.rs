//! # adpack
//!
//! Build and package HTML5 advertising creatives. A campaign is a tree of
//! variants (creative directions) and sizes (ad formats); each
//! `<variant>/<size>` folder is built into a self-contained bundle and zipped
//! for delivery to the ad server.
//!
//! # Architecture: Stage Graph
//!
//! ```text
//! makesprites   src/variants/v/s/assets/sprites/*  →  txtsprite.png + txtsprite.css
//! clean         dev/*, dist/*                      →  (removed)
//! build         src/global + src/variants/v/s      →  dev/v/s/
//! zip           dev/v/s/                           →  dist/<client> <campaign> v s v<version>.zip
//! ```
//!
//! `build` depends on `clean` and `zip` on `build`; `makesprites` runs on
//! demand because its output is committed back into the sources. Within a
//! stage every `(variant, size)` pair is processed in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Stage graph, per-pair fan-out, `check` dry run |
//! | [`sprite`] | Sprite sheet packing, compositing, PNG compression, stylesheet |
//! | [`bundle`] | One pair's build: merge, concatenate, inject |
//! | [`assets`] | Asset merging and stylesheet/script concatenation |
//! | [`inject`] | Injection markers and `{{token}}` substitution |
//! | [`archive`] | Reproducible per-pair zips with size reports |
//! | [`clean`] | Emptying the build and distribution roots |
//! | [`layout`] | Variant/size discovery and selection |
//! | [`naming`] | `<width>x<height>` size name parsing |
//! | [`metadata`] | `package.json` project descriptor |
//! | [`config`] | `config.toml` loading, merging, validation |
//! | [`fsio`] | Durable (fsynced) writes |
//! | [`types`] | `Pair` and `Selection` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Durable Writes Instead of Delays
//!
//! The archiver re-reads the build output from disk. Every file a later
//! stage depends on is written with [`fsio::write_synced`] (write, flush,
//! fsync) and stages run strictly one after another, so a settled stage's
//! output is complete before the next one looks at it.
//!
//! ## Sources Stay Sources
//!
//! Sprite sheets are written next to the images they were packed from and
//! are then treated like any hand-made asset. The build never regenerates
//! them, which keeps `build` fast and its output reproducible byte for byte.
//!
//! ## Fail Fast
//!
//! The first pair that fails stops its stage and the run; the error names
//! the stage and the pair. `check` is the collect-everything alternative.

pub mod archive;
pub mod assets;
pub mod bundle;
pub mod clean;
pub mod config;
pub mod fsio;
pub mod inject;
pub mod layout;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod sprite;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
