//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a single user file at the project root; every key is
//! optional, so a project with no `config.toml` at all builds with the stock
//! layout.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! variants = "src/variants"     # <variant>/<size>/ source folders
//! global = "src/global"         # shared assets/, styles/, scripts/
//! dev = "dev"                   # build output root
//! dist = "dist"                 # archive output root (flat)
//! descriptor = "package.json"   # project metadata (client, campaign, version...)
//!
//! [sprites]
//! padding = 1                   # pixels between packed images
//! image_name = "txtsprite.png"  # written to <pair>/assets/
//! css_name = "txtsprite.css"    # written to <pair>/
//! class_prefix = "icon-"        # selector is .<prefix><image stem>
//!
//! [build]
//! stylesheet = "screen.css"     # concatenated styles
//! script = "scripts.min.js"     # concatenated scripts
//! strict_sizes = true           # <w>x<h> required; false lets `tablet` build
//!
//! [archive]
//! compression_level = 9         # deflate level 1-9, 0 stores uncompressed
//!
//! [processing]
//! max_processes = 4             # parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up at the project root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where sources are read from and outputs are written to.
    pub paths: PathsConfig,
    /// Sprite sheet generation settings.
    pub sprites: SpritesConfig,
    /// Bundle output names and size-name policy.
    pub build: BuildConfig,
    /// Zip settings.
    pub archive: ArchiveConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("sprites.image_name", &self.sprites.image_name),
            ("sprites.css_name", &self.sprites.css_name),
            ("build.stylesheet", &self.build.stylesheet),
            ("build.script", &self.build.script),
        ] {
            validate_file_name(key, value)?;
        }
        if self.build.stylesheet == self.build.script {
            return Err(ConfigError::Validation(
                "build.stylesheet and build.script must differ".into(),
            ));
        }
        if self.archive.compression_level > 9 {
            return Err(ConfigError::Validation(
                "archive.compression_level must be 0-9".into(),
            ));
        }
        for (key, value) in [
            ("paths.variants", &self.paths.variants),
            ("paths.global", &self.paths.global),
            ("paths.dev", &self.paths.dev),
            ("paths.dist", &self.paths.dist),
            ("paths.descriptor", &self.paths.descriptor),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.paths.dev == self.paths.dist {
            return Err(ConfigError::Validation(
                "paths.dev and paths.dist must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Output names land inside pair folders, so they must be bare file names.
fn validate_file_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "{key} must be a file name, not a path: {value:?}"
        )));
    }
    Ok(())
}

/// Source and output locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root holding `<variant>/<size>/` folders.
    pub variants: String,
    /// Root holding shared `assets/`, `styles/` and `scripts/`.
    pub global: String,
    /// Build output root.
    pub dev: String,
    /// Archive output root.
    pub dist: String,
    /// Project metadata descriptor (`.json` or `.toml`).
    pub descriptor: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            variants: "src/variants".to_string(),
            global: "src/global".to_string(),
            dev: "dev".to_string(),
            dist: "dist".to_string(),
            descriptor: "package.json".to_string(),
        }
    }
}

/// [`PathsConfig`] joined onto a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub variants: PathBuf,
    pub global: PathBuf,
    pub dev: PathBuf,
    pub dist: PathBuf,
    pub descriptor: PathBuf,
}

impl PathsConfig {
    /// Absolute entries stay absolute; relative ones hang off `root`.
    pub fn resolve(&self, root: &Path) -> ProjectPaths {
        ProjectPaths {
            variants: root.join(&self.variants),
            global: root.join(&self.global),
            dev: root.join(&self.dev),
            dist: root.join(&self.dist),
            descriptor: root.join(&self.descriptor),
        }
    }
}

impl ProjectPaths {
    /// Refuse output roots that would take sources with them when emptied.
    ///
    /// `clean` and `build` empty `dev` and `dist`, so neither may be the
    /// project root or contain it, the variants or global folders, or the
    /// descriptor. Paths are compared lexically after `.`/`..` folding.
    pub fn check_outputs(&self, root: &Path) -> Result<(), ConfigError> {
        let protected = [
            ("the project root", normalize(root)?),
            ("paths.variants", normalize(&self.variants)?),
            ("paths.global", normalize(&self.global)?),
            ("paths.descriptor", normalize(&self.descriptor)?),
        ];
        for (key, output) in [("paths.dev", &self.dev), ("paths.dist", &self.dist)] {
            let emptied = normalize(output)?;
            for (name, source) in &protected {
                if source.starts_with(&emptied) {
                    return Err(ConfigError::Validation(format!(
                        "{key} ({}) would empty {name} ({})",
                        emptied.display(),
                        source.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` folded.
fn normalize(path: &Path) -> Result<PathBuf, ConfigError> {
    let mut out = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Sprite sheet generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpritesConfig {
    /// Transparent pixels between packed images.
    pub padding: u32,
    /// Composite image file name, written under the pair's `assets/`.
    pub image_name: String,
    /// Stylesheet file name, written at the pair root.
    pub css_name: String,
    /// Class name prefix; the image stem is appended.
    pub class_prefix: String,
}

impl Default for SpritesConfig {
    fn default() -> Self {
        Self {
            padding: 1,
            image_name: "txtsprite.png".to_string(),
            css_name: "txtsprite.css".to_string(),
            class_prefix: "icon-".to_string(),
        }
    }
}

/// Bundle output names and size-name policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Concatenated stylesheet name.
    pub stylesheet: String,
    /// Concatenated script name.
    pub script: String,
    /// When true, a size folder without an `x` fails the build, `tablet`
    /// included. When false, `{{width}}`/`{{height}}` become empty and a
    /// warning is logged.
    pub strict_sizes: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            stylesheet: "screen.css".to_string(),
            script: "scripts.min.js".to_string(),
            strict_sizes: true,
        }
    }
}

/// Zip settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Deflate level 1-9 (9 = smallest); 0 stores members uncompressed.
    pub compression_level: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: 9,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PipelineConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# adpack Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the project root.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Locations
# ---------------------------------------------------------------------------
[paths]
# One folder per variant, one folder per size inside it:
#   src/variants/<variant>/<size>/
variants = "src/variants"

# Shared sources merged into every size:
#   assets/**  styles/*.css  scripts/**/*.js
global = "src/global"

# Build output, mirrors <variant>/<size>/. Emptied by `clean` and `build`.
dev = "dev"

# Archive output, one zip per size. Emptied by `clean` and `build`.
dist = "dist"

# Project descriptor supplying version, author, description and
# meta.client / meta.campaign. JSON (package.json) or TOML.
descriptor = "package.json"

# ---------------------------------------------------------------------------
# Sprite sheets (`makesprites`)
# ---------------------------------------------------------------------------
[sprites]
# Transparent pixels between packed images.
padding = 1

# Composite image, written to <variant>/<size>/assets/.
image_name = "txtsprite.png"

# Position rules, written to <variant>/<size>/ and bundled like any
# other stylesheet of that size.
css_name = "txtsprite.css"

# Each image gets the class .<class_prefix><file stem>.
class_prefix = "icon-"

# ---------------------------------------------------------------------------
# Bundling (`build`)
# ---------------------------------------------------------------------------
[build]
# Global then per-size stylesheets, concatenated.
stylesheet = "screen.css"

# Global then per-size scripts, concatenated (not minified).
script = "scripts.min.js"

# Size folders must be named <width>x<height>. With the default (true),
# a folder without dimensions, including the "tablet" size that
# `makesprites` skips, fails `build`. Projects with such folders set this
# to false: they then build with empty {{width}} / {{height}} and a warning.
strict_sizes = true

# ---------------------------------------------------------------------------
# Archives (`zip`)
# ---------------------------------------------------------------------------
[archive]
# Deflate level 1-9, 9 being smallest. 0 stores files uncompressed.
compression_level = 9

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_stock_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.paths.variants, "src/variants");
        assert_eq!(config.paths.global, "src/global");
        assert_eq!(config.paths.dev, "dev");
        assert_eq!(config.paths.dist, "dist");
        assert_eq!(config.paths.descriptor, "package.json");
    }

    #[test]
    fn default_config_has_output_names() {
        let config = PipelineConfig::default();
        assert_eq!(config.sprites.image_name, "txtsprite.png");
        assert_eq!(config.sprites.css_name, "txtsprite.css");
        assert_eq!(config.sprites.padding, 1);
        assert_eq!(config.build.stylesheet, "screen.css");
        assert_eq!(config.build.script, "scripts.min.js");
        assert!(config.build.strict_sizes);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[sprites]
padding = 2
"#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sprites.padding, 2);
        // Defaults preserved
        assert_eq!(config.sprites.image_name, "txtsprite.png");
        assert_eq!(config.paths.dev, "dev");
    }

    #[test]
    fn paths_resolve_against_root() {
        let paths = PathsConfig::default().resolve(Path::new("/work/spring"));
        assert_eq!(paths.variants, Path::new("/work/spring/src/variants"));
        assert_eq!(paths.dev, Path::new("/work/spring/dev"));
        assert_eq!(paths.descriptor, Path::new("/work/spring/package.json"));
    }

    #[test]
    fn absolute_paths_ignore_root() {
        let config = PathsConfig {
            dist: "/srv/deliveries".into(),
            ..PathsConfig::default()
        };
        assert_eq!(
            config.resolve(Path::new("/work/spring")).dist,
            Path::new("/srv/deliveries")
        );
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.build.stylesheet, "screen.css");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[paths]
dev = "build"

[build]
strict_sizes = false
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.paths.dev, "build");
        assert!(!config.build.strict_sizes);
        assert_eq!(config.paths.dist, "dist");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "[archive]\ncompression_level = 12\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[build]
stylesheet = "screen.css"
script = "scripts.min.js"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[build]
script = "app.js"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let build = merged.get("build").unwrap();
        assert_eq!(build.get("script").unwrap().as_str(), Some("app.js"));
        assert_eq!(build.get("stylesheet").unwrap().as_str(), Some("screen.css"));
    }

    #[test]
    fn merge_toml_scalar_replaces_table() {
        let base: toml::Value = toml::from_str("[a]\nb = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(2));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("[sprites]\npading = 1\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("[sprite]\npadding = 1\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_path_like_output_names() {
        let mut config = PipelineConfig::default();
        config.build.stylesheet = "css/screen.css".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("build.stylesheet"));
    }

    #[test]
    fn validate_rejects_same_stylesheet_and_script() {
        let mut config = PipelineConfig::default();
        config.build.script = config.build.stylesheet.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_shared_output_roots() {
        let mut config = PipelineConfig::default();
        config.paths.dist = config.paths.dev.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_compression_boundary() {
        let mut config = PipelineConfig::default();
        config.archive.compression_level = 0;
        assert!(config.validate().is_ok());
        config.archive.compression_level = 10;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Output root guard tests
    // =========================================================================

    fn paths_with(dev: &str, dist: &str) -> PathsConfig {
        PathsConfig {
            dev: dev.into(),
            dist: dist.into(),
            ..PathsConfig::default()
        }
    }

    #[test]
    fn stock_output_roots_are_safe() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig::default().resolve(tmp.path());
        assert!(paths.check_outputs(tmp.path()).is_ok());
        let nested = paths_with("out/dev", "out/dist").resolve(tmp.path());
        assert!(nested.check_outputs(tmp.path()).is_ok());
    }

    #[test]
    fn output_root_cannot_be_project_root() {
        let tmp = TempDir::new().unwrap();
        for dev in [".", "./", "src/..", "dev/.."] {
            let paths = paths_with(dev, "dist").resolve(tmp.path());
            let err = paths.check_outputs(tmp.path()).unwrap_err();
            assert!(err.to_string().contains("paths.dev"), "{dev}: {err}");
        }
    }

    #[test]
    fn output_root_cannot_contain_sources() {
        let tmp = TempDir::new().unwrap();
        for dist in ["src", "src/global", "src/variants", "..", "/"] {
            let paths = paths_with("dev", dist).resolve(tmp.path());
            let err = paths.check_outputs(tmp.path()).unwrap_err();
            assert!(err.to_string().contains("paths.dist"), "{dist}: {err}");
        }
    }

    #[test]
    fn output_root_cannot_hold_descriptor() {
        let tmp = TempDir::new().unwrap();
        let config = PathsConfig {
            descriptor: "meta/package.json".into(),
            ..paths_with("meta", "dist")
        };
        let paths = config.resolve(tmp.path());
        assert!(paths.check_outputs(tmp.path()).is_err());
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: PipelineConfig = toml::from_str(stock_config_toml()).unwrap();
        let stock = PipelineConfig::default();
        assert_eq!(config.paths.variants, stock.paths.variants);
        assert_eq!(config.sprites.padding, stock.sprites.padding);
        assert_eq!(config.sprites.class_prefix, stock.sprites.class_prefix);
        assert_eq!(config.build.script, stock.build.script);
        assert_eq!(
            config.archive.compression_level,
            stock.archive.compression_level
        );
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn stock_config_toml_explains_sizeless_folders() {
        let text = stock_config_toml();
        let strict = text.find("strict_sizes = true").unwrap();
        let note = &text[..strict];
        assert!(note.contains("\"tablet\""));
        assert!(note.contains("set this\n# to false"));
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        for section in ["paths", "sprites", "build", "archive", "processing"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }
}
