//! Shared test utilities for the adpack test suite.
//!
//! Builds a small but complete creative project in a temp directory, so
//! stage tests run against real files without checked-in fixtures:
//!
//! ```text
//! package.json                      Acme / Spring / 1.2.0
//! src/global/
//!   assets/fonts/brand.woff
//!   styles/reset.css
//!   scripts/main.js, scripts/lib/tween.js
//! src/variants/
//!   susan/300x250/   template, css, js, logo.png, 2 sprites
//!   susan/728x90/    template, css, 1 sprite
//!   thomas/300x250/  template, css, no sprites folder
//! ```
//!
//! [`add_tablet`] adds `susan/tablet`, a size without dimensions.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = setup_project();
//! let paths = PathsConfig::default().resolve(project.path());
//! assert_eq!(read(&paths.variants, "susan/300x250/banner.css"), BANNER_CSS_300);
//! ```

use crate::metadata::{Author, Campaign, Metadata};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const RESET_CSS: &str = "/* reset */\nhtml,body{margin:0}";
pub const BANNER_CSS_300: &str = ".banner{width:300px;height:250px}";

pub const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="ad.size" content="width={{width}},height={{height}}">
  <meta name="author" content="{{author}}">
  <meta name="description" content="{{description}}">
  <title>{{title}}</title>
  <!-- inject:css -->
  <!-- endinject -->
</head>
<body>
  <div class="banner" data-version="{{version}}"></div>
  <!-- inject:js -->
  <!-- endinject -->
</body>
</html>
"#;

const PACKAGE_JSON: &str = r#"{
  "name": "spring-launch",
  "version": "1.2.0",
  "author": "Studio North",
  "description": "Spring banners",
  "meta": { "client": "Acme", "campaign": "Spring" },
  "devDependencies": { "gulp": "^3.9.0" }
}
"#;

// =========================================================================
// Fixture setup
// =========================================================================

/// Metadata matching the fixture's `package.json`.
pub fn sample_metadata() -> Metadata {
    Metadata {
        version: "1.2.0".into(),
        author: Author::Name("Studio North".into()),
        description: "Spring banners".into(),
        meta: Campaign {
            client: "Acme".into(),
            campaign: "Spring".into(),
        },
    }
}

/// Write `content` to `root/rel`, creating parents.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Write a solid-colour PNG to `root/rel`.
pub fn write_png(root: &Path, rel: &str, width: u32, height: u32, color: [u8; 4]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}

/// Generate the fixture project in a fresh temp directory.
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_file(root, "package.json", PACKAGE_JSON);

    let global = root.join("src/global");
    write_file(&global, "assets/fonts/brand.woff", "font");
    write_file(&global, "styles/reset.css", RESET_CSS);
    write_file(&global, "scripts/main.js", "var ad = {};");
    write_file(&global, "scripts/lib/tween.js", "function tween() {}");

    let variants = root.join("src/variants");
    write_file(&variants, "susan/300x250/index.html", TEMPLATE);
    write_file(&variants, "susan/300x250/banner.css", BANNER_CSS_300);
    write_file(&variants, "susan/300x250/banner.js", "ad.size = '300x250';");
    write_png(&variants, "susan/300x250/assets/logo.png", 8, 8, [200, 0, 0, 255]);
    write_png(&variants, "susan/300x250/assets/sprites/headline.png", 40, 12, [0, 0, 0, 255]);
    write_png(&variants, "susan/300x250/assets/sprites/cta.png", 20, 8, [255, 255, 255, 255]);

    write_file(&variants, "susan/728x90/index.html", TEMPLATE);
    write_file(&variants, "susan/728x90/banner.css", ".banner{width:728px}");
    write_png(&variants, "susan/728x90/assets/sprites/headline.png", 60, 10, [0, 0, 0, 255]);

    write_file(&variants, "thomas/300x250/index.html", TEMPLATE);
    write_file(&variants, "thomas/300x250/banner.css", ".banner{color:red}");

    tmp
}

/// Add `susan/tablet`: a template and sprite sources but no dimensions.
pub fn add_tablet(root: &Path) {
    let variants = root.join("src/variants");
    write_file(&variants, "susan/tablet/index.html", TEMPLATE);
    write_png(&variants, "susan/tablet/assets/sprites/headline.png", 30, 30, [0, 0, 0, 255]);
}

// =========================================================================
// Lookups
// =========================================================================

/// Read `root/rel` as UTF-8. Panics with the path on failure.
pub fn read(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Sorted entry names of a directory.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
