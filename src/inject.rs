//! Template injection and token substitution.
//!
//! Every pair folder holds exactly one `*.html` template. It is rewritten
//! into the build output in two passes:
//!
//! 1. **Injection**: the region between a start marker and the following
//!    `<!-- endinject -->` is replaced by a reference tag. Markers stay in
//!    place so the output can be re-injected.
//!
//!    ```html
//!    <!-- inject:css -->
//!    <link rel="stylesheet" href="screen.css">
//!    <!-- endinject -->
//!    ```
//!
//! 2. **Substitution**: `{{author}}`, `{{description}}`, `{{version}}`,
//!    `{{title}}`, `{{width}}`, `{{height}}`, replaced in that order,
//!    every occurrence.
//!
//! The result is written with [`write_synced`]; the archiver reads it back
//! in a later stage.

use crate::fsio::write_synced;
use crate::layout::files_with_extension;
use crate::metadata::Metadata;
use crate::naming::parse_size;
use crate::types::Pair;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CSS_MARKER: &str = "<!-- inject:css -->";
pub const JS_MARKER: &str = "<!-- inject:js -->";
pub const END_MARKER: &str = "<!-- endinject -->";

#[derive(Error, Debug)]
pub enum InjectError {
    #[error("no *.html template in {0}")]
    MissingTemplate(PathBuf),
    #[error("more than one *.html template in {dir}: {found:?}")]
    AmbiguousTemplate { dir: PathBuf, found: Vec<String> },
    #[error("size {0:?} is not <width>x<height>")]
    InvalidSize(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File names the template should reference, relative to the output folder.
#[derive(Debug, Clone)]
pub struct References {
    pub stylesheet: String,
    pub script: String,
}

impl References {
    pub fn css_tag(&self) -> String {
        format!(r#"<link rel="stylesheet" href="{}">"#, self.stylesheet)
    }

    pub fn js_tag(&self) -> String {
        format!(r#"<script src="{}"></script>"#, self.script)
    }
}

/// Values for the `{{token}}` placeholders of one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub author: String,
    pub description: String,
    pub version: String,
    pub title: String,
    pub width: String,
    pub height: String,
}

impl Tokens {
    /// Derive tokens for `pair`.
    ///
    /// A size without `x` is [`InjectError::InvalidSize`] when `strict`;
    /// otherwise width and height are empty.
    pub fn for_pair(metadata: &Metadata, pair: &Pair, strict: bool) -> Result<Self, InjectError> {
        let (width, height) = match parse_size(&pair.size) {
            Some(size) => (size.width.to_string(), size.height.to_string()),
            None if strict => return Err(InjectError::InvalidSize(pair.size.clone())),
            None => {
                tracing::warn!(pair = %pair, "size has no <width>x<height>, leaving dimensions empty");
                (String::new(), String::new())
            }
        };
        Ok(Self {
            author: metadata.author.display(),
            description: metadata.description.clone(),
            version: metadata.version.clone(),
            title: metadata.title(&pair.variant, &pair.size),
            width,
            height,
        })
    }

    fn in_order(&self) -> [(&'static str, &str); 6] {
        [
            ("{{author}}", self.author.as_str()),
            ("{{description}}", self.description.as_str()),
            ("{{version}}", self.version.as_str()),
            ("{{title}}", self.title.as_str()),
            ("{{width}}", self.width.as_str()),
            ("{{height}}", self.height.as_str()),
        ]
    }
}

/// The single `*.html` file directly inside `pair_dir`.
pub fn find_template(pair_dir: &Path) -> Result<PathBuf, InjectError> {
    let mut templates = files_with_extension(pair_dir, "html").map_err(|source| InjectError::Io {
        path: pair_dir.to_path_buf(),
        source,
    })?;
    match templates.len() {
        0 => Err(InjectError::MissingTemplate(pair_dir.to_path_buf())),
        1 => Ok(templates.remove(0)),
        _ => Err(InjectError::AmbiguousTemplate {
            dir: pair_dir.to_path_buf(),
            found: templates
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}

/// Whitespace preceding `pos` on its line, if that is all that precedes it.
fn indentation_at(html: &str, pos: usize) -> &str {
    let line_start = html[..pos].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &html[line_start..pos];
    if prefix.chars().all(char::is_whitespace) {
        prefix
    } else {
        ""
    }
}

/// Replace every `marker … <!-- endinject -->` region with `tag`.
///
/// The tag goes on its own line, indented like the start marker. A marker
/// with no closing `endinject` is left as is.
pub fn inject_tag(html: &str, marker: &str, tag: &str) -> String {
    let mut out = String::with_capacity(html.len() + tag.len());
    let mut rest = html;
    let mut consumed = 0;

    while let Some(start) = rest.find(marker) {
        let body_start = start + marker.len();
        let Some(end_rel) = rest[body_start..].find(END_MARKER) else {
            break;
        };
        let end = body_start + end_rel;
        let indent = indentation_at(html, consumed + start);

        out.push_str(&rest[..body_start]);
        out.push('\n');
        out.push_str(indent);
        out.push_str(tag);
        out.push('\n');
        out.push_str(indent);
        out.push_str(END_MARKER);

        let next = end + END_MARKER.len();
        consumed += next;
        rest = &rest[next..];
    }
    out.push_str(rest);
    out
}

/// Replace the placeholders in the fixed order.
pub fn substitute(html: &str, tokens: &Tokens) -> String {
    tokens
        .in_order()
        .into_iter()
        .fold(html.to_string(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        })
}

/// Both passes on an in-memory template.
pub fn render(html: &str, refs: &References, tokens: &Tokens) -> String {
    let html = inject_tag(html, CSS_MARKER, &refs.css_tag());
    let html = inject_tag(&html, JS_MARKER, &refs.js_tag());
    substitute(&html, tokens)
}

/// Rewrite the pair's template into `out_dir` under the same file name.
pub fn inject_template(
    pair_dir: &Path,
    out_dir: &Path,
    refs: &References,
    tokens: &Tokens,
) -> Result<PathBuf, InjectError> {
    let template = find_template(pair_dir)?;
    let html = std::fs::read_to_string(&template).map_err(|source| InjectError::Io {
        path: template.clone(),
        source,
    })?;
    let rendered = render(&html, refs, tokens);

    let file_name = template.file_name().unwrap_or_default();
    let out = out_dir.join(file_name);
    write_synced(&out, rendered.as_bytes()).map_err(|source| InjectError::Io {
        path: out.clone(),
        source,
    })?;
    Ok(out)
}
