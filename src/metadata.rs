//! Project metadata loaded from the descriptor file.
//!
//! The descriptor is usually the creative's `package.json`, which already
//! carries `version`, `author` and `description`, plus a `meta` block naming
//! the client and campaign:
//!
//! ```json
//! {
//!   "name": "spring-launch",
//!   "version": "1.2.0",
//!   "author": "Studio North",
//!   "description": "Spring launch banners",
//!   "meta": { "client": "Acme", "campaign": "Spring" }
//! }
//! ```
//!
//! A `.toml` descriptor with the same keys is accepted too. Keys the pipeline
//! does not use (`name`, `devDependencies`, ...) are ignored; the file is
//! shared with other tooling.
//!
//! The loaded [`Metadata`] is immutable and passed explicitly to the stages
//! that read it (template injection and archive naming).

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("cannot read project descriptor {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("TOML error in {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Metadata validation error: {0}")]
    Validation(String),
}

/// Client and campaign names; both end up in titles and archive names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Campaign {
    pub client: String,
    pub campaign: String,
}

/// `author` is either a plain string or an npm-style person object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Person {
        name: String,
        #[serde(default)]
        email: Option<String>,
    },
}

impl Author {
    /// The text substituted for `{{author}}`.
    pub fn display(&self) -> String {
        match self {
            Author::Name(name) => name.clone(),
            Author::Person {
                name,
                email: Some(email),
            } => format!("{name} <{email}>"),
            Author::Person { name, email: None } => name.clone(),
        }
    }
}

impl Default for Author {
    fn default() -> Self {
        Author::Name(String::new())
    }
}

/// Process-wide, read-only project metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    pub version: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub description: String,
    pub meta: Campaign,
}

impl Metadata {
    /// Validate values that end up in file names.
    pub fn validate(&self) -> Result<(), MetadataError> {
        for (key, value) in [
            ("version", &self.version),
            ("meta.client", &self.meta.client),
            ("meta.campaign", &self.meta.campaign),
        ] {
            if value.trim().is_empty() {
                return Err(MetadataError::Validation(format!(
                    "{key} must not be empty"
                )));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(MetadataError::Validation(format!(
                    "{key} must not contain path separators: {value:?}"
                )));
            }
        }
        Ok(())
    }

    /// `<client> <campaign> | <variant> | <size> | <version>`, the `{{title}}`
    /// value.
    pub fn title(&self, variant: &str, size: &str) -> String {
        format!(
            "{} {} | {} | {} | {}",
            self.meta.client, self.meta.campaign, variant, size, self.version
        )
    }

    /// `<client> <campaign> <variant> <size> v<version>.zip`.
    pub fn archive_name(&self, variant: &str, size: &str) -> String {
        format!(
            "{} {} {} {} v{}.zip",
            self.meta.client, self.meta.campaign, variant, size, self.version
        )
    }
}

/// Load and validate metadata from a descriptor file.
///
/// The format is picked from the extension: `.toml` is TOML, anything else
/// is parsed as JSON.
pub fn load_metadata(path: &Path) -> Result<Metadata, MetadataError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
        path: display.clone(),
        source,
    })?;
    let is_toml = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let metadata: Metadata = if is_toml {
        toml::from_str(&content).map_err(|source| MetadataError::Toml {
            path: display,
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|source| MetadataError::Json {
            path: display,
            source,
        })?
    };
    metadata.validate()?;
    Ok(metadata)
}
