//! Shared types used across all pipeline stages.

use std::fmt;
use std::path::{Path, PathBuf};

/// A (variant, size) couple: the unit of work every stage fans out over.
///
/// Both halves are plain directory names: `susan` and `300x250` for
/// `src/variants/susan/300x250/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    pub variant: String,
    pub size: String,
}

impl Pair {
    pub fn new(variant: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            size: size.into(),
        }
    }

    /// Directory of this pair under a variants-shaped root
    /// (`<root>/<variant>/<size>`).
    pub fn dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.variant).join(&self.size)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.variant, self.size)
    }
}

/// Optional restriction of the pairs a stage processes.
///
/// `None` on either side means "everything discovered".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub variant: Option<String>,
    pub size: Option<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.variant.is_none() && self.size.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_displays_as_variant_slash_size() {
        assert_eq!(Pair::new("susan", "300x250").to_string(), "susan/300x250");
    }

    #[test]
    fn pair_dir_nests_variant_then_size() {
        let dir = Pair::new("thomas", "728x90").dir_in(Path::new("dev"));
        assert_eq!(dir, Path::new("dev").join("thomas").join("728x90"));
    }

    #[test]
    fn pairs_order_by_variant_then_size() {
        let mut pairs = vec![
            Pair::new("b", "300x250"),
            Pair::new("a", "728x90"),
            Pair::new("a", "300x250"),
        ];
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                Pair::new("a", "300x250"),
                Pair::new("a", "728x90"),
                Pair::new("b", "300x250"),
            ]
        );
    }

    #[test]
    fn default_selection_is_all() {
        assert!(Selection::all().is_all());
        let only = Selection {
            variant: Some("susan".into()),
            size: None,
        };
        assert!(!only.is_all());
    }
}
