//! Size folder name parsing.
//!
//! Size directories follow a `<width>x<height>` convention (`300x250`,
//! `728x90`). The two halves feed the `{{width}}` and `{{height}}` template
//! tokens. Parsing is purely textual: the name is split on the **first**
//! literal `x`, and neither half is required to be numeric: `160x600-alt`
//! yields width `160` and height `600-alt`, exactly what ends up in the
//! template.
//!
//! Names without an `x` (e.g. `tablet`) have no dimensions. Whether that is
//! an error is the caller's decision; see [`crate::inject`].

/// Width and height halves of a size name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeName<'a> {
    pub width: &'a str,
    pub height: &'a str,
}

/// Split a size name on the first `x`.
///
/// - `"300x250"` → width `"300"`, height `"250"`
/// - `"970x250x2"` → width `"970"`, height `"250x2"`
/// - `"x90"` → width `""`, height `"90"`
/// - `"tablet"` → `None`
pub fn parse_size(name: &str) -> Option<SizeName<'_>> {
    name.split_once('x')
        .map(|(width, height)| SizeName { width, height })
}

/// Numeric pixel dimensions, when both halves are plain integers.
///
/// Used by `check` to flag suspicious names; substitution itself never
/// requires numbers.
pub fn pixel_dimensions(name: &str) -> Option<(u32, u32)> {
    let size = parse_size(name)?;
    let width = size.width.parse().ok()?;
    let height = size.height.parse().ok()?;
    Some((width, height))
}
