//! Sprite stylesheet rendering.
//!
//! One rule per packed image:
//!
//! ```css
//! .icon-logo {
//!   background-image: url(assets/txtsprite.png);
//!   background-position: -42px 0px;
//!   width: 120px;
//!   height: 30px;
//! }
//! ```
//!
//! Offsets are negated because the sheet is shifted under the element.

use super::packer::Layout;

/// Turn an image stem into a CSS class-safe token.
///
/// ASCII letters, digits, `-` and `_` are kept; anything else becomes `-`.
pub fn class_name(prefix: &str, stem: &str) -> String {
    let body: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{prefix}{body}")
}

fn offset(value: u32) -> String {
    if value == 0 {
        "0px".to_string()
    } else {
        format!("-{value}px")
    }
}

/// Render the stylesheet for a packed layout, rules in layout order.
pub fn render_stylesheet(layout: &Layout, image_url: &str, class_prefix: &str) -> String {
    let mut css = String::new();
    for item in &layout.items {
        css.push_str(&format!(
            ".{class} {{\n  background-image: url({image_url});\n  background-position: {x} {y};\n  width: {w}px;\n  height: {h}px;\n}}\n",
            class = class_name(class_prefix, &item.name),
            x = offset(item.x),
            y = offset(item.y),
            w = item.width,
            h = item.height,
        ));
    }
    css
}
