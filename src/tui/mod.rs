pub mod card;
pub mod detail_overlay;
pub mod footer;
pub mod grid;
pub mod header;
pub mod pagination;
pub mod render;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cuts `s` to `max_width` display columns, ending with `…` when shortened.
pub fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            result.push('…');
            break;
        }
        result.push(c);
        width += cw;
    }
    result
}
