//! Text Measurement
//!
//! Display widths in terminal cells, via `unicode-width`:
//! - ASCII printable: 1 cell
//! - CJK and most emoji: 2 cells
//! - Control and zero-width characters: 0 cells

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal cells.
pub fn string_width(s: &str) -> u16 {
    u16::try_from(s.width()).unwrap_or(u16::MAX)
}

/// Wrap text at `width` cells, breaking at spaces when possible and inside
/// words when a word alone is too wide. Explicit newlines always break.
pub fn wrap_text(text: &str, width: u16) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0u16;
        for word in paragraph.split_inclusive(' ') {
            let word_width = string_width(word.trim_end());
            if line_width > 0 && line_width + word_width > width {
                lines.push(line.trim_end().to_string());
                line.clear();
                line_width = 0;
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0) as u16;
                if line_width + ch_width > width && ch != ' ' && line_width > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width = line_width.saturating_add(ch_width);
            }
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Number of lines `text` occupies when wrapped at `width`.
pub fn measure_text_height(text: &str, width: u16) -> u16 {
    u16::try_from(wrap_text(text, width).len()).unwrap_or(u16::MAX)
}

/// Widest line of `text` after wrapping at `width`.
pub fn measure_text_width(text: &str, width: u16) -> u16 {
    wrap_text(text, width)
        .iter()
        .map(|line| string_width(line))
        .max()
        .unwrap_or(0)
}
