//! FrameBuffer and drawing primitives.
//!
//! A 2D grid of [`Cell`]s describing what the terminal should show. Storage
//! is flat and row-major: `index = y * width + x`. Wide characters occupy two
//! cells; the second holds `'\0'` and is skipped on output.

use unicode_width::UnicodeWidthChar;

use crate::types::{Attr, Cell, Rect, Rgba};

/// Continuation marker for the second half of a wide character.
pub const CONTINUATION: char = '\0';

/// A 2D buffer of terminal cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(self.index(x, y))
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = self.index(x, y);
        self.cells.get_mut(index)
    }

    /// Row `y` as a string, continuation cells dropped.
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .filter(|cell| cell.ch != CONTINUATION)
            .map(|cell| cell.ch)
            .collect()
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Resize the buffer (clears content).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.resize(width as usize * height as usize, Cell::default());
        self.clear();
    }

    /// Set a single cell's glyph and style, keeping the background when `bg`
    /// is `None`. Returns true if the cell was inside the buffer and `clip`.
    pub fn set_char(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        fg: Rgba,
        bg: Option<Rgba>,
        attrs: Attr,
        clip: Option<&Rect>,
    ) -> bool {
        if clip.is_some_and(|clip| !clip.contains(x, y)) {
            return false;
        }
        let Some(cell) = self.get_mut(x, y) else {
            return false;
        };
        cell.ch = ch;
        cell.fg = fg;
        if let Some(bg) = bg {
            cell.bg = bg;
        }
        cell.attrs = attrs;
        true
    }

    /// Fill a rectangle with a background color, erasing glyphs.
    pub fn fill_rect(&mut self, rect: Rect, bg: Rgba, clip: Option<&Rect>) {
        let Some(area) = rect.intersect(&self.bounds()) else {
            return;
        };
        let area = match clip {
            Some(clip) => match area.intersect(clip) {
                Some(area) => area,
                None => return,
            },
            None => area,
        };
        for row in area.y..area.y + area.height {
            let start = self.index(area.x, row);
            let end = start + area.width as usize;
            for cell in &mut self.cells[start..end] {
                cell.ch = ' ';
                cell.bg = bg;
                cell.attrs = Attr::NONE;
            }
        }
    }

    /// Draw `text` starting at `(x, y)` without wrapping.
    ///
    /// Returns the number of columns used.
    pub fn draw_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg: Rgba,
        attrs: Attr,
        clip: Option<&Rect>,
    ) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0) as u16;
            if width == 0 {
                continue;
            }
            if col >= self.width {
                break;
            }
            self.set_char(col, y, ch, fg, None, attrs, clip);
            if width == 2 {
                self.set_char(col + 1, y, CONTINUATION, fg, None, attrs, clip);
            }
            col = col.saturating_add(width);
        }
        col - x
    }

    /// Draw a single-line box border around `rect`.
    pub fn draw_border(&mut self, rect: Rect, color: Rgba, clip: Option<&Rect>) {
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        let (x, y) = (rect.x, rect.y);
        let x2 = x + rect.width - 1;
        let y2 = y + rect.height - 1;

        self.set_char(x, y, '┌', color, None, Attr::NONE, clip);
        self.set_char(x2, y, '┐', color, None, Attr::NONE, clip);
        self.set_char(x2, y2, '┘', color, None, Attr::NONE, clip);
        self.set_char(x, y2, '└', color, None, Attr::NONE, clip);
        for col in (x + 1)..x2 {
            self.set_char(col, y, '─', color, None, Attr::NONE, clip);
            self.set_char(col, y2, '─', color, None, Attr::NONE, clip);
        }
        for row in (y + 1)..y2 {
            self.set_char(x, row, '│', color, None, Attr::NONE, clip);
            self.set_char(x2, row, '│', color, None, Attr::NONE, clip);
        }
    }
}
