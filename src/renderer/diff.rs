//! Differential renderer for fullscreen mode.
//!
//! Compares the current frame to the previous one and only writes the cells
//! that changed, inside a synchronized-update block.
//!
//! # Algorithm
//!
//! 1. Begin synchronized update
//! 2. For each cell of the new frame:
//!    - If the previous frame has the same size and the cell is unchanged: skip
//!    - Otherwise: emit it through [`CellWriter`]
//! 3. End synchronized update and flush once
//! 4. Keep the frame for the next comparison

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{
    BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen,
};

use super::buffer::{FrameBuffer, CONTINUATION};
use crate::types::{Attr, Cell, Rgba};

/// Differential renderer writing to `W` (stdout in practice).
pub struct DiffRenderer<W: Write> {
    out: W,
    writer: CellWriter,
    previous: Option<FrameBuffer>,
}

impl<W: Write> DiffRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            writer: CellWriter::default(),
            previous: None,
        }
    }

    /// Render a frame, writing only changed cells.
    ///
    /// Returns true if any cell was written.
    pub fn render(&mut self, buffer: &FrameBuffer) -> io::Result<bool> {
        let mut changed_any = false;
        queue!(self.out, BeginSynchronizedUpdate)?;
        self.writer.reset();

        let comparable = self
            .previous
            .as_ref()
            .filter(|prev| prev.width() == buffer.width() && prev.height() == buffer.height());

        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let Some(cell) = buffer.get(x, y) else {
                    continue;
                };
                let changed = comparable
                    .and_then(|prev| prev.get(x, y))
                    .is_none_or(|prev| prev != cell);
                if changed {
                    changed_any = true;
                    self.writer.write_cell(&mut self.out, x, y, cell)?;
                }
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.previous = Some(buffer.clone());
        Ok(changed_any)
    }

    /// Forget the previous frame; the next render redraws everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Switch to the alternate screen and hide the cursor.
    pub fn enter_fullscreen(&mut self, mouse: bool) -> io::Result<()> {
        queue!(self.out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        if mouse {
            queue!(self.out, EnableMouseCapture)?;
        }
        self.out.flush()?;
        self.invalidate();
        Ok(())
    }

    /// Restore the main screen.
    pub fn exit_fullscreen(&mut self, mouse: bool) -> io::Result<()> {
        if mouse {
            queue!(self.out, DisableMouseCapture)?;
        }
        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            Show,
            LeaveAlternateScreen
        )?;
        self.out.flush()
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

/// Emits cells, skipping escape codes for state that did not change.
#[derive(Debug, Default)]
struct CellWriter {
    last: Option<(u16, u16)>,
    fg: Option<Rgba>,
    bg: Option<Rgba>,
    attrs: Attr,
}

impl CellWriter {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn write_cell(&mut self, out: &mut impl Write, x: u16, y: u16, cell: &Cell) -> io::Result<()> {
        if cell.ch == CONTINUATION {
            self.last = Some((x, y));
            return Ok(());
        }

        let sequential = self.last.is_some_and(|(lx, ly)| ly == y && lx + 1 == x);
        if !sequential {
            queue!(out, MoveTo(x, y))?;
        }

        if cell.attrs != self.attrs {
            queue!(out, SetAttribute(Attribute::Reset))?;
            for attribute in attributes(cell.attrs) {
                queue!(out, SetAttribute(attribute))?;
            }
            self.fg = None;
            self.bg = None;
            self.attrs = cell.attrs;
        }
        if self.fg != Some(cell.fg) {
            queue!(out, SetForegroundColor(color(cell.fg)))?;
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            queue!(out, SetBackgroundColor(color(cell.bg)))?;
            self.bg = Some(cell.bg);
        }

        queue!(out, Print(cell.ch))?;
        self.last = Some((x, y));
        Ok(())
    }
}

fn color(rgba: Rgba) -> Color {
    if rgba.is_terminal_default() {
        Color::Reset
    } else {
        Color::Rgb {
            r: rgba.r.clamp(0, 255) as u8,
            g: rgba.g.clamp(0, 255) as u8,
            b: rgba.b.clamp(0, 255) as u8,
        }
    }
}

fn attributes(attrs: Attr) -> impl Iterator<Item = Attribute> {
    [
        (Attr::BOLD, Attribute::Bold),
        (Attr::DIM, Attribute::Dim),
        (Attr::ITALIC, Attribute::Italic),
        (Attr::UNDERLINE, Attribute::Underlined),
        (Attr::INVERSE, Attribute::Reverse),
        (Attr::STRIKETHROUGH, Attribute::CrossedOut),
    ]
    .into_iter()
    .filter(move |(flag, _)| attrs.contains(*flag))
    .map(|(_, attribute)| attribute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_render_writes_everything() {
        let mut renderer = DiffRenderer::new(Vec::new());
        let mut buffer = FrameBuffer::new(3, 1);
        buffer.draw_text(0, 0, "abc", Rgba::WHITE, Attr::NONE, None);
        assert!(renderer.render(&buffer).unwrap());
        let written = String::from_utf8_lossy(renderer.writer()).into_owned();
        assert!(written.contains("abc"));
        assert!(renderer.has_previous());
    }

    #[test]
    fn test_unchanged_frame_writes_no_cells() {
        let mut renderer = DiffRenderer::new(Vec::new());
        let buffer = FrameBuffer::new(3, 2);
        renderer.render(&buffer).unwrap();
        assert!(!renderer.render(&buffer).unwrap());

        let mut next = buffer.clone();
        next.draw_text(1, 1, "x", Rgba::RED, Attr::UNDERLINE, None);
        assert!(renderer.render(&next).unwrap());
    }

    #[test]
    fn test_invalidate_forces_redraw() {
        let mut renderer = DiffRenderer::new(Vec::new());
        let buffer = FrameBuffer::new(2, 2);
        renderer.render(&buffer).unwrap();
        renderer.invalidate();
        assert!(!renderer.has_previous());
        assert!(renderer.render(&buffer).unwrap());
    }

    #[test]
    fn test_attributes_mapping() {
        let mapped: Vec<Attribute> = attributes(Attr::BOLD | Attr::UNDERLINE).collect();
        assert_eq!(mapped, vec![Attribute::Bold, Attribute::Underlined]);
        assert_eq!(color(Rgba::TERMINAL_DEFAULT), Color::Reset);
        assert_eq!(color(Rgba::rgb(1, 2, 3)), Color::Rgb { r: 1, g: 2, b: 3 });
    }
}
