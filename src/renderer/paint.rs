//! Paint - draw a laid-out document subtree into a [`FrameBuffer`].
//!
//! Elements paint their `background` and `border`, then their children, and
//! claim their rectangle in the [`HitGrid`] so later (deeper) elements win.
//! Text inherits `color`, `font-weight`, `font-style` and `text-decoration`
//! from its ancestors and wraps inside its own rectangle.

use crate::dom::{Document, NodeId};
use crate::layout::{has_border, wrap_text, ComputedLayout};
use crate::state::mouse::HitGrid;
use crate::types::{Attr, Rect, Rgba, StyleMap};

use super::buffer::FrameBuffer;

/// A painted frame and its hit regions.
#[derive(Debug, Clone)]
pub struct Frame {
    pub buffer: FrameBuffer,
    pub hits: HitGrid,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    fg: Rgba,
    attrs: Attr,
}

impl TextStyle {
    fn inherit(self, style: &StyleMap) -> Self {
        let mut next = self;
        if let Some(color) = style.get("color").and_then(|v| Rgba::parse(v)) {
            next.fg = color;
        }
        match style.get("font-weight").map(|v| v.trim()) {
            Some("bold") => next.attrs |= Attr::BOLD,
            Some("normal") => next.attrs.remove(Attr::BOLD),
            _ => {}
        }
        if let Some("italic") = style.get("font-style").map(|v| v.trim()) {
            next.attrs |= Attr::ITALIC;
        }
        if let Some(decoration) = style.get("text-decoration") {
            for part in decoration.split_whitespace() {
                match part {
                    "underline" => next.attrs |= Attr::UNDERLINE,
                    "line-through" => next.attrs |= Attr::STRIKETHROUGH,
                    "none" => next.attrs.remove(Attr::UNDERLINE | Attr::STRIKETHROUGH),
                    _ => {}
                }
            }
        }
        next
    }
}

/// Paint `root`'s subtree.
pub fn paint(document: &Document, root: NodeId, layout: &ComputedLayout) -> Frame {
    let mut frame = Frame {
        buffer: FrameBuffer::new(layout.width, layout.height),
        hits: HitGrid::new(layout.width, layout.height),
    };
    let inherited = TextStyle {
        fg: Rgba::TERMINAL_DEFAULT,
        attrs: Attr::NONE,
    };
    let bounds = frame.buffer.bounds();
    paint_node(document, root, layout, &mut frame, inherited, bounds);
    frame
}

fn paint_node(
    document: &Document,
    node: NodeId,
    layout: &ComputedLayout,
    frame: &mut Frame,
    inherited: TextStyle,
    clip: Rect,
) {
    let Some(rect) = layout.rect(node) else {
        return;
    };

    if document.is_text(node) {
        let text = document.text(node).unwrap_or_default();
        let Some(area) = rect.intersect(&clip) else {
            return;
        };
        for (row, line) in wrap_text(&text, rect.width).iter().enumerate() {
            let y = rect.y.saturating_add(row as u16);
            frame
                .buffer
                .draw_text(rect.x, y, line, inherited.fg, inherited.attrs, Some(&area));
        }
        return;
    }

    let style = document.style(node);
    let text_style = inherited.inherit(&style);
    let Some(visible) = rect.intersect(&clip) else {
        return;
    };

    if let Some(bg) = style.get("background").and_then(|v| Rgba::parse(v)) {
        frame.buffer.fill_rect(rect, bg, Some(&clip));
    }
    if has_border(style.get("border").map(String::as_str)) {
        let color = style
            .get("border-color")
            .and_then(|v| Rgba::parse(v))
            .unwrap_or(text_style.fg);
        frame.buffer.draw_border(rect, color, Some(&clip));
    }
    frame.hits.fill_rect(visible, node);

    for child in document.children(node) {
        paint_node(document, child, layout, frame, text_style, visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::types::style;

    #[test]
    fn test_paint_text_and_hits() {
        let doc = Document::new();
        let root = doc.create_element("main");
        let button = doc.create_element("button");
        doc.set_style(
            button,
            style([
                ("width", "5"),
                ("border", "single"),
                ("font-weight", "bold"),
                ("color", "red"),
            ]),
        );
        let label = doc.create_text("Buy");
        doc.append_child(button, label);
        doc.append_child(root, button);

        let layout = compute_layout(&doc, root, 10, 4);
        let frame = paint(&doc, root, &layout);

        assert_eq!(frame.buffer.row_text(0), "┌───┐     ");
        assert_eq!(frame.buffer.row_text(1), "│Buy│     ");
        let cell = frame.buffer.get(1, 1).copied().unwrap_or_default();
        assert_eq!(cell.fg, Rgba::RED);
        assert!(cell.attrs.contains(Attr::BOLD));

        assert_eq!(frame.hits.get(2, 1), Some(button));
        assert_eq!(frame.hits.get(2, 3), Some(root));
    }

    #[test]
    fn test_background_fill() {
        let doc = Document::new();
        let root = doc.create_element("main");
        doc.set_style(root, style([("background", "#102030")]));
        let layout = compute_layout(&doc, root, 3, 2);
        let frame = paint(&doc, root, &layout);
        assert_eq!(
            frame.buffer.get(2, 1).map(|c| c.bg),
            Some(Rgba::rgb(0x10, 0x20, 0x30))
        );
    }
}
