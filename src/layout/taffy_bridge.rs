//! Taffy Bridge - Integration with the Taffy layout engine
//!
//! Converts document elements and their `style` maps to Taffy styles, runs
//! flexbox layout, and extracts absolute cell rectangles.
//!
//! Elements are flex containers (columns by default, rows for inline and
//! text-level tags); text nodes are measured leaves.

use std::collections::HashMap;

use taffy::{
    AvailableSpace, Dimension, Display, FlexDirection, LengthPercentage, LengthPercentageAuto,
    NodeId as TaffyNode, Rect as TaffyRect, Size, Style, TaffyResult, TaffyTree,
};

use super::text_measure::{measure_text_height, measure_text_width, string_width};
use super::ComputedLayout;
use crate::dom::{Document, NodeId};
use crate::types::{Rect, StyleMap};

/// Tags whose children lay out left to right.
const ROW_TAGS: &[&str] = &[
    "a", "b", "button", "code", "em", "h1", "h2", "h3", "h4", "h5", "h6", "i", "label", "li", "p",
    "small", "span", "strong", "u",
];

// =============================================================================
// STYLE CONVERSION
// =============================================================================

fn parse_cells(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value
        .strip_suffix("ch")
        .or_else(|| value.strip_suffix("px"))
        .unwrap_or(value);
    number.trim().parse::<f32>().ok().filter(|n| n.is_finite())
}

fn to_dimension(value: Option<&String>) -> Dimension {
    match value.map(|v| v.trim()) {
        None | Some("auto") => Dimension::Auto,
        Some(v) => match v.strip_suffix('%') {
            Some(percent) => percent
                .trim()
                .parse::<f32>()
                .map(|p| Dimension::Percent(p / 100.0))
                .unwrap_or(Dimension::Auto),
            None => parse_cells(v).map(Dimension::Length).unwrap_or(Dimension::Auto),
        },
    }
}

/// CSS shorthand: one, two or four values (top right bottom left).
fn parse_sides(value: Option<&String>) -> [f32; 4] {
    let Some(value) = value else {
        return [0.0; 4];
    };
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(|part| parse_cells(part).unwrap_or(0.0))
        .collect();
    match parts.as_slice() {
        [all] => [*all; 4],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left, ..] => [*top, *right, *bottom, *left],
        [] => [0.0; 4],
    }
}

fn lp_rect(sides: [f32; 4]) -> TaffyRect<LengthPercentage> {
    TaffyRect {
        top: LengthPercentage::Length(sides[0]),
        right: LengthPercentage::Length(sides[1]),
        bottom: LengthPercentage::Length(sides[2]),
        left: LengthPercentage::Length(sides[3]),
    }
}

/// Whether a `border` style value draws a border.
pub fn has_border(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        !v.is_empty() && v != "none" && v != "0"
    })
}

fn element_style(tag: &str, style: &StyleMap) -> Style {
    let direction = match style.get("flex-direction").map(|v| v.trim()) {
        Some("row") => FlexDirection::Row,
        Some("column") => FlexDirection::Column,
        _ if ROW_TAGS.contains(&tag) => FlexDirection::Row,
        _ => FlexDirection::Column,
    };
    let margin = parse_sides(style.get("margin"));
    let border = if has_border(style.get("border").map(String::as_str)) {
        1.0
    } else {
        0.0
    };
    let gap = style.get("gap").and_then(|v| parse_cells(v)).unwrap_or(0.0);

    Style {
        display: Display::Flex,
        flex_direction: direction,
        flex_grow: style
            .get("flex-grow")
            .and_then(|v| parse_cells(v))
            .unwrap_or(0.0),
        flex_shrink: 1.0,
        size: Size {
            width: to_dimension(style.get("width")),
            height: to_dimension(style.get("height")),
        },
        min_size: Size {
            width: to_dimension(style.get("min-width")),
            height: to_dimension(style.get("min-height")),
        },
        padding: lp_rect(parse_sides(style.get("padding"))),
        border: lp_rect([border; 4]),
        margin: TaffyRect {
            top: LengthPercentageAuto::Length(margin[0]),
            right: LengthPercentageAuto::Length(margin[1]),
            bottom: LengthPercentageAuto::Length(margin[2]),
            left: LengthPercentageAuto::Length(margin[3]),
        },
        gap: Size {
            width: LengthPercentage::Length(gap),
            height: LengthPercentage::Length(gap),
        },
        ..Style::default()
    }
}

// =============================================================================
// TREE
// =============================================================================

/// Taffy tree mirroring the document, plus the node mapping.
struct Mirror {
    tree: TaffyTree<String>,
    nodes: Vec<(NodeId, TaffyNode)>,
}

impl Mirror {
    fn build(&mut self, document: &Document, node: NodeId) -> TaffyResult<Option<TaffyNode>> {
        if document.is_text(node) {
            let text = document.text(node).unwrap_or_default();
            if text.is_empty() {
                return Ok(None);
            }
            let leaf = self.tree.new_leaf_with_context(Style::default(), text)?;
            self.nodes.push((node, leaf));
            return Ok(Some(leaf));
        }

        let style = document.style(node);
        if style.get("display").is_some_and(|v| v.trim() == "none") {
            return Ok(None);
        }
        let tag = document.tag(node).unwrap_or_default();

        let mut children = Vec::new();
        for child in document.children(node) {
            if let Some(built) = self.build(document, child)? {
                children.push(built);
            }
        }
        let branch = self
            .tree
            .new_with_children(element_style(&tag, &style), &children)?;
        self.nodes.push((node, branch));
        Ok(Some(branch))
    }
}

fn measure_text(
    known: Size<Option<f32>>,
    available: Size<AvailableSpace>,
    text: &str,
) -> Size<f32> {
    let natural = string_width(text);
    let wrap_at = match known.width {
        Some(width) => width as u16,
        None => match available.width {
            AvailableSpace::Definite(width) => (width as u16).min(natural),
            AvailableSpace::MinContent => text
                .split_whitespace()
                .map(string_width)
                .max()
                .unwrap_or(0),
            AvailableSpace::MaxContent => natural,
        },
    };
    let wrap_at = wrap_at.max(1);
    Size {
        width: known
            .width
            .unwrap_or_else(|| measure_text_width(text, wrap_at) as f32),
        height: known
            .height
            .unwrap_or_else(|| measure_text_height(text, wrap_at) as f32),
    }
}

/// Lay out the subtree under `root` into a `width` x `height` viewport.
pub fn compute_layout_taffy(
    document: &Document,
    root: NodeId,
    width: u16,
    height: u16,
) -> TaffyResult<ComputedLayout> {
    let mut mirror = Mirror {
        tree: TaffyTree::new(),
        nodes: Vec::new(),
    };
    let Some(root_node) = mirror.build(document, root)? else {
        return Ok(ComputedLayout::default());
    };

    let mut root_style = mirror.tree.style(root_node)?.clone();
    root_style.size = Size {
        width: Dimension::Length(width as f32),
        height: Dimension::Length(height as f32),
    };
    mirror.tree.set_style(root_node, root_style)?;

    let available = Size {
        width: AvailableSpace::Definite(width as f32),
        height: AvailableSpace::Definite(height as f32),
    };
    mirror.tree.compute_layout_with_measure(
        root_node,
        available,
        |known, available, _node, context: Option<&mut String>, _style| match context {
            Some(text) => measure_text(known, available, text),
            None => Size::ZERO,
        },
    )?;

    // Locations are parent-relative.
    let dom_nodes: HashMap<TaffyNode, NodeId> = mirror
        .nodes
        .iter()
        .map(|&(node, taffy_node)| (taffy_node, node))
        .collect();
    let mut layout = ComputedLayout::default();
    let mut stack = vec![(root_node, 0.0f32, 0.0f32)];
    while let Some((taffy_node, offset_x, offset_y)) = stack.pop() {
        let computed = mirror.tree.layout(taffy_node)?;
        let x = offset_x + computed.location.x;
        let y = offset_y + computed.location.y;
        if let Some(&node) = dom_nodes.get(&taffy_node) {
            layout.rects.insert(
                node,
                Rect::new(
                    x.round().max(0.0) as u16,
                    y.round().max(0.0) as u16,
                    computed.size.width.round().max(0.0) as u16,
                    computed.size.height.round().max(0.0) as u16,
                ),
            );
        }
        for child in mirror.tree.children(taffy_node)? {
            stack.push((child, x, y));
        }
    }
    layout.width = width;
    layout.height = height;
    Ok(layout)
}
