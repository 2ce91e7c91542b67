//! Layout - flexbox computation for the terminal surface.
//!
//! Uses [Taffy](https://github.com/DioxusLabs/taffy) for flexbox. The bridge
//! mirrors the document under a container into a Taffy tree, measures text
//! with `unicode-width` and hands back absolute cell rectangles.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::layout::compute_layout;
//!
//! let layout = compute_layout(&document, container, 80, 24);
//! let rect = layout.rect(button);
//! ```

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::types::Rect;

mod taffy_bridge;
mod text_measure;

pub use taffy_bridge::{compute_layout_taffy, has_border};
pub use text_measure::*;

/// Absolute cell rectangles of laid-out nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedLayout {
    pub width: u16,
    pub height: u16,
    pub rects: HashMap<NodeId, Rect>,
}

impl ComputedLayout {
    pub fn rect(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Lay out `root`'s subtree into a `width` x `height` viewport.
///
/// A layout failure is logged and yields an empty layout.
pub fn compute_layout(document: &Document, root: NodeId, width: u16, height: u16) -> ComputedLayout {
    match compute_layout_taffy(document, root, width, height) {
        Ok(layout) => layout,
        Err(err) => {
            log::warn!("layout of {root:?} failed: {err:?}");
            ComputedLayout::default()
        }
    }
}
