//! Mouse Module - hit testing and pointer state
//!
//! HitGrid maps terminal cells to the deepest painted element. The
//! [`PointerState`] turns raw mouse events into document events:
//!
//! - `mousedown` / `mouseup` on the element under the pointer
//! - `click` when the press and release land on the same element
//! - `mouseleave` / `mouseenter` when the hovered element changes
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::state::mouse::{MouseEvent, PointerState};
//! use spark_dom::dom::MouseButton;
//!
//! let mut pointer = PointerState::default();
//! pointer.dispatch(&document, &hits, &MouseEvent::down(MouseButton::Left, 3, 1));
//! pointer.dispatch(&document, &hits, &MouseEvent::up(MouseButton::Left, 3, 1));
//! ```

use crate::dom::{Document, EventDetail, Modifiers, MouseButton, NativeEvent, NodeId};
use crate::types::Rect;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
    Move,
    Drag,
    Scroll,
}

/// Mouse event in terminal cell coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub button: MouseButton,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn new(action: MouseAction, button: MouseButton, x: u16, y: u16) -> Self {
        Self {
            action,
            button,
            x,
            y,
            modifiers: Modifiers::default(),
        }
    }

    pub fn down(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Down, button, x, y)
    }

    pub fn up(button: MouseButton, x: u16, y: u16) -> Self {
        Self::new(MouseAction::Up, button, x, y)
    }

    pub fn move_to(x: u16, y: u16) -> Self {
        Self::new(MouseAction::Move, MouseButton::None, x, y)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn native(&self, name: &str) -> NativeEvent {
        NativeEvent::new(name).with_detail(EventDetail::Mouse {
            x: self.x,
            y: self.y,
            button: self.button,
            modifiers: self.modifiers,
        })
    }
}

// =============================================================================
// HIT GRID - O(1) Coordinate to Node Lookup
// =============================================================================

/// A grid for O(1) mouse hit detection.
///
/// Each cell holds the node painted last at that position.
#[derive(Debug, Clone)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<NodeId>>,
}

impl HitGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize the grid, clearing all contents.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.resize(width as usize * height as usize, None);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    pub fn set(&mut self, x: u16, y: u16, node: NodeId) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.cells[idx] = Some(node);
    }

    /// Fill a rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, rect: Rect, node: NodeId) {
        let x2 = rect.x.saturating_add(rect.width).min(self.width);
        let y2 = rect.y.saturating_add(rect.height).min(self.height);
        for y in rect.y..y2 {
            let row = y as usize * self.width as usize;
            for x in rect.x..x2 {
                self.cells[row + x as usize] = Some(node);
            }
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<NodeId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .flatten()
    }
}

// =============================================================================
// POINTER STATE
// =============================================================================

/// Press and hover tracking between mouse events.
#[derive(Debug, Default, Clone)]
pub struct PointerState {
    pressed: Option<(NodeId, MouseButton)>,
    hovered: Option<NodeId>,
}

impl PointerState {
    pub fn pressed(&self) -> Option<NodeId> {
        self.pressed.map(|(node, _)| node)
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Dispatch the document events `event` implies.
    ///
    /// Returns the node that received a `click`, if any.
    pub fn dispatch(
        &mut self,
        document: &Document,
        hits: &HitGrid,
        event: &MouseEvent,
    ) -> Option<NodeId> {
        let target = hits.get(event.x, event.y).filter(|&node| document.exists(node));
        self.update_hover(document, target, event);

        match event.action {
            MouseAction::Down => {
                self.pressed = target.map(|node| (node, event.button));
                if let Some(node) = target {
                    document.dispatch_event(node, &event.native("mousedown"));
                }
                None
            }
            MouseAction::Up => {
                let pressed = self.pressed.take();
                let node = target?;
                document.dispatch_event(node, &event.native("mouseup"));
                let same_press = pressed.is_some_and(|(down, button)| {
                    down == node && button == event.button && document.exists(node)
                });
                if same_press {
                    log::trace!("click on {node:?}");
                    document.dispatch_event(node, &event.native("click"));
                    return Some(node);
                }
                None
            }
            MouseAction::Move | MouseAction::Drag => {
                if let Some(node) = target {
                    document.dispatch_event(node, &event.native("mousemove"));
                }
                None
            }
            MouseAction::Scroll => {
                if let Some(node) = target {
                    document.dispatch_event(node, &event.native("wheel"));
                }
                None
            }
        }
    }

    fn update_hover(&mut self, document: &Document, target: Option<NodeId>, event: &MouseEvent) {
        if target == self.hovered {
            return;
        }
        if let Some(previous) = self.hovered.filter(|&node| document.exists(node)) {
            document.dispatch_event(previous, &event.native("mouseleave"));
        }
        if let Some(next) = target {
            document.dispatch_event(next, &event.native("mouseenter"));
        }
        self.hovered = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_hit_grid_fill_rect() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let mut grid = HitGrid::new(10, 10);
        grid.fill_rect(Rect::new(2, 2, 4, 4), node);

        assert_eq!(grid.get(2, 2), Some(node));
        assert_eq!(grid.get(5, 5), Some(node));
        assert_eq!(grid.get(1, 2), None);
        assert_eq!(grid.get(6, 2), None);
    }

    #[test]
    fn test_hit_grid_out_of_bounds() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let mut grid = HitGrid::new(10, 10);
        assert_eq!(grid.get(10, 5), None);
        grid.set(100, 100, node);
        assert_eq!(grid.get(100, 100), None);

        grid.fill_rect(Rect::new(8, 8, 10, 10), node);
        assert_eq!(grid.get(9, 9), Some(node));
    }

    #[test]
    fn test_hit_grid_resize_clears() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let mut grid = HitGrid::new(10, 10);
        grid.fill_rect(Rect::new(0, 0, 5, 5), node);
        grid.resize(20, 20);
        assert_eq!(grid.get(2, 2), None);
        assert_eq!(grid.width(), 20);
    }

    fn record(doc: &Document, node: NodeId, names: &[&str], log: &Rc<RefCell<Vec<String>>>) {
        for name in names {
            let log = log.clone();
            doc.add_event_listener(
                node,
                name,
                false,
                Rc::new(move |event: &NativeEvent| log.borrow_mut().push(event.name().to_string())),
            );
        }
    }

    #[test]
    fn test_click_requires_same_node() {
        let doc = Document::new();
        let a = doc.create_element("button");
        let b = doc.create_element("button");
        let mut grid = HitGrid::new(10, 1);
        grid.fill_rect(Rect::new(0, 0, 5, 1), a);
        grid.fill_rect(Rect::new(5, 0, 5, 1), b);

        let log = Rc::new(RefCell::new(Vec::new()));
        record(&doc, a, &["mousedown", "mouseup", "click"], &log);
        record(&doc, b, &["mousedown", "mouseup", "click"], &log);

        let mut pointer = PointerState::default();
        pointer.dispatch(&doc, &grid, &MouseEvent::down(MouseButton::Left, 1, 0));
        let clicked = pointer.dispatch(&doc, &grid, &MouseEvent::up(MouseButton::Left, 7, 0));
        assert_eq!(clicked, None);

        pointer.dispatch(&doc, &grid, &MouseEvent::down(MouseButton::Left, 6, 0));
        let clicked = pointer.dispatch(&doc, &grid, &MouseEvent::up(MouseButton::Left, 8, 0));
        assert_eq!(clicked, Some(b));
        assert_eq!(
            *log.borrow(),
            vec!["mousedown", "mouseup", "mousedown", "mouseup", "click"]
        );
    }

    #[test]
    fn test_hover_enter_and_leave() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let mut grid = HitGrid::new(4, 1);
        grid.fill_rect(Rect::new(0, 0, 2, 1), a);

        let log = Rc::new(RefCell::new(Vec::new()));
        record(&doc, a, &["mouseenter", "mouseleave"], &log);

        let mut pointer = PointerState::default();
        pointer.dispatch(&doc, &grid, &MouseEvent::move_to(0, 0));
        pointer.dispatch(&doc, &grid, &MouseEvent::move_to(1, 0));
        assert_eq!(pointer.hovered(), Some(a));
        pointer.dispatch(&doc, &grid, &MouseEvent::move_to(3, 0));
        assert_eq!(pointer.hovered(), None);
        assert_eq!(*log.borrow(), vec!["mouseenter", "mouseleave"]);
    }
}
