//! Native events dispatched by the [`Document`](super::Document).
//!
//! A `NativeEvent` travels capture → target → bubble through the ancestor
//! chain of its target. Flags live in `Cell`s so listeners only ever need a
//! shared reference.

use std::cell::Cell;

use super::NodeId;

// =============================================================================
// TYPES
// =============================================================================

/// Dispatch phase of a native event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

/// Modifier keys state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with ctrl
    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::default() }
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Payload carried by a native event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventDetail {
    #[default]
    None,
    Mouse {
        x: u16,
        y: u16,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Key {
        key: String,
        modifiers: Modifiers,
    },
    Value(String),
}

/// Events that do not bubble unless told otherwise.
pub fn bubbles_by_default(name: &str) -> bool {
    !matches!(
        name,
        "focus" | "blur" | "load" | "unload" | "scroll" | "mouseenter" | "mouseleave"
    )
}

// =============================================================================
// NATIVE EVENT
// =============================================================================

/// An event as the host document sees it.
#[derive(Debug)]
pub struct NativeEvent {
    name: String,
    bubbles: bool,
    cancelable: bool,
    detail: EventDetail,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    phase: Cell<EventPhase>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl NativeEvent {
    /// Create a cancelable event; bubbling follows [`bubbles_by_default`].
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let bubbles = bubbles_by_default(&name);
        Self {
            name,
            bubbles,
            cancelable: true,
            detail: EventDetail::None,
            target: Cell::new(None),
            current_target: Cell::new(None),
            phase: Cell::new(EventPhase::None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    /// Node the event was dispatched at (set once dispatch begins).
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// Node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Marks the default action as prevented. No-op for non-cancelable events.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn begin_dispatch(&self, target: NodeId) {
        self.target.set(Some(target));
        self.propagation_stopped.set(false);
    }

    pub(crate) fn enter(&self, node: NodeId, phase: EventPhase) {
        self.current_target.set(Some(node));
        self.phase.set(phase);
    }

    pub(crate) fn end_dispatch(&self) {
        self.current_target.set(None);
        self.phase.set(EventPhase::None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bubbles_by_default() {
        assert!(NativeEvent::new("click").bubbles());
        assert!(NativeEvent::new("keydown").bubbles());
        assert!(!NativeEvent::new("focus").bubbles());
        assert!(!NativeEvent::new("mouseenter").bubbles());
        assert!(NativeEvent::new("focus").with_bubbles(true).bubbles());
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let event = NativeEvent::new("click").with_cancelable(false);
        event.prevent_default();
        assert!(!event.is_default_prevented());

        let event = NativeEvent::new("click");
        event.prevent_default();
        assert!(event.is_default_prevented());
    }

    #[test]
    fn test_modifiers_constructors() {
        assert!(Modifiers::ctrl().ctrl);
        assert!(!Modifiers::ctrl().shift);
        assert_eq!(Modifiers::none(), Modifiers::default());
    }
}
