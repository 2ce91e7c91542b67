//! Events - delegated handlers on top of root-level native listeners.
//!
//! Handler props never become native listeners on their own nodes. Each event
//! name gets exactly two native listeners on the render root:
//!
//! - a capture-phase listener that only acts for events that do not bubble
//!   (those never reach the root in the bubble phase), and
//! - a bubble-phase listener that only acts for bubbling events.
//!
//! Either one hands the native event to `Engine::dispatch_event`, which walks
//! from the native target up to the root and invokes the handlers recorded
//! for each node, wrapping the event in a fresh [`SyntheticEvent`] per call.
//!
//! # API
//!
//! - `Engine::add_event_handler(node, name, handler)` - Record a handler
//! - `Engine::remove_event_handler(node, name)` - Forget a handler
//! - `Engine::set_event_root(container)` - Move the native listeners
//! - `Engine::dispatch_event(name, native)` - Delegated dispatch

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::dom::{EventDetail, EventPhase, ListenerId, NativeEvent, NativeListener, NodeId};
use crate::engine::Engine;
use crate::types::EventHandler;

// =============================================================================
// SYNTHETIC EVENT
// =============================================================================

/// Event passed to handlers.
///
/// Its prevention and propagation flags are its own, but setting them also
/// forwards to the native event, and the queries report either source.
pub struct SyntheticEvent<'a> {
    native: &'a NativeEvent,
    current_target: NodeId,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl<'a> SyntheticEvent<'a> {
    pub(crate) fn new(native: &'a NativeEvent, current_target: NodeId) -> Self {
        Self {
            native,
            current_target,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        self.native.name()
    }

    pub fn native(&self) -> &NativeEvent {
        self.native
    }

    /// Node the native event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.native.target()
    }

    /// Node whose handler is running.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn detail(&self) -> &EventDetail {
        self.native.detail()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
        self.native.prevent_default();
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
        self.native.stop_propagation();
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get() || self.native.is_default_prevented()
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get() || self.native.is_propagation_stopped()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct RootListeners {
    capture: ListenerId,
    bubble: ListenerId,
}

/// Per-engine event state.
#[derive(Default)]
pub(crate) struct EventRegistry {
    registered: IndexSet<String>,
    root: Option<NodeId>,
    root_listeners: HashMap<NodeId, IndexMap<String, RootListeners>>,
    handlers: HashMap<NodeId, IndexMap<String, EventHandler>>,
}

impl EventRegistry {
    fn handler(&self, node: NodeId, name: &str) -> Option<EventHandler> {
        self.handlers.get(&node).and_then(|h| h.get(name)).cloned()
    }
}

impl Engine {
    /// Record `handler` for `name` on `node`, replacing any previous one.
    pub fn add_event_handler(&self, node: NodeId, name: &str, handler: EventHandler) {
        let (first_time, root) = {
            let mut registry = self.events.borrow_mut();
            registry
                .handlers
                .entry(node)
                .or_default()
                .insert(name.to_string(), handler);
            (registry.registered.insert(name.to_string()), registry.root)
        };
        if first_time {
            log::trace!("registered event `{name}`");
            if let Some(root) = root {
                self.listen_to_native_event(name, root);
            }
        }
    }

    /// Forget the handler for `name` on `node`. Native listeners stay.
    pub fn remove_event_handler(&self, node: NodeId, name: &str) -> bool {
        let mut registry = self.events.borrow_mut();
        let Some(handlers) = registry.handlers.get_mut(&node) else {
            return false;
        };
        let removed = handlers.shift_remove(name).is_some();
        if handlers.is_empty() {
            registry.handlers.remove(&node);
        }
        removed
    }

    /// Handler recorded for `name` on `node`.
    pub fn event_handler(&self, node: NodeId, name: &str) -> Option<EventHandler> {
        self.events.borrow().handler(node, name)
    }

    /// Every event name seen so far, in registration order.
    pub fn registered_events(&self) -> Vec<String> {
        self.events.borrow().registered.iter().cloned().collect()
    }

    pub fn event_root(&self) -> Option<NodeId> {
        self.events.borrow().root
    }

    /// Attach the native listeners to `container`, detaching them from the
    /// previous root. The current root is a no-op.
    pub fn set_event_root(&self, container: NodeId) {
        let (previous, names) = {
            let mut registry = self.events.borrow_mut();
            if registry.root == Some(container) {
                return;
            }
            let previous = registry.root.replace(container);
            let names: Vec<String> = registry.registered.iter().cloned().collect();
            (previous, names)
        };
        log::debug!("event root {previous:?} -> {container:?}");
        if let Some(previous) = previous {
            self.detach_root_listeners(previous);
        }
        for name in &names {
            self.listen_to_native_event(name, container);
        }
    }

    /// Detach every native listener and forget the root.
    pub(crate) fn clear_event_root(&self) {
        let previous = self.events.borrow_mut().root.take();
        if let Some(previous) = previous {
            self.detach_root_listeners(previous);
        }
    }

    /// Walk from the native target up to the root, invoking handlers for `name`.
    pub fn dispatch_event(&self, name: &str, native: &NativeEvent) {
        let Some(root) = self.events.borrow().root else {
            log::warn!("`{name}` dispatched with no event root");
            return;
        };
        let document = self.document();
        let mut current = native.target();
        while let Some(node) = current {
            if document.is_text(node) {
                current = document.parent(node);
                continue;
            }

            let handler = self.events.borrow().handler(node, name);
            if let Some(handler) = handler {
                log::trace!("dispatch `{name}` to {node:?}");
                let event = SyntheticEvent::new(native, node);
                handler(&event);
                if event.is_propagation_stopped() {
                    break;
                }
            }

            if node == root {
                break;
            }
            current = document.parent(node);
        }
    }

    /// Drop handler maps for destroyed nodes.
    pub(crate) fn forget_nodes(&self, nodes: &[NodeId]) {
        let mut registry = self.events.borrow_mut();
        for node in nodes {
            registry.handlers.remove(node);
            registry.root_listeners.remove(node);
        }
    }

    fn listen_to_native_event(&self, name: &str, container: NodeId) {
        let attached = self
            .events
            .borrow()
            .root_listeners
            .get(&container)
            .is_some_and(|listeners| listeners.contains_key(name));
        if attached {
            return;
        }

        let capture: NativeListener = {
            let engine = self.downgrade();
            let name = name.to_string();
            Rc::new(move |event: &NativeEvent| {
                if event.bubbles() || event.phase() == EventPhase::Bubbling {
                    return;
                }
                if let Some(engine) = engine.upgrade() {
                    engine.dispatch_event(&name, event);
                }
            })
        };
        let bubble: NativeListener = {
            let engine = self.downgrade();
            let name = name.to_string();
            Rc::new(move |event: &NativeEvent| {
                if !event.bubbles() {
                    return;
                }
                if let Some(engine) = engine.upgrade() {
                    engine.dispatch_event(&name, event);
                }
            })
        };

        let document = self.document();
        let ids = document
            .add_event_listener(container, name, true, capture)
            .zip(document.add_event_listener(container, name, false, bubble));
        match ids {
            Some((capture, bubble)) => {
                self.events
                    .borrow_mut()
                    .root_listeners
                    .entry(container)
                    .or_default()
                    .insert(name.to_string(), RootListeners { capture, bubble });
                log::trace!("listening for `{name}` on {container:?}");
            }
            None => log::warn!("cannot listen for `{name}`: {container:?} is not in the document"),
        }
    }

    fn detach_root_listeners(&self, container: NodeId) {
        let listeners = self.events.borrow_mut().root_listeners.remove(&container);
        let document = self.document();
        for (_, ids) in listeners.into_iter().flatten() {
            document.remove_event_listener(container, ids.capture);
            document.remove_event_listener(container, ids.bubble);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use std::cell::RefCell;

    fn setup() -> (Engine, Document, NodeId, NodeId, NodeId) {
        let doc = Document::new();
        let root = doc.create_element("div");
        let outer = doc.create_element("section");
        let inner = doc.create_element("button");
        doc.append_child(root, outer);
        doc.append_child(outer, inner);
        let engine = Engine::new(doc.clone());
        engine.set_event_root(root);
        (engine, doc, root, outer, inner)
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &str) -> EventHandler {
        let log = log.clone();
        let label = label.to_string();
        Rc::new(move |_: &SyntheticEvent<'_>| log.borrow_mut().push(label.clone()))
    }

    #[test]
    fn test_handlers_run_bottom_up() {
        let (engine, doc, _, outer, inner) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        engine.add_event_handler(outer, "click", recorder(&log, "outer"));
        engine.add_event_handler(inner, "click", recorder(&log, "inner"));

        doc.dispatch_event(inner, &NativeEvent::new("click"));
        assert_eq!(*log.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn test_stop_propagation_halts_walk() {
        let (engine, doc, _, outer, inner) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        engine.add_event_handler(outer, "click", recorder(&log, "outer"));
        engine.add_event_handler(
            inner,
            "click",
            Rc::new(|event: &SyntheticEvent<'_>| event.stop_propagation()),
        );

        doc.dispatch_event(inner, &NativeEvent::new("click"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_non_bubbling_event_delivered_once_via_capture() {
        let (engine, doc, _, outer, inner) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        engine.add_event_handler(outer, "focus", recorder(&log, "outer"));

        doc.dispatch_event(inner, &NativeEvent::new("focus"));
        assert_eq!(*log.borrow(), vec!["outer"]);
        assert_eq!(doc.listener_count(doc.parent(outer).unwrap()), 2);
    }

    #[test]
    fn test_text_target_starts_at_parent() {
        let (engine, doc, _, _, inner) = setup();
        let label = doc.create_text("Buy");
        doc.append_child(inner, label);
        let log = Rc::new(RefCell::new(Vec::new()));
        engine.add_event_handler(inner, "click", recorder(&log, "button"));

        doc.dispatch_event(label, &NativeEvent::new("click"));
        assert_eq!(*log.borrow(), vec!["button"]);
    }

    #[test]
    fn test_prevent_default_reaches_native() {
        let (engine, doc, _, _, inner) = setup();
        engine.add_event_handler(
            inner,
            "click",
            Rc::new(|event: &SyntheticEvent<'_>| {
                event.prevent_default();
                assert!(event.is_default_prevented());
            }),
        );
        assert!(!doc.dispatch_event(inner, &NativeEvent::new("click")));
    }

    #[test]
    fn test_walk_stops_at_root() {
        let doc = Document::new();
        let page = doc.create_element("body");
        let root = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(page, root);
        doc.append_child(root, button);
        let engine = Engine::new(doc.clone());
        engine.set_event_root(root);

        let log = Rc::new(RefCell::new(Vec::new()));
        engine.add_event_handler(page, "click", recorder(&log, "page"));
        engine.add_event_handler(root, "click", recorder(&log, "root"));
        engine.add_event_handler(button, "click", recorder(&log, "button"));

        doc.dispatch_event(button, &NativeEvent::new("click"));
        assert_eq!(*log.borrow(), vec!["button", "root"]);
    }

    #[test]
    fn test_set_event_root_moves_listeners() {
        let (engine, doc, root, _, inner) = setup();
        engine.add_event_handler(inner, "click", Rc::new(|_: &SyntheticEvent<'_>| {}));
        assert_eq!(doc.listener_count(root), 2);

        engine.set_event_root(root);
        assert_eq!(doc.listener_count(root), 2);

        let other = doc.create_element("div");
        engine.set_event_root(other);
        assert_eq!(doc.listener_count(root), 0);
        assert_eq!(doc.listener_count(other), 2);
        assert_eq!(engine.event_root(), Some(other));
    }

    #[test]
    fn test_remove_event_handler() {
        let (engine, doc, _, _, inner) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        engine.add_event_handler(inner, "click", recorder(&log, "inner"));
        assert!(engine.remove_event_handler(inner, "click"));
        assert!(!engine.remove_event_handler(inner, "click"));

        doc.dispatch_event(inner, &NativeEvent::new("click"));
        assert!(log.borrow().is_empty());
        assert_eq!(engine.registered_events(), vec!["click".to_string()]);
    }
}
