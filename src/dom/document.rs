//! Document - retained host tree.
//!
//! An arena of element and text nodes addressed by [`NodeId`]. Freed slots go
//! into a pool and are reused, the same way component indices are recycled.
//! Every write bumps a mutation counter so callers can tell whether a pass
//! touched the tree at all.
//!
//! # API
//!
//! - `create_element` / `create_text` - Allocate detached nodes
//! - `insert_before` / `append_child` / `remove_child` / `destroy` - Structure
//! - `set_attribute` / `set_class_name` / `set_style` / `set_property` / `set_text` - Content
//! - `add_event_listener` / `dispatch_event` - Native capture/target/bubble events
//! - `to_markup` - Serialize a subtree
//!
//! # Example
//!
//! ```ignore
//! let doc = Document::new();
//! let root = doc.create_element("div");
//! let label = doc.create_text("hello");
//! doc.append_child(root, label);
//! assert_eq!(doc.to_markup(root), "<div>hello</div>");
//! ```

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;

use super::event::{EventPhase, NativeEvent};
use crate::types::{PropValue, StyleMap};

// =============================================================================
// IDS
// =============================================================================

/// Handle to a node inside one [`Document`].
///
/// Slots are recycled; the generation makes a handle to a destroyed node
/// stay dead after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Identity of a document, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(usize);

/// Handle returned by `add_event_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// Callback attached to a node for native events.
pub type NativeListener = Rc<dyn Fn(&NativeEvent)>;

static NEXT_DOCUMENT_ID: AtomicUsize = AtomicUsize::new(0);

// =============================================================================
// NODE STORAGE
// =============================================================================

#[derive(Default)]
struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
    class_name: String,
    style: StyleMap,
    properties: IndexMap<String, PropValue>,
}

enum NodeKind {
    Element(ElementData),
    Text(String),
}

struct Listener {
    id: ListenerId,
    name: String,
    capture: bool,
    callback: NativeListener,
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
}

#[derive(Default)]
struct DocumentInner {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    next_listener: usize,
    mutations: u64,
}

impl DocumentInner {
    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.node_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn unlink(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.node_mut(child)?.parent.take()?;
        if let Some(parent_data) = self.node_mut(parent) {
            parent_data.children.retain(|&c| c != child);
        }
        Some(parent)
    }

    fn free_subtree(&mut self, root: NodeId, freed: &mut Vec<NodeId>) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .nodes
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            if let Some(data) = slot.data.take() {
                stack.extend(data.children.iter().rev().copied());
                self.free.push(id.index);
                freed.push(id);
            }
        }
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// Shared handle to a retained host tree.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    inner: Rc<RefCell<DocumentInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("live_nodes", &(inner.nodes.len() - inner.free.len()))
            .field("mutations", &inner.mutations)
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed)),
            inner: Rc::new(RefCell::new(DocumentInner::default())),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Number of writes performed on this document so far.
    pub fn mutation_count(&self) -> u64 {
        self.inner.borrow().mutations
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    /// Create a detached element node.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData {
            tag: tag.to_string(),
            ..ElementData::default()
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&self, value: &str) -> NodeId {
        self.alloc(NodeKind::Text(value.to_string()))
    }

    fn alloc(&self, kind: NodeKind) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        };
        inner.mutations += 1;
        // Reuse free slot or grow
        match inner.free.pop() {
            Some(index) => {
                let slot = &mut inner.nodes[index];
                slot.generation = slot.generation.wrapping_add(1);
                slot.data = Some(data);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                inner.nodes.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                NodeId {
                    index: inner.nodes.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Detach `node` and free it with its whole subtree.
    ///
    /// Returns every freed id, root first.
    pub fn destroy(&self, node: NodeId) -> Vec<NodeId> {
        let mut inner = self.inner.borrow_mut();
        let mut freed = Vec::new();
        if inner.node(node).is_none() {
            return freed;
        }
        inner.unlink(node);
        inner.free_subtree(node, &mut freed);
        inner.mutations += 1;
        freed
    }

    /// Destroy every child of `node`.
    pub fn clear_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut freed = Vec::new();
        for child in self.children(node) {
            freed.extend(self.destroy(child));
        }
        freed
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn exists(&self, node: NodeId) -> bool {
        self.inner.borrow().node(node).is_some()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.inner.borrow().element(node).is_some()
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(
            self.inner.borrow().node(node).map(|n| &n.kind),
            Some(NodeKind::Text(_))
        )
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().element(node).map(|e| e.tag.clone())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .and_then(|n| n.children.first().copied())
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let parent = inner.node(node)?.parent?;
        let siblings = &inner.node(parent)?.children;
        let position = siblings.iter().position(|&c| c == node)?;
        siblings.get(position + 1).copied()
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inner.borrow().is_ancestor(ancestor, node)
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Move `child` under `parent`, before `anchor` (or last when `anchor` is
    /// `None` or not a child of `parent`).
    pub fn insert_before(&self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) {
        let mut inner = self.inner.borrow_mut();
        if inner.node(parent).is_none() || inner.node(child).is_none() {
            return;
        }
        if inner.is_ancestor(child, parent) {
            log::warn!("refusing to insert {child:?} into its own subtree");
            return;
        }
        inner.unlink(child);
        let Some(parent_data) = inner.node_mut(parent) else {
            return;
        };
        let position = anchor
            .and_then(|a| parent_data.children.iter().position(|&c| c == a))
            .unwrap_or(parent_data.children.len());
        parent_data.children.insert(position, child);
        if let Some(child_data) = inner.node_mut(child) {
            child_data.parent = Some(parent);
        }
        inner.mutations += 1;
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child).is_some()
    }

    /// Detach `node` from its parent, returning the former parent.
    pub fn detach(&self, node: NodeId) -> Option<NodeId> {
        let mut inner = self.inner.borrow_mut();
        let parent = inner.unlink(node)?;
        inner.mutations += 1;
        Some(parent)
    }

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    pub fn text(&self, node: NodeId) -> Option<String> {
        match self.inner.borrow().node(node).map(|n| &n.kind) {
            Some(NodeKind::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn set_text(&self, node: NodeId, value: &str) {
        let mut inner = self.inner.borrow_mut();
        if let Some(NodeKind::Text(text)) = inner.node_mut(node).map(|n| &mut n.kind) {
            value.clone_into(text);
            inner.mutations += 1;
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .element(node)
            .and_then(|e| e.attributes.get(name).cloned())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .element(node)
            .map(|e| {
                e.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.write_element(node, |e| {
            e.attributes.insert(name.to_string(), value.to_string());
        });
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        self.write_element(node, |e| e.attributes.shift_remove(name).is_some())
            .unwrap_or(false)
    }

    pub fn class_name(&self, node: NodeId) -> String {
        self.inner
            .borrow()
            .element(node)
            .map(|e| e.class_name.clone())
            .unwrap_or_default()
    }

    pub fn set_class_name(&self, node: NodeId, value: &str) {
        self.write_element(node, |e| value.clone_into(&mut e.class_name));
    }

    pub fn style(&self, node: NodeId) -> StyleMap {
        self.inner
            .borrow()
            .element(node)
            .map(|e| e.style.clone())
            .unwrap_or_default()
    }

    pub fn style_value(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .element(node)
            .and_then(|e| e.style.get(name).cloned())
    }

    /// Replace the whole inline style of an element.
    pub fn set_style(&self, node: NodeId, style: StyleMap) {
        self.write_element(node, |e| e.style = style);
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<PropValue> {
        self.inner
            .borrow()
            .element(node)
            .and_then(|e| e.properties.get(name).cloned())
    }

    pub fn set_property(&self, node: NodeId, name: &str, value: PropValue) {
        self.write_element(node, |e| {
            e.properties.insert(name.to_string(), value);
        });
    }

    pub fn remove_property(&self, node: NodeId, name: &str) -> bool {
        self.write_element(node, |e| e.properties.shift_remove(name).is_some())
            .unwrap_or(false)
    }

    fn write_element<R>(&self, node: NodeId, f: impl FnOnce(&mut ElementData) -> R) -> Option<R> {
        let mut inner = self.inner.borrow_mut();
        let result = f(inner.element_mut(node)?);
        inner.mutations += 1;
        Some(result)
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(data) = inner.node(id) else { continue };
            match &data.kind {
                NodeKind::Text(value) => out.push_str(value),
                NodeKind::Element(_) => stack.extend(data.children.iter().rev().copied()),
            }
        }
        out
    }

    /// First element under `root` (inclusive, depth first) with `name == value`.
    pub fn find_by_attribute(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&id| {
            self.attribute(id, name).as_deref() == Some(value)
        })
    }

    /// Every element under `root` (inclusive, document order) with this tag.
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.tag(id).as_deref() == Some(tag))
            .collect()
    }

    /// `root` and all of its descendants in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(data) = inner.node(id) {
                out.push(id);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// Serialize `node` and its subtree as HTML-like markup.
    pub fn to_markup(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        write_markup(&inner, node, &mut out);
        out
    }

    // -------------------------------------------------------------------------
    // Native events
    // -------------------------------------------------------------------------

    /// Attach a native listener. Returns `None` if the node does not exist.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        name: &str,
        capture: bool,
        callback: NativeListener,
    ) -> Option<ListenerId> {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        let data = inner.node_mut(node)?;
        data.listeners.push(Listener {
            id,
            name: name.to_string(),
            capture,
            callback,
        });
        inner.next_listener += 1;
        Some(id)
    }

    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(data) = inner.node_mut(node) else {
            return false;
        };
        let before = data.listeners.len();
        data.listeners.retain(|l| l.id != id);
        data.listeners.len() != before
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.listeners.len())
            .unwrap_or(0)
    }

    /// Dispatch `event` at `target`: capture down the ancestor chain, run the
    /// target's listeners, then bubble back up if the event bubbles.
    ///
    /// Returns false if a listener prevented the default action.
    pub fn dispatch_event(&self, target: NodeId, event: &NativeEvent) -> bool {
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            path.push(id);
            current = self.parent(id);
        }
        if path.is_empty() || !self.exists(target) {
            return true;
        }

        event.begin_dispatch(target);

        // Capture: root → parent of target
        for &node in path.iter().skip(1).rev() {
            if event.is_propagation_stopped() {
                break;
            }
            event.enter(node, EventPhase::Capturing);
            self.invoke_listeners(node, event, Some(true));
        }

        if !event.is_propagation_stopped() {
            event.enter(target, EventPhase::AtTarget);
            self.invoke_listeners(target, event, None);
        }

        if event.bubbles() {
            for &node in path.iter().skip(1) {
                if event.is_propagation_stopped() {
                    break;
                }
                event.enter(node, EventPhase::Bubbling);
                self.invoke_listeners(node, event, Some(false));
            }
        }

        event.end_dispatch();
        !event.is_default_prevented()
    }

    fn invoke_listeners(&self, node: NodeId, event: &NativeEvent, capture: Option<bool>) {
        // Snapshot so listeners can mutate the document.
        let callbacks: Vec<NativeListener> = {
            let inner = self.inner.borrow();
            let Some(data) = inner.node(node) else {
                return;
            };
            let mut matching: Vec<&Listener> = data
                .listeners
                .iter()
                .filter(|l| l.name == event.name())
                .filter(|l| capture.is_none_or(|c| l.capture == c))
                .collect();
            // At target, capture listeners still run first.
            matching.sort_by_key(|l| !l.capture);
            matching.into_iter().map(|l| l.callback.clone()).collect()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

fn write_markup(inner: &DocumentInner, node: NodeId, out: &mut String) {
    let Some(data) = inner.node(node) else {
        return;
    };
    match &data.kind {
        NodeKind::Text(value) => out.push_str(&escape(value)),
        NodeKind::Element(element) => {
            let _ = write!(out, "<{}", element.tag);
            for (name, value) in &element.attributes {
                if value.is_empty() {
                    let _ = write!(out, " {name}");
                } else {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
            }
            if !element.class_name.is_empty() {
                let _ = write!(out, " class=\"{}\"", escape(&element.class_name));
            }
            if !element.style.is_empty() {
                let declarations: Vec<String> = element
                    .style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                let _ = write!(out, " style=\"{}\"", escape(&declarations.join("; ")));
            }
            out.push('>');
            for &child in &data.children {
                write_markup(inner, child, out);
            }
            let _ = write!(out, "</{}>", element.tag);
        }
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_create_and_append() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let text = doc.create_text("hi");
        doc.append_child(root, text);

        assert_eq!(doc.parent(text), Some(root));
        assert_eq!(doc.children(root), vec![text]);
        assert_eq!(doc.to_markup(root), "<div>hi</div>");
    }

    #[test]
    fn test_insert_before_moves_node() {
        let doc = Document::new();
        let root = doc.create_element("ul");
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        let c = doc.create_element("li");
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);

        doc.insert_before(root, c, Some(a));
        assert_eq!(doc.children(root), vec![c, a, b]);
        assert_eq!(doc.next_sibling(c), Some(a));
        assert_eq!(doc.next_sibling(b), None);
    }

    #[test]
    fn test_insert_into_own_subtree_is_ignored() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner);
        doc.append_child(inner, outer);
        assert_eq!(doc.parent(outer), None);
    }

    #[test]
    fn test_destroy_frees_subtree_and_reuses_slots() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let child = doc.create_element("span");
        let leaf = doc.create_text("x");
        doc.append_child(root, child);
        doc.append_child(child, leaf);

        let freed = doc.destroy(child);
        assert_eq!(freed, vec![child, leaf]);
        assert!(!doc.exists(child));
        assert!(doc.children(root).is_empty());

        let reused = doc.create_element("p");
        assert!(reused.index() == child.index() || reused.index() == leaf.index());
        assert_ne!(reused, child);
        assert_ne!(reused, leaf);
        assert!(!doc.exists(child));
        assert_eq!(doc.tag(reused).as_deref(), Some("p"));
    }

    #[test]
    fn test_attributes_class_and_style() {
        let doc = Document::new();
        let node = doc.create_element("button");
        doc.set_attribute(node, "id", "buy");
        doc.set_attribute(node, "disabled", "");
        doc.set_class_name(node, "primary");
        let mut style = StyleMap::new();
        style.insert("color".to_string(), "red".to_string());
        doc.set_style(node, style);

        assert_eq!(
            doc.to_markup(node),
            "<button id=\"buy\" disabled class=\"primary\" style=\"color: red\"></button>"
        );
        assert!(doc.remove_attribute(node, "disabled"));
        assert!(!doc.has_attribute(node, "disabled"));
        assert_eq!(doc.style_value(node, "color").as_deref(), Some("red"));
    }

    #[test]
    fn test_mutation_count_tracks_writes() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let before = doc.mutation_count();
        doc.set_attribute(node, "id", "a");
        assert_eq!(doc.mutation_count(), before + 1);
        let _ = doc.attribute(node, "id");
        assert_eq!(doc.mutation_count(), before + 1);
    }

    #[test]
    fn test_text_content_and_find() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let p = doc.create_element("p");
        doc.set_attribute(p, "id", "lead");
        doc.append_child(root, p);
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(p, a);
        doc.append_child(root, b);

        assert_eq!(doc.text_content(root), "ab");
        assert_eq!(doc.find_by_attribute(root, "id", "lead"), Some(p));
        assert_eq!(doc.elements_by_tag(root, "p"), vec![p]);
    }

    #[test]
    fn test_dispatch_capture_target_bubble_order() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let mid = doc.create_element("div");
        let leaf = doc.create_element("span");
        doc.append_child(root, mid);
        doc.append_child(mid, leaf);

        let log = Rc::new(RefCell::new(Vec::new()));
        for (node, label) in [(root, "root"), (mid, "mid"), (leaf, "leaf")] {
            for capture in [true, false] {
                let log = log.clone();
                let entry = format!("{label}:{}", if capture { "capture" } else { "bubble" });
                doc.add_event_listener(
                    node,
                    "click",
                    capture,
                    Rc::new(move |_: &NativeEvent| log.borrow_mut().push(entry.clone())),
                );
            }
        }

        doc.dispatch_event(leaf, &NativeEvent::new("click"));
        assert_eq!(
            *log.borrow(),
            vec![
                "root:capture",
                "mid:capture",
                "leaf:capture",
                "leaf:bubble",
                "mid:bubble",
                "root:bubble",
            ]
        );
    }

    #[test]
    fn test_dispatch_non_bubbling_skips_bubble_phase() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let leaf = doc.create_element("input");
        doc.append_child(root, leaf);

        let phases = Rc::new(RefCell::new(Vec::new()));
        for capture in [true, false] {
            let phases = phases.clone();
            doc.add_event_listener(
                root,
                "focus",
                capture,
                Rc::new(move |e: &NativeEvent| phases.borrow_mut().push(e.phase())),
            );
        }

        doc.dispatch_event(leaf, &NativeEvent::new("focus"));
        assert_eq!(*phases.borrow(), vec![EventPhase::Capturing]);
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        let doc = Document::new();
        let root = doc.create_element("div");
        let leaf = doc.create_element("a");
        doc.append_child(root, leaf);

        let reached = Rc::new(RefCell::new(false));
        let flag = reached.clone();
        doc.add_event_listener(
            root,
            "click",
            false,
            Rc::new(move |_: &NativeEvent| *flag.borrow_mut() = true),
        );
        doc.add_event_listener(
            leaf,
            "click",
            false,
            Rc::new(|e: &NativeEvent| {
                e.prevent_default();
                e.stop_propagation();
            }),
        );

        let allowed = doc.dispatch_event(leaf, &NativeEvent::new("click"));
        assert!(!allowed);
        assert!(!*reached.borrow());
    }

    #[test]
    fn test_remove_event_listener() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let id = doc
            .add_event_listener(node, "click", false, Rc::new(|_: &NativeEvent| {}))
            .unwrap();
        assert_eq!(doc.listener_count(node), 1);
        assert!(doc.remove_event_listener(node, id));
        assert!(!doc.remove_event_listener(node, id));
        assert_eq!(doc.listener_count(node), 0);
    }
}
