//! Reconciler - walks the previous instance tree and the next element tree
//! together and decides, per position, whether to mount, patch or unmount.
//!
//! # Child lists
//!
//! `reconcile_children` runs in four steps:
//!
//! 1. Match: keyed children by key, unkeyed ones by index, falling back to
//!    the first unused previous child of the same type. Only a candidate of
//!    the same type is reused.
//! 2. Unmount every previous child that was not matched.
//! 3. Reconcile in order. Reused instances keep their path; fresh mounts
//!    claim one, suffixing it with the type when it collides.
//! 4. Walk back to front and move an instance's host nodes only when they
//!    are not already contiguous and directly before the next sibling's
//!    first node (or the tail anchor).

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::host;
use super::instance::Instance;
use crate::dom::{Document, NodeId};
use crate::engine::Engine;
use crate::primitives::{child_path, Component, Element, ElementType};
use crate::state::hooks::Cleanup;
use crate::types::Props;

/// Reconcile one tree position.
///
/// `path` is used when `next` has to be mounted; an updated instance keeps
/// the path it was mounted with.
pub(crate) fn reconcile(
    engine: &Engine,
    parent: NodeId,
    prev: Option<Instance>,
    next: Option<&Element>,
    path: &str,
) -> Option<Instance> {
    let Some(next) = next else {
        if let Some(prev) = prev {
            unmount(engine, prev);
        }
        return None;
    };
    match prev {
        Some(prev) if prev.element.kind() == next.kind() => Some(update(engine, parent, prev, next)),
        prev => {
            if let Some(prev) = prev {
                unmount(engine, prev);
            }
            let stale = engine.hooks.borrow_mut().take_stale_under(path);
            run_cleanups(stale);
            Some(mount(engine, parent, next, path))
        }
    }
}

/// Run the effect cleanups owned by `instance`'s subtree, then destroy its
/// host nodes.
pub(crate) fn unmount(engine: &Engine, instance: Instance) {
    let mut cleanups = Vec::new();
    {
        let mut hooks = engine.hooks.borrow_mut();
        for path in instance.component_paths() {
            if !hooks.is_visited(&path) {
                cleanups.extend(hooks.dispose(&path));
            }
        }
    }
    run_cleanups(cleanups);
    host::remove_instance(engine, &instance);
}

fn run_cleanups(cleanups: Vec<Cleanup>) {
    for cleanup in cleanups {
        cleanup();
    }
}

// =============================================================================
// Mount / update
// =============================================================================

fn mount(engine: &Engine, parent: NodeId, element: &Element, path: &str) -> Instance {
    let document = engine.document();
    match element.kind() {
        ElementType::Text => {
            let node = document.create_text(element.text_value().unwrap_or_default());
            document.append_child(parent, node);
            Instance::new(element, Some(node), path)
        }
        ElementType::Host(tag) => {
            let node = document.create_element(tag);
            host::set_props(engine, node, element.props());
            let mut instance = Instance::new(element, Some(node), path);
            instance.children =
                reconcile_children(engine, node, Vec::new(), element.children(), path, None);
            document.append_child(parent, node);
            instance
        }
        ElementType::Fragment => {
            let mut instance = Instance::new(element, None, path);
            instance.children =
                reconcile_children(engine, parent, Vec::new(), element.children(), path, None);
            instance
        }
        ElementType::Component(component) => {
            let mut instance = Instance::new(element, None, path);
            let rendered = render_component(engine, component, element.props(), path);
            let child = rendered.and_then(|output| {
                reconcile(engine, parent, None, Some(&output), &child_path(path, output.key(), 0))
            });
            instance.children = vec![child];
            instance
        }
    }
}

fn update(engine: &Engine, parent: NodeId, mut instance: Instance, next: &Element) -> Instance {
    let document = engine.document();
    match next.kind() {
        ElementType::Text => {
            let value = next.text_value().unwrap_or_default();
            if instance.element.text_value().unwrap_or_default() != value {
                if let Some(node) = instance.host {
                    document.set_text(node, value);
                }
            }
        }
        ElementType::Host(_) => {
            if let Some(node) = instance.host {
                host::update_props(engine, node, instance.element.props(), next.props());
                let previous = std::mem::take(&mut instance.children);
                instance.children =
                    reconcile_children(engine, node, previous, next.children(), &instance.path, None);
            }
        }
        ElementType::Fragment => {
            let host_parent = instance
                .first_host_node()
                .and_then(|node| document.parent(node))
                .unwrap_or(parent);
            let tail = instance
                .last_host_node()
                .and_then(|node| document.next_sibling(node));
            let previous = std::mem::take(&mut instance.children);
            instance.children = reconcile_children(
                engine,
                host_parent,
                previous,
                next.children(),
                &instance.path,
                tail,
            );
        }
        ElementType::Component(component) => {
            let rendered = render_component(engine, component, next.props(), &instance.path);
            let previous = std::mem::take(&mut instance.children).into_iter().flatten().next();
            let child = match rendered {
                Some(output) => {
                    let path = child_path(&instance.path, output.key(), 0);
                    reconcile(engine, parent, previous, Some(&output), &path)
                }
                None => reconcile(engine, parent, previous, None, ""),
            };
            instance.children = vec![child];
        }
    }
    instance.element = next.clone();
    instance
}

/// Pops the component off the hook stack even if rendering panics.
struct ComponentFrame<'a>(&'a Engine);

impl Drop for ComponentFrame<'_> {
    fn drop(&mut self) {
        if let Ok(mut hooks) = self.0.hooks.try_borrow_mut() {
            hooks.end();
        }
    }
}

fn render_component(
    engine: &Engine,
    component: &Component,
    props: &Props,
    path: &str,
) -> Option<Element> {
    engine.hooks.borrow_mut().begin(path);
    let _frame = ComponentFrame(engine);
    component.render(props)
}

// =============================================================================
// Children
// =============================================================================

/// Reconcile a child list under `parent`. `tail` is the node that must follow
/// the last child (`None` for the end of `parent`).
pub(crate) fn reconcile_children(
    engine: &Engine,
    parent: NodeId,
    previous: Vec<Option<Instance>>,
    next: &[Element],
    path: &str,
    tail: Option<NodeId>,
) -> Vec<Option<Instance>> {
    let mut keyed: IndexMap<String, (usize, Instance)> = IndexMap::new();
    let mut unkeyed: Vec<Option<Instance>> = Vec::with_capacity(previous.len());
    let mut occupied: HashMap<String, ElementType> = HashMap::new();
    let mut leftovers: Vec<(usize, Instance)> = Vec::new();

    for (index, slot) in previous.into_iter().enumerate() {
        let Some(instance) = slot else {
            unkeyed.push(None);
            continue;
        };
        occupied.insert(instance.path.clone(), instance.element.kind().clone());
        match instance.key().map(str::to_string) {
            Some(key) if !keyed.contains_key(&key) => {
                keyed.insert(key, (index, instance));
                unkeyed.push(None);
            }
            _ => unkeyed.push(Some(instance)),
        }
    }

    // 1. Match
    let mut matched: Vec<Option<Instance>> = Vec::with_capacity(next.len());
    for (index, element) in next.iter().enumerate() {
        let candidate = match element.key() {
            Some(key) => match keyed.swap_remove(key) {
                Some((_, instance)) if instance.element.kind() == element.kind() => Some(instance),
                Some(mismatch) => {
                    leftovers.push(mismatch);
                    None
                }
                None => None,
            },
            None => take_unkeyed(&mut unkeyed, index, element.kind()),
        };
        matched.push(candidate);
    }

    // 2. Unmount what was not matched, in previous order
    leftovers.extend(keyed.into_values());
    leftovers.extend(
        unkeyed
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|instance| (index, instance))),
    );
    leftovers.sort_by_key(|(index, _)| *index);
    for (_, instance) in leftovers {
        unmount(engine, instance);
    }

    // 3. Reconcile in order
    let mut claimed: HashSet<String> = matched.iter().flatten().map(|i| i.path.clone()).collect();
    let mut children = Vec::with_capacity(next.len());
    for ((index, element), candidate) in next.iter().enumerate().zip(matched) {
        let child = match candidate {
            Some(instance) => Some(update(engine, parent, instance, element)),
            None => {
                let base = child_path(path, element.key(), index);
                let fresh = claim_path(base, element.kind(), &occupied, &mut claimed);
                reconcile(engine, parent, None, Some(element), &fresh)
            }
        };
        children.push(child);
    }

    // 4. Order host nodes
    let document = engine.document();
    let mut anchor = tail;
    for child in children.iter().rev().flatten() {
        let nodes = child.host_nodes();
        let Some(&first) = nodes.first() else {
            continue;
        };
        if !in_place(document, parent, &nodes, anchor) {
            host::insert_instance(document, parent, child, anchor);
        }
        anchor = Some(first);
    }

    children
}

fn take_unkeyed(pool: &mut [Option<Instance>], index: usize, kind: &ElementType) -> Option<Instance> {
    let same_type = |slot: &Option<Instance>| {
        slot.as_ref()
            .is_some_and(|instance| instance.element.kind() == kind)
    };
    if pool.get(index).is_some_and(same_type) {
        return pool[index].take();
    }
    let position = pool.iter().position(same_type)?;
    pool[position].take()
}

/// Claim `base` for a fresh mount unless it is already claimed in this pass
/// or was held by a previous child of another type.
fn claim_path(
    base: String,
    kind: &ElementType,
    occupied: &HashMap<String, ElementType>,
    claimed: &mut HashSet<String>,
) -> String {
    let collides = claimed.contains(&base)
        || occupied.get(&base).is_some_and(|previous| previous != kind);
    if !collides {
        claimed.insert(base.clone());
        return base;
    }
    let tagged = format!("{base}:{}", kind.discriminator());
    let mut candidate = tagged.clone();
    let mut n = 1;
    while claimed.contains(&candidate) {
        candidate = format!("{tagged}#{n}");
        n += 1;
    }
    claimed.insert(candidate.clone());
    candidate
}

fn in_place(document: &Document, parent: NodeId, nodes: &[NodeId], anchor: Option<NodeId>) -> bool {
    let Some(&last) = nodes.last() else {
        return true;
    };
    nodes.iter().all(|&node| document.parent(node) == Some(parent))
        && nodes
            .windows(2)
            .all(|pair| document.next_sibling(pair[0]) == Some(pair[1]))
        && document.next_sibling(last) == anchor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InstanceKind;
    use crate::primitives::{create_element, fragment, text};
    use crate::types::Props;

    fn item(key: &str) -> Element {
        create_element("li", Props::new().with("key", key), key)
    }

    fn setup() -> (Engine, NodeId) {
        let engine = Engine::new(Document::new());
        let container = engine.document().create_element("ul");
        (engine, container)
    }

    #[test]
    fn test_claim_path_disambiguates() {
        let mut claimed = HashSet::new();
        let mut occupied = HashMap::new();
        occupied.insert("p.0".to_string(), ElementType::from("div"));

        let span = ElementType::from("span");
        assert_eq!(claim_path("p.0".into(), &span, &occupied, &mut claimed), "p.0:span");
        assert_eq!(claim_path("p.0".into(), &span, &occupied, &mut claimed), "p.0:span#1");

        let div = ElementType::from("div");
        assert_eq!(claim_path("p.0".into(), &div, &occupied, &mut claimed), "p.0");
        assert_eq!(claim_path("p.0".into(), &div, &occupied, &mut claimed), "p.0:div");
    }

    #[test]
    fn test_take_unkeyed_prefers_same_index() {
        let doc = Document::new();
        let make = |tag: &str| {
            let el = create_element(tag, Props::new(), ());
            Some(Instance::new(&el, Some(doc.create_element(tag)), tag))
        };
        let mut pool = vec![make("div"), make("span"), make("div")];

        let taken = take_unkeyed(&mut pool, 2, &ElementType::from("div")).unwrap();
        assert_eq!(taken.path(), "div");
        assert!(pool[2].is_none());

        let taken = take_unkeyed(&mut pool, 0, &ElementType::from("div")).unwrap();
        assert!(pool.iter().filter(|slot| slot.is_some()).count() == 1);
        assert_eq!(taken.element().kind(), &ElementType::from("div"));
        assert!(take_unkeyed(&mut pool, 0, &ElementType::from("p")).is_none());
    }

    #[test]
    fn test_keyed_reorder_moves_nodes() {
        let (engine, container) = setup();
        let doc = engine.document().clone();
        let first = reconcile_children(
            &engine,
            container,
            Vec::new(),
            &[item("a"), item("b"), item("c")],
            "root",
            None,
        );
        let nodes: Vec<NodeId> = first.iter().flatten().filter_map(Instance::host).collect();

        let second = reconcile_children(
            &engine,
            container,
            first,
            &[item("c"), item("a"), item("b")],
            "root",
            None,
        );
        let reordered: Vec<NodeId> = second.iter().flatten().filter_map(Instance::host).collect();
        assert_eq!(reordered, vec![nodes[2], nodes[0], nodes[1]]);
        assert_eq!(doc.children(container), reordered);
        assert_eq!(doc.text_content(container), "cab");
    }

    #[test]
    fn test_type_change_remounts() {
        let (engine, container) = setup();
        let doc = engine.document().clone();
        let first = reconcile(&engine, container, None, Some(&text("x")), "root");
        assert_eq!(first.as_ref().map(Instance::kind), Some(InstanceKind::Text));

        let el = create_element("b", Props::new(), "x");
        let second = reconcile(&engine, container, first, Some(&el), "root").unwrap();
        assert_eq!(doc.children(container).len(), 1);
        assert_eq!(doc.to_markup(container), "<ul><b>x</b></ul>");
        assert_eq!(second.path(), "root");
    }

    #[test]
    fn test_fragment_update_keeps_position() {
        let (engine, container) = setup();
        let doc = engine.document().clone();
        let tree = |middle: Vec<Element>| {
            vec![item("head"), fragment(middle), item("tail")]
        };

        let first = reconcile_children(
            &engine,
            container,
            Vec::new(),
            &tree(vec![item("x")]),
            "root",
            None,
        );
        let second = reconcile_children(
            &engine,
            container,
            first,
            &tree(vec![item("y"), item("x")]),
            "root",
            None,
        );
        assert_eq!(doc.text_content(container), "headyxtail");

        let before = doc.mutation_count();
        reconcile_children(
            &engine,
            container,
            second,
            &tree(vec![item("y"), item("x")]),
            "root",
            None,
        );
        assert_eq!(doc.mutation_count(), before);
    }

    #[test]
    fn test_removed_children_are_destroyed() {
        let (engine, container) = setup();
        let doc = engine.document().clone();
        let first = reconcile_children(
            &engine,
            container,
            Vec::new(),
            &[item("a"), item("b")],
            "root",
            None,
        );
        let b = first[1].as_ref().and_then(Instance::host).unwrap();
        let second = reconcile_children(&engine, container, first, &[item("a")], "root", None);
        assert_eq!(second.len(), 1);
        assert!(!doc.exists(b));
        assert_eq!(doc.text_content(container), "a");
    }
}
