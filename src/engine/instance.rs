//! Instances - the live counterpart of elements.
//!
//! One instance exists per tree position per render generation. It remembers
//! the element it was last reconciled against, the host node it owns (text and
//! host instances only) and its identity path.

use crate::dom::NodeId;
use crate::primitives::{Element, ElementType};

/// Kind of a live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Text,
    Host,
    Component,
    Fragment,
}

impl From<&ElementType> for InstanceKind {
    fn from(kind: &ElementType) -> Self {
        match kind {
            ElementType::Text => InstanceKind::Text,
            ElementType::Fragment => InstanceKind::Fragment,
            ElementType::Host(_) => InstanceKind::Host,
            ElementType::Component(_) => InstanceKind::Component,
        }
    }
}

/// A mounted tree position.
#[derive(Debug)]
pub struct Instance {
    pub(crate) kind: InstanceKind,
    pub(crate) host: Option<NodeId>,
    pub(crate) element: Element,
    pub(crate) children: Vec<Option<Instance>>,
    pub(crate) path: String,
}

impl Instance {
    pub(crate) fn new(element: &Element, host: Option<NodeId>, path: &str) -> Self {
        Self {
            kind: InstanceKind::from(element.kind()),
            host,
            element: element.clone(),
            children: Vec::new(),
            path: path.to_string(),
        }
    }

    pub fn kind(&self) -> InstanceKind {
        self.kind
    }

    /// Host node owned by this instance (text and host instances).
    pub fn host(&self) -> Option<NodeId> {
        self.host
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn key(&self) -> Option<&str> {
        self.element.key()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> impl Iterator<Item = &Instance> {
        self.children.iter().flatten()
    }

    /// Top-level host nodes of this subtree, in document order.
    ///
    /// A host or text instance is its own node; components and fragments
    /// contribute the nodes of their children.
    pub fn host_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_host_nodes(&mut out);
        out
    }

    fn collect_host_nodes(&self, out: &mut Vec<NodeId>) {
        match self.host {
            Some(node) => out.push(node),
            None => {
                for child in self.children() {
                    child.collect_host_nodes(out);
                }
            }
        }
    }

    /// First physical node under this instance.
    pub fn first_host_node(&self) -> Option<NodeId> {
        match self.host {
            Some(node) => Some(node),
            None => self.children().find_map(Instance::first_host_node),
        }
    }

    /// Last physical node under this instance.
    pub fn last_host_node(&self) -> Option<NodeId> {
        match self.host {
            Some(node) => Some(node),
            None => self
                .children
                .iter()
                .rev()
                .flatten()
                .find_map(Instance::last_host_node),
        }
    }

    /// Paths of every component instance in this subtree, parents first.
    pub(crate) fn component_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(instance) = stack.pop() {
            if instance.kind == InstanceKind::Component {
                out.push(instance.path.clone());
            }
            stack.extend(instance.children.iter().rev().flatten());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::primitives::{fragment, text, Component};
    use crate::types::Props;

    fn leaf(doc: &Document, value: &str, path: &str) -> Instance {
        Instance::new(&text(value), Some(doc.create_text(value)), path)
    }

    #[test]
    fn test_host_nodes_flatten_fragments() {
        let doc = Document::new();
        let a = leaf(&doc, "a", "root.0");
        let b = leaf(&doc, "b", "root.1");
        let (na, nb) = (a.host.unwrap(), b.host.unwrap());

        let mut frag = Instance::new(&fragment(()), None, "root");
        frag.children = vec![Some(a), None, Some(b)];

        assert_eq!(frag.host_nodes(), vec![na, nb]);
        assert_eq!(frag.first_host_node(), Some(na));
        assert_eq!(frag.last_host_node(), Some(nb));
    }

    #[test]
    fn test_empty_fragment_has_no_nodes() {
        let frag = Instance::new(&fragment(()), None, "root");
        assert!(frag.host_nodes().is_empty());
        assert_eq!(frag.first_host_node(), None);
    }

    #[test]
    fn test_component_paths_preorder() {
        fn shell(_: &Props) -> Option<crate::primitives::Element> {
            None
        }
        let component = Component::new(shell);
        let el = crate::primitives::create_element(&component, Props::new(), ());

        let mut outer = Instance::new(&el, None, "root");
        let mut inner = Instance::new(&el, None, "root.0");
        inner.children = vec![Some(Instance::new(&el, None, "root.0.0"))];
        outer.children = vec![Some(inner)];

        assert_eq!(outer.kind(), InstanceKind::Component);
        assert_eq!(outer.component_paths(), vec!["root", "root.0", "root.0.0"]);
    }
}
