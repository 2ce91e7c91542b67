//! Element model - canonical, immutable descriptions of UI.
//!
//! Anything a component returns is first turned into a [`Node`] and then
//! normalized into a flat list of [`Element`]s: strings and numbers become
//! text elements, booleans and `None` disappear, nested lists are flattened.
//!
//! # API
//!
//! - `create_element(kind, props, children)` - Build an element, extracting `key`
//! - `text(value)` / `fragment(children)` - Shorthands
//! - `normalize(node)` - Canonicalize raw input
//! - `child_path(parent, key, index)` - Stable identity path for a child
//! - `nodes![..]` - Mixed child list
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{create_element, nodes, Props};
//!
//! let list = create_element(
//!     "ul",
//!     Props::new().with("class", "items"),
//!     nodes![
//!         create_element("li", Props::new().with("key", "a"), "Apple"),
//!         show_banana.then(|| create_element("li", Props::new().with("key", "b"), "Banana")),
//!     ],
//! );
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::types::{PropValue, Props};

/// Prop holding a text element's content.
pub const NODE_VALUE: &str = "nodeValue";

// =============================================================================
// Component
// =============================================================================

/// A component: a render function plus a stable identity.
///
/// Two components are the same type when they wrap the same function type, so
/// every distinct `fn` item or closure is its own component type. Functions
/// passed as `fn` pointers share one type and are told apart by address.
#[derive(Clone)]
pub struct Component {
    id: TypeId,
    address: Option<usize>,
    name: Rc<str>,
    render: Rc<dyn Fn(&Props) -> Option<Element>>,
}

impl Component {
    pub fn new<F, R>(render: F) -> Self
    where
        F: Fn(&Props) -> R + 'static,
        R: Into<Option<Element>> + 'static,
    {
        Self {
            id: TypeId::of::<F>(),
            address: fn_address(&render),
            name: Rc::from(short_type_name::<F>()),
            render: Rc::new(move |props| render(props).into()),
        }
    }

    /// Take the pointer identity of another render function.
    pub(crate) fn with_address(mut self, address: Option<usize>) -> Self {
        self.address = address;
        self
    }

    /// Override the display name (used in paths and logs).
    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Rc::from(name.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self, props: &Props) -> Option<Element> {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.address == other.address
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// Address of `render` when it is a plain `fn` pointer.
pub(crate) fn fn_address<F, R>(render: &F) -> Option<usize>
where
    F: Fn(&Props) -> R + 'static,
    R: 'static,
{
    (render as &dyn Any)
        .downcast_ref::<fn(&Props) -> R>()
        .map(|pointer| *pointer as usize)
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let trimmed = full.trim_end_matches("::{{closure}}");
    trimmed.rsplit("::").next().unwrap_or(full)
}

// =============================================================================
// ElementType
// =============================================================================

/// What an element describes.
#[derive(Clone, PartialEq, Debug)]
pub enum ElementType {
    Text,
    Fragment,
    Host(String),
    Component(Component),
}

impl ElementType {
    /// Short label used to disambiguate colliding paths.
    pub fn discriminator(&self) -> &str {
        match self {
            ElementType::Text => "#text",
            ElementType::Fragment => "#fragment",
            ElementType::Host(tag) => tag,
            ElementType::Component(component) => component.name(),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(tag.to_string())
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        ElementType::Host(tag)
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        ElementType::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        ElementType::Component(component.clone())
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable description of one tree position.
#[derive(Clone)]
pub struct Element {
    kind: ElementType,
    key: Option<String>,
    props: Rc<Props>,
}

impl Element {
    pub fn kind(&self) -> &ElementType {
        &self.kind
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    /// Content of a text element.
    pub fn text_value(&self) -> Option<&str> {
        match self.kind {
            ElementType::Text => self.props.get_str(NODE_VALUE),
            _ => None,
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.text_value() {
            return write!(f, "{value:?}");
        }
        let mut out = f.debug_struct("Element");
        out.field("kind", &self.kind);
        if let Some(key) = &self.key {
            out.field("key", key);
        }
        out.field("props", &self.props).finish()
    }
}

// =============================================================================
// Node - raw child input
// =============================================================================

/// Raw child input accepted by [`create_element`].
#[derive(Clone, Debug)]
pub enum Node {
    Empty,
    Text(String),
    Element(Element),
    List(Vec<Node>),
}

impl From<()> for Node {
    fn from(_: ()) -> Self {
        Node::Empty
    }
}

impl From<bool> for Node {
    fn from(_: bool) -> Self {
        Node::Empty
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

impl From<&String> for Node {
    fn from(value: &String) -> Self {
        Node::Text(value.clone())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&Element> for Node {
    fn from(element: &Element) -> Self {
        Node::Element(element.clone())
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Empty, Into::into)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(values: Vec<T>) -> Self {
        Node::List(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! number_node {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::Text(value.to_string())
                }
            }
        )*
    };
}

number_node!(i32, i64, u32, u64, usize, f32, f64);

/// Build a `Vec<Node>` from mixed child values.
#[macro_export]
macro_rules! nodes {
    () => { ::std::vec::Vec::<$crate::Node>::new() };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Node::from($child)),+]
    };
}

// =============================================================================
// Construction
// =============================================================================

/// Canonicalize raw input into a flat list of elements.
pub fn normalize(node: Node) -> Vec<Element> {
    let mut out = Vec::new();
    normalize_into(node, &mut out);
    out
}

fn normalize_into(node: Node, out: &mut Vec<Element>) {
    match node {
        Node::Empty => {}
        Node::Text(value) => out.push(text(value)),
        Node::Element(element) => out.push(element),
        Node::List(items) => {
            for item in items {
                normalize_into(item, out);
            }
        }
    }
}

/// Create an element. A `key` prop becomes the element key; children are
/// normalized into `props.children` and omitted when there are none.
pub fn create_element(
    kind: impl Into<ElementType>,
    mut props: Props,
    children: impl Into<Node>,
) -> Element {
    let key = props.remove("key").and_then(|value| match value {
        PropValue::Str(s) => Some(s),
        PropValue::Int(i) => Some(i.to_string()),
        other => other.to_attribute(),
    });
    let children = normalize(children.into());
    if !children.is_empty() {
        props.insert("children", PropValue::Children(Rc::from(children)));
    }
    Element {
        kind: kind.into(),
        key,
        props: Rc::new(props),
    }
}

/// A text element.
pub fn text(value: impl Into<String>) -> Element {
    Element {
        kind: ElementType::Text,
        key: None,
        props: Rc::new(Props::new().with(NODE_VALUE, value.into())),
    }
}

/// A fragment grouping `children` without a host node of its own.
pub fn fragment(children: impl Into<Node>) -> Element {
    create_element(ElementType::Fragment, Props::new(), children)
}

/// Identity path of a child: its key, else its index, under the parent path.
pub fn child_path(parent: &str, key: Option<&str>, index: usize) -> String {
    let id = match key {
        Some(key) => key.to_string(),
        None => index.to_string(),
    };
    if parent.is_empty() {
        id
    } else {
        format!("{parent}.{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(elements: &[Element]) -> Vec<&str> {
        elements.iter().filter_map(Element::text_value).collect()
    }

    #[test]
    fn test_normalize_drops_empty_and_flattens() {
        let node: Node = nodes![
            "a",
            true,
            Option::<&str>::None,
            vec![Node::from(1), Node::List(vec![Node::from("b"), Node::Empty])],
            2.5,
        ]
        .into();
        let out = normalize(node);
        assert_eq!(texts(&out), vec!["a", "1", "b", "2.5"]);
    }

    #[test]
    fn test_create_element_extracts_key() {
        let el = create_element("li", Props::new().with("key", "a").with("id", "x"), ());
        assert_eq!(el.key(), Some("a"));
        assert!(!el.props().contains("key"));
        assert_eq!(el.props().get_str("id"), Some("x"));

        let numbered = create_element("li", Props::new().with("key", 7), ());
        assert_eq!(numbered.key(), Some("7"));
    }

    #[test]
    fn test_create_element_omits_empty_children() {
        let el = create_element("div", Props::new(), nodes![false, ()]);
        assert!(!el.props().contains("children"));

        let el = create_element("div", Props::new(), "hi");
        assert_eq!(texts(el.children()), vec!["hi"]);
    }

    #[test]
    fn test_explicit_children_prop_kept_without_raw_children() {
        let el = create_element(
            "div",
            Props::new().with_children(vec![text("kept")]),
            (),
        );
        assert_eq!(texts(el.children()), vec!["kept"]);
    }

    #[test]
    fn test_fragment_and_text() {
        let frag = fragment(nodes!["a", text("b")]);
        assert_eq!(frag.kind(), &ElementType::Fragment);
        assert_eq!(frag.children().len(), 2);
        assert_eq!(text("x").kind().discriminator(), "#text");
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("root", None, 2), "root.2");
        assert_eq!(child_path("root", Some("cart"), 2), "root.cart");
        assert_eq!(child_path("", None, 0), "0");
    }

    fn product_card(_: &Props) -> Option<Element> {
        None
    }

    fn cart_badge(_: &Props) -> Option<Element> {
        None
    }

    #[test]
    fn test_component_identity() {
        let a = Component::new(product_card);
        let b = Component::new(product_card);
        let c = Component::new(cart_badge);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), "product_card");
        assert_eq!(c.clone().named("Badge").name(), "Badge");
        assert_eq!(ElementType::from(&a), ElementType::from(b));
        assert_ne!(ElementType::from(&a), ElementType::from("div"));
    }

    #[test]
    fn test_fn_pointer_components_are_distinct() {
        let card: fn(&Props) -> Option<Element> = product_card;
        let badge: fn(&Props) -> Option<Element> = cart_badge;
        assert_eq!(Component::new(card), Component::new(card));
        assert_ne!(Component::new(card), Component::new(badge));
        assert_ne!(Component::new(card), Component::new(product_card));
    }
}
