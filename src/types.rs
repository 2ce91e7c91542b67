//! Core types for spark-dom.
//!
//! Prop values flow from element descriptions through the reconciler into the
//! document. Colors, attributes and cells are what the terminal renderer
//! understands.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::primitives::Element;
use crate::state::SyntheticEvent;

// =============================================================================
// Prop values
// =============================================================================

/// Handler invoked by the delegation layer.
pub type EventHandler = Rc<dyn Fn(&SyntheticEvent<'_>)>;

/// Inline style declarations in insertion order.
pub type StyleMap = IndexMap<String, String>;

/// Build a [`StyleMap`] from `(name, value)` pairs.
pub fn style<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> StyleMap
where
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A single prop value.
///
/// Scalars compare by value; handlers, children and opaque values compare by
/// identity, which is what makes prop equality shallow.
#[derive(Clone)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Style(StyleMap),
    Handler(EventHandler),
    Children(Rc<[Element]>),
    Any(Rc<dyn Any>),
}

impl PropValue {
    /// Wrap a closure as a handler value.
    pub fn handler(f: impl Fn(&SyntheticEvent<'_>) + 'static) -> Self {
        PropValue::Handler(Rc::new(f))
    }

    /// Wrap any value; it is applied to host nodes as a property.
    pub fn any<T: 'static>(value: T) -> Self {
        PropValue::Any(Rc::new(value))
    }

    /// String form used for host attributes.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            PropValue::Str(s) => Some(s.clone()),
            PropValue::Int(i) => Some(i.to_string()),
            PropValue::Float(f) => Some(f.to_string()),
            PropValue::Bool(true) => Some(String::new()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => Rc::ptr_eq(a, b),
            (PropValue::Children(a), PropValue::Children(b)) => Rc::ptr_eq(a, b),
            (PropValue::Any(a), PropValue::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(s) => write!(f, "{s:?}"),
            PropValue::Int(i) => write!(f, "{i}"),
            PropValue::Float(x) => write!(f, "{x}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Style(s) => f.debug_map().entries(s.iter()).finish(),
            PropValue::Handler(_) => f.write_str("<handler>"),
            PropValue::Children(c) => write!(f, "<{} children>", c.len()),
            PropValue::Any(_) => f.write_str("<any>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<&String> for PropValue {
    fn from(value: &String) -> Self {
        PropValue::Str(value.clone())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<StyleMap> for PropValue {
    fn from(value: StyleMap) -> Self {
        PropValue::Style(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

macro_rules! int_prop_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    PropValue::Int(i64::from(value))
                }
            }
        )*
    };
}

int_prop_value!(i32, i64, u8, u16, u32);

/// Counts past `i64::MAX` fall back to a float instead of wrapping.
impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(value) => PropValue::Int(value),
            Err(_) => PropValue::Float(value as f64),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Ordered prop map.
///
/// Equality is shallow: same key set, values equal under [`PropValue`]'s
/// identity-aware comparison. Key order does not matter.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    values: IndexMap<String, PropValue>,
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a prop.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder: attach a handler for `event` (`"click"` becomes `onClick`).
    pub fn on(self, event: &str, handler: impl Fn(&SyntheticEvent<'_>) + 'static) -> Self {
        self.with_handler(event, Rc::new(handler))
    }

    /// Builder: attach an existing handler, keeping its identity.
    pub fn with_handler(self, event: &str, handler: EventHandler) -> Self {
        self.with(handler_prop_name(event), PropValue::Handler(handler))
    }

    /// Builder: store an opaque value.
    pub fn with_any<T: 'static>(self, name: impl Into<String>, value: T) -> Self {
        self.with(name, PropValue::any(value))
    }

    /// Builder: set explicit children.
    pub fn with_children(self, children: Vec<Element>) -> Self {
        self.with("children", PropValue::Children(Rc::from(children)))
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(PropValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(PropValue::Float(x)) => Some(*x),
            Some(PropValue::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(PropValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Downcast an opaque value stored with [`Props::with_any`].
    pub fn get_any<T: 'static>(&self, name: &str) -> Option<&T> {
        match self.get(name) {
            Some(PropValue::Any(value)) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn get_handler(&self, name: &str) -> Option<&EventHandler> {
        match self.get(name) {
            Some(PropValue::Handler(handler)) => Some(handler),
            _ => None,
        }
    }

    /// Normalized children, empty when the prop is absent.
    pub fn children(&self) -> &[Element] {
        match self.get("children") {
            Some(PropValue::Children(children)) => children,
            _ => &[],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.values.shift_remove(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `"click"` → `"onClick"`.
pub fn handler_prop_name(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "on".to_string(),
    }
}

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels.
///
/// Special value: r=-1 means "terminal default" (let terminal pick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::TERMINAL_DEFAULT
    }
}

impl Rgba {
    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as i16,
            g: g as i16,
            b: b as i16,
            a: 255,
        }
    }

    /// Terminal default color (let terminal decide).
    pub const TERMINAL_DEFAULT: Self = Self {
        r: -1,
        g: -1,
        b: -1,
        a: -1,
    };

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    #[inline]
    pub const fn is_terminal_default(&self) -> bool {
        self.r == -1
    }

    /// Parse a CSS-ish color: a basic name or `#rrggbb`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let color = match value.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::RED,
            "green" => Self::GREEN,
            "blue" => Self::BLUE,
            "yellow" => Self::YELLOW,
            "cyan" => Self::CYAN,
            "magenta" => Self::MAGENTA,
            "gray" | "grey" => Self::GRAY,
            "default" | "inherit" => Self::TERMINAL_DEFAULT,
            _ => return None,
        };
        Some(color)
    }
}

// =============================================================================
// Cell Attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Text attributes as a bitfield.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::ITALIC`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const INVERSE = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
    }
}

// =============================================================================
// Cell - The atomic unit of terminal rendering
// =============================================================================

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgba,
    pub bg: Rgba,
    pub attrs: Attr,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Rgba::TERMINAL_DEFAULT,
            bg: Rgba::TERMINAL_DEFAULT,
            attrs: Attr::NONE,
        }
    }
}

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && (x as u32) < self.x as u32 + self.width as u32
            && y >= self.y
            && (y as u32) < self.y as u32 + self.height as u32
    }

    /// Intersection of two rects, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.x.saturating_add(self.width).min(other.x.saturating_add(other.width));
        let y2 = self.y.saturating_add(self.height).min(other.y.saturating_add(other.height));
        if x2 > x1 && y2 > y1 {
            Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_value_equality_is_shallow() {
        let handler: EventHandler = Rc::new(|_: &SyntheticEvent<'_>| {});
        assert_eq!(
            PropValue::Handler(handler.clone()),
            PropValue::Handler(handler)
        );
        assert_ne!(PropValue::handler(|_| {}), PropValue::handler(|_| {}));
        assert_eq!(PropValue::from("a"), PropValue::from("a".to_string()));
        assert_ne!(PropValue::from(1), PropValue::from("1"));
    }

    #[test]
    fn test_props_equality_ignores_order() {
        let a = Props::new().with("id", "x").with("n", 1);
        let b = Props::new().with("n", 1).with("id", "x");
        assert_eq!(a, b);
        assert_ne!(a, b.with("extra", true));
    }

    #[test]
    fn test_handler_prop_name() {
        assert_eq!(handler_prop_name("click"), "onClick");
        assert_eq!(handler_prop_name("mousedown"), "onMousedown");
        let props = Props::new().on("click", |_| {});
        assert!(props.get_handler("onClick").is_some());
    }

    #[test]
    fn test_props_accessors() {
        let props = Props::new()
            .with("label", "Buy")
            .with("count", 3)
            .with("ratio", 0.5)
            .with("open", true)
            .with_any("sku", vec![1u32, 2]);
        assert_eq!(props.get_str("label"), Some("Buy"));
        assert_eq!(props.get_int("count"), Some(3));
        assert_eq!(props.get_float("count"), Some(3.0));
        assert_eq!(props.get_float("ratio"), Some(0.5));
        assert_eq!(props.get_bool("open"), Some(true));
        assert_eq!(props.get_any::<Vec<u32>>("sku"), Some(&vec![1, 2]));
        assert!(props.get_any::<String>("sku").is_none());
        assert!(props.children().is_empty());
    }

    #[test]
    fn test_to_attribute() {
        assert_eq!(PropValue::from(7).to_attribute().as_deref(), Some("7"));
        assert_eq!(PropValue::from(true).to_attribute().as_deref(), Some(""));
        assert_eq!(PropValue::from(false).to_attribute(), None);
    }

    #[test]
    fn test_usize_props_do_not_wrap() {
        assert_eq!(PropValue::from(42usize), PropValue::Int(42));
        if usize::BITS == 64 {
            match PropValue::from(usize::MAX) {
                PropValue::Float(value) => assert!(value > 0.0),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_rgba_parse() {
        assert_eq!(Rgba::parse("red"), Some(Rgba::RED));
        assert_eq!(Rgba::parse("#00ff80"), Some(Rgba::rgb(0, 255, 128)));
        assert_eq!(Rgba::parse("#0f8"), None);
        assert_eq!(Rgba::parse("chartreuse"), None);
        assert!(Rgba::parse("default").unwrap().is_terminal_default());
    }

    #[test]
    fn test_rect_contains_and_intersect() {
        let a = Rect::new(0, 0, 10, 5);
        assert!(a.contains(9, 4));
        assert!(!a.contains(10, 4));
        let b = Rect::new(5, 2, 10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 2, 5, 3)));
        assert_eq!(a.intersect(&Rect::new(20, 20, 1, 1)), None);
    }
}
