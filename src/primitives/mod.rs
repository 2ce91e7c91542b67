//! Primitives - the element model and higher-order components.
//!
//! - [`element`] - `Element`, `Node`, `create_element`, `text`, `fragment`
//! - [`memo`] - components that reuse their output for equal props

pub mod element;
mod memo;

pub use element::{
    child_path, create_element, fragment, normalize, text, Component, Element, ElementType, Node,
    NODE_VALUE,
};
pub use memo::{memo, memo_with};
