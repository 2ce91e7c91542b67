//! # spark-dom
//!
//! Declarative UI engine over a retained document tree.
//!
//! Components are plain functions from [`Props`] to an [`Element`]. Rendering
//! reconciles the new element tree against the previous one and applies the
//! minimal set of document mutations. Hooks ([`use_state`], [`use_effect`],
//! [`use_memo`], ...) keep per-instance state keyed by the instance's path in
//! the tree. State updates schedule a re-render on a microtask queue, so
//! several updates in one handler produce one render.
//!
//! Event handlers given as `on*` props are not attached per node. Each root
//! container holds one capture and one bubble listener per event name and
//! dispatches [`SyntheticEvent`]s along the handler path.
//!
//! ## Architecture
//!
//! ```text
//! Element tree → reconciler → Document mutations → (terminal) layout → paint → diff
//!      ↑                                   │
//!   hooks ← SetState ← scheduler ← events ←┘
//! ```
//!
//! ## Modules
//!
//! - [`dom`] - the retained document: nodes, attributes, native events
//! - [`primitives`] - elements, components, `memo`
//! - [`engine`] - engine state, instances and the reconciler
//! - [`state`] - hooks, scheduler, event delegation, terminal input
//! - [`pipeline`] - roots and the terminal mount loop
//! - [`layout`] / [`renderer`] - terminal layout, painting and diff output
//!
//! ## Example
//!
//! ```ignore
//! use spark_dom::*;
//!
//! fn counter(_: &Props) -> Option<Element> {
//!     let (count, set_count) = use_state(0);
//!     Some(create_element(
//!         "button",
//!         Props::new().on("click", move |_| set_count.update(|n| n + 1)),
//!         format!("Clicked {count} times"),
//!     ))
//! }
//!
//! let document = Document::new();
//! let container = document.create_element("main");
//! let root = attach(&document, container)?;
//! root.render(create_element(Component::new(counter), Props::new(), ()))?;
//! ```

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod state;
pub mod types;

pub use config::{EngineConfig, MountConfig};
pub use dom::{Document, EventDetail, Modifiers, MouseButton, NativeEvent, NodeId};
pub use engine::Engine;
pub use error::{Error, Result};
pub use pipeline::{attach, attach_with_config, mount, setup, Root, StopHandle, TerminalHandle};
pub use primitives::{
    create_element, fragment, memo, memo_with, text, Component, Element, ElementType, Node,
};
pub use state::{
    cleanup, use_auto_callback, use_callback, use_effect, use_effect_always, use_memo,
    use_memo_with, use_ref, use_state, use_state_with, Cleanup, Deps, MutRef, SetState,
    SyntheticEvent,
};
pub use types::{style, EventHandler, PropValue, Props, StyleMap};
