//! Host platform - an in-memory retained document.
//!
//! The reconciler never touches this module directly; all writes go through
//! `engine::host`. Terminal presentation reads it back for layout and paint.

mod document;
mod event;

pub use document::{Document, DocumentId, ListenerId, NativeListener, NodeId};
pub use event::{bubbles_by_default, EventDetail, EventPhase, Modifiers, MouseButton, NativeEvent};
