//! Engine - instances, the host adapter and the reconciler.
//!
//! An [`Engine`] owns one render root: its hook state, effect queue, event
//! handlers and task queue. The reconciler turns element trees into
//! [`Instance`] trees and keeps the document in sync through the host adapter.

mod context;
mod host;
mod instance;
pub(crate) mod reconciler;

pub use context::{Engine, EngineState};
pub(crate) use context::{current_engine, WeakEngine};
pub use host::{event_name_from_prop, parse_style};
pub use instance::{Instance, InstanceKind};
