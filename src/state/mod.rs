//! State - runtime systems behind the element tree.
//!
//! - **Hooks** - per-instance state, effects, refs and memoization
//! - **Scheduler** - task queue and render coalescing
//! - **Events** - delegated event handlers and synthetic events
//! - **Mouse** - hit testing for the terminal surface
//! - **Input** - terminal input conversion and routing

pub(crate) mod events;
pub mod hooks;
pub mod input;
pub mod mouse;
pub(crate) mod scheduler;

pub use events::SyntheticEvent;
pub use hooks::{
    cleanup, use_auto_callback, use_callback, use_effect, use_effect_always, use_memo,
    use_memo_with, use_ref, use_state, use_state_with, Cleanup, Dependency, Deps, IntoCleanup,
    MutRef, SetState,
};
