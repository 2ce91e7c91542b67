//! Render Pipeline
//!
//! Connects element trees to the document and, optionally, to a terminal.
//!
//! ```text
//! Root::render → setup → render (reconcile) → effects flush
//!                                      ↓
//!            TerminalHandle: input → route → flush → layout → paint → diff
//! ```
//!
//! - [`root`] - attaching a root to a container, rendering and unmounting
//! - [`mount`] - the terminal front end over a root

pub mod mount;
pub(crate) mod render;
pub mod root;

pub use mount::{mount, StopHandle, TerminalHandle};
pub use render::ROOT_PATH;
pub use root::{attach, attach_with_config, setup, Root};
