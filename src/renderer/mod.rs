//! Terminal renderer.
//!
//! - [`buffer`] - `FrameBuffer` and drawing primitives
//! - [`paint`] - document subtree to frame and hit regions
//! - [`diff`] - differential output through crossterm

pub mod buffer;
pub mod diff;
pub mod paint;

pub use buffer::FrameBuffer;
pub use diff::DiffRenderer;
pub use paint::{paint, Frame};
