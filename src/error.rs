//! Error type shared by the render entry points and the terminal loop.

use crate::dom::NodeId;

/// Errors surfaced by spark-dom.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The render container is missing, destroyed, or not an element node.
    #[error("render container {0:?} is not a live element node of the document")]
    InvalidContainer(NodeId),

    /// `setup` was called without a root element.
    #[error("no root element was given to render")]
    MissingRootElement,

    /// A single flush ran more tasks than the engine allows.
    #[error("task queue did not settle after {limit} tasks; an effect is probably re-triggering its own render")]
    FlushLimitExceeded { limit: usize },

    /// Terminal I/O failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
