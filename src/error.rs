// ============================================================================
// deep-observe - Errors
// ============================================================================

use thiserror::Error;

/// Boxed error a change notifier may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while observing a graph.
///
/// Only `Notifier` and `ReentrancyLimit` ever reach the caller of an observed
/// write. `ReadOnly` is raised by raw objects and swallowed by the wrapping
/// layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Write to a field declared read-only by its owner.
    #[error("field `{key}` is read-only")]
    ReadOnly { key: String },

    /// The value handed to the binder is not an object.
    #[error("cannot observe a value of kind `{kind}`")]
    NotObservable { kind: &'static str },

    /// An array mutator was called on an observed object.
    #[error("`{method}` needs an array, found `{kind}`")]
    NotAnArray {
        method: &'static str,
        kind: &'static str,
    },

    /// The registered notifier failed; the write that triggered it is committed.
    #[error("change notifier failed: {0}")]
    Notifier(#[source] BoxError),

    /// A notifier kept writing into the graph it observes.
    #[error("notifications nested {depth} levels deep")]
    ReentrancyLimit { depth: usize },
}

impl Error {
    /// Returns true for the error raw objects raise on read-only fields.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Error::ReadOnly { .. })
    }
}
