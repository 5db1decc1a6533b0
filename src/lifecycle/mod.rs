// ============================================================================
// deep-observe - Lifecycle
// Boundary to the host framework: attach on mount, detach on unmount
// ============================================================================

mod binder;

pub use binder::{attach, detach, Binder, ObservedRoot};
