// ============================================================================
// deep-observe - Constants
// The fixed lists that make up the engine's whole configuration surface
// ============================================================================

// =============================================================================
// FIELD FILTER
// =============================================================================

/// Host-lifecycle internals that are never observed.
///
/// A field with one of these names is never wrapped, never recursed into and
/// never reported to the change notifier.
pub const DEFAULT_RESERVED_KEYS: &[&str] = &[
    "state",
    "refs",
    "props",
    "context",
    "updater",
    "_reactInternalFiber",
    "_reactInternalInstance",
];

// =============================================================================
// ARRAY MUTATORS
// =============================================================================

/// In-place array methods rebound to the observed wrapper, in adaptation order.
pub const ARRAY_MUTATORS: [&str; 9] = [
    "push",
    "pop",
    "unshift",
    "shift",
    "slice",
    "reverse",
    "fill",
    "copyWithin",
    "sort",
];

/// Name under which arrays expose their length for reads.
pub const LENGTH_KEY: &str = "length";

/// Largest key treated as an array index (2^32 - 2). Larger numeric keys
/// are plain names.
pub const MAX_ARRAY_INDEX: usize = (u32::MAX - 1) as usize;

// =============================================================================
// RE-ENTRANCY
// =============================================================================

/// Maximum nesting of notifications triggered from inside a notifier.
///
/// A notifier that writes back into an observed node runs that write (and its
/// notification) synchronously. Past this depth the notification is refused.
pub const MAX_NOTIFY_DEPTH: usize = 64;

// =============================================================================
// TESTS
// =============================================================================
