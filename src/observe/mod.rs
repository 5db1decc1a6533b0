// ============================================================================
// deep-observe - Observation
// Field filtering, interception, array adaptation and deep wrapping
// ============================================================================
//
// Data flow for a raw value handed to `wrap`:
//
// 1. Each field is checked by the FieldFilter
// 2. Nested objects and arrays are wrapped first (depth-first)
// 3. Arrays get their mutators rebound to their node (adapter)
// 4. Every level ends up behind a Node
//
// Every later write on any Node runs through `Node::set`, which reports to
// the ChangeNotifier held by the graph's Scope.
// ============================================================================

pub mod adapter;
pub mod filter;
pub mod node;
pub mod notifier;
pub mod wrap;

pub use adapter::MutatorSet;
pub use filter::{read_fields, FieldFilter};
pub use node::{Node, Target};
pub use notifier::{Change, ChangeNotifier, Scope};
pub use wrap::{wrap, wrap_with};
