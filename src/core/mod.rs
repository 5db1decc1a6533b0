// ============================================================================
// deep-observe - Core Module
// The dynamic value model every observed graph is made of
// ============================================================================

pub mod array;
pub mod constants;
pub mod function;
pub mod object;
pub mod value;

// Re-export commonly used items
pub use array::{default_compare, Array};
pub use constants::*;
pub use function::{Function, MethodFn};
pub use object::Object;
pub use value::{Key, Value};
