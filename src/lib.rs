// ============================================================================
// deep-observe - Transparent Deep Observation for Rust
// ============================================================================
//
// Wraps an arbitrary object graph so that every later mutation anywhere in it
// (field writes, index writes, in-place array mutators) reports to a single
// change notifier, until the graph is detached.
// ============================================================================

pub mod core;
pub mod error;
pub mod lifecycle;
pub mod observe;

#[macro_use]
mod macros;

// Re-export the value model at crate root
pub use self::core::constants;
pub use self::core::{default_compare, Array, Function, Key, MethodFn, Object, Value};

pub use error::{BoxError, Error, Result};

// Re-export observation
pub use observe::{
    read_fields, wrap, wrap_with, Change, ChangeNotifier, FieldFilter, MutatorSet, Node, Scope,
    Target,
};

// Re-export lifecycle entry points
pub use lifecycle::{attach, detach, Binder, ObservedRoot};

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn mount_push_detach_push() {
        let log: Rc<RefCell<Vec<Change>>> = Rc::new(RefCell::new(Vec::new()));
        let notifier = ChangeNotifier::from_fn(cloned!(log => move |c| log.borrow_mut().push(c.clone())));

        let root = object! { "list" => array![object! { "name" => "bob" }] };
        let observed = attach(root, notifier).unwrap();

        let list = observed.get("list");
        let list = list.as_node().unwrap();
        list.push(object! { "name" => "ann" }).unwrap();

        assert_eq!(list.get("length"), Value::from(2));
        assert_eq!(list.get(1).get("name"), Value::from("ann"));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].key, Some(Key::Index(1)));

        detach(&observed);
        list.push(object! { "name" => "carl" }).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn raw_array_mutators_reach_the_notifier() {
        let count = Rc::new(RefCell::new(0));
        let notifier = ChangeNotifier::from_fn(cloned!(count => move |_| *count.borrow_mut() += 1));

        let host = object! { "list" => array![1, 2] };
        let _observed = attach(host.clone(), notifier).unwrap();

        // The host now holds the adapted copy; its raw mutators route to the node
        let list = host.get("list");
        let Value::Node(node) = &list else {
            panic!("list was not wrapped");
        };
        let Target::Array(raw) = node.target() else {
            panic!("list node does not wrap an array");
        };
        raw.push(3).unwrap();

        assert_eq!(*count.borrow(), 1);
        assert_eq!(node.len(), 3);
    }
}
