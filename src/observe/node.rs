// ============================================================================
// deep-observe - Observed Node
//
// The interception layer over exactly one object or array.
// ============================================================================
//
// Reads pass straight through. Writes wrap the assigned value, commit the
// wrapped form, then report (key, old, new) to the scope's notifier, where
// `new` is the value as assigned:
//
//   set(key, value)
//     nullish value            -> committed silently
//     filtered key or function -> committed silently, never wrapped
//     read-only target field   -> skipped silently
//     otherwise                -> wrap, commit, notify
// ============================================================================

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::notifier::{Change, Scope};
use super::wrap::wrap_in;
use crate::core::array::Array;
use crate::core::object::Object;
use crate::core::value::{Key, Value};
use crate::error::Result;

// =============================================================================
// CONTAINER
// =============================================================================

/// Raw key-level access, implemented per container kind.
pub(crate) trait Container {
    fn read(&self, key: &Key) -> Value;
    fn write(&self, key: &Key, value: Value) -> Result<()>;
    fn keys(&self) -> Vec<Key>;
    fn len(&self) -> usize;
}

impl Container for Object {
    fn read(&self, key: &Key) -> Value {
        self.get(&key.to_name())
    }

    fn write(&self, key: &Key, value: Value) -> Result<()> {
        self.set(key.to_name(), value)
    }

    fn keys(&self) -> Vec<Key> {
        Object::keys(self).into_iter().map(Key::Name).collect()
    }

    fn len(&self) -> usize {
        Object::len(self)
    }
}

impl Container for Array {
    fn read(&self, key: &Key) -> Value {
        Array::read(self, key)
    }

    fn write(&self, key: &Key, value: Value) -> Result<()> {
        if let Some(index) = key.as_index() {
            self.set(index, value);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<Key> {
        (0..Array::len(self)).map(Key::Index).collect()
    }

    fn len(&self) -> usize {
        Array::len(self)
    }
}

/// The container a node wraps.
#[derive(Clone, Debug)]
pub enum Target {
    Object(Object),
    Array(Array),
}

impl Target {
    fn container(&self) -> &dyn Container {
        match self {
            Target::Object(object) => object,
            Target::Array(array) => array,
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

pub(crate) struct NodeInner {
    target: Target,
    scope: Rc<Scope>,
    /// Raw array this node was copied from; keeps its identity-table key alive
    _source: Option<Array>,
}

/// An observed object or array.
///
/// Cloning a `Node` clones the handle; every clone intercepts the same
/// container and reports to the same notifier.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

/// Non-owning handle to a node.
#[derive(Clone)]
pub(crate) struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    pub(crate) fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Node {
    pub(crate) fn new(target: Target, scope: Rc<Scope>, source: Option<Array>) -> Self {
        Self(Rc::new(NodeInner {
            target,
            scope,
            _source: source,
        }))
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// Returns true if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The container this node intercepts.
    pub fn target(&self) -> &Target {
        &self.0.target
    }

    /// The scope shared by every node of this graph.
    pub fn scope(&self) -> &Rc<Scope> {
        &self.0.scope
    }

    pub fn is_array(&self) -> bool {
        matches!(self.0.target, Target::Array(_))
    }

    /// Number of fields, or elements for an array.
    pub fn len(&self) -> usize {
        self.0.target.container().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field names in insertion order, or indices for an array.
    pub fn keys(&self) -> Vec<Key> {
        self.0.target.container().keys()
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        match &self.0.target {
            Target::Object(object) => object.contains_key(&key.to_name()),
            Target::Array(array) => key.as_index().is_some_and(|i| i < array.len()),
        }
    }

    // =========================================================================
    // GET / SET
    // =========================================================================

    /// Reads `key` exactly as stored. Never wraps.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        self.0.target.container().read(&key.into())
    }

    /// Writes `key`, wrapping the value and reporting the change.
    ///
    /// The write itself never fails. An error means the notifier failed (or
    /// re-entered too deeply) after the value was committed.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let Some(key) = self.normalize(key.into()) else {
            return Ok(());
        };
        let value = value.into();

        if value.is_nullish() {
            self.commit(&key, value);
            return Ok(());
        }

        let old = self.get(key.clone());
        if !self.0.scope.filter().accepts(&key, &value) || old.is_function() {
            self.commit(&key, value);
            return Ok(());
        }

        let wrapped = wrap_in(&value, &self.0.scope);
        if !self.commit(&key, wrapped) {
            return Ok(());
        }

        self.0.scope.notify(Change::new(Some(key), old, value))
    }

    /// Stores `value` at `key`, returning false if the field is read-only.
    fn commit(&self, key: &Key, value: Value) -> bool {
        match self.0.target.container().write(key, value) {
            Ok(()) => true,
            Err(err) if err.is_read_only() => {
                debug!(%key, "read-only field, write skipped");
                false
            }
            Err(err) => {
                debug!(%key, %err, "write failed");
                false
            }
        }
    }

    /// Indices become names on objects; arrays only take indices.
    fn normalize(&self, key: Key) -> Option<Key> {
        match &self.0.target {
            Target::Object(_) => Some(Key::Name(key.to_name())),
            Target::Array(_) => match key.as_index() {
                Some(index) => Some(Key::Index(index)),
                None => {
                    debug!(%key, "named write on an array ignored");
                    None
                }
            },
        }
    }

    /// Reports a structural change (no key) through this node's scope.
    pub(crate) fn notify_structural(&self, old: Value, new: Value) -> Result<()> {
        self.0.scope.notify(Change::new(None, old, new))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.target {
            Target::Object(object) => write!(f, "Node({:?})", object),
            Target::Array(array) => write!(f, "Node({:?})", array),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::function::Function;
    use crate::observe::filter::FieldFilter;
    use crate::observe::notifier::ChangeNotifier;
    use crate::observe::wrap::{wrap, wrap_with};
    use crate::{array, object};
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<Change>>>;

    fn observed(value: impl Into<Value>) -> (Node, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let wrapped = wrap(
            value,
            ChangeNotifier::from_fn(move |c| sink.borrow_mut().push(c.clone())),
        );
        (wrapped.as_node().cloned().unwrap(), log)
    }

    #[test]
    fn get_passes_through() {
        let (node, log) = observed(object! { "a" => 1, "b" => "x" });
        assert_eq!(node.get("a"), Value::from(1));
        assert_eq!(node.get("missing"), Value::Undefined);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn set_notifies_with_old_and_assigned_value() {
        let (node, log) = observed(object! { "count" => 1 });

        node.set("count", 2).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![Change::new(Some(Key::from("count")), Value::from(1), Value::from(2))]
        );
    }

    #[test]
    fn set_wraps_nested_values_but_reports_raw() {
        let (node, log) = observed(object! {});
        let user = object! { "name" => "bob" };

        node.set("user", user.clone()).unwrap();

        let stored = node.get("user");
        assert!(stored.as_node().is_some());
        let reported = log.borrow()[0].new.clone();
        assert!(reported.as_object().is_some_and(|o| o.ptr_eq(&user)));

        // Writes into the nested value are observed too
        stored.as_node().unwrap().set("name", "ann").unwrap();
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[1].key, Some(Key::from("name")));
    }

    #[test]
    fn nullish_writes_are_silent() {
        let (node, log) = observed(object! { "a" => 1 });

        node.set("a", Value::Null).unwrap();
        node.set("b", Value::Undefined).unwrap();

        assert!(log.borrow().is_empty());
        assert_eq!(node.get("a"), Value::Null);
        assert!(node.contains_key("b"));
    }

    #[test]
    fn filtered_writes_are_silent_and_unwrapped() {
        let (node, log) = observed(object! {
            "render" => Function::new("render", |_, _| Ok(Value::Undefined)),
        });

        node.set("props", object! { "x" => 1 }).unwrap();
        node.set("render", 5).unwrap();
        node.set("handler", Function::new("h", |_, _| Ok(Value::Undefined))).unwrap();

        assert!(log.borrow().is_empty());
        assert!(node.get("props").as_object().is_some());
        assert_eq!(node.get("render"), Value::from(5));
    }

    #[test]
    fn readonly_target_field_is_skipped() {
        let raw = object! {};
        raw.define_readonly("id", 1);
        let (node, log) = observed(raw);

        node.set("id", 2).unwrap();

        assert_eq!(node.get("id"), Value::from(1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn writes_notify_in_issue_order() {
        let (node, log) = observed(object! {});

        node.set("k1", 1).unwrap();
        node.set("k2", 2).unwrap();

        let keys: Vec<_> = log.borrow().iter().map(|c| c.key.clone()).collect();
        assert_eq!(keys, vec![Some(Key::from("k1")), Some(Key::from("k2"))]);
    }

    #[test]
    fn index_keys_on_objects_become_names() {
        let (node, log) = observed(object! {});
        node.set(0, "zero").unwrap();
        assert_eq!(node.get("0"), Value::from("zero"));
        assert_eq!(log.borrow()[0].key, Some(Key::from("0")));
    }

    #[test]
    fn array_index_assignment_is_intercepted() {
        let (node, log) = observed(array![1, 2]);

        node.set(1, 20).unwrap();
        node.set(3, 40).unwrap();

        assert_eq!(node.len(), 4);
        assert_eq!(node.get(2), Value::Undefined);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[0].key, Some(Key::Index(1)));
    }

    #[test]
    fn oversized_array_indices_are_ignored() {
        use crate::core::constants::MAX_ARRAY_INDEX;

        let (node, log) = observed(array![1]);

        node.set(usize::MAX, 2).unwrap();
        node.set(MAX_ARRAY_INDEX + 1, 3).unwrap();
        node.set("18446744073709551615", 4).unwrap();

        assert_eq!(node.len(), 1);
        assert!(!node.contains_key(usize::MAX));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn oversized_indices_on_objects_are_names() {
        let (node, log) = observed(object! {});
        node.set(usize::MAX, "far").unwrap();

        assert_eq!(node.get("18446744073709551615"), Value::from("far"));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn named_writes_on_arrays_are_ignored() {
        let (node, log) = observed(array![1]);
        node.set("length", 0).unwrap();
        node.set("label", "x").unwrap();

        assert_eq!(node.len(), 1);
        assert_eq!(node.get("length"), Value::from(1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn custom_filter_applies_to_every_node() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let wrapped = wrap_with(
            object! { "inner" => object! {} },
            ChangeNotifier::from_fn(move |c| sink.borrow_mut().push(c.clone())),
            FieldFilter::permissive().with_reserved("secret"),
        );
        let inner = wrapped.get("inner");

        inner.as_node().unwrap().set("secret", 1).unwrap();
        inner.as_node().unwrap().set("props", 1).unwrap();

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].key, Some(Key::from("props")));
    }

    #[test]
    fn reentrant_writes_run_recursively() {
        let slot: Rc<RefCell<Option<Node>>> = Rc::new(RefCell::new(None));
        let handle = slot.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let wrapped = wrap(
            object! { "a" => 0, "b" => 0 },
            ChangeNotifier::from_fn(move |c| {
                sink.borrow_mut().push(c.key.clone());
                if c.key == Some(Key::from("a")) {
                    if let Some(node) = handle.borrow().as_ref() {
                        node.set("b", 1).unwrap();
                    }
                }
            }),
        );
        let node = wrapped.as_node().cloned().unwrap();
        *slot.borrow_mut() = Some(node.clone());

        node.set("a", 1).unwrap();

        assert_eq!(node.get("b"), Value::from(1));
        assert_eq!(*seen.borrow(), vec![Some(Key::from("a")), Some(Key::from("b"))]);
        slot.borrow_mut().take();
    }

    #[test]
    fn runaway_reentrancy_is_cut_off() {
        let slot: Rc<RefCell<Option<Node>>> = Rc::new(RefCell::new(None));
        let handle = slot.clone();

        let wrapped = wrap(
            object! { "n" => 0 },
            crate::ChangeNotifier::new(move |c| {
                let node = handle.borrow().clone();
                if let Some(node) = node {
                    let next = c.new.as_f64().unwrap_or(0.0) + 1.0;
                    node.set("n", next)?;
                }
                Ok(())
            }),
        );
        let node = wrapped.as_node().cloned().unwrap();
        *slot.borrow_mut() = Some(node.clone());

        let err = node.set("n", 1).unwrap_err();
        assert!(err.to_string().contains("nested"));
        assert_eq!(node.scope().depth(), 0);
        slot.borrow_mut().take();
    }
}
