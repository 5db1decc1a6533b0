// ============================================================================
// deep-observe - Deep Wrap
//
// Recursively turns a raw value into its fully observed form.
// ============================================================================
//
// - Primitives, functions and nullish values pass through unchanged.
// - Objects are wrapped in place: every observable field is replaced by its
//   wrapped form, then a node is built over the object itself.
// - Arrays are copied: the elements are wrapped into a fresh array, a node is
//   built over it, and its mutators are rebound to that node.
//
// A node belonging to another scope that has been detached is stale: its
// container is wrapped again into the current scope, so re-attaching a host
// observes the whole graph again. Nodes of live scopes are kept as they are.
//
// Each scope keeps an identity table from raw container to node. A container
// is registered before its children are visited, so revisiting it (a cycle,
// or the same object reachable twice) yields the existing node instead of a
// second wrapper.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use super::adapter;
use super::filter::FieldFilter;
use super::node::{Node, Target, WeakNode};
use super::notifier::{ChangeNotifier, Scope};
use crate::core::array::Array;
use crate::core::object::Object;
use crate::core::value::Value;

/// Table size below which dead entries are left alone.
const MIN_PRUNE_LEN: usize = 64;

// =============================================================================
// IDENTITY TABLE
// =============================================================================

/// Maps raw container identity to the node wrapping it.
///
/// Entries are weak: a node that is no longer referenced anywhere frees its
/// container, and its entry is pruned lazily.
pub(crate) struct IdentityTable {
    nodes: RefCell<HashMap<usize, WeakNode>>,
    prune_at: Cell<usize>,
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self {
            nodes: RefCell::new(HashMap::new()),
            prune_at: Cell::new(MIN_PRUNE_LEN),
        }
    }
}

impl IdentityTable {
    /// The live node registered for `id`, if any.
    pub(crate) fn lookup(&self, id: usize) -> Option<Node> {
        self.nodes.borrow().get(&id).and_then(WeakNode::upgrade)
    }

    pub(crate) fn insert(&self, id: usize, node: &Node) {
        let len = {
            let mut nodes = self.nodes.borrow_mut();
            nodes.insert(id, node.downgrade());
            nodes.len()
        };
        if len >= self.prune_at.get() {
            self.prune();
            self.prune_at.set((self.len() * 2).max(MIN_PRUNE_LEN));
        }
    }

    /// Drops entries whose node is gone.
    pub(crate) fn prune(&self) {
        self.nodes.borrow_mut().retain(|_, node| node.is_alive());
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.borrow().len()
    }
}

// =============================================================================
// DEEP WRAP
// =============================================================================

/// Wraps `value` and everything reachable from it, reporting to `notifier`.
///
/// Returns the value unchanged when it is not an object or array. Every node
/// created shares one new scope with the default [`FieldFilter`].
///
/// # Example
///
/// ```
/// use deep_observe::{object, wrap, ChangeNotifier, Value};
///
/// let state = wrap(object! { "count" => 0 }, ChangeNotifier::from_fn(|c| {
///     println!("{:?}: {:?} -> {:?}", c.key, c.old, c.new);
/// }));
///
/// let node = state.as_node().unwrap();
/// node.set("count", 1).unwrap();
/// assert_eq!(node.get("count"), Value::from(1));
/// ```
pub fn wrap(value: impl Into<Value>, notifier: ChangeNotifier) -> Value {
    wrap_with(value, notifier, FieldFilter::default())
}

/// [`wrap`] with a custom field filter.
pub fn wrap_with(value: impl Into<Value>, notifier: ChangeNotifier, filter: FieldFilter) -> Value {
    let scope = Scope::new(notifier, filter);
    wrap_in(&value.into(), &scope)
}

/// Wraps `value` into an existing scope.
pub(crate) fn wrap_in(value: &Value, scope: &Rc<Scope>) -> Value {
    match value {
        Value::Object(object) => Value::Node(wrap_object(object, scope)),
        Value::Array(array) => Value::Node(wrap_array(array, scope)),
        Value::Node(node) if is_stale(node, scope) => Value::Node(rehome(node, scope)),
        // Already observed, or nothing to observe
        _ => value.clone(),
    }
}

/// True for a node left behind by another, detached scope.
fn is_stale(node: &Node, scope: &Rc<Scope>) -> bool {
    !Rc::ptr_eq(node.scope(), scope) && node.scope().is_quiescent()
}

/// Wraps a stale node's container again, into `scope`.
fn rehome(node: &Node, scope: &Rc<Scope>) -> Node {
    trace!("re-wrapping node of a detached scope");
    match node.target() {
        Target::Object(object) => wrap_object(object, scope),
        Target::Array(array) => wrap_array(array, scope),
    }
}

/// Returns true if deep wrap has to visit `value`.
fn needs_wrap(value: &Value, scope: &Rc<Scope>) -> bool {
    match value {
        Value::Object(_) | Value::Array(_) => true,
        Value::Node(node) => is_stale(node, scope),
        _ => false,
    }
}

pub(crate) fn wrap_object(object: &Object, scope: &Rc<Scope>) -> Node {
    if let Some(node) = scope.table().lookup(object.id()) {
        return node;
    }

    let node = Node::new(Target::Object(object.clone()), scope.clone(), None);
    scope.table().insert(object.id(), &node);
    trace!(fields = object.len(), "wrapped object");

    for (key, value) in object.entries() {
        if !needs_wrap(&value, scope) {
            continue;
        }
        if !scope.filter().is_observable(&key, &value) {
            continue;
        }
        let wrapped = wrap_in(&value, scope);
        if let Err(err) = object.set(key.clone(), wrapped) {
            debug!(%key, %err, "field left unwrapped");
        }
    }

    node
}

fn wrap_array(array: &Array, scope: &Rc<Scope>) -> Node {
    if let Some(node) = scope.table().lookup(array.id()) {
        return node;
    }

    let target = Array::new();
    let node = Node::new(Target::Array(target.clone()), scope.clone(), Some(array.clone()));
    scope.table().insert(array.id(), &node);
    scope.table().insert(target.id(), &node);
    trace!(len = array.len(), "wrapped array");

    let items = array.to_vec().iter().map(|item| wrap_in(item, scope)).collect();
    target.replace_items(items);

    adapter::adapt(&target, node)
}

// =============================================================================
// TESTS
// =============================================================================
