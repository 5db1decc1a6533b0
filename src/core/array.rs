// ============================================================================
// deep-observe - Array
// A plain array with reference identity and reroutable mutators
// ============================================================================
//
// Mutators (push, pop, unshift, shift, slice, reverse, fill, copy_within,
// sort) run against the array itself until the array is adapted. Once
// adapted, every rebound mutator forwards to the observed node, so the
// element writes it performs go through the node's `set` path.
//
// Index assignment (`set`) is never rerouted: writes that bypass the mutators
// are the node's business, not the adapter's.
// ============================================================================

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::rc::Rc;

use tracing::debug;

use super::constants::{LENGTH_KEY, MAX_ARRAY_INDEX};
use super::value::{nested_format, Key, Value};
use crate::error::Result;
use crate::observe::adapter::MutatorSet;
use crate::observe::node::{Node, WeakNode};

// =============================================================================
// ROUTE
// =============================================================================

/// Where rebound mutators go after adaptation.
struct Route {
    methods: MutatorSet,
    node: WeakNode,
}

struct ArrayInner {
    items: RefCell<Vec<Value>>,
    route: RefCell<Option<Route>>,
}

// =============================================================================
// ARRAY
// =============================================================================

/// A plain array of values.
///
/// Like [`Object`](crate::Object), an `Array` is a handle: clones share the
/// same elements.
///
/// # Example
///
/// ```
/// use deep_observe::{array, Value};
///
/// let list = array![3, 1, 2];
/// list.sort().unwrap();
/// assert_eq!(list.to_vec(), vec![Value::from(1), Value::from(2), Value::from(3)]);
/// ```
#[derive(Clone)]
pub struct Array(Rc<ArrayInner>);

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Array {
    /// Create a new empty array.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an array owning the given elements.
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ArrayInner {
            items: RefCell::new(items),
            route: RefCell::new(None),
        }))
    }

    /// Identity of the underlying allocation.
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Returns true if both handles refer to the same array.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, `Undefined` when out of bounds.
    pub fn get(&self, index: usize) -> Value {
        self.0.items.borrow().get(index).cloned().unwrap_or_default()
    }

    /// Reads by key: indices address elements, `"length"` the length.
    pub fn read(&self, key: &Key) -> Value {
        match key.as_index() {
            Some(index) => self.get(index),
            None if key.is_name(LENGTH_KEY) => Value::from(self.len()),
            None => Value::Undefined,
        }
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    // =========================================================================
    // INDEX ASSIGNMENT
    // =========================================================================

    /// Assigns `value` at `index`, padding with `Undefined` past the end.
    ///
    /// This is plain assignment; it is never rerouted to an observer.
    /// Indices past [`MAX_ARRAY_INDEX`] are ignored.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let Some(len) = index.checked_add(1).filter(|_| index <= MAX_ARRAY_INDEX) else {
            debug!(index, "array index out of range, write ignored");
            return;
        };
        let mut items = self.0.items.borrow_mut();
        if len > items.len() {
            items.resize(len, Value::Undefined);
        }
        items[index] = value.into();
    }

    /// Shortens the array, dropping everything from `len` on.
    pub(crate) fn truncate(&self, len: usize) {
        self.0.items.borrow_mut().truncate(len);
    }

    pub(crate) fn replace_items(&self, items: Vec<Value>) {
        *self.0.items.borrow_mut() = items;
    }

    // =========================================================================
    // ADAPTATION
    // =========================================================================

    /// Reroutes `methods` to `node` from now on.
    pub(crate) fn rebind(&self, methods: MutatorSet, node: &Node) {
        *self.0.route.borrow_mut() = Some(Route {
            methods,
            node: node.downgrade(),
        });
    }

    /// Mutators currently rerouted to a live node.
    pub fn rebound_methods(&self) -> MutatorSet {
        match &*self.0.route.borrow() {
            Some(route) if route.node.upgrade().is_some() => route.methods,
            _ => MutatorSet::empty(),
        }
    }

    /// The node a mutator should run against, if it was rebound.
    fn routed(&self, method: MutatorSet) -> Option<Node> {
        let route = self.0.route.borrow();
        let route = route.as_ref()?;
        if route.methods.contains(method) {
            route.node.upgrade()
        } else {
            None
        }
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Appends an element, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        if let Some(node) = self.routed(MutatorSet::PUSH) {
            return node.push(value);
        }
        let mut items = self.0.items.borrow_mut();
        items.push(value.into());
        Ok(items.len())
    }

    /// Removes and returns the last element, `Undefined` if empty.
    pub fn pop(&self) -> Result<Value> {
        if let Some(node) = self.routed(MutatorSet::POP) {
            return node.pop();
        }
        Ok(self.0.items.borrow_mut().pop().unwrap_or_default())
    }

    /// Prepends an element, returning the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> Result<usize> {
        if let Some(node) = self.routed(MutatorSet::UNSHIFT) {
            return node.unshift(value);
        }
        let mut items = self.0.items.borrow_mut();
        items.insert(0, value.into());
        Ok(items.len())
    }

    /// Removes and returns the first element, `Undefined` if empty.
    pub fn shift(&self) -> Result<Value> {
        if let Some(node) = self.routed(MutatorSet::SHIFT) {
            return node.shift();
        }
        let mut items = self.0.items.borrow_mut();
        if items.is_empty() {
            Ok(Value::Undefined)
        } else {
            Ok(items.remove(0))
        }
    }

    /// Copies a range of elements into a new plain array.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<Array> {
        if let Some(node) = self.routed(MutatorSet::SLICE) {
            return node.slice(range);
        }
        let items = self.0.items.borrow();
        let (start, end) = resolve_range(range, items.len());
        Ok(Array::from_vec(items[start..end].to_vec()))
    }

    /// Reverses the elements in place.
    pub fn reverse(&self) -> Result<()> {
        if let Some(node) = self.routed(MutatorSet::REVERSE) {
            return node.reverse();
        }
        self.0.items.borrow_mut().reverse();
        Ok(())
    }

    /// Assigns `value` to every index in `range`.
    pub fn fill(&self, value: impl Into<Value>, range: impl RangeBounds<usize>) -> Result<()> {
        if let Some(node) = self.routed(MutatorSet::FILL) {
            return node.fill(value, range);
        }
        let value = value.into();
        let mut items = self.0.items.borrow_mut();
        let (start, end) = resolve_range(range, items.len());
        for item in &mut items[start..end] {
            *item = value.clone();
        }
        Ok(())
    }

    /// Copies the elements in `range` to the positions starting at `target`.
    pub fn copy_within(&self, target: usize, range: impl RangeBounds<usize>) -> Result<()> {
        if let Some(node) = self.routed(MutatorSet::COPY_WITHIN) {
            return node.copy_within(target, range);
        }
        let mut items = self.0.items.borrow_mut();
        let len = items.len();
        let (start, end) = resolve_range(range, len);
        if target < len {
            let count = (end - start).min(len - target);
            let copied: Vec<Value> = items[start..start + count].to_vec();
            items[target..target + count].clone_from_slice(&copied);
        }
        Ok(())
    }

    /// Sorts by string conversion, `Undefined` last.
    pub fn sort(&self) -> Result<()> {
        self.sort_by(default_compare)
    }

    /// Stable sort with a custom comparator, `Undefined` last.
    pub fn sort_by<F>(&self, compare: F) -> Result<()>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        if let Some(node) = self.routed(MutatorSet::SORT) {
            return node.sort_by(compare);
        }
        // The comparator may read this array, so sort a snapshot
        let sorted = sort_values(self.to_vec(), compare);
        self.replace_items(sorted);
        Ok(())
    }

    /// Element-wise structural equality.
    pub(crate) fn structural_eq(&self, other: &Array) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let ours = self.to_vec();
        let theirs = other.to_vec();
        ours.len() == theirs.len() && ours.iter().zip(theirs.iter()).all(|(a, b)| a == b)
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Array::from_vec(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.to_vec();
        nested_format(|| f.debug_list().entries(items.iter()).finish())
            .unwrap_or_else(|| f.write_str("[..]"))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Clamps a range to `0..len`, never yielding `start > end`.
pub(crate) fn resolve_range(range: impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    (start.min(end), end)
}

/// Default sort order: string conversion, `Undefined` after everything else.
pub fn default_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => Ordering::Equal,
        (Value::Undefined, _) => Ordering::Greater,
        (_, Value::Undefined) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Stable sort keeping every `Undefined` at the end, unseen by `compare`.
pub(crate) fn sort_values<F>(items: Vec<Value>, mut compare: F) -> Vec<Value>
where
    F: FnMut(&Value, &Value) -> Ordering,
{
    let (mut defined, undefined): (Vec<Value>, Vec<Value>) = items
        .into_iter()
        .partition(|v| !matches!(v, Value::Undefined));
    defined.sort_by(|a, b| compare(a, b));
    defined.extend(undefined);
    defined
}

// =============================================================================
// TESTS
// =============================================================================
