// ============================================================================
// deep-observe - Field Filter
// Decides which fields take part in observation
// ============================================================================

use std::rc::Rc;

use crate::core::constants::DEFAULT_RESERVED_KEYS;
use crate::core::object::Object;
use crate::core::value::{Key, Value};

/// Policy deciding which fields are observable.
///
/// A field is not observable when its name is reserved or its value is a
/// function. Unobservable fields are never wrapped, never recursed into and
/// never reported.
///
/// # Example
///
/// ```
/// use deep_observe::{FieldFilter, Value};
///
/// let filter = FieldFilter::default().with_reserved("session");
///
/// assert!(filter.is_observable("items", &Value::from(1)));
/// assert!(!filter.is_observable("props", &Value::from(1)));
/// assert!(!filter.is_observable("session", &Value::from(1)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldFilter {
    reserved: Vec<Rc<str>>,
}

impl Default for FieldFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_KEYS.iter().copied())
    }
}

impl FieldFilter {
    /// Create a filter reserving exactly the given names.
    pub fn new<I, K>(reserved: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Rc<str>>,
    {
        let mut filter = Self {
            reserved: Vec::new(),
        };
        for key in reserved {
            filter = filter.with_reserved(key);
        }
        filter
    }

    /// A filter reserving nothing; only functions are skipped.
    pub fn permissive() -> Self {
        Self {
            reserved: Vec::new(),
        }
    }

    /// Adds a reserved name.
    pub fn with_reserved(mut self, key: impl Into<Rc<str>>) -> Self {
        let key = key.into();
        if !self.is_reserved(&key) {
            self.reserved.push(key);
        }
        self
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        self.reserved.iter().any(|k| &**k == key)
    }

    /// Reserved names in the order they were added.
    pub fn reserved(&self) -> impl Iterator<Item = &str> {
        self.reserved.iter().map(|k| &**k)
    }

    /// Returns false for reserved names and function values.
    pub fn is_observable(&self, key: &str, value: &Value) -> bool {
        !self.is_reserved(key) && !value.is_function()
    }

    /// Key-generic form of [`is_observable`](Self::is_observable); indices
    /// are never reserved.
    pub fn accepts(&self, key: &Key, value: &Value) -> bool {
        match key {
            Key::Name(name) => self.is_observable(name, value),
            Key::Index(_) => !value.is_function(),
        }
    }
}

/// Visits every observable field of `object` in insertion order.
///
/// Fields are snapshotted first, so `read` may write back into `object`.
pub fn read_fields<F>(object: &Object, filter: &FieldFilter, mut read: F)
where
    F: FnMut(&Rc<str>, &Value),
{
    for (key, value) in object.entries() {
        if filter.is_observable(&key, &value) {
            read(&key, &value);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
