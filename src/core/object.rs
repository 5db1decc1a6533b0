// ============================================================================
// deep-observe - Object
// A plain, insertion-ordered object with reference identity
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::value::{nested_format, Value};
use crate::error::{Error, Result};

// =============================================================================
// PROPERTY
// =============================================================================

#[derive(Clone)]
struct Property {
    key: Rc<str>,
    value: Value,
    writable: bool,
}

// =============================================================================
// OBJECT
// =============================================================================

/// A plain object: named fields in insertion order.
///
/// `Object` is a handle. Clones share the same fields, and identity (not
/// contents) decides whether two handles are "the same object".
///
/// # Example
///
/// ```
/// use deep_observe::{Object, Value};
///
/// let user = Object::new();
/// user.set("name", "bob").unwrap();
///
/// let alias = user.clone();
/// alias.set("name", "ann").unwrap();
///
/// assert_eq!(user.get("name"), Value::from("ann"));
/// ```
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Vec<Property>>>);

impl Object {
    /// Create a new empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the underlying allocation.
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Returns true if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Reads a field, `Undefined` if absent.
    pub fn get(&self, key: &str) -> Value {
        self.0
            .borrow()
            .iter()
            .find(|p| &*p.key == key)
            .map(|p| p.value.clone())
            .unwrap_or_default()
    }

    /// Writes a field, appending it if absent.
    ///
    /// Fails with [`Error::ReadOnly`] if the field was declared read-only.
    pub fn set(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        let mut props = self.0.borrow_mut();
        match props.iter_mut().find(|p| p.key == key) {
            Some(prop) if !prop.writable => Err(Error::ReadOnly {
                key: key.to_string(),
            }),
            Some(prop) => {
                prop.value = value;
                Ok(())
            }
            None => {
                props.push(Property {
                    key,
                    value,
                    writable: true,
                });
                Ok(())
            }
        }
    }

    /// Defines (or redefines) a field that later writes cannot change.
    pub fn define_readonly(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut props = self.0.borrow_mut();
        match props.iter_mut().find(|p| p.key == key) {
            Some(prop) => {
                prop.value = value;
                prop.writable = false;
            }
            None => props.push(Property {
                key,
                value,
                writable: false,
            }),
        }
    }

    /// Returns false only for fields declared read-only.
    pub fn is_writable(&self, key: &str) -> bool {
        self.0
            .borrow()
            .iter()
            .find(|p| &*p.key == key)
            .is_none_or(|p| p.writable)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().iter().any(|p| &*p.key == key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.borrow().iter().map(|p| p.key.clone()).collect()
    }

    /// Snapshot of all fields in insertion order.
    pub fn entries(&self) -> Vec<(Rc<str>, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Same fields with structurally equal values, in any order.
    pub(crate) fn structural_eq(&self, other: &Object) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let ours = self.entries();
        let theirs = other.entries();
        ours.len() == theirs.len()
            && ours.iter().all(|(key, value)| {
                theirs
                    .iter()
                    .find(|(k, _)| k == key)
                    .is_some_and(|(_, v)| v == value)
            })
    }
}

impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        for (key, value) in iter {
            // A fresh object has no read-only fields
            let _ = object.set(key, value);
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries();
        nested_format(|| {
            f.debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish()
        })
        .unwrap_or_else(|| f.write_str("{..}"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let obj = Object::new();
        obj.set("a", 1).unwrap();
        obj.set("b", "two").unwrap();

        assert_eq!(obj.get("a"), Value::from(1));
        assert_eq!(obj.get("b"), Value::from("two"));
        assert_eq!(obj.get("missing"), Value::Undefined);
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn keys_keep_insertion_order() {
        let obj = Object::new();
        obj.set("z", 1).unwrap();
        obj.set("a", 2).unwrap();
        obj.set("z", 3).unwrap();

        let keys: Vec<String> = obj.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn readonly_fields_reject_writes() {
        let obj = Object::new();
        obj.define_readonly("id", 7);

        let err = obj.set("id", 8).unwrap_err();
        assert!(err.is_read_only());
        assert_eq!(obj.get("id"), Value::from(7));
        assert!(!obj.is_writable("id"));
        assert!(obj.is_writable("other"));
    }

    #[test]
    fn clones_share_identity() {
        let a = Object::new();
        let b = a.clone();
        b.set("x", true).unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(a.get("x"), Value::from(true));
        assert!(!a.ptr_eq(&Object::new()));
    }

    #[test]
    fn collect_from_pairs() {
        let obj: Object = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("b"));
    }
}
