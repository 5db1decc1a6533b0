// ============================================================================
// deep-observe - Value Model
// Dynamically-shaped values with reference identity for containers
// ============================================================================
//
// Primitives are held by value. Objects, arrays and functions are reference
// types: cloning a `Value` that holds one clones the handle, so two clones
// observe each other's writes exactly like two references to one object in a
// dynamic language.
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::array::Array;
use super::constants::MAX_ARRAY_INDEX;
use super::function::Function;
use super::object::Object;
use crate::observe::node::{Node, Target};

// =============================================================================
// KEY
// =============================================================================

/// A property key: a field name or an array index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Name(Rc<str>),
    Index(usize),
}

impl Key {
    /// Returns the index this key addresses, accepting canonical numeric names.
    ///
    /// Anything past [`MAX_ARRAY_INDEX`] is a name, not an index.
    pub fn as_index(&self) -> Option<usize> {
        let index = match self {
            Key::Index(i) => *i,
            Key::Name(name) => {
                let index: usize = name.parse().ok()?;
                // "01" and "+1" are names, not indices
                if index.to_string() != **name {
                    return None;
                }
                index
            }
        };
        (index <= MAX_ARRAY_INDEX).then_some(index)
    }

    /// Returns the key as a field name, stringifying indices.
    pub fn to_name(&self) -> Rc<str> {
        match self {
            Key::Name(name) => name.clone(),
            Key::Index(i) => Rc::from(i.to_string()),
        }
    }

    /// Returns true if this key names the given field.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Key::Name(n) if &**n == name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(Rc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Rc::from(name))
    }
}

impl From<Rc<str>> for Key {
    fn from(name: Rc<str>) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// Any value that can live in an observed graph.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Function(Function),
    /// A plain object that has not been wrapped.
    Object(Object),
    /// A plain array that has not been wrapped.
    Array(Array),
    /// An observed node wrapping an object or array.
    Node(Node),
}

impl Value {
    /// Returns true for `Undefined` and `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns true for objects, arrays and nodes.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_) | Value::Node(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Node(n) if n.is_array() => "observed array",
            Value::Node(_) => "observed object",
        }
    }

    /// Reads `key` from a container, or `Undefined` for anything else.
    ///
    /// Reading never wraps. Reads through a node are the node's pass-through
    /// `get`.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = key.into();
        match self {
            Value::Object(o) => o.get(&key.to_name()),
            Value::Array(a) => a.read(&key),
            Value::Node(n) => n.get(key),
            _ => Value::Undefined,
        }
    }

    /// Looks through a node to the container it wraps.
    fn resolved(&self) -> Value {
        match self {
            Value::Node(n) => match n.target() {
                Target::Object(o) => Value::Object(o.clone()),
                Target::Array(a) => Value::Array(a.clone()),
            },
            other => other.clone(),
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Node(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Undefined, Into::into)
    }
}

// =============================================================================
// EQUALITY
// =============================================================================

/// Structural equality. Nodes compare as the container they wrap, so an
/// observed value equals the raw value it was built from.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolved(), other.resolved()) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(&b),
            (Value::Object(a), Value::Object(b)) => a.structural_eq(&b),
            (Value::Array(a), Value::Array(b)) => a.structural_eq(&b),
            _ => false,
        }
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

thread_local! {
    /// Nesting of the formatter currently running, bounds cyclic graphs.
    static FORMAT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

const MAX_FORMAT_DEPTH: usize = 16;

/// Runs `f` one nesting level deeper, or returns `None` past the limit.
pub(crate) fn nested_format<R>(f: impl FnOnce() -> R) -> Option<R> {
    let depth = FORMAT_DEPTH.with(Cell::get);
    if depth >= MAX_FORMAT_DEPTH {
        return None;
    }
    FORMAT_DEPTH.with(|d| d.set(depth + 1));
    let result = f();
    FORMAT_DEPTH.with(|d| d.set(depth));
    Some(result)
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // Covers -0
        f.write_str("0")
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        write!(f, "{:.0}", n)
    } else {
        write!(f, "{}", n)
    }
}

/// String conversion of a value, as used by the default array sort.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Function(func) => write!(f, "function {}", func.name()),
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Array(a) => {
                let items = a.to_vec();
                nested_format(|| {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        if !item.is_nullish() {
                            write!(f, "{}", item)?;
                        }
                    }
                    Ok(())
                })
                .unwrap_or(Ok(()))
            }
            Value::Node(_) => write!(f, "{}", self.resolved()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{:?}", b),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Object(o) => write!(f, "{:?}", o),
            Value::Array(a) => write!(f, "{:?}", a),
            Value::Node(n) => write!(f, "{:?}", n),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
