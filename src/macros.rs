// ============================================================================
// deep-observe - Ergonomic Macros
// ============================================================================

/// Build a plain [`Object`](crate::Object) from `key => value` pairs.
///
/// Values go through `Value::from`, so primitives, nested objects, arrays and
/// functions can be mixed freely.
///
/// # Usage
///
/// ```rust
/// use deep_observe::{array, object, Value};
///
/// let user = object! {
///     "name" => "bob",
///     "age" => 42,
///     "tags" => array!["admin"],
///     "address" => object! { "city" => "Oslo" },
/// };
///
/// assert_eq!(user.get("name"), Value::from("bob"));
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Object::from_iter([
            $( ($key, $crate::Value::from($value)) ),+
        ])
    };
}

/// Build a plain [`Array`](crate::Array) from a list of values.
///
/// # Usage
///
/// ```rust
/// use deep_observe::{array, Value};
///
/// let list = array![1, "two", deep_observe::Value::Null];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! array {
    () => {
        $crate::Array::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Array::from_vec(vec![
            $( $crate::Value::from($value) ),+
        ])
    };
}

/// Helper macro to clone variables into a move closure.
///
/// Handy for notifiers that record into shared state.
///
/// # Usage
///
/// ```rust
/// use deep_observe::{cloned, ChangeNotifier};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = Rc::new(Cell::new(0));
/// let notifier = ChangeNotifier::from_fn(cloned!(count => move |_| count.set(count.get() + 1)));
/// # let _ = notifier;
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}
