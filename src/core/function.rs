// ============================================================================
// deep-observe - Function
// Callable values stored in object fields
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::value::Value;
use crate::error::Result;

/// Body of a function: receives `this` and the call arguments.
pub type MethodFn = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// A callable value.
///
/// Functions are never observed: they are skipped by the field filter and
/// compare by identity.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    body: Rc<MethodFn>,
}

impl Function {
    /// Create a function from a closure taking `this` and arguments.
    pub fn new<F>(name: impl Into<Rc<str>>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls with `this` bound to `Undefined`, unless the function was bound.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.body)(&Value::Undefined, args)
    }

    /// Calls with an explicit `this`.
    pub fn call_with(&self, this: &Value, args: &[Value]) -> Result<Value> {
        (self.body)(this, args)
    }

    /// Returns a function that always runs with `this`, whatever it is called with.
    pub fn bind(&self, this: Value) -> Function {
        let body = self.body.clone();
        Function::new(self.name.clone(), move |_, args| body(&this, args))
    }

    /// Returns a function that resolves `this` on every call.
    pub fn bind_with<T>(&self, this: T) -> Function
    where
        T: Fn() -> Value + 'static,
    {
        let body = self.body.clone();
        Function::new(self.name.clone(), move |_, args| body(&this(), args))
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn this_name() -> Function {
        Function::new("thisName", |this, _| Ok(this.get("name")))
    }

    #[test]
    fn call_passes_arguments() {
        let sum = Function::new("sum", |_, args| {
            Ok(Value::from(args.iter().filter_map(Value::as_f64).sum::<f64>()))
        });
        assert_eq!(sum.call(&[Value::from(1), Value::from(2)]).unwrap(), Value::from(3));
        assert_eq!(sum.name(), "sum");
    }

    #[test]
    fn unbound_this_is_undefined() {
        assert_eq!(this_name().call(&[]).unwrap(), Value::Undefined);
    }

    #[test]
    fn bind_fixes_this() {
        let host = crate::object! { "name" => "bob" };
        let bound = this_name().bind(Value::from(host));

        let other = Value::from(crate::object! { "name" => "ann" });
        assert_eq!(bound.call_with(&other, &[]).unwrap(), Value::from("bob"));
    }

    #[test]
    fn bound_copies_are_distinct_functions() {
        let f = this_name();
        let bound = f.bind(Value::Null);
        assert!(!f.ptr_eq(&bound));
        assert!(f.ptr_eq(&f.clone()));
    }
}
