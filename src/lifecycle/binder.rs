// ============================================================================
// deep-observe - Lifecycle Binder
//
// Attaches observation to a host object at mount, quiesces it at unmount.
// ============================================================================
//
// The host framework owns the object and decides when to mount and unmount.
// On mount it hands the object to `attach` and keeps the returned root as its
// mutable state; on unmount it calls `detach` (or drops the root). After
// that, writes anywhere in the graph still land, but nothing is reported.
// ============================================================================

use std::ops::Deref;
use std::rc::Rc;

use tracing::debug;

use crate::core::object::Object;
use crate::core::value::Value;
use crate::error::{Error, Result};
use crate::observe::filter::{read_fields, FieldFilter};
use crate::observe::node::Node;
use crate::observe::notifier::{ChangeNotifier, Scope};
use crate::observe::wrap::wrap_object;

// =============================================================================
// BINDER
// =============================================================================

/// Mount-time configuration.
///
/// # Example
///
/// ```
/// use deep_observe::{object, Binder, ChangeNotifier, FieldFilter, Function, Value};
///
/// let host = object! {
///     "items" => deep_observe::array![],
///     "add" => Function::new("add", |this, args| {
///         let items = this.get("items");
///         items.as_node().unwrap().push(args[0].clone())?;
///         Ok(Value::Undefined)
///     }),
/// };
///
/// let root = Binder::new()
///     .filter(FieldFilter::default().with_reserved("session"))
///     .bind_method("add")
///     .attach(host.clone(), ChangeNotifier::noop())
///     .unwrap();
///
/// // The rebound method writes through the observed root
/// let add = host.get("add");
/// add.as_function().unwrap().call(&[Value::from(1)]).unwrap();
/// assert_eq!(root.get("items").get("length"), Value::from(1));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Binder {
    filter: FieldFilter,
    methods: Vec<Rc<str>>,
    notify_on_mount: bool,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field filter shared by every node of the attached graph.
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Rebinds the host's function field `name` so `this` is the observed root.
    pub fn bind_method(mut self, name: impl Into<Rc<str>>) -> Self {
        let name = name.into();
        if !self.methods.contains(&name) {
            self.methods.push(name);
        }
        self
    }

    pub fn bind_methods<I, K>(self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Rc<str>>,
    {
        names
            .into_iter()
            .fold(self, |binder, name| binder.bind_method(name))
    }

    /// Re-assigns every observable field through the root once attached,
    /// so the notifier hears about the initial state.
    pub fn notify_on_mount(mut self, enabled: bool) -> Self {
        self.notify_on_mount = enabled;
        self
    }

    /// Wraps the host's current fields and returns the observed root.
    ///
    /// Fails with [`Error::NotObservable`] unless `host` is a plain object,
    /// or with the notifier's error when `notify_on_mount` is set.
    pub fn attach(&self, host: impl Into<Value>, notifier: ChangeNotifier) -> Result<ObservedRoot> {
        let host = match host.into() {
            Value::Object(object) => object,
            other => return Err(Error::NotObservable { kind: other.kind() }),
        };

        let scope = Scope::new(notifier, self.filter.clone());
        let root = ObservedRoot {
            node: wrap_object(&host, &scope),
        };
        self.rebind_methods(&host, &root.node);

        if self.notify_on_mount {
            let mut fields = Vec::new();
            read_fields(&host, &self.filter, |key, value| {
                fields.push((key.clone(), value.clone()))
            });
            for (key, value) in fields {
                root.node.set(key, value)?;
            }
        }

        debug!(
            fields = host.len(),
            methods = self.methods.len(),
            "attached observer"
        );
        Ok(root)
    }

    fn rebind_methods(&self, host: &Object, root: &Node) {
        for name in &self.methods {
            let Value::Function(method) = host.get(name) else {
                debug!(%name, "no such method to bind");
                continue;
            };
            // Weak, so the host's fields do not keep their own wrapper alive
            let this = root.downgrade();
            let bound = method.bind_with(move || this.upgrade().map(Value::Node).unwrap_or_default());
            if let Err(err) = host.set(name.clone(), bound) {
                debug!(%name, %err, "method left unbound");
            }
        }
    }
}

// =============================================================================
// OBSERVED ROOT
// =============================================================================

/// The observed replacement for a host's mutable state.
///
/// Derefs to the root [`Node`]. Dropping it detaches the whole graph.
pub struct ObservedRoot {
    node: Node,
}

impl ObservedRoot {
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Quiesces the graph. Idempotent.
    pub fn detach(&self) {
        detach(&self.node);
    }

    pub fn is_detached(&self) -> bool {
        self.node.scope().is_quiescent()
    }
}

impl Deref for ObservedRoot {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl Drop for ObservedRoot {
    fn drop(&mut self) {
        detach(&self.node);
    }
}

impl std::fmt::Debug for ObservedRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedRoot")
            .field("node", &self.node)
            .field("detached", &self.is_detached())
            .finish()
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Observes `host` with the default configuration.
///
/// # Example
///
/// ```
/// use deep_observe::{array, attach, detach, object, ChangeNotifier};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let calls = Rc::new(Cell::new(0));
/// let counter = calls.clone();
/// let root = attach(
///     object! { "list" => array![] },
///     ChangeNotifier::from_fn(move |_| counter.set(counter.get() + 1)),
/// )
/// .unwrap();
///
/// root.get("list").as_node().unwrap().push(1).unwrap();
/// assert_eq!(calls.get(), 1);
///
/// detach(&root);
/// root.get("list").as_node().unwrap().push(2).unwrap();
/// assert_eq!(calls.get(), 1);
/// ```
pub fn attach(host: impl Into<Value>, notifier: ChangeNotifier) -> Result<ObservedRoot> {
    Binder::default().attach(host, notifier)
}

/// Stops every node sharing `root`'s notifier from reporting. Idempotent.
pub fn detach(root: &Node) {
    if root.scope().quiesce() {
        debug!("detached observer");
    }
}

// =============================================================================
// TESTS
// =============================================================================
