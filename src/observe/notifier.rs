// ============================================================================
// deep-observe - Change Notifier
//
// The single callback every committed write reports to, and the scope that
// owns it on behalf of one observed graph.
// ============================================================================
//
// A Scope is shared by every node of one graph. Detaching the graph flips
// the scope into quiescence: writes keep committing, but the notifier has
// been released and nothing is reported any more.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::filter::FieldFilter;
use super::wrap::IdentityTable;
use crate::core::constants::MAX_NOTIFY_DEPTH;
use crate::core::value::{Key, Value};
use crate::error::{BoxError, Error, Result};

// =============================================================================
// CHANGE
// =============================================================================

/// One committed mutation.
///
/// `old` is whatever was stored at `key` before the write (possibly an
/// observed node); `new` is the value as assigned, before wrapping. `key` is
/// `None` for structural events (an array shrinking).
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub key: Option<Key>,
    pub old: Value,
    pub new: Value,
}

impl Change {
    pub fn new(key: Option<Key>, old: Value, new: Value) -> Self {
        Self { key, old, new }
    }

    /// Returns true for structural events.
    pub fn is_structural(&self) -> bool {
        self.key.is_none()
    }
}

// =============================================================================
// CHANGE NOTIFIER
// =============================================================================

type NotifyFn = dyn Fn(&Change) -> std::result::Result<(), BoxError>;

/// The callback invoked synchronously on every committed, non-nullish write.
///
/// A notifier may fail; the failure surfaces from the write that triggered
/// it, after the write has been committed.
///
/// # Example
///
/// ```
/// use deep_observe::ChangeNotifier;
///
/// let logging = ChangeNotifier::from_fn(|change| println!("{:?} changed", change.key));
/// let strict = ChangeNotifier::new(|change| {
///     if change.is_structural() {
///         return Err("structural changes are not allowed".into());
///     }
///     Ok(())
/// });
/// # let _ = (logging, strict);
/// ```
#[derive(Clone)]
pub struct ChangeNotifier(Rc<NotifyFn>);

impl ChangeNotifier {
    /// Create a fallible notifier.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Change) -> std::result::Result<(), BoxError> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Create a notifier that cannot fail.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Change) + 'static,
    {
        Self::new(move |change| {
            f(change);
            Ok(())
        })
    }

    /// A notifier that ignores everything.
    pub fn noop() -> Self {
        Self::from_fn(|_| {})
    }

    pub fn notify(&self, change: &Change) -> std::result::Result<(), BoxError> {
        (self.0)(change)
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangeNotifier")
    }
}

// =============================================================================
// SCOPE
// =============================================================================

/// Shared state of one observed graph: its notifier, filter and identity table.
pub struct Scope {
    /// `None` once quiescent
    notifier: RefCell<Option<ChangeNotifier>>,
    filter: FieldFilter,
    table: IdentityTable,
    /// Nesting of notifications currently on the stack
    depth: Cell<usize>,
}

impl Scope {
    /// Create an active scope.
    pub fn new(notifier: ChangeNotifier, filter: FieldFilter) -> Rc<Self> {
        Rc::new(Self {
            notifier: RefCell::new(Some(notifier)),
            filter,
            table: IdentityTable::default(),
            depth: Cell::new(0),
        })
    }

    pub fn filter(&self) -> &FieldFilter {
        &self.filter
    }

    pub(crate) fn table(&self) -> &IdentityTable {
        &self.table
    }

    pub fn is_quiescent(&self) -> bool {
        self.notifier.borrow().is_none()
    }

    /// Stops all further notifications and releases the notifier.
    ///
    /// Returns false if the scope was already quiescent.
    pub fn quiesce(&self) -> bool {
        // Take first: the notifier may own the graph, and dropping it can
        // re-enter this scope
        let released = self.notifier.borrow_mut().take();
        let was_active = released.is_some();
        drop(released);
        if was_active {
            self.table.prune();
        }
        was_active
    }

    /// Number of notifications currently running.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Reports a committed change.
    ///
    /// A notifier that writes back into the graph is run recursively, up to
    /// `MAX_NOTIFY_DEPTH` levels.
    pub(crate) fn notify(&self, change: Change) -> Result<()> {
        // Clone out so the notifier may quiesce this scope while running
        let Some(notifier) = self.notifier.borrow().clone() else {
            debug!(key = ?change.key, "scope is quiescent, change not reported");
            return Ok(());
        };

        let depth = self.depth.get();
        if depth >= MAX_NOTIFY_DEPTH {
            return Err(Error::ReentrancyLimit { depth });
        }

        trace!(key = ?change.key, depth, "notify");
        let _guard = DepthGuard::enter(&self.depth);
        notifier.notify(&change).map_err(Error::Notifier)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("quiescent", &self.is_quiescent())
            .field("filter", &self.filter)
            .field("nodes", &self.table.len())
            .finish()
    }
}

/// Restores the notification depth even if the notifier panics.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

// =============================================================================
// TESTS
// =============================================================================
