use std::fmt;
use std::sync::Arc;

use crate::path;
use crate::storage::TreeStore;

/// Call-scoped state of one top-level execution.
///
/// Holds the store handle and the path of the most recent mutation. Create a
/// fresh context per execution and thread it by `&mut` through every visit;
/// it is deliberately not `Clone`, so two executions cannot share the
/// last-path slot.
pub struct VisitContext {
    store: Arc<dyn TreeStore>,
    last_path: Option<String>,
}

impl VisitContext {
    /// Start a new execution against `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self {
            store,
            last_path: None,
        }
    }

    /// The store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Resolved path of the most recent mutation in this execution.
    #[must_use]
    pub fn last_path(&self) -> Option<&str> {
        self.last_path.as_deref()
    }

    /// Trailing segment of [`Self::last_path`], if non-empty.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.last_path.as_deref().and_then(path::last_segment)
    }

    pub(crate) fn record_path(&mut self, resolved: String) {
        self.last_path = Some(resolved);
    }
}

impl fmt::Debug for VisitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitContext")
            .field("last_path", &self.last_path)
            .finish_non_exhaustive()
    }
}
