use std::sync::Arc;

use tracing::{debug, warn};

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Pre-request hook run before any protocol check
///
/// Middleware may only mutate response headers; status and body belong to
/// the dispatcher and its terminal handlers.
pub trait Middleware: Send + Sync {
    fn before(&self, req: &HandlerRequest, res: &mut HandlerResponse);
}

impl<F> Middleware for F
where
    F: Fn(&HandlerRequest, &mut HandlerResponse) + Send + Sync,
{
    fn before(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        self(req, res)
    }
}

/// Named slot in a [`MiddlewareChain`]; `None` is an inert slot
type Slot = (String, Option<Arc<dyn Middleware>>);

/// Ordered, named middleware table
///
/// Entries run in registration order. Re-registering a name replaces the
/// middleware in place, so the slot keeps its position; [`disable`] keeps the
/// slot but makes it inert.
///
/// [`disable`]: MiddlewareChain::disable
#[derive(Default, Clone)]
pub struct MiddlewareChain {
    slots: Vec<Slot>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|(name, mw)| (name, mw.is_some())))
            .finish()
    }
}

impl MiddlewareChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `mw` under `name`, replacing in place or appending
    pub fn register(&mut self, name: &str, mw: Arc<dyn Middleware>) {
        match self.slots.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                debug!(middleware = name, "Replaced middleware");
                slot.1 = Some(mw);
            }
            None => self.slots.push((name.to_owned(), Some(mw))),
        }
    }

    /// Make the slot `name` inert; returns false when no such slot exists
    pub fn disable(&mut self, name: &str) -> bool {
        match self.slots.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = None;
                true
            }
            None => {
                warn!(middleware = name, "Cannot disable unknown middleware");
                false
            }
        }
    }

    /// Remove the slot `name` entirely
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Middleware>> {
        let idx = self.slots.iter().position(|(n, _)| n == name)?;
        self.slots.remove(idx).1
    }

    /// Active middleware registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Middleware>> {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, mw)| mw.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|(n, _)| n == name)
    }

    /// Slot names in execution order, including inert ones
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run every active middleware in order
    pub fn run(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        for mw in self.slots.iter().filter_map(|(_, mw)| mw.as_ref()) {
            mw.before(req, res);
        }
    }
}
