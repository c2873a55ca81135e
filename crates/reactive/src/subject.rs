//! The observable primitive.
//!
//! A `Subject` is the minimal "anything with subscribe" shape the engine
//! consumes: an observer list keyed by monotonically increasing ids, and an
//! emit operation that delivers to every observer registered at emission
//! time before returning.
//!
//! Observer callbacks return `Result<()>`: that is how engine-side errors
//! (the tick-depth guard) surface back at the emitting call site.

use crate::event::{EmitError, Event};
use alloc::rc::Rc;
use alloc::vec::Vec;
use arbor_core::{Result, Value};
use core::cell::RefCell;
use core::fmt;

/// Unique identifier for an observer of one subject.
pub type ObserverId = u64;

/// Stable identity of a subject, independent of handle clones.
///
/// The propagation engine uses tokens to register exactly one tree-side
/// observer per subject, no matter how many hooks reference it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubjectToken(usize);

type ObserverFn = Rc<dyn Fn(&Event) -> Result<()>>;

struct SubjectInner {
    observers: Vec<(ObserverId, ObserverFn)>,
    next_id: ObserverId,
}

/// A cheap-clone observable handle; all clones share one observer list.
#[derive(Clone)]
pub struct Subject {
    inner: Rc<RefCell<SubjectInner>>,
}

impl Default for Subject {
    fn default() -> Self {
        Self::new()
    }
}

impl Subject {
    /// Creates a new subject with no observers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                observers: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Returns this subject's stable identity token.
    pub fn token(&self) -> SubjectToken {
        SubjectToken(Rc::as_ptr(&self.inner) as usize)
    }

    /// Subscribes an observer, returning its id.
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Event) -> Result<()> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push((id, Rc::new(callback)));
        id
    }

    /// Unsubscribes by id. Idempotent.
    ///
    /// Returns true if the observer was found and removed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let len_before = inner.observers.len();
        inner.observers.retain(|(observer_id, _)| *observer_id != id);
        inner.observers.len() < len_before
    }

    /// Returns the number of active observers.
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Delivers an event to every observer registered at this point.
    ///
    /// Every observer runs; the first error produced (if any) is returned
    /// to the caller after the sweep.
    pub fn emit(&self, event: &Event) -> Result<()> {
        // Snapshot so observers may (un)subscribe during delivery.
        let observers: Vec<ObserverFn> = self
            .inner
            .borrow()
            .observers
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        let mut first_error = None;
        for callback in observers {
            if let Err(err) = callback(event) {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Emits a value.
    pub fn next(&self, value: impl Into<Value>) -> Result<()> {
        self.emit(&Event::Next(value.into()))
    }

    /// Emits an error.
    pub fn error(&self, error: EmitError) -> Result<()> {
        self.emit(&Event::Error(error))
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("token", &self.token())
            .field("observers", &self.observer_count())
            .finish()
    }
}
