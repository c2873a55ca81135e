//! Arbor Reactive - trigger stream primitives for the Arbor state tree.
//!
//! This crate implements the event sources the propagation engine consumes:
//!
//! - `Event` / `EmitError`: the payloads crossing the trigger boundary
//! - `Subject`: the observable primitive (subscribe / unsubscribe / emit)
//! - `Action`: a named, triggerable stream with a transform pipeline
//! - `Trigger`: the seam that lets subjects, actions and node streams all
//!   drive reducer hooks
//!
//! Everything here is single-threaded and `Rc`-shared; an emission is fully
//! delivered to every observer before control returns to the emitter.
//!
//! # Example
//!
//! ```ignore
//! use arbor_reactive::{Action, Event};
//!
//! let search = Action::builder()
//!     .name("search")
//!     .distinct_until_changed()
//!     .build();
//!
//! search.subject().subscribe(|event| {
//!     if let Event::Next(term) = event {
//!         // feed the term into a hook
//!     }
//!     Ok(())
//! });
//!
//! search.emit("rust")?;
//! search.emit("rust")?; // suppressed by distinct_until_changed
//! ```

#![no_std]

extern crate alloc;

mod action;
mod event;
mod subject;

pub use action::{Action, ActionBuilder};
pub use event::{EmitError, Event};
pub use subject::{ObserverId, Subject, SubjectToken};

use arbor_core::Path;

/// A source usable as a reducer hook trigger.
///
/// Implemented by `Subject` and `Action` (external emissions) and by the
/// state tree's node handles (a node's own value stream, addressed by path
/// within its owning tree).
pub trait Trigger {
    /// Returns the source this trigger contributes to a hook.
    fn source(&self) -> TriggerSource;
}

/// The concrete source behind a hook trigger.
#[derive(Clone, Debug)]
pub enum TriggerSource {
    /// An external subject emission drives the hook.
    Subject(Subject),
    /// A tree node's value stream drives the hook.
    Node(Path),
}

impl Trigger for Subject {
    fn source(&self) -> TriggerSource {
        TriggerSource::Subject(self.clone())
    }
}

impl Trigger for Action {
    fn source(&self) -> TriggerSource {
        TriggerSource::Subject(self.subject().clone())
    }
}
