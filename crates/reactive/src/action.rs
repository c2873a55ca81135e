//! Named, triggerable event sources.
//!
//! An `Action` wraps a `Subject` behind a transform pipeline: emissions pass
//! through each stage in declaration order before any observer (and so any
//! hook) sees them. `filter` and `distinct_until_changed` stages may suppress
//! an emission entirely.
//!
//! Actions hold no reference to any tree node; their only coupling to the
//! rest of the system is producing subject emissions.

use crate::event::EmitError;
use crate::subject::Subject;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use arbor_core::{Result, Value};
use core::cell::RefCell;
use core::fmt;

enum Transform {
    Map(Box<dyn Fn(Value) -> Value>),
    Filter(Box<dyn Fn(&Value) -> bool>),
    /// Suppresses emissions equal to the previous one that got through.
    Distinct(RefCell<Option<Value>>),
}

/// A named, triggerable event source with a transform pipeline.
#[derive(Clone)]
pub struct Action {
    name: Option<String>,
    subject: Subject,
    transforms: Rc<Vec<Transform>>,
}

impl Default for Action {
    fn default() -> Self {
        Self::new()
    }
}

impl Action {
    /// Creates an action with no transforms.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building an action with a transform pipeline.
    pub fn builder() -> ActionBuilder {
        ActionBuilder {
            name: None,
            transforms: Vec::new(),
        }
    }

    /// Returns the action's name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the post-transform subject hooks observe.
    #[inline]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Emits a value through the transform pipeline.
    ///
    /// Returns `Ok(())` when a stage suppresses the emission. An `Err` is a
    /// downstream engine error (e.g. the tick-depth guard), reported here so
    /// the misusing call site sees it.
    pub fn emit(&self, value: impl Into<Value>) -> Result<()> {
        let mut value = value.into();
        for transform in self.transforms.iter() {
            match transform {
                Transform::Map(f) => value = f(value),
                Transform::Filter(predicate) => {
                    if !predicate(&value) {
                        return Ok(());
                    }
                }
                Transform::Distinct(last) => {
                    let mut last = last.borrow_mut();
                    if last.as_ref() == Some(&value) {
                        return Ok(());
                    }
                    *last = Some(value.clone());
                }
            }
        }
        self.subject.next(value)
    }

    /// Emits an error. Errors bypass the transform pipeline.
    pub fn emit_error(&self, message: impl Into<String>) -> Result<()> {
        self.subject.error(EmitError::new(message))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

/// Builder for `Action` transform pipelines.
pub struct ActionBuilder {
    name: Option<String>,
    transforms: Vec<Transform>,
}

impl ActionBuilder {
    /// Names the action (used in `Debug` output only).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a mapping stage.
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.transforms.push(Transform::Map(Box::new(f)));
        self
    }

    /// Appends a filtering stage; emissions failing the predicate are
    /// suppressed.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.transforms.push(Transform::Filter(Box::new(predicate)));
        self
    }

    /// Appends a deduplication stage: an emission equal to the previous one
    /// that passed this stage is suppressed.
    pub fn distinct_until_changed(mut self) -> Self {
        self.transforms.push(Transform::Distinct(RefCell::new(None)));
        self
    }

    /// Finishes the pipeline.
    pub fn build(self) -> Action {
        Action {
            name: self.name,
            subject: Subject::new(),
            transforms: Rc::new(self.transforms),
        }
    }
}
