//! Arbor State - a hierarchical reactive state container.
//!
//! State lives in a tree of named nodes, materialized lazily by path
//! resolution. Nodes change only through reducer hooks bound to trigger
//! streams; the propagation engine batches every consequence of one
//! emission into a single tick:
//!
//! - `StateStore`: owns the tree; `connect()` seeds it and arms the engine
//! - `NodeHandle`: addresses one node (resolve / subscribe / hook_reducers)
//! - `ReducerBinder`: binds `next` / `error` reducers to a trigger set
//! - the engine: stages writes, decomposes composites downward, aggregates
//!   upward, fires node-stream hooks, then commits with exactly one
//!   emission per affected node
//!
//! # Example
//!
//! ```ignore
//! use arbor_state::{Action, StateStore, Value};
//!
//! let store = StateStore::new();
//! let counter = store.resolve("app.counter")?;
//! counter.set_initial(0i64)?;
//!
//! let increment = Action::new();
//! counter
//!     .hook_reducers(&[&increment])
//!     .next(|current, _| Value::Int(current.as_i64().unwrap_or(0) + 1));
//!
//! counter.subscribe(|value| { /* render */ });
//! store.connect()?;
//! increment.emit(())?;
//! ```

#![no_std]

extern crate alloc;

mod engine;
mod hook;
mod node;
mod store;

pub use hook::ReducerBinder;
pub use node::{NodeHandle, SubscriptionId};
pub use store::StateStore;

pub use arbor_core::{Error, Path, Result, Value, ValueMap};
pub use arbor_reactive::{
    Action, ActionBuilder, EmitError, Event, Subject, Trigger, TriggerSource,
};
