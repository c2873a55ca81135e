//! Reducer hooks and the binder returned by `hook_reducers`.
//!
//! A hook binds a trigger set to at most one next-handler or one
//! error-handler. Registration is additive only; there is no unhook.
//! Multi-trigger hooks gate combine-latest style: the handler fires only
//! once every subject trigger has emitted at least once and every node
//! trigger is initialized.

use crate::node::NodeHandle;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use arbor_core::{Path, Value};
use arbor_reactive::{EmitError, Trigger};
use core::cell::RefCell;

/// Identifier assigned by the tree to each distinct trigger subject.
pub(crate) type TriggerId = u64;

/// One source feeding a hook.
#[derive(Clone, Debug)]
pub(crate) enum HookSource {
    /// An external subject, identified by the tree's trigger table.
    Subject(TriggerId),
    /// Another node's value stream, addressed by path.
    Node(Path),
}

type NextHandler = Box<dyn Fn(&Value, &Value) -> Value>;
type ErrorHandler = Box<dyn Fn(&Value, &EmitError) -> Value>;

pub(crate) struct Hook {
    sources: Vec<HookSource>,
    /// Latest payload per subject source; entries for node sources stay
    /// None and are read live at fire time instead.
    latest: RefCell<Vec<Option<Value>>>,
    next: Option<NextHandler>,
    error: Option<ErrorHandler>,
}

impl Hook {
    pub(crate) fn next_hook<F>(sources: Vec<HookSource>, handler: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + 'static,
    {
        let slots = sources.len();
        Self {
            sources,
            latest: RefCell::new(alloc::vec![None; slots]),
            next: Some(Box::new(handler)),
            error: None,
        }
    }

    pub(crate) fn error_hook<F>(sources: Vec<HookSource>, handler: F) -> Self
    where
        F: Fn(&Value, &EmitError) -> Value + 'static,
    {
        let slots = sources.len();
        Self {
            sources,
            latest: RefCell::new(alloc::vec![None; slots]),
            next: None,
            error: Some(Box::new(handler)),
        }
    }

    pub(crate) fn sources(&self) -> &[HookSource] {
        &self.sources
    }

    /// Returns true if `id` is one of this hook's subject sources.
    pub(crate) fn has_subject(&self, id: TriggerId) -> bool {
        self.sources
            .iter()
            .any(|source| matches!(source, HookSource::Subject(tid) if *tid == id))
    }

    /// Returns true if any node source satisfies `staged`.
    pub(crate) fn listens_to<F>(&self, staged: F) -> bool
    where
        F: Fn(&Path) -> bool,
    {
        self.sources
            .iter()
            .any(|source| matches!(source, HookSource::Node(path) if staged(path)))
    }

    /// Records the latest payload for every slot fed by `id`.
    pub(crate) fn record(&self, id: TriggerId, value: &Value) {
        let mut latest = self.latest.borrow_mut();
        for (slot, source) in self.sources.iter().enumerate() {
            if matches!(source, HookSource::Subject(tid) if *tid == id) {
                latest[slot] = Some(value.clone());
            }
        }
    }

    /// Assembles the handler payload, or None while the gate is incomplete.
    ///
    /// A single-source hook receives the bare value; a multi-source hook
    /// receives a `Value::List` of the latest value per source, in
    /// declaration order.
    pub(crate) fn payload<F>(&self, node_value: F) -> Option<Value>
    where
        F: Fn(&Path) -> Option<Value>,
    {
        let latest = self.latest.borrow();
        let mut parts = Vec::with_capacity(self.sources.len());
        for (slot, source) in self.sources.iter().enumerate() {
            match source {
                HookSource::Subject(_) => match &latest[slot] {
                    Some(value) => parts.push(value.clone()),
                    None => return None,
                },
                HookSource::Node(path) => match node_value(path) {
                    Some(value) => parts.push(value),
                    None => return None,
                },
            }
        }
        if parts.len() == 1 {
            parts.pop()
        } else {
            Some(Value::List(parts))
        }
    }

    /// Invokes the next-handler, or None when this hook has none.
    pub(crate) fn fire_next(&self, current: &Value, payload: &Value) -> Option<Value> {
        self.next.as_ref().map(|handler| handler(current, payload))
    }

    /// Invokes the error-handler, or None when this hook has none —
    /// in which case the node's value is left unchanged for the tick.
    pub(crate) fn fire_error(&self, current: &Value, error: &EmitError) -> Option<Value> {
        self.error.as_ref().map(|handler| handler(current, error))
    }
}

/// Binder returned by `NodeHandle::hook_reducers`.
///
/// Each `next`/`error` call appends one hook bound to the binder's trigger
/// set and returns the binder for chaining; further trigger sets on the
/// same node go through another `hook_reducers` call.
pub struct ReducerBinder {
    node: NodeHandle,
    sources: Vec<HookSource>,
}

impl ReducerBinder {
    pub(crate) fn new(node: NodeHandle, sources: Vec<HookSource>) -> Self {
        Self { node, sources }
    }

    /// Appends a hook reducing trigger emissions into the node's value.
    pub fn next<F>(self, handler: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + 'static,
    {
        self.append(Hook::next_hook(self.sources.clone(), handler));
        self
    }

    /// Appends a hook reducing trigger errors into the node's value.
    pub fn error<F>(self, handler: F) -> Self
    where
        F: Fn(&Value, &EmitError) -> Value + 'static,
    {
        self.append(Hook::error_hook(self.sources.clone(), handler));
        self
    }

    /// Starts a new binder for an independent trigger set on the same node.
    pub fn hook_reducers(&self, triggers: &[&dyn Trigger]) -> ReducerBinder {
        self.node.hook_reducers(triggers)
    }

    fn append(&self, hook: Hook) {
        let hook = Rc::new(hook);
        self.node.cell.borrow_mut().hooks.push(hook.clone());

        let weak = Rc::downgrade(&self.node.cell);
        let mut shared = self.node.shared.borrow_mut();
        for source in hook.sources() {
            match source {
                HookSource::Subject(id) => {
                    let nodes = shared.hooked_subjects.entry(*id).or_default();
                    if !nodes.iter().any(|existing| existing.ptr_eq(&weak)) {
                        nodes.push(weak.clone());
                    }
                }
                HookSource::Node(path) => {
                    let nodes = shared.hooked_paths.entry(path.clone()).or_default();
                    if !nodes.iter().any(|existing| existing.ptr_eq(&weak)) {
                        nodes.push(weak.clone());
                    }
                }
            }
        }
    }
}
