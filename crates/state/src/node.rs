//! Tree nodes and the public node handle.
//!
//! A node is the atomic reactive cell: current value, initialized flag,
//! parent/children links, direct subscribers, and its ordered hook list.
//! Nodes are materialized lazily on first resolution and are append-only;
//! re-resolving a path always yields the same cell.

use crate::engine;
use crate::hook::{Hook, HookSource, ReducerBinder};
use crate::store::TreeShared;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use arbor_core::{Error, Path, Result, Value};
use arbor_reactive::{Subject, Trigger, TriggerSource};
use core::cell::RefCell;
use hashbrown::HashMap;

/// Unique identifier for one subscriber of a node's value stream.
pub type SubscriptionId = u64;

pub(crate) type NodeRef = Rc<RefCell<NodeCell>>;
pub(crate) type ObserverFn = Rc<dyn Fn(&Value)>;

pub(crate) struct NodeCell {
    pub(crate) path: Path,
    pub(crate) value: Value,
    pub(crate) initialized: bool,
    pub(crate) parent: Weak<RefCell<NodeCell>>,
    pub(crate) children: HashMap<String, NodeRef>,
    pub(crate) observers: Vec<(SubscriptionId, ObserverFn)>,
    pub(crate) next_observer_id: SubscriptionId,
    pub(crate) hooks: Vec<Rc<Hook>>,
}

impl NodeCell {
    pub(crate) fn new(path: Path, parent: Weak<RefCell<NodeCell>>) -> Self {
        Self {
            path,
            value: Value::Null,
            initialized: false,
            parent,
            children: HashMap::new(),
            observers: Vec::new(),
            next_observer_id: 1,
            hooks: Vec::new(),
        }
    }

    /// Snapshot of the observer callbacks, for notification outside any
    /// cell borrow.
    pub(crate) fn observer_snapshot(&self) -> Vec<ObserverFn> {
        self.observers
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect()
    }
}

/// A cheap-clone handle addressing one node of a state tree.
///
/// All handles resolved for the same path alias the same underlying cell.
#[derive(Clone)]
pub struct NodeHandle {
    pub(crate) cell: NodeRef,
    pub(crate) shared: Rc<RefCell<TreeShared>>,
}

impl NodeHandle {
    /// Returns this node's path from the root.
    pub fn path(&self) -> Path {
        self.cell.borrow().path.clone()
    }

    /// Returns the current value, or None while uninitialized.
    pub fn value(&self) -> Option<Value> {
        let node = self.cell.borrow();
        if node.initialized {
            Some(node.value.clone())
        } else {
            None
        }
    }

    /// Returns whether this node has received a value.
    pub fn is_initialized(&self) -> bool {
        self.cell.borrow().initialized
    }

    /// Returns the number of direct subscribers.
    pub fn observer_count(&self) -> usize {
        self.cell.borrow().observers.len()
    }

    /// Resolves a descendant by dot-delimited path suffix, creating missing
    /// nodes along the way with `initialized = false`.
    ///
    /// A freshly created child adopts the matching sub-value when its parent
    /// already holds an initialized composite. Requesting a deeper segment
    /// through an initialized non-composite value is a configuration error.
    pub fn resolve(&self, path: &str) -> Result<NodeHandle> {
        let suffix = Path::parse(path)?;
        let mut current = self.cell.clone();
        for segment in suffix.segments() {
            current = resolve_child(&current, segment)?;
        }
        Ok(NodeHandle {
            cell: current,
            shared: self.shared.clone(),
        })
    }

    /// Subscribes to this node's value stream.
    ///
    /// The current value is delivered synchronously when the node is
    /// initialized, followed by every settled tick value. The stream never
    /// completes or errors.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Value) + 'static,
    {
        let callback: ObserverFn = Rc::new(callback);
        let (id, replay) = {
            let mut node = self.cell.borrow_mut();
            let id = node.next_observer_id;
            node.next_observer_id += 1;
            node.observers.push((id, callback.clone()));
            let replay = if node.initialized {
                Some(node.value.clone())
            } else {
                None
            };
            (id, replay)
        };
        if let Some(value) = replay {
            callback(&value);
        }
        id
    }

    /// Unsubscribes by id. Idempotent; never affects other subscribers or
    /// an in-flight tick.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut node = self.cell.borrow_mut();
        let len_before = node.observers.len();
        node.observers.retain(|(sub_id, _)| *sub_id != id);
        node.observers.len() < len_before
    }

    /// Sets the node's initial value.
    ///
    /// Before the store is connected this only records the value and
    /// notifies direct subscribers. Once connected it runs one seeding tick
    /// settling this subtree and its ancestors.
    pub fn set_initial(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let connected = self.shared.borrow().connected;
        if connected {
            return engine::run_seed(&self.shared, &self.cell, value);
        }
        let observers = {
            let mut node = self.cell.borrow_mut();
            node.value = value.clone();
            node.initialized = true;
            node.observer_snapshot()
        };
        for callback in observers {
            callback(&value);
        }
        Ok(())
    }

    /// Starts binding reducers to a set of triggers.
    ///
    /// The returned binder appends one hook per `next`/`error` call; each
    /// hook fires once all of its subject triggers have emitted at least
    /// once and all of its node triggers are initialized.
    pub fn hook_reducers(&self, triggers: &[&dyn Trigger]) -> ReducerBinder {
        let mut sources = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            match trigger.source() {
                TriggerSource::Subject(subject) => {
                    sources.push(HookSource::Subject(self.register_subject(&subject)));
                }
                TriggerSource::Node(path) => sources.push(HookSource::Node(path)),
            }
        }
        ReducerBinder::new(self.clone(), sources)
    }

    /// Registers a subject with the tree, subscribing the engine dispatch
    /// exactly once per subject.
    fn register_subject(&self, subject: &Subject) -> crate::hook::TriggerId {
        let token = subject.token();
        if let Some(id) = self.shared.borrow().triggers.get(&token).copied() {
            return id;
        }
        let id = {
            let mut shared = self.shared.borrow_mut();
            let id = shared.next_trigger;
            shared.next_trigger += 1;
            shared.triggers.insert(token, id);
            id
        };
        let weak = Rc::downgrade(&self.shared);
        subject.subscribe(move |event| match weak.upgrade() {
            Some(shared) => engine::run_tick(&shared, id, event),
            None => Ok(()),
        });
        id
    }
}

impl Trigger for NodeHandle {
    fn source(&self) -> TriggerSource {
        TriggerSource::Node(self.path())
    }
}

/// Returns the child cell for `segment`, creating it when missing.
fn resolve_child(cell: &NodeRef, segment: &str) -> Result<NodeRef> {
    let mut node = cell.borrow_mut();
    if let Some(child) = node.children.get(segment) {
        return Ok(child.clone());
    }
    if node.initialized && !node.value.is_composite() {
        return Err(Error::not_composite(node.path.to_string(), segment));
    }
    let mut child = NodeCell::new(node.path.child(segment), Rc::downgrade(cell));
    if let Some(sub) = node.value.get(segment) {
        child.value = sub.clone();
        child.initialized = true;
    }
    let child_ref = Rc::new(RefCell::new(child));
    node.children.insert(segment.to_string(), child_ref.clone());
    Ok(child_ref)
}

#[cfg(test)]
mod tests {
    use crate::store::StateStore;
    use alloc::rc::Rc;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use arbor_core::{Error, Value};
    use core::cell::RefCell;

    #[test]
    fn test_resolve_is_stable() {
        let store = StateStore::new();
        let a = store.resolve("todos.list").unwrap();
        let b = store.resolve("todos").unwrap().resolve("list").unwrap();

        assert!(Rc::ptr_eq(&a.cell, &b.cell));
        assert_eq!(a.path().to_string(), "todos.list");
    }

    #[test]
    fn test_resolve_creates_uninitialized() {
        let store = StateStore::new();
        let node = store.resolve("a.b.c").unwrap();

        assert!(!node.is_initialized());
        assert_eq!(node.value(), None);
    }

    #[test]
    fn test_resolve_adopts_parent_sub_value() {
        let store = StateStore::new();
        let todos = store.resolve("todos").unwrap();
        todos
            .set_initial(Value::map([("list", Value::List(Vec::new()))]))
            .unwrap();

        let list = store.resolve("todos.list").unwrap();
        assert!(list.is_initialized());
        assert_eq!(list.value(), Some(Value::List(Vec::new())));

        // A key the composite lacks stays uninitialized.
        let missing = store.resolve("todos.filter").unwrap();
        assert!(!missing.is_initialized());
    }

    #[test]
    fn test_resolve_through_scalar_is_error() {
        let store = StateStore::new();
        let counter = store.resolve("counter").unwrap();
        counter.set_initial(0i64).unwrap();

        let result = store.resolve("counter.digits");
        assert_eq!(
            result.err(),
            Some(Error::not_composite("counter", "digits"))
        );
    }

    #[test]
    fn test_subscribe_replays_latest() {
        let store = StateStore::new();
        let counter = store.resolve("counter").unwrap();
        counter.set_initial(7i64).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        counter.subscribe(move |value| seen_clone.borrow_mut().push(value.clone()));

        assert_eq!(*seen.borrow(), alloc::vec![Value::Int(7)]);
    }

    #[test]
    fn test_subscribe_uninitialized_delivers_nothing() {
        let store = StateStore::new();
        let node = store.resolve("pending").unwrap();

        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        node.subscribe(move |_| *count_clone.borrow_mut() += 1);

        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_unsubscribe_idempotent() {
        let store = StateStore::new();
        let node = store.resolve("counter").unwrap();

        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        let id = node.subscribe(move |_| *count_clone.borrow_mut() += 1);

        assert!(node.unsubscribe(id));
        assert!(!node.unsubscribe(id));

        node.set_initial(1i64).unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_set_initial_before_connect_notifies_direct_subscribers() {
        let store = StateStore::new();
        let node = store.resolve("counter").unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        node.subscribe(move |value| seen_clone.borrow_mut().push(value.clone()));

        node.set_initial(3i64).unwrap();
        assert_eq!(*seen.borrow(), alloc::vec![Value::Int(3)]);
    }
}
