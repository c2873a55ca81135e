//! The store owning a state tree.
//!
//! A `StateStore` holds the root node and the tree-wide bookkeeping every
//! handle shares: the trigger table mapping subjects to ids, the hook
//! registries the engine dispatches through, and the connect flag. The
//! store starts disconnected; resolution, seeding and hook registration
//! all work in that phase, but no tick runs until `connect()`.

use crate::engine;
use crate::hook::TriggerId;
use crate::node::{NodeCell, NodeHandle, NodeRef};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use arbor_core::{Path, Result};
use arbor_reactive::SubjectToken;
use core::cell::RefCell;
use hashbrown::HashMap;

/// Tree-wide state shared by every handle into one store.
pub(crate) struct TreeShared {
    pub(crate) root: NodeRef,
    pub(crate) connected: bool,
    /// Current tick nesting depth, bounded by the engine.
    pub(crate) depth: usize,
    pub(crate) triggers: HashMap<SubjectToken, TriggerId>,
    pub(crate) next_trigger: TriggerId,
    /// Nodes holding at least one hook on the given subject trigger.
    pub(crate) hooked_subjects: HashMap<TriggerId, Vec<Weak<RefCell<NodeCell>>>>,
    /// Nodes holding at least one hook on the given node stream.
    pub(crate) hooked_paths: HashMap<Path, Vec<Weak<RefCell<NodeCell>>>>,
}

/// A hierarchical reactive state container.
///
/// Dropping the store drops the whole tree; handles hold strong references
/// to their cells, but engine dispatch stops once the shared state is gone.
pub struct StateStore {
    shared: Rc<RefCell<TreeShared>>,
}

impl StateStore {
    /// Creates a disconnected store with an uninitialized root.
    pub fn new() -> Self {
        let root = Rc::new(RefCell::new(NodeCell::new(Path::root(), Weak::new())));
        let shared = TreeShared {
            root,
            connected: false,
            depth: 0,
            triggers: HashMap::new(),
            next_trigger: 1,
            hooked_subjects: HashMap::new(),
            hooked_paths: HashMap::new(),
        };
        Self {
            shared: Rc::new(RefCell::new(shared)),
        }
    }

    /// Returns a handle to the root node.
    pub fn root(&self) -> NodeHandle {
        NodeHandle {
            cell: self.shared.borrow().root.clone(),
            shared: self.shared.clone(),
        }
    }

    /// Resolves a node by dot-delimited path from the root, materializing
    /// missing nodes along the way.
    pub fn resolve(&self, path: &str) -> Result<NodeHandle> {
        self.root().resolve(path)
    }

    /// Returns whether `connect()` has run.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.shared.borrow().connected
    }

    /// Activates the tree.
    ///
    /// Runs one seeding pass over every materialized node: explicit initial
    /// values flow down into children (an explicitly seeded child keeps its
    /// own value), initialized children fold up into their parents, and
    /// hooks listening to seeded node streams fire. After this, trigger
    /// emissions run ticks; before it, they are dropped.
    ///
    /// Calling `connect()` again is a no-op.
    pub fn connect(&self) -> Result<()> {
        if self.shared.borrow().connected {
            return Ok(());
        }
        self.shared.borrow_mut().connected = true;
        engine::run_connect(&self.shared)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
