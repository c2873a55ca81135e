//! The propagation engine.
//!
//! One external subject emission is one tick. A tick evaluates every hook
//! bound to the firing subject (registration order, sequential fold per
//! node), stages all resulting writes in a buffer, decomposes composites
//! downward, fires hooks listening to staged node streams (at most once per
//! hook per tick), aggregates upward so every affected ancestor settles
//! exactly once, and only then commits and notifies. Subscribers never see
//! a half-applied tick: a handler panic unwinds before the commit phase.
//!
//! Re-entrant emissions (a handler or subscriber firing a trigger
//! synchronously) nest up to `MAX_TICK_DEPTH`; past that the emitting call
//! gets `Error::TickOverflow` instead of unbounded recursion.

use crate::hook::{Hook, TriggerId};
use crate::node::{NodeRef, ObserverFn};
use crate::store::TreeShared;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use arbor_core::{Error, Path, Result, Value};
use arbor_reactive::Event;
use core::cell::RefCell;
use hashbrown::{HashMap, HashSet};

/// Bound on nested ticks; exceeding it is a hook-cycle caller error.
pub(crate) const MAX_TICK_DEPTH: usize = 64;

struct StagedNode {
    cell: NodeRef,
    value: Value,
}

/// Per-tick write buffer. Values settle here and reach the cells only in
/// the commit phase, as one write and one emission per affected node.
struct TickBuffer {
    staged: HashMap<Path, StagedNode>,
    /// First-staging order; commit and notification follow it.
    order: Vec<Path>,
    /// Nodes written by a hook this tick; decomposition never overwrites
    /// them (one write source wins per node per tick).
    direct: HashSet<Path>,
}

impl TickBuffer {
    fn new() -> Self {
        Self {
            staged: HashMap::new(),
            order: Vec::new(),
            direct: HashSet::new(),
        }
    }

    fn stage(&mut self, cell: &NodeRef, path: Path, value: Value, direct: bool) {
        if direct {
            self.direct.insert(path.clone());
        }
        match self.staged.get_mut(&path) {
            Some(entry) => entry.value = value,
            None => {
                self.staged.insert(
                    path.clone(),
                    StagedNode {
                        cell: cell.clone(),
                        value,
                    },
                );
                self.order.push(path);
            }
        }
    }

    fn staged_value(&self, path: &Path) -> Option<&Value> {
        self.staged.get(path).map(|entry| &entry.value)
    }

    fn contains(&self, path: &Path) -> bool {
        self.staged.contains_key(path)
    }

    fn is_direct(&self, path: &Path) -> bool {
        self.direct.contains(path)
    }

    /// The value a hook on this node sees mid-tick: staged if present,
    /// committed otherwise (Null for uninitialized nodes).
    fn current_value(&self, cell: &NodeRef) -> Value {
        let node = cell.borrow();
        match self.staged_value(&node.path) {
            Some(value) => value.clone(),
            None => node.value.clone(),
        }
    }

    /// Staged-or-committed value, None while uninitialized and unstaged.
    fn effective(&self, cell: &NodeRef) -> Option<Value> {
        let node = cell.borrow();
        if let Some(value) = self.staged_value(&node.path) {
            return Some(value.clone());
        }
        if node.initialized {
            Some(node.value.clone())
        } else {
            None
        }
    }
}

/// Dispatches one subject emission as one tick.
///
/// Emissions before `connect()` are dropped: no tick occurs.
pub(crate) fn run_tick(
    shared: &Rc<RefCell<TreeShared>>,
    trigger: TriggerId,
    event: &Event,
) -> Result<()> {
    if !shared.borrow().connected {
        return Ok(());
    }
    let _depth = DepthGuard::enter(shared)?;
    tick_inner(shared, trigger, event)
}

/// Seeds one node post-connect (`set_initial` on a live tree) as one tick.
pub(crate) fn run_seed(
    shared: &Rc<RefCell<TreeShared>>,
    cell: &NodeRef,
    value: Value,
) -> Result<()> {
    let _depth = DepthGuard::enter(shared)?;
    seed_inner(shared, cell, value)
}

/// The connect-time seeding pass: every explicit initial value decomposes
/// downward (explicit child seeds win over their parent's key), every node
/// with initialized children aggregates upward, and hooks listening to
/// seeded node streams fire. One settled tree, one emission per node whose
/// value was introduced or changed.
pub(crate) fn run_connect(shared: &Rc<RefCell<TreeShared>>) -> Result<()> {
    let _depth = DepthGuard::enter(shared)?;
    connect_inner(shared)
}

/// Holds one unit of tick-depth for the duration of a tick.
///
/// The counter is restored in `Drop`, so it unwinds together with the tick
/// when a handler panics; no borrow is held while handlers run, which keeps
/// the decrement safe on that path too.
struct DepthGuard {
    shared: Rc<RefCell<TreeShared>>,
}

impl DepthGuard {
    fn enter(shared: &Rc<RefCell<TreeShared>>) -> Result<Self> {
        {
            let mut sh = shared.borrow_mut();
            if sh.depth >= MAX_TICK_DEPTH {
                return Err(Error::tick_overflow(MAX_TICK_DEPTH));
            }
            sh.depth += 1;
        }
        Ok(Self {
            shared: shared.clone(),
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.shared.borrow_mut().depth -= 1;
    }
}

fn tick_inner(
    shared: &Rc<RefCell<TreeShared>>,
    trigger: TriggerId,
    event: &Event,
) -> Result<()> {
    let nodes: Vec<NodeRef> = {
        let sh = shared.borrow();
        sh.hooked_subjects
            .get(&trigger)
            .map(|nodes| nodes.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    };

    let mut tick = TickBuffer::new();
    for cell in &nodes {
        let (path, hooks): (Path, Vec<Rc<Hook>>) = {
            let node = cell.borrow();
            (
                node.path.clone(),
                node.hooks
                    .iter()
                    .filter(|hook| hook.has_subject(trigger))
                    .cloned()
                    .collect(),
            )
        };
        for hook in hooks {
            let current = tick.current_value(cell);
            let next = match event {
                Event::Next(value) => {
                    hook.record(trigger, value);
                    let payload = match hook.payload(|p| lookup_value(shared, &tick, p)) {
                        Some(payload) => payload,
                        None => continue, // gate incomplete
                    };
                    match hook.fire_next(&current, &payload) {
                        Some(next) => next,
                        None => continue,
                    }
                }
                Event::Error(error) => match hook.fire_error(&current, error) {
                    // No error handler: the value stays unchanged and the
                    // tick still settles.
                    Some(next) => next,
                    None => continue,
                },
            };
            tick.stage(cell, path.clone(), next, true);
        }
    }

    let origins = tick.order.clone();
    settle(shared, &mut tick, origins)?;
    commit(tick);
    Ok(())
}

fn seed_inner(shared: &Rc<RefCell<TreeShared>>, cell: &NodeRef, value: Value) -> Result<()> {
    let mut tick = TickBuffer::new();
    let path = cell.borrow().path.clone();
    tick.stage(cell, path.clone(), value, true);
    settle(shared, &mut tick, alloc::vec![path])?;
    commit(tick);
    Ok(())
}

fn connect_inner(shared: &Rc<RefCell<TreeShared>>) -> Result<()> {
    let root = shared.borrow().root.clone();
    let mut tick = TickBuffer::new();
    seed_down(&mut tick, &root);
    seed_up(&mut tick, &root);
    settle(shared, &mut tick, Vec::new())?;
    commit(tick);
    Ok(())
}

/// Drives staged writes to a settled tree: decompose pending writes,
/// aggregate everything staged, fire derived hooks, repeat until no hook
/// produces a new write. Each hook fires at most once per tick.
fn settle(
    shared: &Rc<RefCell<TreeShared>>,
    tick: &mut TickBuffer,
    mut pending: Vec<Path>,
) -> Result<()> {
    let mut fired: HashSet<usize> = HashSet::new();
    let mut rounds = 0usize;
    loop {
        rounds += 1;
        if rounds > MAX_TICK_DEPTH {
            return Err(Error::tick_overflow(MAX_TICK_DEPTH));
        }
        for path in &pending {
            decompose(tick, path);
        }
        aggregate(tick);
        pending = fire_derived(shared, tick, &mut fired)?;
        if pending.is_empty() {
            return Ok(());
        }
    }
}

/// Downward propagation: splits a staged composite into its materialized
/// children by key, recursively. Partial, not destructive — absent keys
/// leave children untouched; unchanged subtrees are pruned; hook-written
/// children are never overwritten.
fn decompose(tick: &mut TickBuffer, path: &Path) {
    let (cell, value) = match tick.staged.get(path) {
        Some(entry) => (entry.cell.clone(), entry.value.clone()),
        None => return,
    };
    decompose_into(tick, &cell, &value);
}

fn decompose_into(tick: &mut TickBuffer, cell: &NodeRef, value: &Value) {
    let map = match value.as_map() {
        Some(map) => map,
        None => return,
    };
    let children: Vec<(String, NodeRef)> = cell
        .borrow()
        .children
        .iter()
        .map(|(segment, child)| (segment.clone(), child.clone()))
        .collect();
    for (segment, child) in children {
        let sub = match map.get(&segment) {
            Some(sub) => sub.clone(),
            None => continue,
        };
        let child_path = child.borrow().path.clone();
        if tick.is_direct(&child_path) {
            continue;
        }
        if tick.effective(&child) == Some(sub.clone()) {
            continue;
        }
        tick.stage(&child, child_path, sub.clone(), false);
        decompose_into(tick, &child, &sub);
    }
}

/// Upward propagation: folds every staged node into its ancestors,
/// deepest-first, so each affected ancestor settles exactly once per tick
/// no matter how many descendants changed.
fn aggregate(tick: &mut TickBuffer) {
    let max_depth = match tick.order.iter().map(Path::depth).max() {
        Some(depth) if depth > 0 => depth,
        _ => return,
    };
    let mut levels: Vec<Vec<Path>> = alloc::vec![Vec::new(); max_depth + 1];
    let mut queued: HashSet<Path> = HashSet::new();
    for path in &tick.order {
        if !path.is_root() && queued.insert(path.clone()) {
            levels[path.depth()].push(path.clone());
        }
    }

    for depth in (1..=max_depth).rev() {
        let paths = levels[depth].clone();
        for path in paths {
            let (cell, child_value) = match tick.staged.get(&path) {
                Some(entry) => (entry.cell.clone(), entry.value.clone()),
                None => continue,
            };
            let parent_cell = match cell.borrow().parent.upgrade() {
                Some(parent) => parent,
                None => continue,
            };
            let key = match path.key() {
                Some(key) => String::from(key),
                None => continue,
            };
            let parent_path = cell
                .borrow()
                .path
                .parent()
                .unwrap_or_else(Path::root);

            let parent_current = tick.effective(&parent_cell);
            let base = parent_current.clone().unwrap_or(Value::Null);
            let parent_next = base.with_key(key, child_value);
            if parent_current.as_ref() == Some(&parent_next) {
                continue;
            }
            tick.stage(&parent_cell, parent_path.clone(), parent_next, false);
            if !parent_path.is_root() && queued.insert(parent_path.clone()) {
                levels[depth - 1].push(parent_path);
            }
        }
    }
}

/// Fires hooks whose node-stream triggers intersect the staged set.
/// Returns the paths their handlers wrote.
fn fire_derived(
    shared: &Rc<RefCell<TreeShared>>,
    tick: &mut TickBuffer,
    fired: &mut HashSet<usize>,
) -> Result<Vec<Path>> {
    let listeners: Vec<NodeRef> = {
        let sh = shared.borrow();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut listeners = Vec::new();
        for path in &tick.order {
            if let Some(nodes) = sh.hooked_paths.get(path) {
                for weak in nodes {
                    if let Some(cell) = weak.upgrade() {
                        if seen.insert(Rc::as_ptr(&cell) as usize) {
                            listeners.push(cell);
                        }
                    }
                }
            }
        }
        listeners
    };

    let mut written = Vec::new();
    for cell in listeners {
        let (path, hooks): (Path, Vec<Rc<Hook>>) = {
            let node = cell.borrow();
            (node.path.clone(), node.hooks.clone())
        };
        for hook in hooks {
            let key = Rc::as_ptr(&hook) as usize;
            if fired.contains(&key) {
                continue;
            }
            if !hook.listens_to(|p| tick.contains(p)) {
                continue;
            }
            let current = tick.current_value(&cell);
            let payload = match hook.payload(|p| lookup_value(shared, tick, p)) {
                Some(payload) => payload,
                // Gate incomplete; the hook stays eligible for a later
                // round of this tick, once its missing input settles.
                None => continue,
            };
            if let Some(next) = hook.fire_next(&current, &payload) {
                fired.insert(key);
                tick.stage(&cell, path.clone(), next, true);
                written.push(path.clone());
            }
        }
    }
    Ok(written)
}

/// Commits staged values and notifies, in first-staging order. All cells
/// are written before any subscriber runs, so observers only ever see the
/// fully settled tree.
fn commit(tick: TickBuffer) {
    let mut notifications: Vec<(Vec<ObserverFn>, Value)> = Vec::new();
    for path in &tick.order {
        if let Some(entry) = tick.staged.get(path) {
            let mut node = entry.cell.borrow_mut();
            node.value = entry.value.clone();
            node.initialized = true;
            let observers = node.observer_snapshot();
            if !observers.is_empty() {
                notifications.push((observers, entry.value.clone()));
            }
        }
    }
    for (observers, value) in notifications {
        for callback in observers {
            callback(&value);
        }
    }
}

/// Reads a node's mid-tick value by path: staged first, committed second.
/// None while the node is missing or uninitialized.
fn lookup_value(
    shared: &Rc<RefCell<TreeShared>>,
    tick: &TickBuffer,
    path: &Path,
) -> Option<Value> {
    if let Some(value) = tick.staged_value(path) {
        return Some(value.clone());
    }
    let mut cell = shared.borrow().root.clone();
    for segment in path.segments() {
        let next = cell.borrow().children.get(segment.as_str()).cloned();
        match next {
            Some(child) => cell = child,
            None => return None,
        }
    }
    let node = cell.borrow();
    if node.initialized {
        Some(node.value.clone())
    } else {
        None
    }
}

/// Connect-time top-down pass: initialized composites assign sub-values to
/// uninitialized materialized children; explicitly seeded children keep
/// their own value.
fn seed_down(tick: &mut TickBuffer, cell: &NodeRef) {
    let children: Vec<(String, NodeRef)> = cell
        .borrow()
        .children
        .iter()
        .map(|(segment, child)| (segment.clone(), child.clone()))
        .collect();
    if let Some(value) = tick.effective(cell) {
        if let Some(map) = value.as_map() {
            for (segment, child) in &children {
                if child.borrow().initialized || tick.contains(&child.borrow().path) {
                    continue;
                }
                if let Some(sub) = map.get(segment) {
                    let child_path = child.borrow().path.clone();
                    tick.stage(child, child_path, sub.clone(), false);
                }
            }
        }
    }
    for (_, child) in &children {
        seed_down(tick, child);
    }
}

/// Connect-time bottom-up pass: folds initialized children into their
/// parents. Returns the node's effective value after seeding.
fn seed_up(tick: &mut TickBuffer, cell: &NodeRef) -> Option<Value> {
    let children: Vec<(String, NodeRef)> = cell
        .borrow()
        .children
        .iter()
        .map(|(segment, child)| (segment.clone(), child.clone()))
        .collect();
    let mut folded: Vec<(String, Value)> = Vec::new();
    for (segment, child) in &children {
        if let Some(value) = seed_up(tick, child) {
            folded.push((segment.clone(), value));
        }
    }

    let current = tick.effective(cell);
    if folded.is_empty() {
        return current;
    }
    let mut next = current.clone().unwrap_or(Value::Null);
    for (segment, value) in folded {
        next = next.with_key(segment, value);
    }
    if current.as_ref() != Some(&next) {
        let path = cell.borrow().path.clone();
        tick.stage(cell, path, next.clone(), false);
    }
    Some(next)
}
