//! Property-based tests for downward and upward propagation.
//!
//! These verify the structural invariants of a tick over randomly generated
//! composite values: decomposition assigns every present key to the
//! matching child, and aggregation replaces exactly the changed key in the
//! parent.

use arbor_state::{Action, StateStore, Value};
use proptest::prelude::*;

const KEYS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// Strategy for a random scalar payload.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

proptest! {
    /// Decomposition: after a composite write, every child whose key is
    /// present holds the sub-value; absent keys leave children untouched.
    #[test]
    fn children_match_composite_keys(
        entries in prop::collection::vec(proptest::option::of(scalar_strategy()), 4),
    ) {
        let store = StateStore::new();
        let parent = store.resolve("parent").unwrap();
        let mut seed = Value::Null;
        for key in KEYS {
            seed = seed.with_key(key, Value::Int(0));
        }
        parent.set_initial(seed).unwrap();
        let children: Vec<_> = KEYS
            .iter()
            .map(|key| store.resolve(&format!("parent.{key}")).unwrap())
            .collect();

        let set = Action::new();
        parent.hook_reducers(&[&set]).next(|_, payload| payload.clone());
        store.connect().unwrap();

        let mut composite = Value::Null;
        for (slot, entry) in entries.iter().enumerate() {
            if let Some(value) = entry {
                composite = composite.with_key(KEYS[slot], value.clone());
            }
        }
        set.emit(composite).unwrap();

        for (slot, entry) in entries.iter().enumerate() {
            match entry {
                Some(value) => {
                    let current = children[slot].value();
                    prop_assert_eq!(current.as_ref(), Some(value));
                }
                None => prop_assert_eq!(children[slot].value(), Some(Value::Int(0))),
            }
        }
    }

    /// Aggregation: one child changing via a hook yields a parent value
    /// equal to the previous one with exactly that key replaced.
    #[test]
    fn parent_replaces_exactly_one_key(
        seeds in prop::collection::vec(any::<i64>(), 4),
        target in 0usize..4,
        replacement in any::<i64>(),
    ) {
        let store = StateStore::new();
        for (slot, seed) in seeds.iter().enumerate() {
            store
                .resolve(&format!("parent.{}", KEYS[slot]))
                .unwrap()
                .set_initial(*seed)
                .unwrap();
        }
        let parent = store.resolve("parent").unwrap();
        let child = store.resolve(&format!("parent.{}", KEYS[target])).unwrap();

        let set = Action::new();
        child.hook_reducers(&[&set]).next(|_, payload| payload.clone());
        store.connect().unwrap();

        let before = parent.value().unwrap();
        set.emit(replacement).unwrap();

        prop_assert_eq!(
            parent.value(),
            Some(before.with_key(KEYS[target], Value::Int(replacement)))
        );
        prop_assert_eq!(child.value(), Some(Value::Int(replacement)));
    }

    /// Batching: however many children one emission changes, the parent
    /// emits at most once per tick.
    #[test]
    fn parent_emits_at_most_once_per_tick(
        entries in prop::collection::vec(scalar_strategy(), 1..4),
    ) {
        let store = StateStore::new();
        let parent = store.resolve("parent").unwrap();
        let mut seed = Value::Null;
        for key in KEYS {
            seed = seed.with_key(key, Value::Int(0));
        }
        parent.set_initial(seed).unwrap();
        for key in KEYS {
            store.resolve(&format!("parent.{key}")).unwrap();
        }

        let set = Action::new();
        parent.hook_reducers(&[&set]).next(move |current, payload| {
            let mut next = current.clone();
            let parts = match payload.as_list() {
                Some(parts) => parts.to_vec(),
                None => vec![payload.clone()],
            };
            for (slot, part) in parts.iter().enumerate() {
                next = next.with_key(KEYS[slot], part.clone());
            }
            next
        });
        store.connect().unwrap();

        let emissions = std::rc::Rc::new(std::cell::RefCell::new(0usize));
        let emissions_clone = emissions.clone();
        parent.subscribe(move |_| *emissions_clone.borrow_mut() += 1);
        let after_replay = *emissions.borrow();

        set.emit(Value::List(entries)).unwrap();
        prop_assert!(*emissions.borrow() <= after_replay + 1);
    }
}
