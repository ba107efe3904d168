//! Property-based tests for attribute change tracking.

use proptest::prelude::*;
use serde_json::{Map, Value};
use tessera_model::AttributeStore;

fn key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alpha", "beta", "gamma", "delta"]).prop_map(str::to_string)
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-3i64..3).prop_map(Value::from),
        "[a-c]{0,2}".prop_map(Value::from),
    ]
}

fn attributes() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::vec((key(), scalar()), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn sync_is_idempotent(defaults in attributes(), edits in attributes()) {
        let mut store = AttributeStore::new(defaults).unwrap();
        store.set_many(edits).unwrap();

        store.sync();
        prop_assert_eq!(store.attributes(), store.reference());
        prop_assert!(!store.any_changed());

        let snapshot = store.reference().clone();
        store.sync();
        prop_assert_eq!(store.reference(), &snapshot);
        prop_assert!(!store.any_changed());
    }

    #[test]
    fn reset_undoes_edits(defaults in attributes(), edits in attributes()) {
        let mut store = AttributeStore::new(defaults).unwrap();
        store.sync();
        let reference = store.reference().clone();

        store.set_many(edits).unwrap();
        store.reset();

        prop_assert_eq!(store.attributes(), &reference);
        prop_assert!(!store.any_changed());
    }

    #[test]
    fn mass_assign_equals_sequential_set(defaults in attributes(), edits in attributes()) {
        let mut mass = AttributeStore::new(defaults.clone()).unwrap();
        mass.set_many(edits.clone()).unwrap();

        let mut sequential = AttributeStore::new(defaults).unwrap();
        for (key, value) in edits {
            sequential.set(&key, value).unwrap();
        }

        prop_assert_eq!(mass.attributes(), sequential.attributes());
        prop_assert_eq!(
            mass.changed_attributes().collect::<Vec<_>>(),
            sequential.changed_attributes().collect::<Vec<_>>()
        );
    }

    #[test]
    fn changed_matches_reference_comparison(defaults in attributes(), edits in attributes()) {
        let mut store = AttributeStore::new(defaults).unwrap();
        store.set_many(edits).unwrap();

        for key in store.registered().map(str::to_string).collect::<Vec<_>>() {
            let differs = store.get(&key) != store.saved(&key);
            prop_assert_eq!(store.changed(&key), differs);
        }
    }
}
