//! Attribute state and change tracking.
//!
//! The store keeps two snapshots of a record: `current` (what the caller has
//! edited) and `reference` (what was last synced). Every registered attribute
//! has a `changed` flag that is true iff its current and reference values
//! differ, and an error slot in the store's [`ErrorReport`].
//!
//! `reference` is only replaced by [`AttributeStore::sync`]; `current` is
//! only replaced wholesale by [`AttributeStore::reset`] and
//! [`AttributeStore::clear`].

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tessera_validator::path::Path;
use tessera_validator::value::is_truthy;
use tessera_validator::ErrorReport;
use tracing::{debug, trace};

use crate::error::{ModelError, Result};
use crate::mutation::Pipeline;

/// Names an attribute may not start with, because the model exposes them as
/// its own API. Names starting with `$` are reserved as well.
pub const RESERVED_NAMES: &[&str] = &[
    "assign",
    "attributes",
    "changed",
    "clear",
    "create",
    "defaults",
    "delete",
    "destroy",
    "errors",
    "fetch",
    "get",
    "mutate",
    "mutated",
    "mutations",
    "options",
    "pending",
    "reference",
    "reset",
    "save",
    "set",
    "sync",
    "update",
    "validate",
];

/// Whether `attribute` collides with the model API.
///
/// Only the first path segment matters: `address.reset` is fine, `reset.x`
/// is not.
pub fn is_reserved(attribute: &str) -> bool {
    match Path::parse(attribute).root() {
        Some(root) => root.is_empty() || root.starts_with('$') || RESERVED_NAMES.contains(&root),
        None => true,
    }
}

/// When mutation pipelines run implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationPolicy {
    /// On every `set`, before comparison and storage
    pub on_change: bool,
    /// On every `sync`, before the snapshot is taken
    pub before_sync: bool,
}

/// Current and reference attributes plus change and error bookkeeping.
///
/// # Examples
///
/// ```
/// use tessera_model::store::AttributeStore;
/// use serde_json::json;
///
/// let mut store = AttributeStore::new(json!({ "name": "Luke" }).as_object().unwrap().clone())?;
/// store.set("name", json!("Yoda"))?;
/// assert!(store.changed("name"));
///
/// store.set("name", json!("Luke"))?;
/// assert!(!store.changed("name"));
/// # Ok::<(), tessera_model::ModelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AttributeStore {
    current: Value,
    reference: Value,
    defaults: Value,
    changed: IndexMap<String, bool>,
    errors: ErrorReport,
    mutations: IndexMap<String, Pipeline>,
    policy: MutationPolicy,
}

impl AttributeStore {
    /// A synced store holding `defaults`, without mutations.
    pub fn new(defaults: Map<String, Value>) -> Result<Self> {
        Self::with_mutations(defaults, IndexMap::new(), MutationPolicy::default())
    }

    /// A synced store holding `defaults`, with per-attribute pipelines.
    pub fn with_mutations(
        defaults: Map<String, Value>,
        mutations: IndexMap<String, Pipeline>,
        policy: MutationPolicy,
    ) -> Result<Self> {
        let defaults = Value::Object(defaults);
        let mut store = Self {
            current: defaults.clone(),
            reference: defaults.clone(),
            defaults,
            changed: IndexMap::new(),
            errors: ErrorReport::new(),
            mutations,
            policy,
        };

        let keys: Vec<String> = store
            .defaults
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        for key in keys {
            store.register(&key)?;
        }
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Reads the current value at `path`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        Path::parse(path).get(&self.current)
    }

    /// Reads the current value at `path`, or `fallback` when absent.
    pub fn get_or<'a>(&'a self, path: &str, fallback: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(fallback)
    }

    /// Reads the last-synced value at `path`.
    pub fn saved(&self, path: &str) -> Option<&Value> {
        Path::parse(path).get(&self.reference)
    }

    /// The current record.
    pub fn attributes(&self) -> &Value {
        &self.current
    }

    /// The last-synced record.
    pub fn reference(&self) -> &Value {
        &self.reference
    }

    /// The default record.
    pub fn defaults(&self) -> &Value {
        &self.defaults
    }

    /// Registered attributes, in registration order.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.changed.keys().map(String::as_str)
    }

    /// Whether `attribute` has been registered.
    pub fn is_registered(&self, attribute: &str) -> bool {
        self.changed.contains_key(attribute)
    }

    /// The mutation pipeline of `attribute`, if any.
    pub fn pipeline(&self, attribute: &str) -> Option<&Pipeline> {
        self.mutations.get(attribute)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Registers an attribute: reserved-name check, `changed` flag and error
    /// slot. Registering twice is a no-op.
    pub fn register(&mut self, attribute: &str) -> Result<()> {
        if self.changed.contains_key(attribute) {
            return Ok(());
        }
        if is_reserved(attribute) {
            return Err(ModelError::ReservedAttribute(attribute.to_string()));
        }
        let changed = self.differs(attribute);
        self.changed.insert(attribute.to_string(), changed);
        self.errors.register(attribute);
        trace!(attribute, "registered attribute");
        Ok(())
    }

    /// Sets one attribute and returns the stored value.
    ///
    /// With the `on_change` policy the attribute's pipeline runs first. If
    /// the previous value is truthy and equal to the new one nothing is
    /// written and the previous value is returned.
    pub fn set(&mut self, path: &str, value: Value) -> Result<Value> {
        self.register(path)?;
        let value = if self.policy.on_change {
            self.mutated_value(path, value)
        } else {
            value
        };

        let path = Path::parse(path);
        if let Some(previous) = path.get(&self.current) {
            if is_truthy(Some(previous)) && *previous == value {
                return Ok(previous.clone());
            }
        }

        path.set(&mut self.current, value.clone())?;
        self.refresh_changed();
        trace!(attribute = %path, changed = self.changed(path.as_str()), "attribute set");
        Ok(value)
    }

    /// Sets every entry in iteration order and returns the input.
    ///
    /// Not atomic: a failing entry leaves earlier entries written.
    pub fn set_many(&mut self, attributes: Map<String, Value>) -> Result<Map<String, Value>> {
        for (key, value) in &attributes {
            self.set(key, value.clone())?;
        }
        Ok(attributes)
    }

    fn write(&mut self, attribute: &str, value: Value) -> Result<()> {
        Path::parse(attribute).set(&mut self.current, value)?;
        self.refresh_changed();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// What `value` becomes after `attribute`'s pipeline. Pure.
    pub fn mutated_value(&self, attribute: &str, value: Value) -> Value {
        match self.mutations.get(attribute) {
            Some(pipeline) => pipeline.apply(value),
            None => value,
        }
    }

    /// The mutated form of the current value of `attribute`. Pure.
    pub fn mutated(&self, attribute: &str) -> Option<Value> {
        self.get(attribute)
            .cloned()
            .map(|value| self.mutated_value(attribute, value))
    }

    /// The whole record with every pipeline applied to the value it
    /// addresses. Pure.
    pub fn mutated_all(&self) -> Value {
        let mut record = self.current.clone();
        apply_pipelines(&self.mutations, &mut record);
        record
    }

    /// Replaces the listed attributes with their mutated form.
    pub fn mutate(&mut self, attributes: &[&str]) -> Result<()> {
        for attribute in attributes {
            self.register(attribute)?;
            if let Some(value) = self.mutated(attribute) {
                self.write(attribute, value)?;
            }
        }
        Ok(())
    }

    /// Stores the mutated form of an explicit `value` for `attribute`.
    pub fn mutate_with(&mut self, attribute: &str, value: Value) -> Result<Value> {
        self.register(attribute)?;
        let value = self.mutated_value(attribute, value);
        self.write(attribute, value.clone())?;
        Ok(value)
    }

    /// Replaces every value a pipeline is declared for with its mutated
    /// form. Nested paths count even when only their parent was set.
    pub fn mutate_all(&mut self) {
        apply_pipelines(&self.mutations, &mut self.current);
        self.refresh_changed();
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Commits `current` as the new reference. Runs every pipeline first
    /// when the `before_sync` policy is set.
    pub fn sync(&mut self) {
        if self.policy.before_sync {
            self.mutate_all();
        }
        self.reference = self.current.clone();
        self.changed.values_mut().for_each(|changed| *changed = false);
        debug!(attributes = self.changed.len(), "synced attributes");
    }

    /// Discards unsynced edits. Every `changed` flag is recomputed, so all
    /// of them are false afterwards.
    pub fn reset(&mut self) {
        self.current = self.reference.clone();
        self.refresh_changed();
        debug!("reset attributes to reference");
    }

    /// Returns to the defaults, clearing every error and `changed` flag.
    pub fn clear(&mut self) {
        self.current = self.defaults.clone();
        self.reference = self.defaults.clone();
        self.changed.values_mut().for_each(|changed| *changed = false);
        self.errors.clear();
        debug!("cleared attributes to defaults");
    }

    // ------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------

    /// Whether `attribute` differs from its reference value.
    pub fn changed(&self, attribute: &str) -> bool {
        self.changed.get(attribute).copied().unwrap_or(false)
    }

    /// Whether any attribute differs from its reference value.
    pub fn any_changed(&self) -> bool {
        self.changed.values().any(|changed| *changed)
    }

    /// Attributes that currently differ from the reference.
    pub fn changed_attributes(&self) -> impl Iterator<Item = &str> {
        self.changed
            .iter()
            .filter(|(_, changed)| **changed)
            .map(|(attribute, _)| attribute.as_str())
    }

    fn differs(&self, attribute: &str) -> bool {
        let path = Path::parse(attribute);
        path.get(&self.current) != path.get(&self.reference)
    }

    // Nested paths overlap (`address` and `address.city`), so every flag is
    // recomputed after a write.
    fn refresh_changed(&mut self) {
        let flags: Vec<bool> = self.changed.keys().map(|key| self.differs(key)).collect();
        for (flag, changed) in self.changed.values_mut().zip(flags) {
            *flag = changed;
        }
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// The error report.
    pub fn errors(&self) -> &ErrorReport {
        &self.errors
    }

    /// Mutable access to the error report.
    pub fn errors_mut(&mut self) -> &mut ErrorReport {
        &mut self.errors
    }
}

// Pipelines run in declaration order; paths absent from `record` are skipped.
fn apply_pipelines(mutations: &IndexMap<String, Pipeline>, record: &mut Value) {
    for (attribute, pipeline) in mutations {
        if let Some(slot) = Path::parse(attribute.as_str()).get_mut(record) {
            *slot = pipeline.apply(std::mem::take(slot));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use tessera_validator::{ErrorContext, ErrorDescriptor, PathError};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn store(defaults: Value) -> AttributeStore {
        AttributeStore::new(object(defaults)).unwrap()
    }

    fn trimming(policy: MutationPolicy) -> AttributeStore {
        let mut mutations = IndexMap::new();
        mutations.insert("name".to_string(), Pipeline::new().then(mutation::trim));
        AttributeStore::with_mutations(object(json!({ "name": "" })), mutations, policy).unwrap()
    }

    #[test]
    fn change_tracking_follows_reference() {
        let mut store = store(json!({ "name": "Luke" }));
        store.set("name", json!("Yoda")).unwrap();
        assert!(store.changed("name"));
        assert!(store.any_changed());
        store.set("name", json!("Luke")).unwrap();
        assert!(!store.changed("name"));
        assert!(!store.any_changed());
    }

    #[test]
    fn sync_is_idempotent() {
        let mut store = store(json!({ "name": "Luke" }));
        store.set("age", json!(19)).unwrap();
        store.sync();
        let first = (store.attributes().clone(), store.reference().clone());
        assert!(!store.any_changed());
        store.sync();
        assert_eq!((store.attributes().clone(), store.reference().clone()), first);
        assert_eq!(store.attributes(), store.reference());
        assert!(!store.any_changed());
    }

    #[test]
    fn reset_undoes_edits_and_flags() {
        let mut store = store(json!({ "name": "Luke", "tags": ["a"] }));
        let reference = store.reference().clone();
        store.set("name", json!("Yoda")).unwrap();
        store.set("tags[1]", json!("b")).unwrap();
        store.reset();
        assert_eq!(store.attributes(), &reference);
        assert!(!store.any_changed());
    }

    #[test]
    fn mass_assign_equals_sequential_set() {
        let mut mass = store(json!({}));
        mass.set_many(object(json!({ "a": 1, "b": 2 }))).unwrap();

        let mut sequential = store(json!({}));
        sequential.set("a", json!(1)).unwrap();
        sequential.set("b", json!(2)).unwrap();

        assert_eq!(mass.attributes(), sequential.attributes());
        assert_eq!(
            mass.changed_attributes().collect::<Vec<_>>(),
            sequential.changed_attributes().collect::<Vec<_>>()
        );
        assert_eq!(mass.errors(), sequential.errors());
    }

    #[test]
    fn truthy_equal_set_is_a_no_op() {
        let mut store = store(json!({ "name": "Luke" }));
        store.set("name", json!("Yoda")).unwrap();
        // Manually desynchronise to observe that the flag is left alone.
        store.changed.insert("name".into(), false);
        assert_eq!(store.set("name", json!("Yoda")).unwrap(), json!("Yoda"));
        assert!(!store.changed("name"));
    }

    #[rstest]
    #[case(json!(null), json!(false))]
    #[case(json!(null), json!(0))]
    #[case(json!(""), json!(null))]
    fn falsy_previous_values_are_still_written(#[case] before: Value, #[case] after: Value) {
        let mut store = store(json!({ "flag": before }));
        store.set("flag", after.clone()).unwrap();
        assert_eq!(store.get("flag"), Some(&after));
        assert!(store.changed("flag"));
    }

    #[test]
    fn new_attributes_are_registered() {
        let mut store = store(json!({}));
        store.set("nickname", json!(null)).unwrap();
        assert!(store.is_registered("nickname"));
        assert!(store.errors().is_registered("nickname"));
        assert!(store.changed("nickname"));
    }

    #[test]
    fn nested_paths_create_containers_and_track_parents() {
        let mut store = store(json!({ "address": { "city": "Oslo" } }));
        store.set("address.city", json!("Bergen")).unwrap();
        store.set("geo.points[1]", json!(3)).unwrap();

        assert_eq!(store.get("address.city"), Some(&json!("Bergen")));
        assert_eq!(store.get("geo"), Some(&json!({ "points": [null, 3] })));
        assert!(store.changed("address"));
        assert!(store.changed("address.city"));
        assert_eq!(store.get_or("missing", &json!("x")), &json!("x"));
    }

    #[rstest]
    #[case("errors")]
    #[case("reset.deep")]
    #[case("$pending")]
    #[case("")]
    fn reserved_names_fail_fast(#[case] attribute: &str) {
        let mut store = store(json!({}));
        let err = store.set(attribute, json!(1)).unwrap_err();
        assert!(matches!(err, ModelError::ReservedAttribute(ref name) if name == attribute));
        assert!(store.attributes().as_object().unwrap().is_empty());
    }

    #[test]
    fn reserved_defaults_fail_at_construction() {
        assert!(AttributeStore::new(object(json!({ "save": true }))).is_err());
    }

    #[test]
    fn mutate_on_change_stores_mutated_value() {
        let mut store = trimming(MutationPolicy {
            on_change: true,
            before_sync: false,
        });
        assert_eq!(store.set("name", json!("  Luke ")).unwrap(), json!("Luke"));
        assert_eq!(store.get("name"), Some(&json!("Luke")));
    }

    #[test]
    fn mutated_is_pure_and_mutate_writes() {
        let mut store = trimming(MutationPolicy::default());
        store.set("name", json!(" Luke ")).unwrap();

        assert_eq!(store.mutated("name"), Some(json!("Luke")));
        assert_eq!(store.mutated_all(), json!({ "name": "Luke" }));
        assert_eq!(store.get("name"), Some(&json!(" Luke ")));

        store.mutate(&["name"]).unwrap();
        assert_eq!(store.get("name"), Some(&json!("Luke")));
        assert_eq!(store.mutate_with("name", json!(" Leia")).unwrap(), json!("Leia"));
    }

    #[test]
    fn sync_policy_mutates_before_snapshot() {
        let mut store = trimming(MutationPolicy {
            on_change: false,
            before_sync: true,
        });
        store.set("name", json!(" Luke ")).unwrap();
        store.sync();
        assert_eq!(store.reference(), &json!({ "name": "Luke" }));
        assert!(!store.any_changed());
    }

    #[test]
    fn nested_pipelines_run_when_the_parent_is_set() {
        let mut mutations = IndexMap::new();
        mutations.insert("address.city".to_string(), Pipeline::new().then(mutation::trim));
        let mut store = AttributeStore::with_mutations(
            Map::new(),
            mutations,
            MutationPolicy {
                on_change: false,
                before_sync: true,
            },
        )
        .unwrap();

        store.set("address", json!({ "city": "  Oslo  " })).unwrap();
        assert_eq!(store.mutated_all(), json!({ "address": { "city": "Oslo" } }));
        assert_eq!(store.get("address.city"), Some(&json!("  Oslo  ")));

        store.sync();
        assert_eq!(store.reference(), &json!({ "address": { "city": "Oslo" } }));
        assert!(!store.any_changed());
    }

    #[test]
    fn pipelines_skip_missing_paths() {
        let mut mutations = IndexMap::new();
        mutations.insert("address.city".to_string(), Pipeline::new().then(mutation::trim));
        let mut store = AttributeStore::with_mutations(
            object(json!({ "name": " Luke " })),
            mutations,
            MutationPolicy::default(),
        )
        .unwrap();

        store.mutate_all();
        assert_eq!(store.attributes(), &json!({ "name": " Luke " }));
    }

    #[test]
    fn oversized_indices_are_refused() {
        let mut store = store(json!({ "tags": [] }));
        let err = store
            .set("tags[18446744073709551615]", json!(1))
            .unwrap_err();
        assert!(matches!(err, ModelError::Path(PathError::IndexOutOfRange { .. })));
        assert_eq!(store.attributes(), &json!({ "tags": [] }));
        assert!(!store.any_changed());
    }

    #[test]
    fn clear_returns_to_defaults() {
        let mut store = store(json!({ "name": "" }));
        store.set("name", json!("Luke")).unwrap();
        store.set("age", json!(3)).unwrap();
        store.sync();
        let context = ErrorContext::new(json!({}), "name", None, &Map::new());
        store
            .errors_mut()
            .replace("name", vec![ErrorDescriptor::new("presence", context)]);
        store.clear();

        assert_eq!(store.attributes(), &json!({ "name": "" }));
        assert_eq!(store.reference(), &json!({ "name": "" }));
        assert!(!store.any_changed());
        assert!(store.errors().none());
    }
}
