//! The model: attribute store, validator and HTTP lifecycle in one place.
//!
//! A [`ModelDefinition`] is built once per resource type with
//! [`ModelBuilder`] and shared between instances. A [`Model`] is one
//! resource instance bound to an [`HttpClient`].
//!
//! ```text
//! set ──► store (changed) ──► validate (mutated snapshot) ──► errors
//!                        └──► save ──► client.send ──► assign / sync
//! ```

use http::header::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tessera_validator::value::{is_nullish, type_name};
use tessera_validator::{
    ErrorReport, OptionError, Rule, RuleOptions, RuleRegistry, RuleSpec, Schema, Validator,
};
use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::transport::{Action, HttpClient, Request, Response};
use crate::merge::merge;
use crate::mutation::Pipeline;
use crate::options::ModelOptions;
use crate::store::{AttributeStore, MutationPolicy, is_reserved};
use crate::url;

// ============================================================================
// VALIDATE OPTIONS
// ============================================================================

/// What a validation pass covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Requested scope; `None` runs unscoped rules only
    pub scope: Option<String>,
    /// Attributes to validate; empty means the whole record
    pub attributes: Vec<String>,
}

impl ValidateOptions {
    /// The whole record, unscoped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a scope.
    #[must_use = "builder methods must be chained or built"]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Restricts the pass to `attribute`. May be called repeatedly.
    #[must_use = "builder methods must be chained or built"]
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }
}

// ============================================================================
// MODEL DEFINITION
// ============================================================================

/// Everything instances of one resource type share.
#[derive(Debug)]
pub struct ModelDefinition {
    defaults: Map<String, Value>,
    validator: Validator,
    mutations: IndexMap<String, Pipeline>,
    options: ModelOptions,
    headers: HeaderMap,
}

impl ModelDefinition {
    /// Starts a definition.
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    /// Default attributes.
    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    /// The compiled validation schema.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Model options.
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Builder for [`ModelDefinition`].
///
/// All configuration errors (unknown rules, bad rule options, reserved
/// attribute names, invalid headers) are reported by [`ModelBuilder::build`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    defaults: Map<String, Value>,
    schema: Schema,
    rules: RuleRegistry,
    mutations: IndexMap<String, Pipeline>,
    options: ModelOptions,
}

impl ModelBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one default attribute.
    #[must_use = "builder methods must be chained or built"]
    pub fn default_value(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(attribute.into(), value.into());
        self
    }

    /// Adds default attributes.
    #[must_use = "builder methods must be chained or built"]
    pub fn defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults.extend(defaults);
        self
    }

    /// Replaces the validation schema.
    #[must_use = "builder methods must be chained or built"]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Declares one validation rule.
    #[must_use = "builder methods must be chained or built"]
    pub fn validate(
        mut self,
        attribute: impl Into<String>,
        rule: impl Into<String>,
        spec: impl Into<RuleSpec>,
    ) -> Self {
        self.schema = self.schema.rule(attribute, rule, spec);
        self
    }

    /// Registers a custom rule factory. Shadows a built-in of the same name.
    #[must_use = "builder methods must be chained or built"]
    pub fn custom_rule<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RuleOptions) -> std::result::Result<Vec<Rule>, OptionError> + Send + Sync + 'static,
    {
        self.rules.register(name, factory);
        self
    }

    /// Registers a custom boolean rule.
    #[must_use = "builder methods must be chained or built"]
    pub fn custom_test<F>(mut self, name: impl Into<String>, test: F) -> Self
    where
        F: Fn(Option<&Value>, &Value, &str) -> bool + Send + Sync + 'static,
    {
        self.rules.register_test(name, test);
        self
    }

    /// Appends a mutation step for `attribute`.
    #[must_use = "builder methods must be chained or built"]
    pub fn mutation<F>(mut self, attribute: impl Into<String>, step: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.mutations.entry(attribute.into()).or_default().push(step);
        self
    }

    /// Replaces the pipeline of `attribute`.
    #[must_use = "builder methods must be chained or built"]
    pub fn pipeline(mut self, attribute: impl Into<String>, pipeline: Pipeline) -> Self {
        self.mutations.insert(attribute.into(), pipeline);
        self
    }

    /// Sets the model options.
    #[must_use = "builder methods must be chained or built"]
    pub fn options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the configuration and builds a shareable definition.
    pub fn build(self) -> Result<Arc<ModelDefinition>> {
        let declared = self
            .defaults
            .keys()
            .chain(self.mutations.keys())
            .map(String::as_str)
            .chain(self.schema.attributes());
        for attribute in declared {
            if is_reserved(attribute) {
                return Err(ModelError::ReservedAttribute(attribute.to_string()));
            }
        }

        let registry = RuleRegistry::defaults().merged(&self.rules);
        let validator = Validator::new(&registry, &self.schema)?;
        let headers = build_headers(&self.options.headers)?;

        debug!(
            defaults = self.defaults.len(),
            validated = self.schema.len(),
            mutated = self.mutations.len(),
            "built model definition"
        );
        Ok(Arc::new(ModelDefinition {
            defaults: self.defaults,
            validator,
            mutations: self.mutations,
            options: self.options,
            headers,
        }))
    }
}

fn build_headers(configured: &IndexMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(configured.len());
    for (name, value) in configured {
        let invalid = |reason: String| ModelError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

// ============================================================================
// PENDING STATE
// ============================================================================

/// Shared, observable "request in flight" flag of one model.
///
/// A request holds `&mut Model` while it is awaited, so callers that want
/// to watch it (a spinner, another future in the same `join!`) keep a clone
/// of this handle from [`Model::pending_state`].
#[derive(Debug, Clone, Default)]
pub struct PendingState(Arc<AtomicBool>);

impl PendingState {
    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn begin(&self) -> PendingGuard {
        self.0.store(true, Ordering::Release);
        PendingGuard(self.clone())
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

// Clears the flag when the request settles or its future is dropped.
struct PendingGuard(PendingState);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.reset();
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// One resource instance.
///
/// Lifecycle:
/// - `assign` merges attributes over the defaults and syncs, so the model
///   is clean afterwards
/// - `set` edits attributes and tracks changes against the last sync
/// - `validate` fills the error report from the mutated record
/// - `fetch`/`create`/`update`/`destroy` talk to the client; `pending` is
///   true while a request is in flight, and false again once it settles or
///   its future is dropped
///
/// Nothing here prevents overlapping requests from different callers.
#[derive(Debug)]
pub struct Model<C> {
    definition: Arc<ModelDefinition>,
    client: C,
    store: AttributeStore,
    pending: PendingState,
}

impl<C: HttpClient> Model<C> {
    /// A model holding the defaults.
    pub fn new(definition: Arc<ModelDefinition>, client: C) -> Result<Self> {
        Self::with_attributes(definition, client, Map::new())
    }

    /// A model holding `attributes` merged over the defaults.
    pub fn with_attributes(
        definition: Arc<ModelDefinition>,
        client: C,
        attributes: Map<String, Value>,
    ) -> Result<Self> {
        let options = definition.options();
        let policy = MutationPolicy {
            on_change: options.mutate_on_change,
            before_sync: options.mutate_before_sync,
        };
        let store = AttributeStore::with_mutations(
            definition.defaults.clone(),
            definition.mutations.clone(),
            policy,
        )?;

        let mut model = Self {
            definition,
            client,
            store,
            pending: PendingState::default(),
        };
        model.assign(attributes)?;
        Ok(model)
    }

    /// The shared definition.
    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.definition
    }

    /// The HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The attribute store.
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Reads an attribute.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.store.get(path)
    }

    /// Reads an attribute, or `fallback` when absent.
    pub fn get_or<'a>(&'a self, path: &str, fallback: &'a Value) -> &'a Value {
        self.store.get_or(path, fallback)
    }

    /// Sets an attribute and returns the stored value.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<Value> {
        self.store.set(path, value.into())
    }

    /// Sets several attributes in order.
    pub fn set_many(&mut self, attributes: Map<String, Value>) -> Result<Map<String, Value>> {
        self.store.set_many(attributes)
    }

    /// Merges `attributes` over the defaults, sets them and syncs.
    pub fn assign(&mut self, attributes: Map<String, Value>) -> Result<()> {
        let mut record = Value::Object(self.definition.defaults.clone());
        merge(&mut record, Value::Object(attributes));
        if let Value::Object(record) = record {
            self.store.set_many(record)?;
        }
        self.store.sync();
        debug!("assigned attributes");
        Ok(())
    }

    /// Commits the current attributes as the reference.
    pub fn sync(&mut self) {
        self.store.sync();
    }

    /// Discards unsynced edits.
    pub fn reset(&mut self) {
        self.store.reset();
    }

    /// Returns to the defaults and clears errors, changes and pending state.
    pub fn clear(&mut self) {
        self.store.clear();
        self.pending.reset();
    }

    /// Replaces the listed attributes with their mutated form.
    pub fn mutate(&mut self, attributes: &[&str]) -> Result<()> {
        self.store.mutate(attributes)
    }

    /// Replaces every attribute with its mutated form.
    pub fn mutate_all(&mut self) {
        self.store.mutate_all();
    }

    /// What `mutate` would store for `attribute`.
    pub fn mutated(&self, attribute: &str) -> Option<Value> {
        self.store.mutated(attribute)
    }

    /// The whole record as `mutate_all` would leave it.
    pub fn mutated_all(&self) -> Value {
        self.store.mutated_all()
    }

    /// Whether `attribute` differs from the last sync.
    pub fn changed(&self, attribute: &str) -> bool {
        self.store.changed(attribute)
    }

    /// Whether any attribute differs from the last sync.
    pub fn any_changed(&self) -> bool {
        self.store.any_changed()
    }

    /// Current attributes as JSON.
    pub fn to_json(&self) -> Value {
        self.store.attributes().clone()
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// The error report of the last validation.
    pub fn errors(&self) -> &ErrorReport {
        self.store.errors()
    }

    /// Whether the last validation found no errors.
    pub fn is_valid(&self) -> bool {
        self.store.errors().none()
    }

    /// Validates the whole record without a scope.
    pub fn validate(&mut self) -> bool {
        self.validate_with(&ValidateOptions::new())
    }

    /// Validates against the mutated record.
    ///
    /// A whole-record pass rebuilds the report. A pass over named attributes
    /// replaces only their slots. Returns whether the validated part passed.
    pub fn validate_with(&mut self, options: &ValidateOptions) -> bool {
        let record = self.store.mutated_all();
        let scope = options.scope.as_deref();
        let validator = &self.definition.validator;
        let errors = self.store.errors_mut();

        let valid = if options.attributes.is_empty() {
            let report = validator.validate_record(&record, scope);
            errors.clear();
            errors.absorb(report);
            errors.none()
        } else {
            for attribute in &options.attributes {
                let found = validator.validate_attribute(&record, attribute, scope);
                errors.replace(attribute.clone(), found);
            }
            options.attributes.iter().all(|attribute| errors.none_for(attribute))
        };

        debug!(?scope, valid, errors = errors.count(), "validated attributes");
        valid
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// A handle that observes [`Model::is_pending`] while a request holds
    /// the model.
    pub fn pending_state(&self) -> PendingState {
        self.pending.clone()
    }

    /// The identity attribute's value.
    pub fn identifier(&self) -> Option<&Value> {
        self.store.get(&self.definition.options.identifier)
    }

    /// Whether the model has no identity yet.
    pub fn is_new(&self) -> bool {
        is_nullish(self.identifier())
    }

    /// The resolved URL for `action`.
    pub fn url(&self, action: Action) -> Result<String> {
        self.definition
            .options
            .template(action)
            .map(|template| url::resolve(template, self.store.attributes()))
            .ok_or(ModelError::MissingUrl { action })
    }

    /// Reads the resource and assigns the response.
    pub async fn fetch(&mut self) -> Result<Response> {
        self.request(Action::Fetch).await
    }

    /// Creates the resource.
    pub async fn create(&mut self) -> Result<Response> {
        self.request(Action::Create).await
    }

    /// Updates the resource.
    pub async fn update(&mut self) -> Result<Response> {
        self.request(Action::Update).await
    }

    /// Creates the resource when it has no identity, updates it otherwise.
    pub async fn save(&mut self) -> Result<Response> {
        if self.is_new() {
            self.create().await
        } else {
            self.update().await
        }
    }

    /// Deletes the resource and clears the model.
    pub async fn destroy(&mut self) -> Result<Response> {
        self.request(Action::Destroy).await
    }

    async fn request(&mut self, action: Action) -> Result<Response> {
        let definition = Arc::clone(&self.definition);
        let options = definition.options();

        if action.has_body() {
            if options.mutate_before_save {
                self.store.mutate_all();
            }
            if options.validate_before_save
                && !self.validate_with(&ValidateOptions::new().scope(action.as_str()))
            {
                return Err(ModelError::Invalid(self.store.errors().clone()));
            }
        }

        let request = Request {
            method: action.method(options.update_method),
            url: self.url(action)?,
            headers: definition.headers.clone(),
            body: action.has_body().then(|| self.store.attributes().clone()),
            credentials: options.credentials,
        };
        debug!(%action, method = %request.method, url = %request.url, "dispatching request");

        let outcome = {
            let _pending = self.pending.begin();
            self.client.send(request).await
        };

        let response = outcome.map_err(|source| {
            warn!(%action, error = %source, "request failed");
            ModelError::Transport { source }
        })?;
        debug!(%action, status = %response.status, "request settled");

        self.settle(action, &response)?;
        Ok(response)
    }

    fn settle(&mut self, action: Action, response: &Response) -> Result<()> {
        if action == Action::Destroy {
            self.clear();
            return Ok(());
        }
        match &response.data {
            Some(Value::Object(attributes)) => self.assign(attributes.clone()),
            None | Some(Value::Null) => {
                self.store.sync();
                Ok(())
            }
            Some(other) => Err(ModelError::MalformedResponse {
                status: response.status,
                reason: format!("expected an object, found {}", type_name(other)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClient;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn user() -> Arc<ModelDefinition> {
        ModelDefinition::builder()
            .default_value("name", "")
            .default_value("email", Value::Null)
            .validate("name", "presence", true)
            .validate("email", "format", RuleOptions::new().with("with", "@"))
            .mutation("name", crate::mutation::trim)
            .build()
            .unwrap()
    }

    #[test]
    fn construction_assigns_over_defaults_and_syncs() {
        let model =
            Model::with_attributes(user(), MockClient::new(), object(json!({ "name": "Luke" })))
                .unwrap();
        assert_eq!(model.to_json(), json!({ "name": "Luke", "email": null }));
        assert!(!model.any_changed());
        assert!(!model.is_pending());
    }

    #[test]
    fn validation_sees_mutated_values_without_storing_them() {
        let mut model = Model::new(user(), MockClient::new()).unwrap();
        model.set("name", "   ").unwrap();
        model.set("email", "nope").unwrap();

        assert!(!model.validate());
        assert_eq!(model.errors().first("name").unwrap().name, "presence");
        assert_eq!(
            model.errors().first("name").unwrap().context.value,
            Some(json!(""))
        );
        assert_eq!(model.get("name"), Some(&json!("   ")));
        assert!(!model.is_valid());
    }

    #[test]
    fn single_attribute_validation_keeps_other_slots() {
        let mut model = Model::new(user(), MockClient::new()).unwrap();
        model.set("email", "nope").unwrap();
        model.validate();
        assert_eq!(model.errors().failing().collect::<Vec<_>>(), ["name", "email"]);

        model.set("name", "Luke").unwrap();
        assert!(model.validate_with(&ValidateOptions::new().attribute("name")));
        assert_eq!(model.errors().failing().collect::<Vec<_>>(), ["email"]);
    }

    #[test]
    fn configuration_errors_surface_at_build() {
        let unknown = ModelDefinition::builder()
            .validate("name", "bogus", true)
            .build()
            .unwrap_err();
        assert!(matches!(unknown, ModelError::Schema(ref e) if e.is_unknown_rule()));

        let reserved = ModelDefinition::builder()
            .default_value("errors", 1)
            .build()
            .unwrap_err();
        assert!(matches!(reserved, ModelError::ReservedAttribute(ref name) if name == "errors"));

        let header = ModelDefinition::builder()
            .options(ModelOptions::default().with_header("bad header", "x"))
            .build()
            .unwrap_err();
        assert!(matches!(header, ModelError::InvalidHeader { .. }));
    }

    #[test]
    fn urls_fall_back_and_drop_missing_identity() {
        let definition = ModelDefinition::builder()
            .options(ModelOptions::default().with_url("/users/{id}"))
            .build()
            .unwrap();
        let mut model = Model::new(definition, MockClient::new()).unwrap();
        assert_eq!(model.url(Action::Create).unwrap(), "/users");
        model.set("id", 7).unwrap();
        assert_eq!(model.url(Action::Update).unwrap(), "/users/7");

        let bare = Model::new(user(), MockClient::new()).unwrap();
        assert!(matches!(
            bare.url(Action::Fetch),
            Err(ModelError::MissingUrl {
                action: Action::Fetch
            })
        ));
    }
}
