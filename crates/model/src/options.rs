//! Model configuration.
//!
//! Options are plain data and can be loaded from JSON:
//!
//! ```json
//! {
//!   "url": "/users/{id}",
//!   "routes": { "create": "/users" },
//!   "updateMethod": "PATCH",
//!   "headers": { "accept": "application/json" },
//!   "validateBeforeSave": true
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::transport::Action;

/// HTTP method used by `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateMethod {
    /// Full replacement
    #[default]
    Put,
    /// Partial update
    Patch,
}

/// Per-action URL templates. Unset actions fall back to [`ModelOptions::url`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Routes {
    /// Template for `fetch`
    pub fetch: Option<String>,
    /// Template for `create`
    pub create: Option<String>,
    /// Template for `update`
    pub update: Option<String>,
    /// Template for `destroy`
    pub destroy: Option<String>,
}

impl Routes {
    /// The template configured for `action`.
    pub fn get(&self, action: Action) -> Option<&str> {
        match action {
            Action::Fetch => self.fetch.as_deref(),
            Action::Create => self.create.as_deref(),
            Action::Update => self.update.as_deref(),
            Action::Destroy => self.destroy.as_deref(),
        }
    }
}

/// Behaviour switches and request settings for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelOptions {
    /// Run an attribute's mutations on every `set`
    pub mutate_on_change: bool,
    /// Run all mutations before every `sync`
    pub mutate_before_sync: bool,
    /// Run all mutations before `create` and `update`
    pub mutate_before_save: bool,
    /// Validate before `create` and `update`; failures block the request
    pub validate_before_save: bool,
    /// Attribute holding the resource identity
    pub identifier: String,
    /// Method used by `update`
    pub update_method: UpdateMethod,
    /// Headers sent with every request
    pub headers: IndexMap<String, String>,
    /// Send credentials with every request
    pub credentials: bool,
    /// Default URL template
    pub url: Option<String>,
    /// Per-action URL templates
    pub routes: Routes,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            mutate_on_change: false,
            mutate_before_sync: true,
            mutate_before_save: true,
            validate_before_save: false,
            identifier: "id".to_string(),
            update_method: UpdateMethod::default(),
            headers: IndexMap::new(),
            credentials: false,
            url: None,
            routes: Routes::default(),
        }
    }
}

impl ModelOptions {
    /// Parses options from JSON. Missing keys take their defaults.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(ModelError::Options)
    }

    /// Sets the default URL template.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a request header.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// URL template for `action`: its route, else the default URL.
    pub fn template(&self, action: Action) -> Option<&str> {
        self.routes.get(action).or(self.url.as_deref())
    }
}
