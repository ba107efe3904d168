//! # tessera-model
//!
//! Client-side models for REST resources: attribute state with change
//! tracking, mutation pipelines, declarative validation (via
//! [`tessera_validator`]) and a CRUD lifecycle over a pluggable
//! [`HttpClient`].
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera_model::prelude::*;
//! use tessera_model::BoxError;
//!
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl HttpClient for Offline {
//!     async fn send(&self, _: Request) -> std::result::Result<Response, BoxError> {
//!         Err("offline".into())
//!     }
//! }
//!
//! let user = ModelDefinition::builder()
//!     .default_value("name", "")
//!     .validate("name", "presence", true)
//!     .mutation("name", tessera_model::mutation::trim)
//!     .options(ModelOptions::default().with_url("/users/{id}"))
//!     .build()?;
//!
//! let mut model = Model::new(user, Offline)?;
//! model.set("name", "  ")?;
//! assert!(model.changed("name"));
//! assert!(!model.validate());
//! assert_eq!(model.url(Action::Create)?, "/users");
//! # Ok::<(), tessera_model::ModelError>(())
//! ```

pub mod error;
pub mod merge;
pub mod model;
pub mod mutation;
pub mod options;
pub mod store;
pub mod transport;
pub mod url;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{BoxError, ModelError, Result};
pub use model::{Model, ModelBuilder, ModelDefinition, PendingState, ValidateOptions};
pub use mutation::Pipeline;
pub use options::{ModelOptions, Routes, UpdateMethod};
pub use store::{AttributeStore, MutationPolicy};
pub use transport::{Action, HttpClient, Request, Response};

pub use tessera_validator as validator;

/// Common imports.
pub mod prelude {
    pub use crate::error::{ModelError, Result};
    pub use crate::model::{Model, ModelBuilder, ModelDefinition, PendingState, ValidateOptions};
    pub use crate::mutation::Pipeline;
    pub use crate::options::ModelOptions;
    pub use crate::transport::{Action, HttpClient, Request, Response};
    pub use tessera_validator::prelude::*;
}
