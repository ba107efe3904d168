//! # tessera-validator
//!
//! Declarative, schema-driven validation for JSON records.
//!
//! ## Quick Start
//!
//! ```rust
//! use tessera_validator::prelude::*;
//! use serde_json::json;
//!
//! let schema = Schema::from_json(&json!({
//!     "name":     { "presence": true },
//!     "password": { "length": { "min": 8 } },
//! }))
//! .unwrap();
//! let validator = Validator::new(&RuleRegistry::defaults(), &schema).unwrap();
//!
//! let report = validator.validate_record(&json!({ "password": "123" }), None);
//! assert_eq!(report.first("name").unwrap().name, "presence");
//! assert_eq!(report.first("password").unwrap().name, "too_short");
//! ```
//!
//! ## Building Blocks
//!
//! - [`Rule`]: a named, pure test with metadata, an optional [`Condition`]
//!   and optional scopes
//! - [`RuleRegistry`]: rule name → factory; [`RuleRegistry::defaults`] holds
//!   the built-in [`rules`]
//! - [`Schema`]: attribute → rule name → [`RuleSpec`]
//! - [`Validator`]: the compiled schema; produces [`ErrorReport`]s
//!
//! Configuration mistakes are [`SchemaError`]s raised when a [`Validator`]
//! is built. Failed rules are never errors: they are [`ErrorDescriptor`]s.

pub mod error;
pub mod options;
pub mod path;
pub mod prelude;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rules;
pub mod schema;
pub mod validator;
pub mod value;

pub use error::{OptionError, PathError, SchemaError};
pub use options::{RuleOptions, RuleSpec};
pub use path::Path;
pub use registry::{RuleFactory, RuleRegistry};
pub use report::{ErrorContext, ErrorDescriptor, ErrorReport};
pub use rule::{Condition, Rule, RuleTest};
pub use schema::Schema;
pub use validator::Validator;
