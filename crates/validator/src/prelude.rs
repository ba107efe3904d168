//! Prelude module for convenient imports.
//!
//! ```rust
//! use tessera_validator::prelude::*;
//! ```

pub use crate::error::{OptionError, PathError, SchemaError};
pub use crate::options::{RuleOptions, RuleSpec};
pub use crate::path::Path;
pub use crate::registry::RuleRegistry;
pub use crate::report::{ErrorContext, ErrorDescriptor, ErrorReport};
pub use crate::rule::{Condition, Rule, RuleTest};
pub use crate::schema::Schema;
pub use crate::validator::Validator;
