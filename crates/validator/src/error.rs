//! Configuration errors raised while compiling a validation schema, and
//! attribute path writes that cannot be carried out.
//!
//! Schema errors are programming mistakes (a typo in a rule name, a rule
//! missing a required option) and surface when a
//! [`Validator`](crate::Validator) is built, never while validating. Failed
//! validations are data, see [`ErrorReport`](crate::ErrorReport).

use thiserror::Error;

/// Problem with a single rule's options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// A required option is absent.
    #[error("missing required option {0}")]
    Missing(String),

    /// An option is present but unusable.
    #[error("option `{option}` {reason}")]
    Invalid {
        /// Option key.
        option: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl OptionError {
    /// Creates a [`OptionError::Missing`] error.
    pub fn missing(description: impl Into<String>) -> Self {
        Self::Missing(description.into())
    }

    /// Creates a [`OptionError::Invalid`] error.
    pub fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Error compiling a validation schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No rule with this name exists in the registry.
    #[error("unknown validation rule `{rule}`")]
    UnknownRule {
        /// The offending rule name.
        rule: String,
    },

    /// The rule exists but its options are wrong.
    #[error("invalid options for rule `{rule}`: {source}")]
    InvalidOptions {
        /// Rule name.
        rule: String,
        /// The underlying option problem.
        #[source]
        source: OptionError,
    },

    /// A rule specification is neither `true`, `false` nor an options object.
    #[error("rule `{rule}` must be true, false or an options object, got {found}")]
    MalformedSpec {
        /// Rule name.
        rule: String,
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The schema document itself has the wrong shape.
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// An error attributed to a particular attribute of the schema.
    #[error("attribute `{attribute}`: {source}")]
    Attribute {
        /// Attribute the failing rule was declared on.
        attribute: String,
        /// The underlying error.
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attaches attribute context to this error.
    pub fn for_attribute(self, attribute: impl Into<String>) -> Self {
        Self::Attribute {
            attribute: attribute.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with attribute context peeled off.
    pub fn root(&self) -> &SchemaError {
        match self {
            Self::Attribute { source, .. } => source.root(),
            other => other,
        }
    }

    /// The attribute this error was raised for, if known.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Attribute { attribute, .. } => Some(attribute.as_str()),
            _ => None,
        }
    }

    /// Whether the root cause is an unknown rule name.
    pub fn is_unknown_rule(&self) -> bool {
        matches!(self.root(), Self::UnknownRule { .. })
    }
}

/// A write through a [`Path`](crate::Path) that was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The index would pad an array with more than
    /// [`MAX_ARRAY_PADDING`](crate::path::MAX_ARRAY_PADDING) placeholders.
    #[error("index {index} in `{path}` is out of range for an array of {len} elements")]
    IndexOutOfRange {
        /// The path as written.
        path: String,
        /// The requested index.
        index: usize,
        /// Length of the array at that step (0 when it does not exist yet).
        len: usize,
    },
}
