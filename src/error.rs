//! Error types for model construction, graph assembly and SQL generation.
//!
//! Every operation in the crate is pure and deterministic, so none of these
//! errors is retryable: the same inputs always reproduce the same failure.

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building, assembling or compiling model graphs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Positional `{}` placeholders and supplied arguments disagree.
    #[error("Template '{template}' has {expected} placeholder(s) but {actual} argument(s) were given")]
    TemplateArity {
        template: String,
        expected: usize,
        actual: usize,
    },

    /// Unbalanced braces or an empty placeholder name.
    #[error("Malformed template '{template}': {message}")]
    MalformedTemplate { template: String, message: String },

    /// The same name is used both as `{x}` and as `{{x}}`.
    #[error("Placeholder '{placeholder}' in model '{model}' is used both as a property and as a reference")]
    AmbiguousPlaceholder { model: String, placeholder: String },

    /// Placeholders present in the template without a binding.
    #[error("Model '{model}' is missing bindings for: {}", .placeholders.join(", "))]
    MissingBinding {
        model: String,
        placeholders: Vec<String>,
    },

    /// A binding of a kind the placeholder cannot accept.
    #[error("Invalid binding for '{placeholder}' in model '{model}': expected {expected}")]
    InvalidBinding {
        model: String,
        placeholder: String,
        expected: &'static str,
    },

    /// A reference that cannot be resolved to a node or expression.
    #[error("Unresolved reference '{placeholder}' in model '{model}'")]
    UnresolvedReference { model: String, placeholder: String },

    /// The reference graph contains a cycle. The path starts and ends with
    /// the repeated model.
    #[error("Cyclic reference detected: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    /// Two different nodes registered under one catalog name.
    #[error("A different model named '{name}' is already registered")]
    DuplicateModel { name: String },

    /// An identifier violates a dialect constraint.
    #[error("Identifier '{identifier}' is not supported by {dialect}: {rule}")]
    UnsupportedIdentifier {
        identifier: String,
        dialect: &'static str,
        rule: String,
    },

    /// An operation without defined semantics on the target dialect.
    #[error("{}", describe_unsupported(.dialect, .operation, .suggestion))]
    DialectUnsupportedOperation {
        dialect: &'static str,
        operation: String,
        suggestion: Option<String>,
    },

    /// No conversion registered for a semantic type.
    #[error("No conversion registered for semantic type '{semantic_type}'")]
    MissingConverter { semantic_type: String },

    /// A value could not be converted to an expression.
    #[error("Cannot convert value to '{semantic_type}': {message}")]
    Conversion {
        semantic_type: String,
        message: String,
    },

    /// The dtype mapper has no semantic type for a database type.
    #[error("Unknown {dialect} column type '{type_name}' for column '{column}'")]
    UnknownDatabaseType {
        dialect: &'static str,
        column: String,
        type_name: String,
    },

    /// Canonical serialization for hashing failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl ModelError {
    /// Shorthand for [`ModelError::DialectUnsupportedOperation`].
    pub fn unsupported(
        dialect: &'static str,
        operation: impl Into<String>,
        suggestion: Option<&str>,
    ) -> Self {
        ModelError::DialectUnsupportedOperation {
            dialect,
            operation: operation.into(),
            suggestion: suggestion.map(String::from),
        }
    }

    /// Shorthand for [`ModelError::MalformedTemplate`].
    pub(crate) fn malformed(template: &str, message: impl Into<String>) -> Self {
        ModelError::MalformedTemplate {
            template: template.into(),
            message: message.into(),
        }
    }
}

fn describe_unsupported(dialect: &str, operation: &str, suggestion: &Option<String>) -> String {
    match suggestion {
        Some(suggestion) => format!(
            "{} is not supported by {}; {}",
            operation, dialect, suggestion
        ),
        None => format!("{} is not supported by {}", operation, dialect),
    }
}
