//! Conversion of typed runtime values into expressions.
//!
//! A [`ConversionRegistry`] maps a semantic type name (`"int64"`, `"date"`,
//! ...) to a function turning a JSON value of that type into an
//! [`Expression`]. Values never reach SQL text directly; they always become
//! typed literals and are formatted by the dialect at render time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::expr::{Expression, Literal};
use crate::error::{ModelError, ModelResult};

/// A runtime value tagged with its semantic type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub semantic_type: String,
    pub value: Value,
}

impl TypedValue {
    pub fn new(semantic_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            semantic_type: semantic_type.into(),
            value: value.into(),
        }
    }
}

/// Converts a JSON value into an expression.
pub type Converter = Arc<dyn Fn(&Value) -> ModelResult<Expression> + Send + Sync>;

/// Registry of per-semantic-type value converters.
#[derive(Clone, Default)]
pub struct ConversionRegistry {
    converters: HashMap<String, Converter>,
}

impl ConversionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with converters for the built-in semantic types:
    /// `bool`, `int64`, `float64`, `string`, `date`, `timestamp` and `json`.
    pub fn standard() -> Self {
        Self::new()
            .with("bool", |v| literal("bool", v, |v| v.as_bool().map(Literal::Bool)))
            .with("int64", |v| literal("int64", v, |v| v.as_i64().map(Literal::Int)))
            .with("float64", |v| {
                literal("float64", v, |v| v.as_f64().map(Literal::Float))
            })
            .with("string", |v| {
                literal("string", v, |v| v.as_str().map(|s| Literal::String(s.into())))
            })
            .with("date", |v| {
                literal("date", v, |v| v.as_str().map(|s| Literal::Date(s.into())))
            })
            .with("timestamp", |v| {
                literal("timestamp", v, |v| {
                    v.as_str().map(|s| Literal::Timestamp(s.into()))
                })
            })
            .with("json", |v| {
                literal("json", v, |v| serde_json::to_string(v).ok().map(Literal::Json))
            })
    }

    /// Register a converter, replacing any previous one for the same type.
    pub fn register<F>(&mut self, semantic_type: impl Into<String>, converter: F)
    where
        F: Fn(&Value) -> ModelResult<Expression> + Send + Sync + 'static,
    {
        self.converters
            .insert(semantic_type.into(), Arc::new(converter));
    }

    /// Builder-style [`ConversionRegistry::register`].
    pub fn with<F>(mut self, semantic_type: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&Value) -> ModelResult<Expression> + Send + Sync + 'static,
    {
        self.register(semantic_type, converter);
        self
    }

    pub fn contains(&self, semantic_type: &str) -> bool {
        self.converters.contains_key(semantic_type)
    }

    /// Convert a typed value using the converter registered for its type.
    pub fn convert(&self, value: &TypedValue) -> ModelResult<Expression> {
        let converter =
            self.converters
                .get(&value.semantic_type)
                .ok_or_else(|| ModelError::MissingConverter {
                    semantic_type: value.semantic_type.clone(),
                })?;
        converter(&value.value)
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.converters.keys().collect();
        types.sort();
        f.debug_struct("ConversionRegistry")
            .field("types", &types)
            .finish()
    }
}

/// JSON null is NULL for every type; anything else goes through `extract`.
fn literal(
    semantic_type: &str,
    value: &Value,
    extract: impl Fn(&Value) -> Option<Literal>,
) -> ModelResult<Expression> {
    if value.is_null() {
        return Ok(Expression::literal(Literal::Null));
    }
    extract(value)
        .map(Expression::literal)
        .ok_or_else(|| ModelError::Conversion {
            semantic_type: semantic_type.to_string(),
            message: format!("unexpected value {}", value),
        })
}
