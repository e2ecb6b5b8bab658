//! Values a placeholder can be bound to.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::ModelNode;
use crate::sql::expr::Expression;

/// A scalar property value. Spliced into the template as raw SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// What a placeholder is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// Scalar text for a `{property}`
    Value(Scalar),
    /// A structured expression, rendered per dialect at generation time
    Expression(Expression),
    /// A list of expressions, rendered joined with `", "`
    Expressions(Vec<Expression>),
    /// Another model for a `{{reference}}`
    Model(Arc<ModelNode>),
    /// A model looked up by name in a catalog when the graph is assembled
    Deferred(String),
}

impl Binding {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Binding::Value(_) => "value",
            Binding::Expression(_) => "expression",
            Binding::Expressions(_) => "expression list",
            Binding::Model(_) => "model",
            Binding::Deferred(_) => "deferred model",
        }
    }
}

/// Named bindings passed to [`ModelBuilder::build`](super::ModelBuilder::build).
///
/// ```ignore
/// let bindings = Bindings::new()
///     .model("orders", orders)
///     .value("limit", 10)
///     .deferred("customers", "customers");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: BTreeMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a placeholder, replacing any previous binding with the same name.
    pub fn bind(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.entries.insert(name.into(), binding);
        self
    }

    pub fn value(self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.bind(name, Binding::Value(value.into()))
    }

    pub fn expr(self, name: impl Into<String>, expr: Expression) -> Self {
        self.bind(name, Binding::Expression(expr))
    }

    pub fn exprs(self, name: impl Into<String>, exprs: Vec<Expression>) -> Self {
        self.bind(name, Binding::Expressions(exprs))
    }

    pub fn model(self, name: impl Into<String>, node: Arc<ModelNode>) -> Self {
        self.bind(name, Binding::Model(node))
    }

    pub fn deferred(self, name: impl Into<String>, model_name: impl Into<String>) -> Self {
        self.bind(name, Binding::Deferred(model_name.into()))
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
