//! Binding templates into model nodes.

use std::sync::Arc;

use tracing::warn;

use super::binding::{Binding, Bindings, Scalar};
use super::node::{ModelNode, Reference};
use super::spec::ModelSpec;
use crate::error::{ModelError, ModelResult};
use crate::template::{escape_template_metacharacters, scan, Fragment};

const PROPERTY_KINDS: &str = "a value, expression or expression list";
const REFERENCE_KINDS: &str = "a model, deferred model, expression or expression list";
const FINITE_FLOAT: &str = "a finite number (bind lit_float for NaN or infinity)";

/// Builds nodes from a [`ModelSpec`]. Reusable; `build` is pure.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    spec: Arc<ModelSpec>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> ModelResult<Self> {
        Ok(Self::from_spec(ModelSpec::new(name, template)?))
    }

    pub fn from_spec(spec: ModelSpec) -> Self {
        Self {
            spec: Arc::new(spec),
        }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Bind every placeholder and produce an immutable node.
    ///
    /// Scalar properties are stringified and brace-escaped once, so the text
    /// they insert survives the generation round unchanged. Expression-bound
    /// properties stay structured and are rendered for the target dialect at
    /// generation time. Bindings for names the template does not use are
    /// ignored with a warning.
    pub fn build(&self, bindings: Bindings) -> ModelResult<Arc<ModelNode>> {
        let spec = &*self.spec;

        let missing: Vec<String> = spec
            .properties()
            .iter()
            .chain(spec.references())
            .filter(|name| bindings.get(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::MissingBinding {
                model: spec.name().to_string(),
                placeholders: missing,
            });
        }

        for (name, binding) in bindings.iter() {
            if !spec.is_property(name) && !spec.is_reference(name) {
                warn!(
                    model = spec.name(),
                    binding = name,
                    kind = binding.kind(),
                    "ignoring unused binding"
                );
            }
        }

        let mut sql = String::with_capacity(spec.template().len());
        let mut references: Vec<(String, Reference)> = Vec::new();

        // Bind round: properties are substituted, `{{ref}}` becomes `{ref}`.
        for fragment in scan(spec.template())? {
            match fragment {
                Fragment::Literal(text) => sql.push_str(&text),
                Fragment::Field(field) => {
                    let name = field.trim();
                    let reference = match lookup(spec, &bindings, name)? {
                        Binding::Value(Scalar::Float(f)) if !f.is_finite() => {
                            return Err(invalid(spec, name, FINITE_FLOAT))
                        }
                        Binding::Value(scalar) => {
                            sql.push_str(&escape_template_metacharacters(&scalar.to_string(), 1));
                            continue;
                        }
                        Binding::Expression(expr) => Reference::Expressions(vec![expr.clone()]),
                        Binding::Expressions(exprs) => Reference::Expressions(exprs.clone()),
                        Binding::Model(_) | Binding::Deferred(_) => {
                            return Err(invalid(spec, name, PROPERTY_KINDS))
                        }
                    };
                    push_reference(&mut sql, &mut references, name, reference);
                }
            }
        }

        for name in spec.references() {
            let reference = match lookup(spec, &bindings, name)? {
                Binding::Model(node) => Reference::Model(node.clone()),
                Binding::Deferred(target) => Reference::Deferred(target.clone()),
                Binding::Expression(expr) => Reference::Expressions(vec![expr.clone()]),
                Binding::Expressions(exprs) => Reference::Expressions(exprs.clone()),
                Binding::Value(_) => return Err(invalid(spec, name, REFERENCE_KINDS)),
            };
            references.push((name.clone(), reference));
        }

        // Keep references in the order their fields appear in the bound SQL.
        let order = crate::template::field_names(&sql)?;
        references.sort_by_key(|(name, _)| order.iter().position(|n| n == name));

        ModelNode::new(
            spec.name().to_string(),
            spec.template().to_string(),
            sql,
            references,
        )
        .map(Arc::new)
    }
}

/// Record an expression-bound property as a synthetic reference and leave a
/// field for the generation round.
fn push_reference(
    sql: &mut String,
    references: &mut Vec<(String, Reference)>,
    name: &str,
    reference: Reference,
) {
    sql.push('{');
    sql.push_str(name);
    sql.push('}');
    if !references.iter().any(|(n, _)| n == name) {
        references.push((name.to_string(), reference));
    }
}

fn lookup<'b>(spec: &ModelSpec, bindings: &'b Bindings, name: &str) -> ModelResult<&'b Binding> {
    bindings.get(name).ok_or_else(|| ModelError::MissingBinding {
        model: spec.name().to_string(),
        placeholders: vec![name.to_string()],
    })
}

fn invalid(spec: &ModelSpec, name: &str, expected: &'static str) -> ModelError {
    ModelError::InvalidBinding {
        model: spec.name().to_string(),
        placeholder: name.to_string(),
        expected,
    }
}
