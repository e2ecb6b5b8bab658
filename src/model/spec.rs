//! Parsed model templates.

use std::collections::BTreeSet;

use crate::error::{ModelError, ModelResult};
use crate::template::{field_names, literal_text};

/// A named SQL template with `{property}` and `{{reference}}` placeholders.
///
/// The template is parsed once on construction; malformed braces and names
/// used both as a property and as a reference are rejected here, before any
/// binding happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    name: String,
    template: String,
    /// `{name}` placeholders, in order of first appearance
    properties: Vec<String>,
    /// `{{name}}` placeholders, in order of first appearance
    references: Vec<String>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> ModelResult<Self> {
        let name = name.into();
        let template = template.into();

        let properties = field_names(&template)?;
        let references = field_names(&literal_text(&template)?)?;

        if let Some(both) = properties.iter().find(|p| references.contains(p)) {
            return Err(ModelError::AmbiguousPlaceholder {
                model: name,
                placeholder: both.clone(),
            });
        }

        Ok(Self {
            name,
            template,
            properties,
            references,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    pub fn is_reference(&self, name: &str) -> bool {
        self.references.iter().any(|r| r == name)
    }

    /// Every placeholder name.
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.properties
            .iter()
            .chain(&self.references)
            .cloned()
            .collect()
    }
}
