//! Brace templates: escaping and placeholder extraction.
//!
//! Model templates go through two substitution rounds:
//!
//! ```text
//! "select * from {{source}} limit {n}"
//!         │ bind: {n} ← "10", {{ → {, }} → }
//!         ▼
//! "select * from {source} limit 10"
//!         │ generate: {source} ← alias or (subquery)
//!         ▼
//! "select * from \"source\" limit 10"
//! ```
//!
//! `{name}` is a *property* filled in at bind time and `{{name}}` is a
//! *reference* to another model resolved at generation time. A literal brace in
//! the final SQL is written `{{{{` in the template.

mod escape;
mod scan;

pub use escape::{
    escape_parameter_markers, escape_template_metacharacters, unescape_parameter_markers,
    unescape_template_metacharacters, Escaper,
};
pub use scan::{scan, Fragment};

pub(crate) use scan::{field_names, literal_text};

use std::collections::BTreeSet;

use crate::error::ModelResult;

/// Names of the `{name}` property placeholders in a model template.
pub fn extract_property_names(template: &str) -> ModelResult<BTreeSet<String>> {
    Ok(field_names(template)?.into_iter().collect())
}

/// Names of the `{{name}}` model references in a model template.
pub fn extract_reference_names(template: &str) -> ModelResult<BTreeSet<String>> {
    Ok(field_names(&literal_text(template)?)?.into_iter().collect())
}

/// All placeholder names a template requires, properties and references.
pub fn extract_placeholder_names(template: &str) -> ModelResult<BTreeSet<String>> {
    let mut names = extract_property_names(template)?;
    names.extend(extract_reference_names(template)?);
    Ok(names)
}
