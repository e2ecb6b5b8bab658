//! Single-pass scanner for brace templates.
//!
//! One call to [`scan`] performs the same interpretation as one round of
//! substitution: `{{`/`}}` become literal braces and `{name}` becomes a field.

use crate::error::{ModelError, ModelResult};

/// A piece of a scanned template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text with one level of brace escaping removed.
    Literal(String),
    /// A `{name}` field. The name is empty for positional `{}` fields.
    Field(String),
}

/// Split a template into literal text and fields.
///
/// Fails on an unmatched `{` or `}` and on a `{` inside a field name.
pub fn scan(template: &str) -> ModelResult<Vec<Fragment>> {
    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => {
                            return Err(ModelError::malformed(
                                template,
                                format!("unexpected '{{' inside placeholder '{}'", name),
                            ))
                        }
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(ModelError::malformed(
                                template,
                                format!("unclosed placeholder '{{{}'", name),
                            ))
                        }
                    }
                }
                if !literal.is_empty() {
                    fragments.push(Fragment::Literal(std::mem::take(&mut literal)));
                }
                fragments.push(Fragment::Field(name));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => {
                return Err(ModelError::malformed(
                    template,
                    "single '}' encountered; use '}}' for a literal brace",
                ))
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        fragments.push(Fragment::Literal(literal));
    }
    Ok(fragments)
}

/// Names of the fields in a template, in order of first appearance.
///
/// Empty (positional) names are rejected since named templates cannot bind
/// them.
pub(crate) fn field_names(template: &str) -> ModelResult<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for fragment in scan(template)? {
        if let Fragment::Field(name) = fragment {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ModelError::malformed(template, "empty placeholder name"));
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// The text a template evaluates to after one substitution round in which
/// every field is replaced by nothing. Used to look through the first round
/// for the fields of the second.
pub(crate) fn literal_text(template: &str) -> ModelResult<String> {
    Ok(scan(template)?
        .into_iter()
        .filter_map(|fragment| match fragment {
            Fragment::Literal(text) => Some(text),
            Fragment::Field(_) => None,
        })
        .collect())
}
