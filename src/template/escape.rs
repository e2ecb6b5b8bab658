//! Reversible escaping of template metacharacters.
//!
//! Templates are processed by a brace-based substitution engine: `{name}` is a
//! field, `{{` and `}}` are literal braces. A data value spliced into a
//! template that will still be processed `n` more times must have each brace
//! doubled `n` times, or the engine would read it as a field.
//!
//! Drivers that use `%`-style parameter markers (`%s`, `%(name)s`) need `%`
//! doubled once, independent of the number of template passes, because the
//! driver interpolates exactly once when the statement is executed.

/// Escape `{` and `}` so that `passes` rounds of template substitution
/// evaluate back to `s`.
pub fn escape_template_metacharacters(s: &str, passes: usize) -> String {
    let mut out = s.to_string();
    for _ in 0..passes {
        out = double_braces(&out);
    }
    out
}

/// Inverse of [`escape_template_metacharacters`].
///
/// Each pass collapses `{{` to `{` and `}}` to `}`, which is exactly what one
/// round of substitution does to literal text.
pub fn unescape_template_metacharacters(s: &str, passes: usize) -> String {
    let mut out = s.to_string();
    for _ in 0..passes {
        out = out.replace("{{", "{").replace("}}", "}");
    }
    out
}

/// Double every `%` for drivers that treat it as a parameter marker.
pub fn escape_parameter_markers(s: &str) -> String {
    s.replace('%', "%%")
}

/// Inverse of [`escape_parameter_markers`].
pub fn unescape_parameter_markers(s: &str) -> String {
    s.replace("%%", "%")
}

fn double_braces(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaping configuration for one substitution channel.
///
/// `passes` is the number of template rounds the value still has to survive;
/// `escape_percent` is set when the final consumer is a driver that reads `%`
/// as a parameter marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escaper {
    pub passes: usize,
    pub escape_percent: bool,
}

impl Default for Escaper {
    fn default() -> Self {
        Self {
            passes: 1,
            escape_percent: false,
        }
    }
}

impl Escaper {
    pub fn new(passes: usize) -> Self {
        Self {
            passes,
            escape_percent: false,
        }
    }

    pub fn with_percent(mut self, escape_percent: bool) -> Self {
        self.escape_percent = escape_percent;
        self
    }

    pub fn escape(&self, s: &str) -> String {
        let braces = escape_template_metacharacters(s, self.passes);
        if self.escape_percent {
            escape_parameter_markers(&braces)
        } else {
            braces
        }
    }

    pub fn unescape(&self, s: &str) -> String {
        let percent = if self.escape_percent {
            unescape_parameter_markers(s)
        } else {
            s.to_string()
        };
        unescape_template_metacharacters(&percent, self.passes)
    }
}
