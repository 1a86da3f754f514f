//! # Field Resolution
//!
//! Extracts column values out of arbitrarily shaped rows.
//!
//! Path selectors use dot notation with optional bracketed indices
//! (`properties.items[0].name`). Bracket contents are ordinary segments, so
//! `items.0.name` addresses the same value. Missing segments resolve to
//! `None` instead of failing; only a selector that is neither a path nor an
//! accessor is an error.

use serde_json::Value;
use tabula_types::{Formatter, Selector, TableError};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parsed path expression evaluated against a JSON row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses `a.b[0].c` style paths. Empty segments are skipped, so a blank
    /// path addresses the row itself.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        for segment in path.trim().split('.') {
            if segment.is_empty() {
                continue;
            }
            let (key, indices) = split_indices(segment);
            if !key.is_empty() {
                segments.push(classify(key));
            }
            segments.extend(indices.into_iter().map(classify));
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walks the row segment by segment.
    pub fn lookup<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        let mut current = row;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Canonical decimal segments are indices; `01` or `+1` stay object keys.
fn classify(segment: &str) -> PathSegment {
    match segment.parse::<usize>() {
        Ok(index) if index.to_string() == segment => PathSegment::Index(index),
        _ => PathSegment::Key(segment.to_string()),
    }
}

/// Splits `items[0][1]` into `("items", ["0", "1"])`.
fn split_indices(segment: &str) -> (&str, Vec<&str>) {
    let key_end = segment.find('[').unwrap_or(segment.len());
    let key = &segment[..key_end];
    let mut indices = Vec::new();
    let mut rest = &segment[key_end..];
    while let Some(open) = rest.strip_prefix('[') {
        let Some(close) = open.find(']') else {
            break;
        };
        if close > 0 {
            indices.push(&open[..close]);
        }
        rest = &open[close + 1..];
    }
    (key, indices)
}

/// Resolves a row value for a selector, optionally replaced by a formatter.
///
/// The selector is validated before the formatter runs, so an unsupported
/// selector fails even when a formatter would have produced the value.
pub fn resolve(row: &Value, selector: &Selector, format: Option<&Formatter>) -> Result<Option<Value>, TableError> {
    let raw = match selector {
        Selector::Unsupported(value) => {
            return Err(TableError::InvalidSelector {
                selector: value.to_string(),
            });
        }
        Selector::Accessor(accessor) => Some(accessor(row)),
        Selector::Path(path) => FieldPath::parse(path).lookup(row).cloned(),
    };

    match format {
        Some(formatter) => Ok(Some(apply_formatter(row, formatter))),
        None => Ok(raw),
    }
}

pub fn apply_formatter(row: &Value, formatter: &Formatter) -> Value {
    match formatter {
        Formatter::Function(function) => function(row),
        Formatter::Template(template) => Value::String(interpolate_template(template, row)),
    }
}

/// Replaces `${{ path }}` placeholders with values read from the row.
///
/// Missing paths render as an empty string; an unterminated placeholder is
/// kept verbatim along with the rest of the template.
pub fn interpolate_template(template: &str, row: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut remaining = template;

    while let Some(start) = remaining.find("${{") {
        let (before, after) = remaining.split_at(start);
        output.push_str(before);

        let Some(end) = after.find("}}") else {
            output.push_str(after);
            return output;
        };
        let path = after[3..end].trim();
        if let Some(value) = FieldPath::parse(path).lookup(row) {
            output.push_str(&format_json_value(value));
        }
        remaining = &after[end + 2..];
    }

    output.push_str(remaining);
    output
}

/// Renders a JSON value for display: strings unquoted, null as empty.
pub fn format_json_value(value: &Value) -> String {
    match value {
        Value::String(string_value) => string_value.clone(),
        Value::Number(number_value) => number_value.to_string(),
        Value::Bool(boolean_value) => boolean_value.to_string(),
        Value::Null => String::new(),
        other_value => other_value.to_string(),
    }
}
