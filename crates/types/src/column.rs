//! Column definitions shared by the engine and the rendering layer.
//!
//! Columns come in two shapes. [`Column`] is the runtime form and may carry
//! closures (accessors, formatters, predicates). [`ColumnDefinition`] is the
//! declarative form read from YAML/JSON table files; it converts into a
//! [`Column`] whose closures are replaced by path, template, and expression
//! strings.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque style effect produced by a conditional style rule.
///
/// The engine never interprets the entries; an empty map is the "no effect" value.
pub type StyleEffect = Map<String, Value>;

/// Accessor invoked with the whole row to compute a column value.
pub type RowAccessor = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Predicate invoked with the whole row.
pub type RowPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Identifies which part of a row a column displays.
#[derive(Clone)]
pub enum Selector {
    /// Dot path with optional bracketed indices, for example `items[0].name`.
    Path(String),
    /// Unary function of the row.
    Accessor(RowAccessor),
    /// A configured selector that is neither a string nor a function.
    /// Kept as-is so the failure surfaces only when the column is resolved.
    Unsupported(Value),
}

impl Selector {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn accessor<F>(accessor: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Accessor(Arc::new(accessor))
    }

    /// Interprets a configured JSON value as a selector.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(path) => Self::Path(path),
            other => Self::Unsupported(other),
        }
    }

    /// Returns the path string for path selectors.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(path) => Some(path.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Selector {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Selector {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Path(left), Self::Path(right)) => left == right,
            (Self::Accessor(left), Self::Accessor(right)) => Arc::ptr_eq(left, right),
            (Self::Unsupported(left), Self::Unsupported(right)) => left == right,
            _ => false,
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Accessor(_) => f.write_str("Accessor(<fn>)"),
            Self::Unsupported(value) => f.debug_tuple("Unsupported").field(value).finish(),
        }
    }
}

/// Produces the displayed value of a cell from the whole row.
#[derive(Clone)]
pub enum Formatter {
    Function(RowAccessor),
    /// Template with `${{ path }}` placeholders resolved against the row.
    Template(String),
}

impl Formatter {
    pub fn function<F>(formatter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Function(Arc::new(formatter))
    }

    pub fn template(template: impl Into<String>) -> Self {
        Self::Template(template.into())
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(<fn>)"),
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
        }
    }
}

/// The `when` half of a conditional style rule.
#[derive(Clone)]
pub enum Predicate {
    Function(RowPredicate),
    /// Condition expression such as `status == "failed" && retries > 2`.
    Expression(String),
    /// A configured `when` that can be neither called nor evaluated.
    Unsupported(Value),
}

impl Predicate {
    pub fn function<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Function(Arc::new(predicate))
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        Self::Expression(expression.into())
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(expression) => Self::Expression(expression),
            other => Self::Unsupported(other),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(<fn>)"),
            Self::Expression(expression) => f.debug_tuple("Expression").field(expression).finish(),
            Self::Unsupported(value) => f.debug_tuple("Unsupported").field(value).finish(),
        }
    }
}

/// One `{when, style}` pair. Both halves are optional so malformed rules can be
/// represented and rejected lazily at evaluation time.
#[derive(Debug, Clone, Default)]
pub struct ConditionalStyle {
    pub when: Option<Predicate>,
    pub style: Option<StyleEffect>,
}

impl ConditionalStyle {
    pub fn new(when: Predicate, style: StyleEffect) -> Self {
        Self {
            when: Some(when),
            style: Some(style),
        }
    }
}

/// Runtime column definition.
#[derive(Debug, Clone)]
pub struct Column {
    /// Header text; not interpreted by the engine.
    pub name: Option<String>,
    pub selector: Selector,
    pub sortable: bool,
    pub format: Option<Formatter>,
    /// Ordered rules; the first matching rule decides the cell style.
    pub conditional_styles: Vec<ConditionalStyle>,
}

impl Column {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            name: None,
            selector: selector.into(),
            sortable: false,
            format: None,
            conditional_styles: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_format(mut self, format: Formatter) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_conditional_style(mut self, rule: ConditionalStyle) -> Self {
        self.conditional_styles.push(rule);
        self
    }
}

/// Declarative column read from a table definition file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDefinition {
    #[serde(default)]
    pub name: Option<String>,
    /// Any JSON value; only strings are valid selectors.
    pub selector: Value,
    #[serde(default)]
    pub sortable: bool,
    /// Template string, see [`Formatter::Template`].
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub conditional_styles: Vec<ConditionalStyleDefinition>,
}

/// Declarative `{when, style}` pair; `when` is an expression string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConditionalStyleDefinition {
    #[serde(default)]
    pub when: Option<Value>,
    #[serde(default)]
    pub style: Option<StyleEffect>,
}

impl From<ConditionalStyleDefinition> for ConditionalStyle {
    fn from(definition: ConditionalStyleDefinition) -> Self {
        Self {
            when: definition.when.map(Predicate::from_value),
            style: definition.style,
        }
    }
}

impl From<ColumnDefinition> for Column {
    fn from(definition: ColumnDefinition) -> Self {
        Self {
            name: definition.name,
            selector: Selector::from_value(definition.selector),
            sortable: definition.sortable,
            format: definition.format.map(Formatter::Template),
            conditional_styles: definition.conditional_styles.into_iter().map(ConditionalStyle::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_definition_converts_selectors_and_rules() {
        let definition: ColumnDefinition = serde_yaml::from_str(
            r#"
name: Status
selector: state.name
sortable: true
format: "${{ state.name }}!"
conditional_styles:
  - when: state.name == "failed"
    style:
      color: red
  - style:
      color: grey
"#,
        )
        .expect("parse column definition");

        let column = Column::from(definition);
        assert_eq!(column.name.as_deref(), Some("Status"));
        assert_eq!(column.selector, Selector::path("state.name"));
        assert!(column.sortable);
        assert!(matches!(column.format, Some(Formatter::Template(ref t)) if t == "${{ state.name }}!"));
        assert_eq!(column.conditional_styles.len(), 2);
        assert!(matches!(column.conditional_styles[0].when, Some(Predicate::Expression(_))));
        assert!(column.conditional_styles[1].when.is_none());
    }

    #[test]
    fn non_string_selector_is_kept_as_unsupported() {
        let selector = Selector::from_value(json!({ "bad": true }));
        assert_eq!(selector, Selector::Unsupported(json!({ "bad": true })));
        assert_eq!(selector.as_path(), None);
    }

    #[test]
    fn accessor_selectors_compare_by_identity() {
        let accessor = Selector::accessor(|row| row["name"].clone());
        let same = accessor.clone();
        let other = Selector::accessor(|row| row["name"].clone());
        assert_eq!(accessor, same);
        assert_ne!(accessor, other);
    }
}
