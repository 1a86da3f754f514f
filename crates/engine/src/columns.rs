//! Column decoration and per-cell helpers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_types::{Column, StyleEffect, TableError};

use crate::{conditional::conditional_style, field::resolve};

/// Synthetic column identifier used as a list-rendering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(pub usize);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column-{}", self.0)
    }
}

/// A column paired with its synthetic identifier.
#[derive(Debug, Clone)]
pub struct DecoratedColumn {
    pub id: ColumnId,
    pub column: Column,
}

impl DecoratedColumn {
    /// Display value of this column for `row`.
    pub fn cell_value(&self, row: &Value) -> Result<Option<Value>, TableError> {
        resolve(row, &self.column.selector, self.column.format.as_ref())
    }

    /// Style effect of this column for `row`.
    pub fn cell_style(&self, row: &Value) -> Result<StyleEffect, TableError> {
        conditional_style(row, Some(self.column.conditional_styles.as_slice()))
    }
}

/// Assigns sequential identifiers (starting at 1) in column order.
pub fn decorate_columns(columns: impl IntoIterator<Item = Column>) -> Vec<DecoratedColumn> {
    columns
        .into_iter()
        .enumerate()
        .map(|(index, column)| DecoratedColumn {
            id: ColumnId(index + 1),
            column,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_types::{ConditionalStyle, Formatter, Predicate, Selector};

    #[test]
    fn decorates_each_column_with_an_id() {
        let columns = decorate_columns([Column::new("foo").with_name("Foo"), Column::new("bar").sortable(true)]);
        assert_eq!(columns[0].id, ColumnId(1));
        assert_eq!(columns[1].id, ColumnId(2));
        assert_eq!(columns[0].column.name.as_deref(), Some("Foo"));
        assert_eq!(columns[1].column.selector, Selector::path("bar"));
        assert!(columns[1].column.sortable);
        assert_eq!(columns[1].id.to_string(), "column-2");
    }

    #[test]
    fn cell_helpers_resolve_values_and_styles() {
        let mut style = StyleEffect::new();
        style.insert("color".into(), json!("red"));
        let column = Column::new("score")
            .with_format(Formatter::template("${{ score }} pts"))
            .with_conditional_style(ConditionalStyle::new(Predicate::expression("score < 10"), style.clone()));
        let decorated = decorate_columns([column]).remove(0);

        let row = json!({ "score": 3 });
        assert_eq!(decorated.cell_value(&row).unwrap(), Some(json!("3 pts")));
        assert_eq!(decorated.cell_style(&row).unwrap(), style);
        assert!(decorated.cell_style(&json!({ "score": 30 })).unwrap().is_empty());
    }
}
