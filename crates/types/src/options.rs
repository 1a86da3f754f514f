//! Table configuration: serializable options plus closure hooks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::column::{ColumnDefinition, RowPredicate, Selector};

/// Sort direction applied by the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Maps an "ascending?" flag to a direction.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending { Self::Asc } else { Self::Desc }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replacement for the built-in comparator. Receives the rows in input order
/// and its result is used verbatim.
pub type SortFunction = Arc<dyn Fn(&[Value], Option<&Selector>, SortDirection) -> Vec<Value> + Send + Sync>;

/// Serializable table options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableOptions {
    /// Path into each row yielding its identity. Rows lacking it fall back to
    /// structural identity.
    pub key_field: String,
    pub default_sort_field: Option<String>,
    pub default_sort_asc: bool,
    /// Record sort requests without re-ordering rows locally.
    pub sort_server: bool,
    pub pagination: bool,
    /// The row set is already the current page; only `total_rows` drives paging.
    pub pagination_server: bool,
    pub pagination_default_page: usize,
    pub pagination_per_page: usize,
    /// Total row count reported by the server when `pagination_server` is set.
    pub pagination_total_rows: Option<usize>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            key_field: "id".to_string(),
            default_sort_field: None,
            default_sort_asc: true,
            sort_server: false,
            pagination: false,
            pagination_server: false,
            pagination_default_page: 1,
            pagination_per_page: 10,
            pagination_total_rows: None,
        }
    }
}

/// Behavioral hooks that cannot be expressed in a configuration file.
#[derive(Clone, Default)]
pub struct TableHooks {
    pub sort_function: Option<SortFunction>,
    /// Rows for which this returns `true` cannot be selected.
    pub selectable_row_disabled: Option<RowPredicate>,
    /// Rows for which this returns `true` start out selected.
    pub selectable_row_selected: Option<RowPredicate>,
    /// Rows for which this returns `true` cannot be expanded or collapsed.
    pub expandable_row_disabled: Option<RowPredicate>,
    /// Rows for which this returns `true` start out expanded.
    pub expandable_row_expanded: Option<RowPredicate>,
}

impl TableHooks {
    pub fn with_sort_function<F>(mut self, sort: F) -> Self
    where
        F: Fn(&[Value], Option<&Selector>, SortDirection) -> Vec<Value> + Send + Sync + 'static,
    {
        self.sort_function = Some(Arc::new(sort));
        self
    }

    pub fn with_selectable_row_disabled<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.selectable_row_disabled = Some(Arc::new(predicate));
        self
    }

    pub fn with_selectable_row_selected<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.selectable_row_selected = Some(Arc::new(predicate));
        self
    }

    pub fn with_expandable_row_disabled<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.expandable_row_disabled = Some(Arc::new(predicate));
        self
    }

    pub fn with_expandable_row_expanded<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.expandable_row_expanded = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for TableHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHooks")
            .field("sort_function", &self.sort_function.is_some())
            .field("selectable_row_disabled", &self.selectable_row_disabled.is_some())
            .field("selectable_row_selected", &self.selectable_row_selected.is_some())
            .field("expandable_row_disabled", &self.expandable_row_disabled.is_some())
            .field("expandable_row_expanded", &self.expandable_row_expanded.is_some())
            .finish()
    }
}

/// Options and hooks together.
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    pub options: TableOptions,
    pub hooks: TableHooks,
}

impl TableConfig {
    pub fn new(options: TableOptions) -> Self {
        Self {
            options,
            hooks: TableHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: TableHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Declarative table file: options plus column definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableDefinition {
    #[serde(default)]
    pub options: TableOptions,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_direction_from_flag() {
        assert_eq!(SortDirection::from_ascending(true), SortDirection::Asc);
        assert_eq!(SortDirection::from_ascending(false), SortDirection::Desc);
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.to_string(), "desc");
    }

    #[test]
    fn options_fill_missing_fields_with_defaults() {
        let options: TableOptions = serde_yaml::from_str("pagination: true\npagination_per_page: 25\n").expect("parse options");
        assert!(options.pagination);
        assert_eq!(options.pagination_per_page, 25);
        assert_eq!(options.key_field, "id");
        assert!(options.default_sort_asc);
        assert_eq!(options.pagination_default_page, 1);
    }
}
