//! Shared type definitions for the Tabula table engine.
//!
//! Rows are plain `serde_json::Value`s. The types here describe how a table
//! looks at those rows (columns, selectors, conditional styles) and how it is
//! configured (options and hooks). Behavior lives in `tabula-engine`.

pub mod column;
pub mod error;
pub mod options;

pub use column::{
    Column, ColumnDefinition, ConditionalStyle, ConditionalStyleDefinition, Formatter, Predicate, RowAccessor, RowPredicate, Selector,
    StyleEffect,
};
pub use error::TableError;
pub use options::{SortDirection, SortFunction, TableConfig, TableDefinition, TableHooks, TableOptions};
