//! # Tabula Engine
//!
//! Headless state engine for data tables. It resolves cell values, sorts
//! rows, tracks selection, pagination, and row expansion, and evaluates
//! conditional cell styles. Rendering is left to the caller.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use tabula_engine::{TableAction, TableEngine, parse_table_file};
//! use tabula_types::TableHooks;
//!
//! let temp_dir = tempfile::tempdir()?;
//! let table_path = temp_dir.path().join("people.yaml");
//! std::fs::write(&table_path, r#"
//! options:
//!   pagination: true
//!   pagination_per_page: 2
//! columns:
//!   - name: Name
//!     selector: name
//!     sortable: true
//! "#)?;
//!
//! let definition = parse_table_file(&table_path)?;
//! let rows = vec![json!({ "id": 1, "name": "luke" }), json!({ "id": 2, "name": "leia" })];
//! let mut engine = TableEngine::from_definition(definition, TableHooks::default(), rows)?;
//! engine.dispatch(TableAction::SelectAllRows)?;
//! assert!(engine.state().selection().all_selected());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`field`**: selector resolution and cell formatting
//! - **`sort`**: stable row ordering
//! - **`selection`**: identity-aware selection set helpers
//! - **`conditional`**: conditional style rules and condition expressions
//! - **`columns`**: column identifiers and per-cell helpers
//! - **`state`** / **`reducer`**: immutable snapshots and the pure transition function
//! - **`engine`**: the stateful [`TableEngine`] and its observers

use std::{fs, path::Path};

use anyhow::{Context, Result};
use tabula_types::TableDefinition;

pub mod columns;
pub mod conditional;
pub mod engine;
pub mod field;
pub mod reducer;
pub mod selection;
pub mod sort;
pub mod state;

pub use columns::{ColumnId, DecoratedColumn, decorate_columns};
pub use conditional::{conditional_style, eval_condition};
pub use engine::{TableEngine, TableObserver};
pub use field::{FieldPath, PathSegment, resolve};
pub use reducer::{TableAction, TableEvent, Transition, reduce};
pub use selection::{IdentityRule, insert_row, is_row_selected, remove_row};
pub use sort::sort_rows;
pub use state::{ExpansionState, PaginationMode, PaginationState, RowKey, SelectionState, SortState, TableState};

/// Loads a table definition (options and columns) from a YAML or JSON file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or does not describe a table.
pub fn parse_table_file(file_path: impl AsRef<Path>) -> Result<TableDefinition> {
    let file_path = file_path.as_ref();
    let file_content = fs::read(file_path).with_context(|| format!("Failed to read table file: {}", file_path.display()))?;
    let content_string = String::from_utf8_lossy(&file_content);

    // JSON is a subset of YAML, so one parser covers both formats.
    serde_yaml::from_str::<TableDefinition>(&content_string)
        .with_context(|| format!("Unsupported table document format: {}", file_path.display()))
}
