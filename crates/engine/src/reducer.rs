//! # Table State Reducer
//!
//! Folds [`TableAction`]s into new [`TableState`] snapshots. The reducer is
//! pure: it never touches the previous snapshot and reports what observers
//! should hear about as [`TableEvent`]s alongside the new state. A failing
//! action (for example sorting by an unsupported selector) returns an error
//! and produces no state.

use serde_json::Value;
use tabula_types::{Selector, SortDirection, TableConfig, TableError};
use tracing::{debug, warn};

use crate::selection::{insert_row, is_row_selected, remove_row};
use crate::sort::sort_rows;
use crate::state::{PaginationMode, RowKey, SortState, TableState, display_rows, is_expansion_disabled, is_selection_disabled, key_field};

/// Discrete state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    /// Toggles membership of one row in the selection.
    SelectSingleRow { row: Value },
    /// Selects every selectable visible row, or clears the selection when
    /// they are all selected already.
    SelectAllRows,
    ClearSelectedRows,
    SortChange { field: Option<Selector>, direction: SortDirection },
    ChangePage { page: usize },
    /// Keeps the first visible row on the resulting page.
    ChangeRowsPerPage { rows_per_page: usize },
    ToggleExpand { row: Value },
    /// Replaces the rows. The selection is kept.
    SetData { rows: Vec<Value> },
    /// Server-reported total row count; ignored unless paginating server-side.
    SetTotalRows { total_rows: usize },
    /// Returns to the configured default page.
    ResetPage,
}

impl TableAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectSingleRow { .. } => "select_single_row",
            Self::SelectAllRows => "select_all_rows",
            Self::ClearSelectedRows => "clear_selected_rows",
            Self::SortChange { .. } => "sort_change",
            Self::ChangePage { .. } => "change_page",
            Self::ChangeRowsPerPage { .. } => "change_rows_per_page",
            Self::ToggleExpand { .. } => "toggle_expand",
            Self::SetData { .. } => "set_data",
            Self::SetTotalRows { .. } => "set_total_rows",
            Self::ResetPage => "reset_page",
        }
    }
}

/// Notifications for the rendering and server-integration layers.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    SelectionChanged {
        all_selected: bool,
        selected_count: usize,
        selected_rows: Vec<Value>,
    },
    /// `server` is set when the sort was recorded but not applied locally.
    SortChanged {
        field: Option<Selector>,
        direction: SortDirection,
        server: bool,
    },
    PageChanged { page: usize, total_rows: usize },
    RowsPerPageChanged { rows_per_page: usize, page: usize },
    RowExpansionToggled { expanded: bool, row: Value },
}

/// Result of reducing one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: TableState,
    pub events: Vec<TableEvent>,
}

impl Transition {
    fn quiet(state: TableState) -> Self {
        Self { state, events: Vec::new() }
    }

    fn with_event(state: TableState, event: TableEvent) -> Self {
        Self {
            state,
            events: vec![event],
        }
    }
}

/// Computes the snapshot that follows `state` after `action`.
pub fn reduce(config: &TableConfig, state: &TableState, action: TableAction) -> Result<Transition, TableError> {
    let key_field = key_field(&config.options);
    let mut next = state.clone();

    let transition = match action {
        TableAction::SelectSingleRow { row } => {
            if is_selection_disabled(config, &row) {
                warn!("ignoring selection toggle for a disabled row");
                return Ok(Transition::quiet(next));
            }
            next.selection.rows = if is_row_selected(Some(&row), Some(&state.selection.rows), key_field) {
                remove_row(&state.selection.rows, &row, key_field)
            } else {
                insert_row(&state.selection.rows, row)
            };
            next.refresh_all_selected(config);
            let event = selection_changed(&next);
            Transition::with_event(next, event)
        }
        TableAction::SelectAllRows => {
            let selectable = state.selectable_page_rows(config);
            let fully_selected = !selectable.is_empty()
                && selectable
                    .iter()
                    .all(|row| is_row_selected(Some(row), Some(&state.selection.rows), key_field));
            next.selection.rows = if fully_selected { Vec::new() } else { selectable };
            next.refresh_all_selected(config);
            let event = selection_changed(&next);
            Transition::with_event(next, event)
        }
        TableAction::ClearSelectedRows => {
            next.selection.rows.clear();
            next.refresh_all_selected(config);
            let event = selection_changed(&next);
            Transition::with_event(next, event)
        }
        TableAction::SortChange { field, direction } => {
            let server = config.options.sort_server;
            if server {
                debug!(%direction, "sort delegated; keeping current row order");
            } else {
                next.rows = sort_rows(&state.data, field.as_ref(), direction, config.hooks.sort_function.as_ref())?;
            }
            next.sort = SortState {
                field: field.clone(),
                direction,
            };
            next.refresh_all_selected(config);
            Transition::with_event(
                next,
                TableEvent::SortChanged {
                    field,
                    direction,
                    server,
                },
            )
        }
        TableAction::ChangePage { page } => {
            next.pagination.current_page = next.pagination.clamp_page(page);
            if next.pagination.current_page != page {
                debug!(requested = page, page = next.pagination.current_page, "page clamped");
            }
            next.refresh_all_selected(config);
            let event = page_changed(&next);
            Transition::with_event(next, event)
        }
        TableAction::ChangeRowsPerPage { rows_per_page } => {
            let first_row = state.pagination.first_row_index();
            next.pagination.rows_per_page = rows_per_page.max(1);
            next.pagination.current_page = next.pagination.clamp_page(first_row / next.pagination.rows_per_page + 1);
            next.refresh_all_selected(config);
            let event = TableEvent::RowsPerPageChanged {
                rows_per_page: next.pagination.rows_per_page,
                page: next.pagination.current_page,
            };
            Transition::with_event(next, event)
        }
        TableAction::ToggleExpand { row } => {
            if is_expansion_disabled(config, &row) {
                warn!("ignoring expansion toggle for a disabled row");
                return Ok(Transition::quiet(next));
            }
            let expanded = next.expansion.toggle(RowKey::for_row(&row, key_field));
            Transition::with_event(next, TableEvent::RowExpansionToggled { expanded, row })
        }
        TableAction::SetData { rows } => {
            next.rows = display_rows(config, &rows, &state.sort)?;
            next.data = rows;
            if next.pagination.mode != PaginationMode::Server {
                next.pagination.total_rows = next.data.len();
            }
            next.pagination.clamp_current_page();
            next.expansion.seed(config, &next.rows);
            next.refresh_all_selected(config);
            Transition::quiet(next)
        }
        TableAction::SetTotalRows { total_rows } => {
            if next.pagination.mode != PaginationMode::Server {
                warn!(total_rows, "total row count only applies to server-side pagination");
                return Ok(Transition::quiet(next));
            }
            next.pagination.total_rows = total_rows;
            next.pagination.clamp_current_page();
            Transition::quiet(next)
        }
        TableAction::ResetPage => {
            next.pagination.current_page = next.pagination.clamp_page(config.options.pagination_default_page);
            next.refresh_all_selected(config);
            let event = page_changed(&next);
            Transition::with_event(next, event)
        }
    };

    Ok(transition)
}

fn selection_changed(state: &TableState) -> TableEvent {
    TableEvent::SelectionChanged {
        all_selected: state.selection.all_selected,
        selected_count: state.selection.selected_count(),
        selected_rows: state.selection.rows.clone(),
    }
}

fn page_changed(state: &TableState) -> TableEvent {
    TableEvent::PageChanged {
        page: state.pagination.current_page,
        total_rows: state.pagination.total_rows,
    }
}
