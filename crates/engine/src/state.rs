//! Immutable table state snapshots.
//!
//! A [`TableState`] bundles the row set with its selection, sort, pagination,
//! and expansion state. Snapshots are only produced by
//! [`TableState::initial`] and [`reduce`](crate::reducer::reduce); callers read
//! them through accessors.

use std::ops::Range;

use indexmap::IndexMap;
use serde_json::Value;
use tabula_types::{Selector, SortDirection, TableConfig, TableError, TableOptions};

use crate::field::FieldPath;
use crate::selection::{is_row_selected, row_key};
use crate::sort::sort_rows;

/// Identity of a row for expansion bookkeeping.
///
/// Keyed rows are identified by the JSON rendering of their key value, so `1`
/// and `"1"` are distinct. Rows without the key, or with a `null` key, are
/// identified by their whole JSON rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Keyed(String),
    Structural(String),
}

impl RowKey {
    pub fn for_row(row: &Value, key_field: Option<&str>) -> Self {
        key_field
            .and_then(|key_field| row_key(&FieldPath::parse(key_field), row).map(|key| Self::Keyed(key.to_string())))
            .unwrap_or_else(|| Self::Structural(row.to_string()))
    }
}

/// Selected rows, most recently selected first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub(crate) rows: Vec<Value>,
    pub(crate) all_selected: bool,
}

impl SelectionState {
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn selected_count(&self) -> usize {
        self.rows.len()
    }

    /// Every selectable visible row is selected.
    pub fn all_selected(&self) -> bool {
        self.all_selected
    }

    /// Some rows are selected but not all visible ones.
    pub fn is_indeterminate(&self) -> bool {
        !self.rows.is_empty() && !self.all_selected
    }

    pub fn contains(&self, row: &Value, key_field: Option<&str>) -> bool {
        is_row_selected(Some(row), Some(&self.rows), key_field)
    }
}

/// Requested sort. `field = None` keeps input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortState {
    pub field: Option<Selector>,
    pub direction: SortDirection,
}

/// How rows are split into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    /// Single page holding every row.
    #[default]
    Disabled,
    /// Rows are sliced locally.
    Client,
    /// Rows already are the current page; `total_rows` comes from the server.
    Server,
}

impl PaginationMode {
    pub fn from_options(options: &TableOptions) -> Self {
        match (options.pagination, options.pagination_server) {
            (false, _) => Self::Disabled,
            (true, false) => Self::Client,
            (true, true) => Self::Server,
        }
    }
}

/// Page window over the row set. `current_page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub(crate) current_page: usize,
    pub(crate) rows_per_page: usize,
    pub(crate) total_rows: usize,
    pub(crate) mode: PaginationMode,
}

impl PaginationState {
    pub fn new(mode: PaginationMode, rows_per_page: usize, total_rows: usize, page: usize) -> Self {
        let mut state = Self {
            current_page: 1,
            rows_per_page: rows_per_page.max(1),
            total_rows,
            mode,
        };
        state.current_page = state.clamp_page(page);
        state
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    /// Last valid page; 1 when there are no rows or pagination is disabled.
    pub fn last_page(&self) -> usize {
        match self.mode {
            PaginationMode::Disabled => 1,
            PaginationMode::Client | PaginationMode::Server => self.total_rows.div_ceil(self.rows_per_page).max(1),
        }
    }

    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.last_page())
    }

    /// Zero-based index of the first row on the current page.
    pub fn first_row_index(&self) -> usize {
        (self.current_page - 1) * self.rows_per_page
    }

    /// Range of locally held rows shown on the current page.
    pub fn window(&self, row_count: usize) -> Range<usize> {
        match self.mode {
            PaginationMode::Client => {
                let start = self.first_row_index().min(row_count);
                let end = start.saturating_add(self.rows_per_page).min(row_count);
                start..end
            }
            PaginationMode::Disabled | PaginationMode::Server => 0..row_count,
        }
    }

    pub(crate) fn clamp_current_page(&mut self) {
        self.current_page = self.clamp_page(self.current_page);
    }
}

/// Expanded flags keyed by row identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionState {
    pub(crate) rows: IndexMap<RowKey, bool>,
}

impl ExpansionState {
    pub fn is_expanded(&self, row: &Value, key_field: Option<&str>) -> bool {
        self.rows.get(&RowKey::for_row(row, key_field)).copied().unwrap_or(false)
    }

    pub fn expanded_count(&self) -> usize {
        self.rows.values().filter(|expanded| **expanded).count()
    }

    /// Flips the flag for `key` and returns the new value.
    pub(crate) fn toggle(&mut self, key: RowKey) -> bool {
        let expanded = self.rows.entry(key).or_insert(false);
        *expanded = !*expanded;
        *expanded
    }

    /// Records rows the hook marks as expanded, leaving known rows untouched.
    pub(crate) fn seed(&mut self, config: &TableConfig, rows: &[Value]) {
        let Some(expanded) = config.hooks.expandable_row_expanded.as_ref() else {
            return;
        };
        let key_field = key_field(&config.options);
        for row in rows {
            let key = RowKey::for_row(row, key_field);
            if !self.rows.contains_key(&key) && expanded(row) {
                self.rows.insert(key, true);
            }
        }
    }
}

/// Complete table state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    /// Rows in the order they were supplied.
    pub(crate) data: Vec<Value>,
    /// Rows in display order.
    pub(crate) rows: Vec<Value>,
    pub(crate) selection: SelectionState,
    pub(crate) sort: SortState,
    pub(crate) pagination: PaginationState,
    pub(crate) expansion: ExpansionState,
}

impl TableState {
    /// Builds the initial snapshot for `data`.
    ///
    /// Applies the configured default sort, default page (clamped), and
    /// rows-per-page. Rows flagged by the `selectable_row_selected` and
    /// `expandable_row_expanded` hooks start selected or expanded.
    pub fn initial(config: &TableConfig, data: Vec<Value>) -> Result<Self, TableError> {
        let options = &config.options;
        let sort = SortState {
            field: options.default_sort_field.as_deref().map(Selector::path),
            direction: SortDirection::from_ascending(options.default_sort_asc),
        };
        let rows = display_rows(config, &data, &sort)?;
        let mode = PaginationMode::from_options(options);
        let total_rows = match mode {
            PaginationMode::Server => options.pagination_total_rows.unwrap_or(data.len()),
            PaginationMode::Client | PaginationMode::Disabled => data.len(),
        };
        let pagination = PaginationState::new(mode, options.pagination_per_page, total_rows, options.pagination_default_page);

        let selection_rows = match config.hooks.selectable_row_selected.as_ref() {
            Some(selected) => rows
                .iter()
                .filter(|row| selected(*row) && !is_selection_disabled(config, row))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let mut expansion = ExpansionState::default();
        expansion.seed(config, &rows);

        let mut state = Self {
            data,
            rows,
            selection: SelectionState {
                rows: selection_rows,
                all_selected: false,
            },
            sort,
            pagination,
            expansion,
        };
        state.refresh_all_selected(config);
        Ok(state)
    }

    /// Rows in input order.
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// Rows in display order.
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// Rows shown on the current page.
    pub fn page_rows(&self) -> &[Value] {
        &self.rows[self.pagination.window(self.rows.len())]
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Visible rows that may be selected.
    pub(crate) fn selectable_page_rows(&self, config: &TableConfig) -> Vec<Value> {
        self.page_rows()
            .iter()
            .filter(|row| !is_selection_disabled(config, row))
            .cloned()
            .collect()
    }

    pub(crate) fn refresh_all_selected(&mut self, config: &TableConfig) {
        let key_field = key_field(&config.options);
        let selectable = self.selectable_page_rows(config);
        self.selection.all_selected = !selectable.is_empty()
            && selectable
                .iter()
                .all(|row| is_row_selected(Some(row), Some(&self.selection.rows), key_field));
    }
}

/// Configured key field, ignoring blank values.
pub(crate) fn key_field(options: &TableOptions) -> Option<&str> {
    Some(options.key_field.as_str()).filter(|key| !key.trim().is_empty())
}

pub(crate) fn is_selection_disabled(config: &TableConfig, row: &Value) -> bool {
    config.hooks.selectable_row_disabled.as_ref().is_some_and(|disabled| disabled(row))
}

pub(crate) fn is_expansion_disabled(config: &TableConfig, row: &Value) -> bool {
    config.hooks.expandable_row_disabled.as_ref().is_some_and(|disabled| disabled(row))
}

/// Display order for `data`: sorted locally unless sorting is delegated.
pub(crate) fn display_rows(config: &TableConfig, data: &[Value], sort: &SortState) -> Result<Vec<Value>, TableError> {
    if config.options.sort_server {
        return Ok(data.to_vec());
    }
    sort_rows(data, sort.field.as_ref(), sort.direction, config.hooks.sort_function.as_ref())
}
