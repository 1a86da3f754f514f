//! Stateful wrapper around the reducer.
//!
//! [`TableEngine`] owns the current snapshot, applies actions one at a time,
//! and forwards the resulting events to subscribed observers.

use std::sync::mpsc::Sender;

use serde_json::Value;
use tabula_types::{Column, SortDirection, TableConfig, TableDefinition, TableError, TableHooks};
use tracing::{debug, warn};

use crate::columns::{ColumnId, DecoratedColumn, decorate_columns};
use crate::reducer::{TableAction, TableEvent, reduce};
use crate::state::TableState;

/// Receives events emitted while the engine applies actions.
pub trait TableObserver {
    fn on_event(&self, event: &TableEvent);
}

impl<F> TableObserver for F
where
    F: Fn(&TableEvent),
{
    fn on_event(&self, event: &TableEvent) {
        self(event)
    }
}

/// Table state for the lifetime of one table instance.
pub struct TableEngine {
    config: TableConfig,
    columns: Vec<DecoratedColumn>,
    state: TableState,
    observers: Vec<Box<dyn TableObserver>>,
}

impl TableEngine {
    pub fn new(config: TableConfig, columns: impl IntoIterator<Item = Column>, rows: Vec<Value>) -> Result<Self, TableError> {
        let state = TableState::initial(&config, rows)?;
        Ok(Self {
            config,
            columns: decorate_columns(columns),
            state,
            observers: Vec::new(),
        })
    }

    /// Builds an engine from a declarative table definition plus hooks.
    pub fn from_definition(definition: TableDefinition, hooks: TableHooks, rows: Vec<Value>) -> Result<Self, TableError> {
        let config = TableConfig::new(definition.options).with_hooks(hooks);
        Self::new(config, definition.columns.into_iter().map(Column::from), rows)
    }

    pub fn subscribe(&mut self, observer: impl TableObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Forwards every event to `sender`. Events are dropped once the receiver is gone.
    pub fn subscribe_channel(&mut self, sender: Sender<TableEvent>) {
        self.subscribe(move |event: &TableEvent| {
            if sender.send(event.clone()).is_err() {
                debug!("table event receiver disconnected");
            }
        });
    }

    /// Applies `action` and notifies observers. On error the current state is kept.
    pub fn dispatch(&mut self, action: TableAction) -> Result<&TableState, TableError> {
        let action_name = action.name();
        let transition = match reduce(&self.config, &self.state, action) {
            Ok(transition) => transition,
            Err(error) => {
                warn!(action = action_name, error = %error, "table action rejected");
                return Err(error);
            }
        };
        debug!(action = action_name, events = transition.events.len(), "table action applied");

        self.state = transition.state;
        for event in &transition.events {
            for observer in &self.observers {
                observer.on_event(event);
            }
        }
        Ok(&self.state)
    }

    /// Sorts by a sortable column. Re-sorting the active column flips the
    /// direction; a newly chosen column starts ascending.
    pub fn toggle_sort(&mut self, column_id: ColumnId) -> Result<&TableState, TableError> {
        let Some(column) = self.column(column_id) else {
            warn!(%column_id, "unknown column");
            return Ok(&self.state);
        };
        if !column.column.sortable {
            debug!(%column_id, "column is not sortable");
            return Ok(&self.state);
        }
        let field = column.column.selector.clone();
        let sort = self.state.sort();
        let direction = if sort.field.as_ref() == Some(&field) {
            sort.direction.toggled()
        } else {
            SortDirection::Asc
        };
        self.dispatch(TableAction::SortChange {
            field: Some(field),
            direction,
        })
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn columns(&self) -> &[DecoratedColumn] {
        &self.columns
    }

    pub fn column(&self, id: ColumnId) -> Option<&DecoratedColumn> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Rows shown on the current page.
    pub fn page_rows(&self) -> &[Value] {
        self.state.page_rows()
    }

    pub fn is_selected(&self, row: &Value) -> bool {
        self.state.selection().contains(row, self.key_field())
    }

    pub fn is_expanded(&self, row: &Value) -> bool {
        self.state.expansion().is_expanded(row, self.key_field())
    }

    fn key_field(&self) -> Option<&str> {
        crate::state::key_field(&self.config.options)
    }
}

impl std::fmt::Debug for TableEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableEngine")
            .field("config", &self.config)
            .field("columns", &self.columns)
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}
