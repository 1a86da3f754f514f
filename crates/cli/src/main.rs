use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use serde_json::{Value, json};
use tabula_engine::{TableAction, TableEngine, TableEvent, parse_table_file};
use tabula_types::{SortDirection, TableHooks};
use tracing::{debug, info};

fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();
    let page = run(&matches)?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new("tabula")
        .about("Render one page of a table as JSON")
        .arg(
            Arg::new("table")
                .long("table")
                .short('t')
                .required(true)
                .action(ArgAction::Set)
                .help("Path to table definition YAML/JSON"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .short('d')
                .required(true)
                .action(ArgAction::Set)
                .help("Path to a JSON array of rows"),
        )
        .arg(Arg::new("sort").long("sort").action(ArgAction::Set).help("Column name or selector to sort by"))
        .arg(Arg::new("desc").long("desc").action(ArgAction::SetTrue).help("Sort descending"))
        .arg(Arg::new("page").long("page").value_parser(value_parser!(usize)).action(ArgAction::Set))
        .arg(Arg::new("per-page").long("per-page").value_parser(value_parser!(usize)).action(ArgAction::Set))
        .arg(Arg::new("select-all").long("select-all").action(ArgAction::SetTrue).help("Select every row on the page"))
}

fn run(matches: &ArgMatches) -> Result<Value> {
    let table_path = matches.get_one::<String>("table").context("missing --table")?;
    let data_path = matches.get_one::<String>("data").context("missing --data")?;

    let definition = parse_table_file(table_path)?;
    let rows = load_rows(data_path)?;
    let mut engine = TableEngine::from_definition(definition, TableHooks::default(), rows)?;
    engine.subscribe(|event: &TableEvent| info!(event = ?event, "table event"));

    if let Some(sort) = matches.get_one::<String>("sort") {
        sort_by(&mut engine, sort, matches.get_flag("desc"))?;
    }
    if let Some(rows_per_page) = matches.get_one::<usize>("per-page") {
        engine.dispatch(TableAction::ChangeRowsPerPage {
            rows_per_page: *rows_per_page,
        })?;
    }
    if let Some(page) = matches.get_one::<usize>("page") {
        engine.dispatch(TableAction::ChangePage { page: *page })?;
    }
    if matches.get_flag("select-all") {
        engine.dispatch(TableAction::SelectAllRows)?;
    }

    render_page(&engine)
}

fn load_rows(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read rows file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Rows file must contain a JSON array: {}", path.display()))
}

/// Sorts by the sortable column whose name or selector path matches `column`.
fn sort_by(engine: &mut TableEngine, column: &str, descending: bool) -> Result<()> {
    let decorated = engine
        .columns()
        .iter()
        .find(|decorated| decorated.column.name.as_deref() == Some(column) || decorated.column.selector.as_path() == Some(column))
        .with_context(|| format!("no column named '{column}'"))?;
    if !decorated.column.sortable {
        bail!("column '{column}' is not sortable");
    }

    let field = decorated.column.selector.clone();
    engine.dispatch(TableAction::SortChange {
        field: Some(field),
        direction: SortDirection::from_ascending(!descending),
    })?;
    debug!(column, descending, "sorted");
    Ok(())
}

fn render_page(engine: &TableEngine) -> Result<Value> {
    let mut rows = Vec::new();
    for row in engine.page_rows() {
        let mut cells = Vec::new();
        for decorated in engine.columns() {
            cells.push(json!({
                "column": decorated.id.to_string(),
                "name": decorated.column.name,
                "value": decorated.cell_value(row)?,
                "style": decorated.cell_style(row)?,
            }));
        }
        rows.push(json!({
            "selected": engine.is_selected(row),
            "expanded": engine.is_expanded(row),
            "cells": cells,
        }));
    }

    let state = engine.state();
    let pagination = state.pagination();
    let sort = state
        .sort()
        .field
        .as_ref()
        .and_then(|field| field.as_path())
        .map(|path| json!({ "field": path, "direction": state.sort().direction.as_str() }));
    Ok(json!({
        "page": pagination.current_page(),
        "last_page": pagination.last_page(),
        "total_rows": pagination.total_rows(),
        "sort": sort,
        "selected_count": state.selection().selected_count(),
        "all_selected": state.selection().all_selected(),
        "rows": rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(dir: &Path) -> (String, String) {
        let table_path = dir.join("table.yaml");
        fs::write(
            &table_path,
            r#"
options:
  pagination: true
  pagination_per_page: 2
columns:
  - name: Name
    selector: name
    sortable: true
  - name: Age
    selector: age
    sortable: true
    format: "${{ age }}y"
    conditional_styles:
      - when: age >= 30
        style:
          color: red
"#,
        )
        .unwrap();
        let data_path = dir.join("rows.json");
        fs::write(
            &data_path,
            r#"[{"id":1,"name":"luke","age":19},{"id":2,"name":"vadar","age":45},{"id":3,"name":"leia","age":19}]"#,
        )
        .unwrap();
        (table_path.display().to_string(), data_path.display().to_string())
    }

    #[test]
    fn renders_sorted_selected_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (table, data) = fixture(temp_dir.path());
        let matches = build_cli().get_matches_from(["tabula", "--table", table.as_str(), "--data", data.as_str(), "--sort", "Age", "--desc", "--select-all"]);

        let page = run(&matches).unwrap();
        assert_eq!(page["page"], 1);
        assert_eq!(page["last_page"], 2);
        assert_eq!(page["sort"]["direction"], "desc");
        assert_eq!(page["selected_count"], 2);
        assert_eq!(page["rows"][0]["cells"][0]["value"], "vadar");
        assert_eq!(page["rows"][0]["cells"][1]["value"], "45y");
        assert_eq!(page["rows"][0]["cells"][1]["style"]["color"], "red");
        assert_eq!(page["rows"][1]["cells"][1]["style"], json!({}));
        assert_eq!(page["rows"][1]["selected"], true);
    }

    #[test]
    fn changes_page_size_and_page() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (table, data) = fixture(temp_dir.path());
        let matches = build_cli().get_matches_from(["tabula", "-t", table.as_str(), "-d", data.as_str(), "--per-page", "1", "--page", "3"]);

        let page = run(&matches).unwrap();
        assert_eq!(page["page"], 3);
        assert_eq!(page["rows"].as_array().map(Vec::len), Some(1));
        assert_eq!(page["rows"][0]["cells"][0]["value"], "leia");
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (table, data) = fixture(temp_dir.path());
        let matches = build_cli().get_matches_from(["tabula", "-t", table.as_str(), "-d", data.as_str(), "--sort", "missing"]);
        assert!(run(&matches).is_err());
    }

    #[test]
    fn descending_sort_is_a_single_sort_change() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (table, data) = fixture(temp_dir.path());
        let definition = parse_table_file(&table).unwrap();
        let mut engine = TableEngine::from_definition(definition, TableHooks::default(), load_rows(&data).unwrap()).unwrap();
        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&events);
        engine.subscribe(move |event: &TableEvent| sink.borrow_mut().push(event.clone()));

        sort_by(&mut engine, "age", true).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            TableEvent::SortChanged {
                direction: SortDirection::Desc,
                ..
            }
        ));
        assert_eq!(engine.page_rows()[0]["name"], "vadar");
    }

    #[test]
    fn unsortable_column_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (table, data) = fixture(temp_dir.path());
        let mut definition = parse_table_file(&table).unwrap();
        definition.columns[0].sortable = false;
        let mut engine = TableEngine::from_definition(definition, TableHooks::default(), load_rows(&data).unwrap()).unwrap();
        assert!(sort_by(&mut engine, "Name", false).is_err());
        assert_eq!(engine.state().sort().field, None);
    }
}
