//! Row ordering by a resolved field value.

use std::cmp::Ordering;

use serde_json::Value;
use tabula_types::{Selector, SortDirection, SortFunction, TableError};

use crate::field::resolve;

/// Sorts rows by `field`, returning a new vector.
///
/// A custom sort function takes over entirely and its output is returned
/// verbatim. Without a field the rows come back in input order. Otherwise the
/// order is stable in both directions: rows whose values compare equal keep
/// their relative input order.
pub fn sort_rows(
    rows: &[Value],
    field: Option<&Selector>,
    direction: SortDirection,
    custom: Option<&SortFunction>,
) -> Result<Vec<Value>, TableError> {
    if let Some(custom) = custom {
        return Ok(custom(rows, field, direction));
    }
    let Some(field) = field else {
        return Ok(rows.to_vec());
    };

    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        keyed.push((resolve(row, field, None)?, row));
    }
    keyed.sort_by(|(left, _), (right, _)| {
        let ordering = compare_values(left.as_ref(), right.as_ref());
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    Ok(keyed.into_iter().map(|(_, row)| row.clone()).collect())
}

/// Total order over optional JSON values.
///
/// Values of the same kind compare naturally (numbers numerically, strings
/// lexicographically, `false < true`). Across kinds the order is
/// `bool < number < string < array < object < null < missing`, so rows
/// lacking the field trail in ascending order. Arrays and objects compare
/// equal among themselves.
pub fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => compare_numbers(left, right),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        _ => rank(left).cmp(&rank(right)),
    }
}

fn compare_numbers(left: &serde_json::Number, right: &serde_json::Number) -> Ordering {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return left.cmp(&right);
    }
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return left.cmp(&right);
    }
    let left = left.as_f64().unwrap_or(f64::NAN);
    let right = right.as_f64().unwrap_or(f64::NAN);
    left.total_cmp(&right)
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Bool(_)) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Array(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Null) => 5,
        None => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn names(rows: &[Value]) -> Vec<&str> {
        rows.iter().map(|row| row["name"].as_str().unwrap_or("?")).collect()
    }

    #[test]
    fn built_in_sort_descending() {
        let rows = vec![json!({ "name": "luke" }), json!({ "name": "vadar" })];
        let sorted = sort_rows(&rows, Some(&Selector::path("name")), SortDirection::Desc, None).unwrap();
        assert_eq!(names(&sorted), vec!["vadar", "luke"]);
    }

    #[test]
    fn missing_field_keeps_input_order() {
        let rows = vec![json!({ "name": "vadar" }), json!({ "name": "luke" })];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sorted = sort_rows(&rows, None, direction, None).unwrap();
            assert_eq!(sorted, rows);
        }
    }

    #[test]
    fn custom_sort_is_delegated_verbatim() {
        let seen = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen);
        let custom: SortFunction = Arc::new(move |rows: &[Value], field: Option<&Selector>, direction: SortDirection| {
            *recorder.lock().unwrap() = Some((rows.to_vec(), field.cloned(), direction));
            vec![json!("replaced")]
        });

        let rows = vec![json!({ "name": "luke" }), json!({ "name": "vadar" })];
        let field = Selector::path("name");
        let sorted = sort_rows(&rows, Some(&field), SortDirection::Desc, Some(&custom)).unwrap();

        assert_eq!(sorted, vec![json!("replaced")]);
        let recorded = seen.lock().unwrap().clone().expect("custom sort called");
        assert_eq!(recorded, (rows, Some(field), SortDirection::Desc));
    }

    #[test]
    fn numbers_sort_numerically() {
        let rows = vec![json!({ "n": 10 }), json!({ "n": 9 }), json!({ "n": 2.5 }), json!({ "n": -1 })];
        let sorted = sort_rows(&rows, Some(&Selector::path("n")), SortDirection::Asc, None).unwrap();
        let values: Vec<f64> = sorted.iter().filter_map(|row| row["n"].as_f64()).collect();
        assert_eq!(values, vec![-1.0, 2.5, 9.0, 10.0]);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let rows = vec![
            json!({ "name": "a", "group": 1 }),
            json!({ "name": "b", "group": 2 }),
            json!({ "name": "c", "group": 1 }),
            json!({ "name": "d", "group": 2 }),
        ];
        let field = Selector::path("group");

        let ascending = sort_rows(&rows, Some(&field), SortDirection::Asc, None).unwrap();
        assert_eq!(names(&ascending), vec!["a", "c", "b", "d"]);

        let descending = sort_rows(&rows, Some(&field), SortDirection::Desc, None).unwrap();
        assert_eq!(names(&descending), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn rows_missing_the_field_trail_ascending_and_lead_descending() {
        let rows = vec![json!({ "name": "x" }), json!({ "name": "y", "age": 30 }), json!({ "name": "z", "age": 20 })];
        let field = Selector::path("age");

        let ascending = sort_rows(&rows, Some(&field), SortDirection::Asc, None).unwrap();
        assert_eq!(names(&ascending), vec!["z", "y", "x"]);

        let descending = sort_rows(&rows, Some(&field), SortDirection::Desc, None).unwrap();
        assert_eq!(names(&descending), vec!["x", "y", "z"]);
    }

    #[test]
    fn sorting_does_not_mutate_input() {
        let rows = vec![json!({ "name": "b" }), json!({ "name": "a" })];
        let snapshot = rows.clone();
        let _ = sort_rows(&rows, Some(&Selector::path("name")), SortDirection::Asc, None).unwrap();
        assert_eq!(rows, snapshot);
    }

    #[test]
    fn unsupported_selector_fails_the_sort() {
        let rows = vec![json!({ "name": "b" })];
        let result = sort_rows(&rows, Some(&Selector::Unsupported(json!(true))), SortDirection::Asc, None);
        assert!(matches!(result, Err(TableError::InvalidSelector { .. })));
    }

    #[test]
    fn compare_values_ranks_kinds() {
        assert_eq!(compare_values(Some(&json!(true)), Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("a")), Some(&json!(null))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(null)), None), Ordering::Less);
        assert_eq!(compare_values(None, None), Ordering::Equal);
    }
}
