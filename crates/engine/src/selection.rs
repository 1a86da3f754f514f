//! Selected-row set operations.
//!
//! The selection is an ordered `Vec` of rows, most recent first. Rows are
//! compared under an [`IdentityRule`] chosen once per operation from the
//! candidate row: keyed when a key field is supplied and the candidate carries
//! a non-null value for it, structural otherwise. A keyed rule still compares
//! members lacking the key as whole rows, so two rows are matched by key only
//! when the key exists on both.

use serde_json::Value;
use tracing::debug;

use crate::field::FieldPath;

/// Equality strategy used to match rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRule {
    /// Rows carrying the key field are equal when the key values are equal.
    Keyed(FieldPath),
    /// Rows are equal when they are equal as whole values.
    Structural,
}

impl IdentityRule {
    /// Chooses the rule for comparing `candidate` against the members of a set.
    ///
    /// A `null` key counts as missing.
    pub fn resolve(key_field: Option<&str>, candidate: &Value) -> Self {
        let Some(key_field) = key_field.filter(|key| !key.trim().is_empty()) else {
            return Self::Structural;
        };
        let path = FieldPath::parse(key_field);
        if row_key(&path, candidate).is_some() {
            Self::Keyed(path)
        } else {
            debug!(key_field, "row has no key value; comparing rows structurally");
            Self::Structural
        }
    }

    pub fn matches(&self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Keyed(path) => match (row_key(path, left), row_key(path, right)) {
                (Some(left_key), Some(right_key)) => left_key == right_key,
                _ => left == right,
            },
            Self::Structural => left == right,
        }
    }
}

/// Key value of `row`, treating `null` as absent.
pub(crate) fn row_key<'a>(path: &FieldPath, row: &'a Value) -> Option<&'a Value> {
    path.lookup(row).filter(|key| !key.is_null())
}

/// Returns a new set with `row` at the front.
pub fn insert_row(set: &[Value], row: Value) -> Vec<Value> {
    let mut next = Vec::with_capacity(set.len() + 1);
    next.push(row);
    next.extend_from_slice(set);
    next
}

/// Returns a new set without the first entry matching `row`.
pub fn remove_row(set: &[Value], row: &Value, key_field: Option<&str>) -> Vec<Value> {
    let rule = IdentityRule::resolve(key_field, row);
    let mut next = set.to_vec();
    if let Some(position) = next.iter().position(|member| rule.matches(member, row)) {
        next.remove(position);
    }
    next
}

/// Whether `row` is a member of `set`. Missing inputs are never selected.
pub fn is_row_selected(row: Option<&Value>, set: Option<&[Value]>, key_field: Option<&str>) -> bool {
    let (Some(row), Some(set)) = (row, set) else {
        return false;
    };
    let rule = IdentityRule::resolve(key_field, row);
    set.iter().any(|member| rule.matches(member, row))
}
