//! # Conditional Styles
//!
//! Picks the style effect of the first rule whose predicate holds for a row.
//!
//! Predicates are either closures or condition expressions. Expressions
//! support `==`, `!=`, `>`, `>=`, `<`, `<=`, leading `!`, `&&`, `||`,
//! parenthesized groups, JSON literals (`"done"`, `3`, `true`, `null`),
//! single-quoted strings (`'done'`) and row paths (`owner.name`, `tags[0]`).
//! A bare path is tested for truthiness. `&&` binds tighter than `||`.
//!
//! Rules are validated lazily: only the rules visited before the first match
//! can fail.

use std::cmp::Ordering;

use serde_json::Value;
use tabula_types::{ConditionalStyle, Predicate, StyleEffect, TableError};

use crate::field::FieldPath;
use crate::sort::compare_values;

/// Returns the style of the first matching rule, or an empty effect.
pub fn conditional_style(row: &Value, rules: Option<&[ConditionalStyle]>) -> Result<StyleEffect, TableError> {
    for (index, rule) in rules.unwrap_or_default().iter().enumerate() {
        let Some(when) = rule.when.as_ref() else {
            return Err(TableError::invalid_predicate(index, "rule has no `when` predicate"));
        };
        let matched = match when {
            Predicate::Function(predicate) => predicate(row),
            Predicate::Expression(expression) => {
                eval_condition(expression, row).map_err(|reason| TableError::invalid_predicate(index, reason))?
            }
            Predicate::Unsupported(value) => {
                return Err(TableError::invalid_predicate(
                    index,
                    format!("`when` must be a function or a condition expression, got {value}"),
                ));
            }
        };
        if matched {
            return Ok(rule.style.clone().unwrap_or_default());
        }
    }
    Ok(StyleEffect::new())
}

/// Evaluates a condition expression against a row.
pub fn eval_condition(expression: &str, row: &Value) -> Result<bool, String> {
    let trimmed = strip_wrapping_parens(expression.trim());
    if trimmed.is_empty() {
        return Err("expression cannot be empty".to_string());
    }

    if let Some(parts) = split_top_level(trimmed, "||") {
        for part in parts {
            if eval_condition(part, row)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    if let Some(parts) = split_top_level(trimmed, "&&") {
        for part in parts {
            if !eval_condition(part, row)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    let (negations, inner) = strip_leading_negations(trimmed);
    let inner = inner.trim();
    if inner.is_empty() {
        return Err("expression cannot end with negation operator".to_string());
    }
    let result = if strip_wrapping_parens(inner).len() < inner.len() {
        eval_condition(inner, row)?
    } else {
        evaluate_comparison(inner, row)?
    };
    Ok(if negations % 2 == 1 { !result } else { result })
}

fn evaluate_comparison(expression: &str, row: &Value) -> Result<bool, String> {
    for operator in ["==", "!=", ">=", "<=", ">", "<"] {
        let Some(position) = find_top_level_operator(expression, operator) else {
            continue;
        };
        let left = expression[..position].trim();
        let right = expression[position + operator.len()..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(format!("comparison '{operator}' must include both left and right operands"));
        }
        let left = resolve_operand(left, row)?;
        let right = resolve_operand(right, row)?;
        return Ok(match operator {
            "==" => values_equal(left.as_ref(), right.as_ref()),
            "!=" => !values_equal(left.as_ref(), right.as_ref()),
            ">=" => ordered(left.as_ref(), right.as_ref()).is_some_and(Ordering::is_ge),
            "<=" => ordered(left.as_ref(), right.as_ref()).is_some_and(Ordering::is_le),
            ">" => ordered(left.as_ref(), right.as_ref()).is_some_and(Ordering::is_gt),
            _ => ordered(left.as_ref(), right.as_ref()).is_some_and(Ordering::is_lt),
        });
    }
    Ok(is_truthy(resolve_operand(expression, row)?.as_ref()))
}

fn resolve_operand(expression: &str, row: &Value) -> Result<Option<Value>, String> {
    if let Some(text) = expression.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return Ok(Some(Value::String(text.to_string())));
    }
    if looks_like_json_literal(expression) {
        return serde_json::from_str::<Value>(expression)
            .map(Some)
            .map_err(|error| format!("invalid literal '{expression}': {error}"));
    }
    if !is_path_expression(expression) {
        return Err(format!("unsupported operand '{expression}'"));
    }
    Ok(FieldPath::parse(expression).lookup(row).cloned())
}

fn values_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (Some(Value::Number(_)), Some(Value::Number(_))) => compare_values(left, right) == Ordering::Equal,
        _ => left == right,
    }
}

/// Orders numbers with numbers and strings with strings; anything else is unordered.
fn ordered(left: Option<&Value>, right: Option<&Value>) -> Option<Ordering> {
    match (left, right) {
        (Some(Value::Number(_)), Some(Value::Number(_))) | (Some(Value::String(_)), Some(Value::String(_))) => {
            Some(compare_values(left, right))
        }
        _ => None,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn looks_like_json_literal(expression: &str) -> bool {
    let starts_like_number = expression
        .chars()
        .next()
        .map(|character| character == '-' || character.is_ascii_digit())
        .unwrap_or(false);
    expression.starts_with('[')
        || expression.starts_with('{')
        || expression.starts_with('"')
        || expression == "null"
        || expression == "true"
        || expression == "false"
        || starts_like_number
}

fn is_path_expression(expression: &str) -> bool {
    !expression.is_empty()
        && expression
            .chars()
            .all(|character| character.is_alphanumeric() || matches!(character, '_' | '-' | '.' | '[' | ']' | '$'))
}

fn strip_leading_negations(expression: &str) -> (usize, &str) {
    let mut count = 0;
    let mut rest = expression.trim_start();
    while let Some(stripped) = rest.strip_prefix('!') {
        if stripped.starts_with('=') {
            break;
        }
        count += 1;
        rest = stripped.trim_start();
    }
    (count, rest)
}

/// Byte offset of the first `operator` outside quotes and parentheses.
fn find_top_level_operator(expression: &str, operator: &str) -> Option<usize> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;
    let mut depth = 0usize;

    for (index, character) in expression.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match character {
            '\\' if in_double_quote => {
                escaped = true;
                continue;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                continue;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                continue;
            }
            '(' if !in_single_quote && !in_double_quote => {
                depth += 1;
                continue;
            }
            ')' if !in_single_quote && !in_double_quote => {
                depth = depth.saturating_sub(1);
                continue;
            }
            _ => {}
        }

        if !in_single_quote && !in_double_quote && depth == 0 && expression[index..].starts_with(operator) {
            return Some(index);
        }
    }

    None
}

/// Removes parentheses enclosing the whole expression, repeatedly.
fn strip_wrapping_parens(expression: &str) -> &str {
    let mut current = expression;
    while current.starts_with('(') && matching_paren(current) == Some(current.len() - 1) {
        current = current[1..current.len() - 1].trim();
    }
    current
}

/// Byte offset of the `)` closing the `(` at the start of `expression`.
fn matching_paren(expression: &str) -> Option<usize> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;
    let mut depth = 0usize;

    for (index, character) in expression.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match character {
            '\\' if in_double_quote => escaped = true,
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            '(' if !in_single_quote && !in_double_quote => depth += 1,
            ')' if !in_single_quote && !in_double_quote => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level<'a>(expression: &'a str, operator: &str) -> Option<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut rest = expression;
    while let Some(position) = find_top_level_operator(rest, operator) {
        parts.push(&rest[..position]);
        rest = &rest[position + operator.len()..];
    }
    if parts.is_empty() {
        return None;
    }
    parts.push(rest);
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn green() -> StyleEffect {
        let mut style = StyleEffect::new();
        style.insert("backgroundColor".into(), json!("green"));
        style
    }

    fn luke_rule() -> ConditionalStyle {
        ConditionalStyle::new(Predicate::function(|row| row["name"] == "luke"), green())
    }

    #[test]
    fn returns_style_of_matching_rule() {
        let style = conditional_style(&json!({ "name": "luke" }), Some(&[luke_rule()][..])).unwrap();
        assert_eq!(style, green());
    }

    #[test]
    fn returns_empty_effect_without_match() {
        let style = conditional_style(&json!({ "name": "leia" }), Some(&[luke_rule()][..])).unwrap();
        assert!(style.is_empty());
    }

    #[test]
    fn returns_empty_effect_for_empty_or_missing_rules() {
        assert!(conditional_style(&json!({ "name": "luke" }), Some(&[] as &[ConditionalStyle])).unwrap().is_empty());
        assert!(conditional_style(&Value::Null, None).unwrap().is_empty());
    }

    #[test]
    fn matching_rule_without_style_yields_empty_effect() {
        let rule = ConditionalStyle {
            when: Some(Predicate::function(|row| row["name"] == "luke")),
            style: None,
        };
        assert!(conditional_style(&json!({ "name": "luke" }), Some(&[rule][..])).unwrap().is_empty());
    }

    #[test]
    fn unsupported_when_is_rejected() {
        let rule = ConditionalStyle {
            when: Some(Predicate::Unsupported(json!(42))),
            style: Some(green()),
        };
        let error = conditional_style(&json!({ "name": "luke" }), Some(&[rule][..])).unwrap_err();
        assert!(matches!(error, TableError::InvalidPredicate { rule: 0, .. }));
    }

    #[test]
    fn missing_when_is_rejected() {
        let rule = ConditionalStyle { when: None, style: Some(green()) };
        let error = conditional_style(&json!({ "name": "luke" }), Some(&[rule][..])).unwrap_err();
        assert!(matches!(error, TableError::InvalidPredicate { rule: 0, .. }));
    }

    #[test]
    fn rules_after_a_match_are_not_validated() {
        let rules = [luke_rule(), ConditionalStyle::default()];
        assert_eq!(conditional_style(&json!({ "name": "luke" }), Some(&rules[..])).unwrap(), green());

        let error = conditional_style(&json!({ "name": "leia" }), Some(&rules[..])).unwrap_err();
        assert!(matches!(error, TableError::InvalidPredicate { rule: 1, .. }));
    }

    #[test]
    fn expression_predicates_match_rows() {
        let rules = [ConditionalStyle::new(Predicate::expression(r#"name == "luke""#), green())];
        assert_eq!(conditional_style(&json!({ "name": "luke" }), Some(&rules[..])).unwrap(), green());
        assert!(conditional_style(&json!({ "name": "leia" }), Some(&rules[..])).unwrap().is_empty());
    }

    #[test]
    fn malformed_expression_is_rejected() {
        let rules = [ConditionalStyle::new(Predicate::expression("name == "), green())];
        let error = conditional_style(&json!({ "name": "luke" }), Some(&rules[..])).unwrap_err();
        assert!(matches!(error, TableError::InvalidPredicate { .. }));
    }

    #[test]
    fn eval_condition_operators() {
        let row = json!({ "name": "luke", "age": 19, "tags": ["jedi"], "active": true, "empty": "" });
        assert!(eval_condition("age >= 18", &row).unwrap());
        assert!(eval_condition("age < 20.5", &row).unwrap());
        assert!(!eval_condition("age > 19", &row).unwrap());
        assert!(eval_condition(r#"name != "leia""#, &row).unwrap());
        assert!(eval_condition(r#"tags[0] == "jedi""#, &row).unwrap());
        assert!(eval_condition(r#"active && name == "luke""#, &row).unwrap());
        assert!(eval_condition("empty || active", &row).unwrap());
        assert!(eval_condition("!empty", &row).unwrap());
        assert!(!eval_condition("missing", &row).unwrap());
        assert!(eval_condition("age == 19.0", &row).unwrap());
        assert!(!eval_condition(r#"name > 3"#, &row).unwrap());
    }

    #[test]
    fn eval_condition_ignores_operators_inside_strings() {
        let row = json!({ "title": "a == b" });
        assert!(eval_condition(r#"title == "a == b""#, &row).unwrap());
    }

    #[test]
    fn eval_condition_groups_with_parentheses() {
        let row = json!({ "a": false, "b": true, "c": false, "status": "done" });
        assert!(!eval_condition("(a || b) && c", &row).unwrap());
        assert!(eval_condition("(a || b) && !c", &row).unwrap());
        assert!(eval_condition("a || (b && !c)", &row).unwrap());
        assert!(eval_condition("!(a || c)", &row).unwrap());
        assert!(eval_condition("((status == 'done'))", &row).unwrap());
        assert!(eval_condition(r#"(status == "a) || (b") || b"#, &row).unwrap());
    }

    #[test]
    fn grouped_expression_drives_conditional_style() {
        let rules = [ConditionalStyle::new(Predicate::expression("(a || b) && c"), green())];
        assert!(conditional_style(&json!({ "a": true, "c": false }), Some(&rules[..])).unwrap().is_empty());
        assert_eq!(conditional_style(&json!({ "b": true, "c": true }), Some(&rules[..])).unwrap(), green());
    }

    #[test]
    fn eval_condition_rejects_bad_input() {
        let row = json!({});
        assert!(eval_condition("   ", &row).is_err());
        assert!(eval_condition("!", &row).is_err());
        assert!(eval_condition("name is luke", &row).is_err());
        assert!(eval_condition("== 3", &row).is_err());
        assert!(eval_condition("()", &row).is_err());
        assert!(eval_condition("(name", &row).is_err());
    }
}
