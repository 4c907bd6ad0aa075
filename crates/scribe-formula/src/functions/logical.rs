//! Logical functions
//!
//! The formula grammar has no operators, so comparison is spelled with the
//! EQ/NEQ/GT/GTE/LT/LTE predicates.

use std::cmp::Ordering;

use crate::error::{FormulaError, FormulaResult};
use crate::functions::bool_arg;
use scribe_core::{FormulaContext, Value};

/// IF(condition, then, [else])
///
/// The else branch defaults to null.
pub fn fn_if(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let condition = bool_arg("IF", args, 0)?;
    if condition {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(Value::Null))
    }
}

/// AND(condition, ...)
pub fn fn_and(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    for idx in 0..args.len() {
        if !bool_arg("AND", args, idx)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// OR(condition, ...)
pub fn fn_or(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    for idx in 0..args.len() {
        if bool_arg("OR", args, idx)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// NOT(condition)
pub fn fn_not(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(!bool_arg("NOT", args, 0)?))
}

/// ISEMPTY(value)
///
/// True for null, empty/whitespace-only text, and empty lists.
pub fn fn_isempty(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let empty = match &args[0] {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    };
    Ok(Value::Bool(empty))
}

/// COALESCE(value, ...)
///
/// First non-null argument; null when every argument is null.
pub fn fn_coalesce(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

/// EQ(left, right)
pub fn fn_eq(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(compare_values("EQ", &args[0], &args[1])? == Ordering::Equal))
}

/// NEQ(left, right)
pub fn fn_neq(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(compare_values("NEQ", &args[0], &args[1])? != Ordering::Equal))
}

/// GT(left, right)
pub fn fn_gt(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(compare_values("GT", &args[0], &args[1])? == Ordering::Greater))
}

/// GTE(left, right)
pub fn fn_gte(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(compare_values("GTE", &args[0], &args[1])? != Ordering::Less))
}

/// LT(left, right)
pub fn fn_lt(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(compare_values("LT", &args[0], &args[1])? == Ordering::Less))
}

/// LTE(left, right)
pub fn fn_lte(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    Ok(Value::Bool(compare_values("LTE", &args[0], &args[1])? != Ordering::Greater))
}

/// Compare two values for ordering.
///
/// Nulls sort before everything and equal to each other. When both sides
/// coerce to numbers they compare numerically; datetimes compare
/// chronologically; otherwise both sides compare as case-insensitive text.
fn compare_values(function: &str, left: &Value, right: &Value) -> FormulaResult<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => return Ok(Ordering::Equal),
        (Value::Null, _) => return Ok(Ordering::Less),
        (_, Value::Null) => return Ok(Ordering::Greater),
        (Value::List(_), _) | (_, Value::List(_)) => {
            return Err(FormulaError::runtime(function, "cannot compare lists"));
        }
        _ => {}
    }

    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return l
            .partial_cmp(&r)
            .ok_or_else(|| FormulaError::runtime(function, "cannot compare NaN"));
    }

    if let (Value::DateTime(l), Value::DateTime(r)) = (left, right) {
        return Ok(l.cmp(r));
    }

    let l = left.display_text().to_lowercase();
    let r = right.display_text().to_lowercase();
    Ok(l.cmp(&r))
}
