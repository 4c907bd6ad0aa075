//! Math functions

use crate::error::{FormulaError, FormulaResult};
use crate::functions::{collect_numbers, number_arg};
use scribe_core::{FormulaContext, Value};

/// SUM(value, ...)
pub fn fn_sum(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let numbers = collect_numbers("SUM", args)?;
    Ok(Value::Number(numbers.iter().sum()))
}

/// AVERAGE(value, ...)
///
/// Averaging no numeric values at all (e.g. a lone empty list) has no
/// defined mean and is a runtime error.
pub fn fn_average(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let numbers = collect_numbers("AVERAGE", args)?;
    if numbers.is_empty() {
        return Err(FormulaError::runtime("AVERAGE", "no numeric values to average"));
    }
    Ok(Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64))
}

/// MIN(value, ...)
pub fn fn_min(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let numbers = collect_numbers("MIN", args)?;
    numbers
        .into_iter()
        .fold(None, |acc: Option<f64>, n| {
            Some(acc.map_or(n, |m| m.min(n)))
        })
        .map(Value::Number)
        .ok_or_else(|| FormulaError::runtime("MIN", "no numeric values to compare"))
}

/// MAX(value, ...)
pub fn fn_max(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let numbers = collect_numbers("MAX", args)?;
    numbers
        .into_iter()
        .fold(None, |acc: Option<f64>, n| {
            Some(acc.map_or(n, |m| m.max(n)))
        })
        .map(Value::Number)
        .ok_or_else(|| FormulaError::runtime("MAX", "no numeric values to compare"))
}

/// ROUND(value, [digits])
///
/// Rounds half away from zero, to `digits` decimal places (default 0).
pub fn fn_round(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let value = number_arg("ROUND", args, 0)?;
    let digits = match args.get(1) {
        Some(_) => number_arg("ROUND", args, 1)?.trunc() as i32,
        None => 0,
    };

    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round() / factor;
    if !rounded.is_finite() {
        return Err(FormulaError::runtime("ROUND", "result is not a finite number"));
    }
    Ok(Value::Number(rounded))
}

/// ABS(value)
pub fn fn_abs(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let value = number_arg("ABS", args, 0)?;
    Ok(Value::Number(value.abs()))
}
