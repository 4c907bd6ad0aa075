//! Text functions

use crate::error::{FormulaError, FormulaResult};
use crate::functions::text_arg;
use scribe_core::{FormulaContext, Value};

/// CONCAT(value, ...)
///
/// Every argument is rendered in its display form; nulls contribute
/// nothing and lists are flattened in order.
pub fn fn_concat(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    fn append(value: &Value, out: &mut String) {
        match value {
            Value::List(items) => {
                for item in items {
                    append(item, out);
                }
            }
            other => out.push_str(&other.display_text()),
        }
    }

    let mut result = String::new();
    for value in args {
        append(value, &mut result);
    }
    Ok(Value::Text(result))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let text = text_arg("UPPER", args, 0)?;
    Ok(Value::Text(text.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let text = text_arg("LOWER", args, 0)?;
    Ok(Value::Text(text.to_lowercase()))
}

/// LENGTH(value)
///
/// Characters of text, or elements of a list.
pub fn fn_length(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    match &args[0] {
        Value::Text(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        Value::Null => Ok(Value::Number(0.0)),
        other => Err(FormulaError::Type {
            function: "LENGTH".into(),
            arg: 0,
            expected: "text or list",
            actual: other.type_name(),
        }),
    }
}

/// TRIM(text)
pub fn fn_trim(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let text = text_arg("TRIM", args, 0)?;
    Ok(Value::Text(text.trim().to_string()))
}

/// REPLACE(text, from, to)
///
/// Replaces every occurrence. An empty `from` is a runtime error rather
/// than an infinite expansion.
pub fn fn_replace(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let text = text_arg("REPLACE", args, 0)?;
    let from = text_arg("REPLACE", args, 1)?;
    let to = text_arg("REPLACE", args, 2)?;

    if from.is_empty() {
        return Err(FormulaError::runtime("REPLACE", "search text must not be empty"));
    }
    Ok(Value::Text(text.replace(from, to)))
}
