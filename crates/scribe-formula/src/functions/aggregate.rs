//! Aggregate functions
//!
//! These operate over lists and over the context's sibling items and
//! mentions.

use crate::error::{FormulaError, FormulaResult};
use crate::functions::text_arg;
use scribe_core::{FormulaContext, Value};

/// COUNT(value, ...)
///
/// Number of non-null values; lists are flattened first.
pub fn fn_count(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    fn count(value: &Value) -> usize {
        match value {
            Value::Null => 0,
            Value::List(items) => items.iter().map(count).sum(),
            _ => 1,
        }
    }

    Ok(Value::Number(args.iter().map(count).sum::<usize>() as f64))
}

/// SUMFIELD(field)
///
/// Sums `field` across the context's sibling items. Items without the
/// field (or with a null value) are skipped; a present value that does not
/// coerce to a number fails the call.
pub fn fn_sumfield(args: &[Value], ctx: &FormulaContext) -> FormulaResult<Value> {
    let field = text_arg("SUMFIELD", args, 0)?;

    let mut total = 0.0;
    for item in &ctx.siblings {
        match item.fields.get(field) {
            None | Some(Value::Null) => continue,
            Some(value) => {
                let n = value.as_number().ok_or_else(|| {
                    FormulaError::runtime(
                        "SUMFIELD",
                        format!("field '{}' of '{}' is not numeric", field, item.title),
                    )
                })?;
                total += n;
            }
        }
    }
    Ok(Value::Number(total))
}

/// FILTER(list, [match])
///
/// With a match value, keeps the elements equal to it; without one, drops
/// nulls.
pub fn fn_filter(args: &[Value], _ctx: &FormulaContext) -> FormulaResult<Value> {
    let items = match &args[0] {
        Value::List(items) => items,
        Value::Null => return Ok(Value::List(Vec::new())),
        other => {
            return Err(FormulaError::Type {
                function: "FILTER".into(),
                arg: 0,
                expected: "list",
                actual: other.type_name(),
            })
        }
    };

    let kept = match args.get(1) {
        Some(needle) => items.iter().filter(|v| *v == needle).cloned().collect(),
        None => items.iter().filter(|v| !v.is_null()).cloned().collect(),
    };
    Ok(Value::List(kept))
}

/// MENTIONSOFTYPE(entity_type)
///
/// Display names of mentioned entities of the given type
/// (case-insensitive), in document order.
pub fn fn_mentionsoftype(args: &[Value], ctx: &FormulaContext) -> FormulaResult<Value> {
    let entity_type = text_arg("MENTIONSOFTYPE", args, 0)?;

    let names = ctx
        .mentions
        .iter()
        .filter(|m| m.entity_type.eq_ignore_ascii_case(entity_type))
        .map(|m| Value::text(m.name.clone()))
        .collect();
    Ok(Value::List(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scribe_core::{EntityRef, ItemRef};
    use std::collections::HashMap;

    fn item(title: &str, fields: &[(&str, Value)]) -> ItemRef {
        ItemRef {
            path: format!("notes/{}.md", title),
            title: title.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_count() {
        let ctx = FormulaContext::builder().build();
        let result = fn_count(
            &[
                Value::Number(1.0),
                Value::Null,
                Value::List(vec![Value::text("a"), Value::Null, Value::Bool(true)]),
            ],
            &ctx,
        )
        .unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_sumfield() {
        let ctx = FormulaContext::builder()
            .sibling(item("a", &[("price", Value::Number(10.0))]))
            .sibling(item("b", &[("price", Value::Number(32.0))]))
            .sibling(item("c", &[("other", Value::Number(99.0))]))
            .sibling(item("d", &[("price", Value::Null)]))
            .build();

        let result = fn_sumfield(&[Value::text("price")], &ctx).unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn test_sumfield_rejects_non_numeric() {
        let ctx = FormulaContext::builder()
            .sibling(item("a", &[("price", Value::text("n/a"))]))
            .build();

        let err = fn_sumfield(&[Value::text("price")], &ctx).unwrap_err();
        assert!(matches!(err, FormulaError::Runtime { .. }));
    }

    #[test]
    fn test_filter() {
        let ctx = FormulaContext::builder().build();
        let list = Value::List(vec![
            Value::Number(1.0),
            Value::Null,
            Value::Number(2.0),
            Value::Number(1.0),
        ]);

        // Default: drop nulls
        let result = fn_filter(&[list.clone()], &ctx).unwrap();
        assert_eq!(
            result,
            Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(1.0)])
        );

        // With a match value: keep equal elements
        let result = fn_filter(&[list, Value::Number(1.0)], &ctx).unwrap();
        assert_eq!(result, Value::List(vec![Value::Number(1.0), Value::Number(1.0)]));
    }

    #[test]
    fn test_mentionsoftype() {
        let ctx = FormulaContext::builder()
            .mention(EntityRef {
                id: "e1".into(),
                name: "Ada".into(),
                entity_type: "person".into(),
            })
            .mention(EntityRef {
                id: "e2".into(),
                name: "Apollo".into(),
                entity_type: "project".into(),
            })
            .mention(EntityRef {
                id: "e3".into(),
                name: "Grace".into(),
                entity_type: "Person".into(),
            })
            .build();

        let result = fn_mentionsoftype(&[Value::text("person")], &ctx).unwrap();
        assert_eq!(result, Value::List(vec![Value::text("Ada"), Value::text("Grace")]));
    }
}
