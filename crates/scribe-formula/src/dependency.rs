//! Dependency extraction for reactive re-evaluation
//!
//! Static analysis of a formula AST without evaluation. The host
//! invalidates a cached result when any field in the dependency set
//! changes, so extraction must be conservative: over-approximating is
//! acceptable, under-approximating is a bug.

use std::collections::HashSet;

use crate::ast::Expr;
use scribe_core::Value;

/// Functions whose first string-literal argument names a context field.
///
/// A dynamic first argument (e.g. `GET(CONCAT("pri","ce"))`) cannot be
/// resolved statically; such reads are not representable in the dependency
/// set and the host falls back to re-evaluating on any change.
const FIELD_ACCESSOR_FUNCTIONS: &[&str] = &["GET", "MENTION"];

/// Compute the set of context fields a formula reads.
///
/// Every bare field reference contributes its name; every call to a
/// field-accessor function with a string-literal first argument
/// contributes that literal.
pub fn dependencies(expr: &Expr) -> HashSet<String> {
    let mut deps = HashSet::new();
    walk(expr, &mut deps);
    deps
}

fn walk(expr: &Expr, deps: &mut HashSet<String>) {
    match expr {
        Expr::FieldRef(name) => {
            deps.insert(name.clone());
        }
        Expr::Call { name, args } => {
            if FIELD_ACCESSOR_FUNCTIONS.contains(&name.as_str()) {
                if let Some(Expr::Literal(Value::Text(field))) = args.first() {
                    deps.insert(field.clone());
                }
            }
            for arg in args {
                walk(arg, deps);
            }
        }
        Expr::Literal(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn deps_of(formula: &str) -> HashSet<String> {
        dependencies(&parse_formula(formula).unwrap().ast)
    }

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_literals_have_no_dependencies() {
        assert_eq!(deps_of("SUM(1, 2)"), set(&[]));
    }

    #[test]
    fn test_field_refs() {
        assert_eq!(deps_of("SUM(price, tax)"), set(&["price", "tax"]));
    }

    #[test]
    fn test_get_with_string_literal() {
        assert_eq!(deps_of("GET(\"price\")"), set(&["price"]));
        assert_eq!(deps_of("MENTION(\"Ada\")"), set(&["Ada"]));
    }

    #[test]
    fn test_nested_mix() {
        assert_eq!(
            deps_of("IF(GT(price, 50), GET(\"discount\"), tax)"),
            set(&["price", "discount", "tax"])
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(deps_of("SUM(price, price, GET(\"price\"))"), set(&["price"]));
    }

    #[test]
    fn test_dynamic_accessor_argument_contributes_nothing() {
        // The inner field ref is still collected; the dynamic GET target is not
        assert_eq!(deps_of("GET(CONCAT(prefix, \"_id\"))"), set(&["prefix"]));
    }
}
