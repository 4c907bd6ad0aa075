//! Formula evaluator
//!
//! Evaluates formula ASTs against a per-invocation context. Pure built-ins
//! resolve within the same tick; contextual built-ins that perform network
//! I/O are awaited under the caller-supplied timeout. Arguments always
//! evaluate left-to-right so results are reproducible and contextual
//! side effects are ordered deterministically.

use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Serialize;

use crate::ast::Expr;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{registry, FunctionImpl};
use crate::parser::parse_formula;
use scribe_core::{FormulaContext, Value};

/// Options for a single evaluation
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    /// Ceiling for each I/O-bound function call
    pub timeout: Duration,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of evaluating a formula, shaped for the host UI.
///
/// Public entry points return this instead of an `Err`, so no engine
/// failure can propagate as an exception into the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_time_ms: Option<u64>,
}

impl EvaluationResult {
    fn ok(value: Value, elapsed: Duration) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
            evaluation_time_ms: Some(elapsed.as_millis() as u64),
        }
    }

    fn err(error: &FormulaError) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error.to_string()),
            evaluation_time_ms: None,
        }
    }
}

/// Evaluate a parsed expression against a context.
///
/// Errors carry the failing function name (and argument index where it
/// applies); partial trees are never surfaced as results.
pub async fn evaluate(
    expr: &Expr,
    ctx: &FormulaContext,
    options: &EvaluateOptions,
) -> FormulaResult<Value> {
    eval_expr(expr, ctx, options).await
}

fn eval_expr<'a>(
    expr: &'a Expr,
    ctx: &'a FormulaContext,
    options: &'a EvaluateOptions,
) -> BoxFuture<'a, FormulaResult<Value>> {
    Box::pin(async move {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            // Permissive lookup: an absent field is null, not an error
            Expr::FieldRef(name) => Ok(ctx.field(name).cloned().unwrap_or(Value::Null)),

            Expr::Call { name, args } => {
                let def = registry()
                    .get(name)
                    .ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;

                // The parser already validated arity, but the AST is a public
                // type; re-check so implementations may index required args.
                let min = def.min_args();
                let max = def.max_args();
                if args.len() < min || max.is_some_and(|max| args.len() > max) {
                    return Err(FormulaError::Arity {
                        function: def.name.to_string(),
                        min,
                        max,
                        got: args.len(),
                    });
                }

                // Strictly left-to-right, sequential
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(eval_expr(arg, ctx, options).await?);
                }

                match &def.implementation {
                    FunctionImpl::Sync(f) => f(&values, ctx),
                    FunctionImpl::Async(f) => {
                        match tokio::time::timeout(options.timeout, f(&values, ctx)).await {
                            Ok(result) => result,
                            Err(_) => Err(FormulaError::Timeout {
                                function: def.name.to_string(),
                                limit_ms: options.timeout.as_millis() as u64,
                            }),
                        }
                    }
                }
            }
        }
    })
}

/// Parse and evaluate a formula with default options.
pub async fn evaluate_formula(text: &str, ctx: &FormulaContext) -> EvaluationResult {
    evaluate_formula_with_options(text, ctx, &EvaluateOptions::default()).await
}

/// Parse and evaluate a formula.
///
/// # Example
/// ```rust
/// use scribe_core::FormulaContext;
/// use scribe_formula::evaluate_formula;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = FormulaContext::builder().field("price", 100.0).build();
/// let result = evaluate_formula("SUM(price, 20)", &ctx).await;
/// assert!(result.success);
/// # }
/// ```
pub async fn evaluate_formula_with_options(
    text: &str,
    ctx: &FormulaContext,
    options: &EvaluateOptions,
) -> EvaluationResult {
    match parse_formula(text) {
        Ok(parsed) => evaluate_parsed(&parsed.ast, ctx, options).await,
        Err(err) => EvaluationResult::err(&err),
    }
}

pub(crate) async fn evaluate_parsed(
    ast: &Expr,
    ctx: &FormulaContext,
    options: &EvaluateOptions,
) -> EvaluationResult {
    let started = Instant::now();
    match evaluate(ast, ctx, options).await {
        Ok(value) => {
            let elapsed = started.elapsed();
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "formula evaluated");
            EvaluationResult::ok(value, elapsed)
        }
        Err(err) => {
            tracing::warn!(error = %err, "formula evaluation failed");
            EvaluationResult::err(&err)
        }
    }
}
