//! # scribe-formula
//!
//! Formula expression engine for scribe documents.
//!
//! This crate provides:
//! - Formula parsing (text → AST) with static validation of function
//!   names and argument counts
//! - Dependency extraction for reactive re-evaluation
//! - Evaluation against a per-invocation context, including the
//!   I/O-bound contextual built-ins
//! - The built-in function catalog, grouped by category for the editor's
//!   autocomplete
//! - The debounced live-preview pipeline with stale-result discarding
//!
//! ## Example
//!
//! ```rust
//! use scribe_core::FormulaContext;
//! use scribe_formula::{evaluate_formula, parse_formula};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let parsed = parse_formula("SUM(price, tax)").unwrap();
//! assert!(parsed.dependencies.contains("price"));
//!
//! let ctx = FormulaContext::builder()
//!     .field("price", 100.0)
//!     .field("tax", 25.0)
//!     .build();
//! let result = evaluate_formula("SUM(price, tax)", &ctx).await;
//! assert!(result.success);
//! # }
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod preview;

pub use ast::Expr;
pub use dependency::dependencies;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_formula, evaluate_formula_with_options, EvaluateOptions, EvaluationResult,
};
pub use functions::{has_function, list_functions, Category, FunctionInfo};
pub use parser::{parse_formula, ParseResult};
pub use preview::{
    CompletionOutcome, LivePreview, PreviewMachine, PreviewOptions, PreviewState, PreviewUpdate,
};

// Re-export core types so hosts need only this crate
pub use scribe_core::{
    EntityRef, ExternalServices, FormulaContext, FormulaContextBuilder, ItemRef, NoServices,
    ServiceError, Value,
};
