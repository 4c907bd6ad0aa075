//! # scribe-core
//!
//! Core data model shared between the scribe formula engine and its host
//! editor.
//!
//! This crate provides the fundamental types used throughout scribe:
//! - [`Value`] - Tagged values flowing through formula evaluation
//! - [`FormulaContext`] - The per-evaluation snapshot of document state
//! - [`ExternalServices`] - The seam through which I/O-bound built-ins
//!   reach outside the process
//! - [`block`] - The fenced-block persisted form of formulas
//!
//! ## Example
//!
//! ```rust
//! use scribe_core::{FormulaContext, Value};
//!
//! let ctx = FormulaContext::builder()
//!     .doc_path("notes/today.md")
//!     .field("price", 100.0)
//!     .field("label", "invoice")
//!     .build();
//!
//! assert_eq!(ctx.field("price"), Some(&Value::Number(100.0)));
//! ```

pub mod block;
pub mod context;
pub mod services;
pub mod value;

// Re-exports for convenience
pub use block::{extract_formula_block, format_formula_block, formula_blocks, FormulaBlock};
pub use context::{EntityRef, FormulaContext, FormulaContextBuilder, ItemRef};
pub use services::{ExternalServices, NoServices, ServiceError, ServiceFuture};
pub use value::Value;
