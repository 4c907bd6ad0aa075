//! Formula Abstract Syntax Tree types

use scribe_core::Value;

/// Formula expression AST
///
/// Trees are immutable after construction and finite in depth (the parser
/// enforces a nesting limit).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value (number, text or boolean)
    Literal(Value),

    /// Bare identifier used positionally as a value; resolves against the
    /// context's field map at evaluation time
    FieldRef(String),

    /// Function call; `name` is canonical uppercase
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    /// Name of the top-level call, if this node is one
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call { name, .. } => Some(name),
            _ => None,
        }
    }
}
