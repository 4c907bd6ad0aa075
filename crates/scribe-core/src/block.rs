//! Persisted form of formulas
//!
//! A formula is stored in a document as a fenced code block tagged
//! `formula`, containing only the raw expression text:
//!
//! ````text
//! ```formula
//! SUM(price, tax)
//! ```
//! ````
//!
//! No other metadata is embedded; the host rebuilds the evaluation context
//! at render time.

/// A formula block found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaBlock {
    /// Raw expression text (inner lines, trimmed)
    pub source: String,
    /// 1-based line number of the opening fence
    pub line: usize,
}

/// Collect every `formula` block in a document, in order of appearance.
pub fn formula_blocks(document: &str) -> Vec<FormulaBlock> {
    let mut blocks = Vec::new();
    let mut inside: Option<(usize, Vec<&str>)> = None;

    for (idx, raw) in document.lines().enumerate() {
        let line = raw.trim();
        match &mut inside {
            None => {
                if let Some(tag) = line.strip_prefix("```") {
                    if tag.trim() == "formula" {
                        inside = Some((idx + 1, Vec::new()));
                    }
                }
            }
            Some((start, body)) => {
                if line == "```" {
                    blocks.push(FormulaBlock {
                        source: body.join("\n").trim().to_string(),
                        line: *start,
                    });
                    inside = None;
                } else {
                    body.push(raw);
                }
            }
        }
    }

    blocks
}

/// Extract the first `formula` block's expression text, if any.
pub fn extract_formula_block(document: &str) -> Option<String> {
    formula_blocks(document).into_iter().next().map(|b| b.source)
}

/// Render an expression in its persisted fenced-block form.
pub fn format_formula_block(expression: &str) -> String {
    format!("```formula\n{}\n```\n", expression.trim())
}
