//! Compiles equation text into an operation-node graph.
//!
//! The pipeline runs in three fixed stages: [`lexer`] splits and rewrites
//! the token stream, [`parser`] converts it to postfix order, and
//! [`builder`] synthesizes the node list. [`compile`] drives all three.

pub mod builder;
pub mod lexer;
pub mod parser;

pub use builder::CompiledEquation;

use thiserror::Error;

/// A syntax or structural failure while compiling one equation. No stage
/// ever emits a malformed intermediate stream; the first defect aborts the
/// pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expression is empty")]
    EmptyExpression,
    #[error("unbalanced parentheses")]
    UnbalancedParenthesis,
    #[error("operator or function `{op}` is missing an operand")]
    MissingOperand { op: String },
    #[error("expression leaves {count} unconsumed operands")]
    DanglingOperands { count: usize },
    #[error("generated node name `{name}` collides within the equation")]
    DuplicateName { name: String },
}

/// Compiles `equation_text` into the node list for equation `id`.
pub fn compile(id: &str, equation_text: &str) -> Result<CompiledEquation, ParseError> {
    let tokens = lexer::tokenize(equation_text)?;
    let postfix = parser::to_postfix(&tokens)?;
    builder::build(id, equation_text, &postfix)
}
