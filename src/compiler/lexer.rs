//! Splits an equation string into tokens and rewrites juxtaposition into
//! explicit multiplication.
//!
//! The grammar is whitespace-delimited: every token in the source must be
//! separated by a single space. Implicit multiplication is inferred only at
//! parenthesis boundaries — `2 ( x )` and `( x ) y` gain a `*`, while a
//! function call like `SIN ( x )` does not.

use super::ParseError;
use crate::graph::ops;

/// True for tokens that can stand as an operand: not an operator, not a
/// function name. Literals, variables, and punctuation all qualify, matching
/// the adjacency test the rewriter needs.
fn is_operand_like(token: &str) -> bool {
    !ops::is_operator(token) && !ops::is_function(token)
}

/// Tokenizes `equation`, inserting a `*` wherever adjacency implies
/// multiplication:
///
/// - `) t` where `t` is a literal or variable (not another `)`), and
/// - `t (` where `t` is a literal or variable (not another `(`).
///
/// A function name before `(` is a call, never a product.
pub fn tokenize(equation: &str) -> Result<Vec<String>, ParseError> {
    let raw: Vec<&str> = equation.split(' ').filter(|t| !t.is_empty()).collect();
    if raw.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    let mut tokens = Vec::with_capacity(raw.len());
    tokens.push(raw[0].to_string());
    for pair in raw.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let before_group = right == "(" && left != "(" && is_operand_like(left);
        let after_group = left == ")" && right != ")" && is_operand_like(right);
        if before_group || after_group {
            tokens.push("*".to_string());
        }
        tokens.push(right.to_string());
    }
    Ok(tokens)
}
