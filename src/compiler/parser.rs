//! Shunting-yard conversion from infix tokens to postfix (reverse-Polish)
//! order.
//!
//! Operators follow the fixed precedence table in [`crate::graph::ops`];
//! `^` is right-associative, everything else is left-associative. Function
//! names are pushed as highest-priority containers and re-attached when
//! their closing `)` completes. Mismatched parentheses raise a structured
//! error rather than popping an empty stack.

use super::ParseError;
use crate::graph::ops;

/// Converts a token stream to postfix order.
pub fn to_postfix(tokens: &[String]) -> Result<Vec<String>, ParseError> {
    let mut output: Vec<String> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<&str> = Vec::new();

    for token in tokens {
        let token = token.as_str();
        if let Some(prec) = ops::precedence(token) {
            while let Some(&top) = stack.last() {
                let Some(top_prec) = ops::precedence(top) else {
                    break;
                };
                let pops = top_prec > prec
                    || (top_prec == prec && !ops::is_right_associative(token));
                if !pops {
                    break;
                }
                output.push(top.to_string());
                stack.pop();
            }
            stack.push(token);
        } else if ops::is_function(token) {
            stack.push(token);
        } else if token == "," {
            // Drain the current argument; the `(` stays for the closing `)`.
            while let Some(&top) = stack.last() {
                if top == "(" {
                    break;
                }
                output.push(top.to_string());
                stack.pop();
            }
            if stack.is_empty() {
                return Err(ParseError::UnbalancedParenthesis);
            }
        } else if token == "(" {
            stack.push(token);
        } else if token == ")" {
            loop {
                match stack.pop() {
                    Some("(") => break,
                    Some(top) => output.push(top.to_string()),
                    None => return Err(ParseError::UnbalancedParenthesis),
                }
            }
            // A function name left on top belongs to the group just closed.
            if let Some(&top) = stack.last() {
                if ops::is_function(top) {
                    output.push(top.to_string());
                    stack.pop();
                }
            }
        } else {
            output.push(token.to_string());
        }
    }

    while let Some(top) = stack.pop() {
        if top == "(" {
            return Err(ParseError::UnbalancedParenthesis);
        }
        output.push(top.to_string());
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer;
    use rstest::rstest;

    fn postfix(equation: &str) -> Vec<String> {
        let tokens = lexer::tokenize(equation).expect("tokenize failed");
        to_postfix(&tokens).expect("parse failed")
    }

    #[rstest]
    #[case("2 + 3 * 4", &["2", "3", "4", "*", "+"])]
    #[case("2 * 3 + 4", &["2", "3", "*", "4", "+"])]
    #[case("2 ^ 3 ^ 2", &["2", "3", "2", "^", "^"])]
    #[case("2 - 3 - 4", &["2", "3", "-", "4", "-"])]
    #[case("2 + 3 > 4", &["2", "3", "+", "4", ">"])]
    #[case("( 2 + 3 ) * 4", &["2", "3", "+", "4", "*"])]
    #[case("8 % 3 / 2", &["8", "3", "%", "2", "/"])]
    fn test_precedence_and_associativity(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(postfix(input), expected);
    }

    #[test]
    fn test_function_call_attaches_after_its_arguments() {
        assert_eq!(postfix("SQRT ( 2 + 3 )"), ["2", "3", "+", "SQRT"]);
        assert_eq!(postfix("dSIN ( x )"), ["x", "dSIN"]);
    }

    #[test]
    fn test_binary_function_with_comma() {
        assert_eq!(postfix("MIN ( 2 + 3 , x )"), ["2", "3", "+", "x", "MIN"]);
        assert_eq!(postfix("MAX ( x , MIN ( y , 2 ) )"), ["x", "y", "2", "MIN", "MAX"]);
    }

    #[test]
    fn test_implicit_multiplication_feeds_the_parser() {
        assert_eq!(postfix("2 ( 3 + 4 )"), ["2", "3", "4", "+", "*"]);
    }

    #[rstest]
    #[case("2 + 3 )")]
    #[case("( 2 + 3")]
    #[case("MIN ( 2")]
    #[case("2 , 3")]
    fn test_mismatched_parentheses(#[case] input: &str) {
        let tokens = lexer::tokenize(input).expect("tokenize failed");
        assert_eq!(to_postfix(&tokens), Err(ParseError::UnbalancedParenthesis));
    }
}
