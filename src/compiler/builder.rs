//! Builds the operation-node list for one equation from its postfix token
//! stream.
//!
//! The builder runs a single evaluation stack of operand references. Repeat
//! occurrences of a variable reuse the passthrough node allocated at first
//! sight, so `x + x` yields one variable node feeding both channels of one
//! `Add` node. The finished stack is wrapped in an `Add` output node named
//! `<id>Output`.

use std::collections::HashMap;

use super::ParseError;
use crate::graph::ops::{self, FunctionKind};
use crate::graph::{EquationGraph, InputSlot, OperationNode};

/// A compiled equation: the descriptor plus the synthesized nodes, ready to
/// merge into a store's flat namespace.
#[derive(Debug, Clone)]
pub struct CompiledEquation {
    pub graph: EquationGraph,
    pub nodes: Vec<OperationNode>,
}

/// One entry on the evaluation stack: a bare literal or the name of an
/// already-synthesized node.
enum Operand {
    Literal(f64),
    Node(String),
}

impl Operand {
    fn into_slot(self) -> InputSlot {
        match self {
            Operand::Literal(v) => InputSlot::fixed(v),
            Operand::Node(name) => InputSlot::source(name),
        }
    }
}

struct Builder<'a> {
    id: &'a str,
    nodes: Vec<OperationNode>,
    variable_names: Vec<String>,
    /// Variable spelling -> passthrough node name, for dedup.
    variables: HashMap<&'a str, String>,
    /// Per-kind counters; names are unique within the equation and, thanks
    /// to the id prefix, across every equation in a store.
    counters: HashMap<FunctionKind, u32>,
    stack: Vec<Operand>,
}

/// Compiles `postfix` into the node list for equation `id`.
pub fn build(
    id: &str,
    equation_text: &str,
    postfix: &[String],
) -> Result<CompiledEquation, ParseError> {
    let mut builder = Builder {
        id,
        nodes: Vec::new(),
        variable_names: Vec::new(),
        variables: HashMap::new(),
        counters: HashMap::new(),
        stack: Vec::new(),
    };

    for token in postfix {
        builder.step(token)?;
    }
    builder.finish(equation_text)
}

impl<'a> Builder<'a> {
    fn step(&mut self, token: &'a str) -> Result<(), ParseError> {
        match FunctionKind::from_token(token) {
            None => self.push_operand(token)?,
            Some(kind) if ops::is_binary(token) => {
                let op_b = self.pop_operand(token)?;
                let op_a = self.pop_operand(token)?;
                let name = self.synthesize(kind, op_a.into_slot(), op_b.into_slot())?;
                self.stack.push(Operand::Node(name));
            }
            Some(kind) => {
                let op = self.pop_operand(token)?;
                let name = self.synthesize(kind, op.into_slot(), InputSlot::default())?;
                self.stack.push(Operand::Node(name));
            }
        }
        Ok(())
    }

    /// A literal goes straight onto the stack; a variable allocates (or
    /// reuses) its passthrough node.
    fn push_operand(&mut self, token: &'a str) -> Result<(), ParseError> {
        if let Ok(value) = token.parse::<f64>() {
            self.stack.push(Operand::Literal(value));
            return Ok(());
        }
        let name = match self.variables.get(token) {
            Some(existing) => existing.clone(),
            None => {
                let name = format!("{}{}", self.id, token);
                self.insert_node(OperationNode::new(&name, FunctionKind::Add))?;
                self.variables.insert(token, name.clone());
                self.variable_names.push(name.clone());
                name
            }
        };
        self.stack.push(Operand::Node(name));
        Ok(())
    }

    fn pop_operand(&mut self, token: &str) -> Result<Operand, ParseError> {
        self.stack.pop().ok_or_else(|| ParseError::MissingOperand {
            op: token.to_string(),
        })
    }

    fn synthesize(
        &mut self,
        kind: FunctionKind,
        input_a: InputSlot,
        input_b: InputSlot,
    ) -> Result<String, ParseError> {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        let name = format!("{}{}{}", self.id, kind.op_name(), counter);
        self.insert_node(OperationNode::with_inputs(&name, kind, input_a, input_b))?;
        Ok(name)
    }

    fn insert_node(&mut self, node: OperationNode) -> Result<(), ParseError> {
        // A variable spelled like a generated name ("Add1") could land on a
        // synthesized node; refuse rather than silently alias.
        if self.nodes.iter().any(|n| n.name == node.name) {
            return Err(ParseError::DuplicateName { name: node.name });
        }
        self.nodes.push(node);
        Ok(())
    }

    fn finish(mut self, equation_text: &str) -> Result<CompiledEquation, ParseError> {
        let result = self.stack.pop().ok_or(ParseError::EmptyExpression)?;
        if !self.stack.is_empty() {
            return Err(ParseError::DanglingOperands {
                count: self.stack.len() + 1,
            });
        }

        let output_node_name = format!("{}Output", self.id);
        self.insert_node(OperationNode::with_inputs(
            &output_node_name,
            FunctionKind::Add,
            result.into_slot(),
            InputSlot::default(),
        ))?;

        let graph = EquationGraph {
            id: self.id.to_string(),
            equation_text: equation_text.to_string(),
            variable_names: self.variable_names,
            output_node_name,
            node_names: self.nodes.iter().map(|n| n.name.clone()).collect(),
        };
        Ok(CompiledEquation {
            graph,
            nodes: self.nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler;

    fn compile(id: &str, text: &str) -> CompiledEquation {
        compiler::compile(id, text).expect("compile failed")
    }

    fn node<'a>(eq: &'a CompiledEquation, name: &str) -> &'a OperationNode {
        eq.nodes
            .iter()
            .find(|n| n.name == name)
            .unwrap_or_else(|| panic!("missing node {name}"))
    }

    #[test]
    fn test_single_output_node_wraps_the_result() {
        let eq = compile("EQN1", "2 + 3");
        assert_eq!(eq.graph.output_node_name, "EQN1Output");
        let out = node(&eq, "EQN1Output");
        assert_eq!(out.function, FunctionKind::Add);
        assert_eq!(out.input_a.sources(), ["EQN1Add1"]);
        assert_eq!(out.input_b, InputSlot::default());

        let add = node(&eq, "EQN1Add1");
        assert_eq!(add.input_a, InputSlot::fixed(2.0));
        assert_eq!(add.input_b, InputSlot::fixed(3.0));
    }

    #[test]
    fn test_variables_are_deduplicated() {
        let eq = compile("EQN1", "x + x");
        assert_eq!(eq.graph.variable_names, ["EQN1x"]);

        let add = node(&eq, "EQN1Add1");
        assert_eq!(add.input_a.sources(), ["EQN1x"]);
        assert_eq!(add.input_b.sources(), ["EQN1x"]);
        // Variable passthrough + one Add + the output wrapper.
        assert_eq!(eq.nodes.len(), 3);
    }

    #[test]
    fn test_unary_function_takes_one_operand() {
        let eq = compile("EQN1", "SQRT ( x )");
        let sqrt = node(&eq, "EQN1Sqrt1");
        assert_eq!(sqrt.function, FunctionKind::Sqrt);
        assert_eq!(sqrt.input_a.sources(), ["EQN1x"]);
        assert_eq!(sqrt.input_b, InputSlot::default());
    }

    #[test]
    fn test_binary_function_preserves_argument_order() {
        let eq = compile("EQN1", "MIN ( x , 4 )");
        let min = node(&eq, "EQN1Min1");
        assert_eq!(min.input_a.sources(), ["EQN1x"]);
        assert_eq!(min.input_b, InputSlot::fixed(4.0));
    }

    #[test]
    fn test_operand_order_for_noncommutative_operators() {
        let eq = compile("EQN1", "x - 3");
        let sub = node(&eq, "EQN1Subtract1");
        assert_eq!(sub.input_a.sources(), ["EQN1x"]);
        assert_eq!(sub.input_b, InputSlot::fixed(3.0));
    }

    #[test]
    fn test_no_dangling_references_within_a_compiled_equation() {
        let eq = compile(
            "EQN1",
            "( ( SQRT ( ( dSIN ( 4 + var1 ) ) ^ 3 ) * 24 ) / 2 ) + var2",
        );
        assert_eq!(eq.graph.variable_names, ["EQN1var1", "EQN1var2"]);
        for n in &eq.nodes {
            for reference in n.references() {
                assert!(
                    eq.nodes.iter().any(|m| m.name == reference),
                    "{} dangles from {}",
                    reference,
                    n.name
                );
            }
        }
    }

    #[test]
    fn test_missing_operand_is_an_error() {
        let err = compiler::compile("EQN1", "+ 2").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingOperand {
                op: "+".to_string()
            }
        );
    }

    #[test]
    fn test_unconsumed_operands_are_an_error() {
        let err = compiler::compile("EQN1", "2 3").unwrap_err();
        assert_eq!(err, ParseError::DanglingOperands { count: 2 });
    }
}
