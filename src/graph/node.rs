//! Defines the `OperationNode` and its input slots, the unit of computation
//! in the exported circuit, plus the `EquationGraph` descriptor for one
//! compiled equation.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::ops::FunctionKind;

/// One input channel of a node.
///
/// A slot either carries a fixed numeric value (the unconnected state,
/// default `1.0`) or a non-empty ordered list of source node names whose
/// outputs feed the channel. The external runtime treats a multi-source
/// list as a summed channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputSlot {
    Fixed(f64),
    Sources(SmallVec<[String; 2]>),
}

impl Default for InputSlot {
    fn default() -> Self {
        InputSlot::Fixed(1.0)
    }
}

impl InputSlot {
    pub fn fixed(value: f64) -> Self {
        InputSlot::Fixed(value)
    }

    pub fn source(name: impl Into<String>) -> Self {
        InputSlot::Sources(SmallVec::from_iter([name.into()]))
    }

    /// The source names feeding this slot; empty for a fixed slot.
    pub fn sources(&self) -> &[String] {
        match self {
            InputSlot::Fixed(_) => &[],
            InputSlot::Sources(list) => list,
        }
    }

    pub fn fixed_value(&self) -> Option<f64> {
        match self {
            InputSlot::Fixed(v) => Some(*v),
            InputSlot::Sources(_) => None,
        }
    }

    /// Wires another source into the slot. A fixed slot becomes a
    /// single-source list; an already-sourced slot appends.
    pub(crate) fn attach(&mut self, name: String) {
        match self {
            InputSlot::Fixed(_) => *self = InputSlot::source(name),
            InputSlot::Sources(list) => list.push(name),
        }
    }

    /// Unwires one occurrence of `name`. Returns false if the slot is fixed
    /// or does not reference `name`. A slot whose last source is removed
    /// reverts to the unconnected default.
    pub(crate) fn detach(&mut self, name: &str) -> bool {
        let InputSlot::Sources(list) = self else {
            return false;
        };
        let Some(pos) = list.iter().position(|s| s == name) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            *self = InputSlot::default();
        }
        true
    }

    /// Drops every reference for which `dead` returns true, reverting to the
    /// default if the slot empties. Used by cascade-clear on removal.
    pub(crate) fn purge(&mut self, dead: &dyn Fn(&str) -> bool) {
        if let InputSlot::Sources(list) = self {
            list.retain(|s| !dead(s));
            if list.is_empty() {
                *self = InputSlot::default();
            }
        }
    }
}

/// A single operation in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationNode {
    /// Globally unique within the owning store, stable for the node's life.
    pub name: String,
    pub function: FunctionKind,
    pub input_a: InputSlot,
    pub input_b: InputSlot,
    /// Layout hint only: the exporter gives the node a reserved position
    /// with an adjacent text label. Never affects graph semantics.
    pub separate: bool,
}

impl OperationNode {
    /// A node with both channels in the unconnected default state.
    pub fn new(name: impl Into<String>, function: FunctionKind) -> Self {
        Self::with_inputs(name, function, InputSlot::default(), InputSlot::default())
    }

    pub fn with_inputs(
        name: impl Into<String>,
        function: FunctionKind,
        input_a: InputSlot,
        input_b: InputSlot,
    ) -> Self {
        Self {
            name: name.into(),
            function,
            input_a,
            input_b,
            separate: false,
        }
    }

    /// Every node name referenced by either input slot.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.input_a
            .sources()
            .iter()
            .chain(self.input_b.sources())
            .map(String::as_str)
    }
}

/// The descriptor for one compiled equation.
///
/// The owning store holds every `OperationNode` exactly once in its flat
/// namespace; the equation lists its members by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationGraph {
    /// Unique equation id (`EQN1`, `EQN2`, ...), stable across re-edits.
    pub id: String,
    /// The original source string, retained for display and re-edit.
    pub equation_text: String,
    /// Variable passthrough node names in first-occurrence order. External
    /// callers bind wires by positional index into this sequence; the names
    /// themselves are regenerated on re-edit.
    pub variable_names: Vec<String>,
    /// The terminal node carrying the equation's result.
    pub output_node_name: String,
    /// Every node synthesized for this equation, including the variable
    /// passthroughs and the output node.
    pub node_names: Vec<String>,
}
