//! The process-wide registry of operation nodes and compiled equations.
//!
//! Every node lives exactly once in a flat, name-keyed namespace, whether it
//! was created standalone or synthesized for an equation. `BTreeMap` keys
//! keep iteration (and therefore export) deterministic. Referential
//! integrity is enforced at both edges: wiring a source validates that it
//! exists, and removal cascade-clears every reference to the dead name.

use std::collections::BTreeMap;
use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compiler::{self, ParseError};
use crate::graph::{EquationGraph, FunctionKind, InputSlot, OperationNode};

/// A failure in the store's mutation API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("no node named `{0}` in the store")]
    UnknownNode(String),
    #[error("no equation with id `{0}`")]
    UnknownEquation(String),
    #[error("node `{name}` already exists in the store")]
    DuplicateName { name: String },
    #[error("`{source_name}` is not attached to that input of `{name}`")]
    SourceNotAttached { name: String, source_name: String },
    #[error("node `{name}` is owned by equation `{id}`; remove the equation instead")]
    EquationOwned { name: String, id: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A single-slot update: a literal replaces the slot outright, a source
/// name is appended to the slot's reference list.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotPatch {
    Value(f64),
    Source(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStore {
    nodes_by_name: BTreeMap<String, OperationNode>,
    equations_by_id: BTreeMap<String, EquationGraph>,
    /// Next integer suffix per name stem (`Add`, `Sqrt`, `EQN`, ...).
    name_counters: HashMap<String, u64>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read accessors ---

    pub fn node(&self, name: &str) -> Option<&OperationNode> {
        self.nodes_by_name.get(name)
    }

    pub fn equation(&self, id: &str) -> Option<&EquationGraph> {
        self.equations_by_id.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes_by_name.len()
    }

    /// All nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &OperationNode> {
        self.nodes_by_name.values()
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes_by_name.keys().map(String::as_str)
    }

    pub fn equations(&self) -> impl Iterator<Item = &EquationGraph> {
        self.equations_by_id.values()
    }

    // --- Node mutation ---

    /// Inserts a single interactively-created node and returns its generated
    /// name. Any sources already wired into the given slots must exist.
    pub fn add_standalone_node(
        &mut self,
        function: FunctionKind,
        input_a: InputSlot,
        input_b: InputSlot,
    ) -> Result<String, StoreError> {
        self.check_sources(&input_a)?;
        self.check_sources(&input_b)?;
        let name = self.generate_unique_name(function.op_name());
        debug!("add node {name}");
        self.nodes_by_name.insert(
            name.clone(),
            OperationNode::with_inputs(&name, function, input_a, input_b),
        );
        Ok(name)
    }

    /// Removes a standalone node and scrubs every reference to it from the
    /// surviving nodes' slots (cascade-clear). Equation-owned nodes can only
    /// be destroyed by removing their equation.
    pub fn remove_node(&mut self, name: &str) -> Result<(), StoreError> {
        if !self.nodes_by_name.contains_key(name) {
            return Err(StoreError::UnknownNode(name.to_string()));
        }
        if let Some(eq) = self
            .equations_by_id
            .values()
            .find(|eq| eq.node_names.iter().any(|n| n == name))
        {
            return Err(StoreError::EquationOwned {
                name: name.to_string(),
                id: eq.id.clone(),
            });
        }
        debug!("remove node {name}");
        self.nodes_by_name.remove(name);
        self.scrub_references(&|s| s == name);
        Ok(())
    }

    /// Rewires one or both input channels. A `Value` patch replaces the
    /// slot; a `Source` patch appends to its reference list, modelling a new
    /// wire into a channel that may already merge other sources.
    pub fn update_node(
        &mut self,
        name: &str,
        input_a: Option<SlotPatch>,
        input_b: Option<SlotPatch>,
    ) -> Result<(), StoreError> {
        for patch in [&input_a, &input_b].into_iter().flatten() {
            if let SlotPatch::Source(source_name) = patch {
                if !self.nodes_by_name.contains_key(source_name) {
                    return Err(StoreError::UnknownNode(source_name.clone()));
                }
            }
        }
        let node = self
            .nodes_by_name
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownNode(name.to_string()))?;
        debug!("update node {name}: a={input_a:?} b={input_b:?}");
        if let Some(patch) = input_a {
            apply_patch(&mut node.input_a, patch);
        }
        if let Some(patch) = input_b {
            apply_patch(&mut node.input_b, patch);
        }
        Ok(())
    }

    /// Unwires one reference from a channel; a slot whose list empties
    /// reverts to the numeric default.
    pub fn remove_node_input(
        &mut self,
        name: &str,
        input_a: Option<&str>,
        input_b: Option<&str>,
    ) -> Result<(), StoreError> {
        let node = self
            .nodes_by_name
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownNode(name.to_string()))?;
        debug!("remove inputs of {name}: a={input_a:?} b={input_b:?}");
        if let Some(source_name) = input_a {
            if !node.input_a.detach(source_name) {
                return Err(StoreError::SourceNotAttached {
                    name: name.to_string(),
                    source_name: source_name.to_string(),
                });
            }
        }
        if let Some(source_name) = input_b {
            if !node.input_b.detach(source_name) {
                return Err(StoreError::SourceNotAttached {
                    name: name.to_string(),
                    source_name: source_name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Toggles the layout hint. Cosmetic only.
    pub fn set_separate(&mut self, name: &str, separate: bool) -> Result<(), StoreError> {
        let node = self
            .nodes_by_name
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownNode(name.to_string()))?;
        node.separate = separate;
        Ok(())
    }

    // --- Equation mutation ---

    /// Compiles `equation_text` under a fresh `EQN<n>` id and merges the
    /// synthesized nodes into the flat namespace.
    pub fn add_equation_graph(&mut self, equation_text: &str) -> Result<&EquationGraph, StoreError> {
        let id = self.generate_unique_name("EQN");
        let compiled = compiler::compile(&id, equation_text)?;
        self.merge_equation(compiled)
    }

    /// Deletes every node the equation owns, scrubbing references to them
    /// from the survivors, then drops the equation itself.
    pub fn remove_equation_graph(&mut self, id: &str) -> Result<(), StoreError> {
        let eq = self
            .equations_by_id
            .remove(id)
            .ok_or_else(|| StoreError::UnknownEquation(id.to_string()))?;
        debug!("remove equation {id} ({} nodes)", eq.node_names.len());
        for name in &eq.node_names {
            self.nodes_by_name.remove(name);
        }
        self.scrub_references(&|s| eq.node_names.iter().any(|n| n == s));
        Ok(())
    }

    /// Recompiles the equation from new text under the same id. The new
    /// text is compiled and its node names checked against the rest of the
    /// store first, so any failure leaves the store untouched. Member node
    /// names are regenerated; only the positional index into
    /// `variable_names` is stable across the edit.
    pub fn update_equation_graph(
        &mut self,
        id: &str,
        equation_text: &str,
    ) -> Result<&EquationGraph, StoreError> {
        let old = self
            .equations_by_id
            .get(id)
            .ok_or_else(|| StoreError::UnknownEquation(id.to_string()))?;
        let compiled = compiler::compile(id, equation_text)?;
        // Names freed by the re-edit are fair to reuse; a clash with any
        // other node must fail before the old subgraph is torn down.
        for node in &compiled.nodes {
            if self.nodes_by_name.contains_key(&node.name)
                && !old.node_names.iter().any(|n| n == &node.name)
            {
                return Err(StoreError::DuplicateName {
                    name: node.name.clone(),
                });
            }
        }
        self.remove_equation_graph(id)?;
        self.merge_equation(compiled)
    }

    // --- Internals ---

    fn merge_equation(
        &mut self,
        compiled: compiler::CompiledEquation,
    ) -> Result<&EquationGraph, StoreError> {
        for node in &compiled.nodes {
            if self.nodes_by_name.contains_key(&node.name) {
                return Err(StoreError::DuplicateName {
                    name: node.name.clone(),
                });
            }
        }
        let id = compiled.graph.id.clone();
        debug!(
            "register equation {id}: {} ({} nodes)",
            compiled.graph.equation_text,
            compiled.nodes.len()
        );
        for node in compiled.nodes {
            self.nodes_by_name.insert(node.name.clone(), node);
        }
        self.equations_by_id.insert(id.clone(), compiled.graph);
        Ok(&self.equations_by_id[&id])
    }

    /// Cascade-clear: drops every surviving reference matching `dead`.
    fn scrub_references(&mut self, dead: &dyn Fn(&str) -> bool) {
        for node in self.nodes_by_name.values_mut() {
            node.input_a.purge(dead);
            node.input_b.purge(dead);
        }
    }

    fn check_sources(&self, slot: &InputSlot) -> Result<(), StoreError> {
        for source_name in slot.sources() {
            if !self.nodes_by_name.contains_key(source_name) {
                return Err(StoreError::UnknownNode(source_name.clone()));
            }
        }
        Ok(())
    }

    /// `<stem><n>` with a monotonically increasing per-stem counter,
    /// skipping ahead if a candidate is somehow already taken.
    fn generate_unique_name(&mut self, stem: &str) -> String {
        let counter = self.name_counters.entry(stem.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{stem}{counter}");
            if !self.nodes_by_name.contains_key(&candidate)
                && !self.equations_by_id.contains_key(&candidate)
            {
                return candidate;
            }
        }
    }
}

fn apply_patch(slot: &mut InputSlot, patch: SlotPatch) {
    match patch {
        SlotPatch::Value(v) => *slot = InputSlot::fixed(v),
        SlotPatch::Source(name) => slot.attach(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_names_count_per_kind() {
        let mut store = GraphStore::new();
        let a = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let b = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let s = store
            .add_standalone_node(FunctionKind::Sqrt, InputSlot::default(), InputSlot::default())
            .unwrap();
        assert_eq!((a.as_str(), b.as_str(), s.as_str()), ("Add1", "Add2", "Sqrt1"));
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_update_node_appends_sources_and_replaces_values() {
        let mut store = GraphStore::new();
        let a = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let b = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let sink = store
            .add_standalone_node(FunctionKind::Multiply, InputSlot::default(), InputSlot::default())
            .unwrap();

        store
            .update_node(&sink, Some(SlotPatch::Source(a.clone())), None)
            .unwrap();
        store
            .update_node(&sink, Some(SlotPatch::Source(b.clone())), None)
            .unwrap();
        assert_eq!(store.node(&sink).unwrap().input_a.sources(), [a.clone(), b]);

        // A literal patch replaces the merged list outright.
        store
            .update_node(&sink, Some(SlotPatch::Value(7.0)), None)
            .unwrap();
        assert_eq!(store.node(&sink).unwrap().input_a, InputSlot::fixed(7.0));
    }

    #[test]
    fn test_update_node_rejects_unknown_names() {
        let mut store = GraphStore::new();
        let a = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        assert_eq!(
            store.update_node("Ghost1", Some(SlotPatch::Value(1.0)), None),
            Err(StoreError::UnknownNode("Ghost1".to_string()))
        );
        assert_eq!(
            store.update_node(&a, Some(SlotPatch::Source("Ghost1".to_string())), None),
            Err(StoreError::UnknownNode("Ghost1".to_string()))
        );
    }

    #[test]
    fn test_remove_node_input_reverts_to_default() {
        let mut store = GraphStore::new();
        let a = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let sink = store
            .add_standalone_node(FunctionKind::Abs, InputSlot::default(), InputSlot::default())
            .unwrap();
        store
            .update_node(&sink, Some(SlotPatch::Source(a.clone())), None)
            .unwrap();

        store.remove_node_input(&sink, Some(&a), None).unwrap();
        assert_eq!(store.node(&sink).unwrap().input_a, InputSlot::fixed(1.0));

        assert_eq!(
            store.remove_node_input(&sink, Some(&a), None),
            Err(StoreError::SourceNotAttached {
                name: sink.clone(),
                source_name: a,
            })
        );
    }

    #[test]
    fn test_remove_node_cascade_clears_references() {
        let mut store = GraphStore::new();
        let a = store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let sink = store
            .add_standalone_node(FunctionKind::Sqrt, InputSlot::default(), InputSlot::default())
            .unwrap();
        store
            .update_node(&sink, Some(SlotPatch::Source(a.clone())), None)
            .unwrap();

        store.remove_node(&a).unwrap();
        assert!(store.node(&a).is_none());
        // The dead wire is scrubbed, not left dangling.
        assert_eq!(store.node(&sink).unwrap().input_a, InputSlot::fixed(1.0));

        assert_eq!(
            store.remove_node(&a),
            Err(StoreError::UnknownNode(a.clone()))
        );
    }

    #[test]
    fn test_equation_round_trip_restores_the_store() {
        let mut store = GraphStore::new();
        store
            .add_standalone_node(FunctionKind::Add, InputSlot::default(), InputSlot::default())
            .unwrap();
        let before = store.node_count();
        let added: Vec<String>;
        {
            let eq = store.add_equation_graph("SQRT ( x + 2 )").unwrap();
            added = eq.node_names.clone();
            assert!(!added.is_empty());
        }
        assert_eq!(store.node_count(), before + added.len());

        store.remove_equation_graph("EQN1").unwrap();
        assert_eq!(store.node_count(), before);
        for name in added {
            assert!(store.node(&name).is_none());
        }
        assert_eq!(
            store.remove_equation_graph("EQN1"),
            Err(StoreError::UnknownEquation("EQN1".to_string()))
        );
    }

    #[test]
    fn test_equation_members_cannot_be_removed_standalone() {
        let mut store = GraphStore::new();
        let output = store.add_equation_graph("x + 2").unwrap().output_node_name.clone();
        assert_eq!(
            store.remove_node(&output),
            Err(StoreError::EquationOwned {
                name: output,
                id: "EQN1".to_string(),
            })
        );
    }

    #[test]
    fn test_removing_an_equation_scrubs_external_wires() {
        let mut store = GraphStore::new();
        let eq_output = store.add_equation_graph("x + 2").unwrap().output_node_name.clone();
        let sink = store
            .add_standalone_node(FunctionKind::Abs, InputSlot::default(), InputSlot::default())
            .unwrap();
        store
            .update_node(&sink, Some(SlotPatch::Source(eq_output)), None)
            .unwrap();

        store.remove_equation_graph("EQN1").unwrap();
        assert_eq!(store.node(&sink).unwrap().input_a, InputSlot::fixed(1.0));
    }

    #[test]
    fn test_update_equation_graph_keeps_the_id() {
        let mut store = GraphStore::new();
        let id = store.add_equation_graph("x + 2").unwrap().id.clone();
        let before = store.node_count();

        let eq = store.update_equation_graph(&id, "y * 3 + z").unwrap();
        assert_eq!(eq.id, id);
        assert_eq!(eq.equation_text, "y * 3 + z");
        assert_eq!(eq.variable_names, [format!("{id}y"), format!("{id}z")]);
        assert_ne!(store.node_count(), before);
        assert!(store.node(&format!("{id}x")).is_none());
    }

    #[test]
    fn test_update_equation_graph_is_atomic_on_parse_failure() {
        let mut store = GraphStore::new();
        let id = store.add_equation_graph("x + 2").unwrap().id.clone();
        let before = store.node_count();

        let err = store.update_equation_graph(&id, "( x + 2").unwrap_err();
        assert_eq!(err, StoreError::Parse(ParseError::UnbalancedParenthesis));
        assert_eq!(store.node_count(), before);
        assert_eq!(store.equation(&id).unwrap().equation_text, "x + 2");
    }

    #[test]
    fn test_update_equation_graph_is_atomic_on_name_collision() {
        let mut store = GraphStore::new();
        // Enough equations that EQN1's prefix is a prefix of EQN12's.
        for _ in 0..11 {
            store.add_equation_graph("1 + 1").unwrap();
        }
        store.add_equation_graph("x + 1").unwrap();
        assert!(store.node("EQN12x").is_some());
        let before = store.node_count();

        // Variable `2x` under id EQN1 would also synthesize `EQN12x`.
        let err = store.update_equation_graph("EQN1", "2x + 1").unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateName {
                name: "EQN12x".to_string()
            }
        );

        // The failed edit must not have torn down the old subgraph.
        assert_eq!(store.node_count(), before);
        let eq = store.equation("EQN1").expect("EQN1 must survive");
        assert_eq!(eq.equation_text, "1 + 1");
        for name in eq.node_names.clone() {
            assert!(store.node(&name).is_some());
        }
    }

    #[test]
    fn test_equation_ids_are_monotonic() {
        let mut store = GraphStore::new();
        let a = store.add_equation_graph("1 + 1").unwrap().id.clone();
        let b = store.add_equation_graph("2 + 2").unwrap().id.clone();
        store.remove_equation_graph(&a).unwrap();
        let c = store.add_equation_graph("3 + 3").unwrap().id.clone();
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("EQN1", "EQN2", "EQN3"));
    }
}
