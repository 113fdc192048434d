//! Dependency-respecting traversal of the store into placement records.
//!
//! Depth-first from each unvisited node, recursing into every referenced
//! source first, so producers are always emitted before their consumers. A
//! visited set keeps the walk linear on DAGs with shared sub-results; a
//! `Visiting` mark turns a back-edge into a structured error instead of
//! unbounded recursion.

use std::collections::HashMap;

use log::info;
use thiserror::Error;

use super::record::{ChannelBinding, LayoutConfig, PlacementRecord};
use crate::graph::OperationNode;
use crate::store::GraphStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("cycle detected through node `{name}`")]
    CycleDetected { name: String },
    #[error("node `{from}` references `{to}`, which is not in the store")]
    DanglingReference { from: String, to: String },
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Emits one placement record per node in the store, sources before
/// consumers, plus label companions for `separate` nodes and optional
/// per-equation captions.
pub fn export(store: &GraphStore, layout: &LayoutConfig) -> Result<Vec<PlacementRecord>, ExportError> {
    let mut walker = Walker {
        store,
        layout,
        state: HashMap::new(),
        records: Vec::new(),
        grid_slot: 0,
        label_slot: 0,
    };

    for node in store.nodes() {
        walker.visit(&node.name, None)?;
    }

    if layout.caption_equations {
        walker.emit_captions();
    }

    info!(
        "exported {} placement records for {} nodes",
        walker.records.len(),
        store.node_count()
    );
    Ok(walker.records)
}

struct Walker<'a> {
    store: &'a GraphStore,
    layout: &'a LayoutConfig,
    state: HashMap<String, VisitState>,
    records: Vec<PlacementRecord>,
    grid_slot: usize,
    label_slot: usize,
}

impl Walker<'_> {
    fn visit(&mut self, name: &str, referrer: Option<&str>) -> Result<(), ExportError> {
        match self.state.get(name) {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                return Err(ExportError::CycleDetected {
                    name: name.to_string(),
                })
            }
            None => {}
        }
        let node = self.store.node(name).ok_or_else(|| ExportError::DanglingReference {
            from: referrer.unwrap_or(name).to_string(),
            to: name.to_string(),
        })?;
        self.state.insert(name.to_string(), VisitState::Visiting);

        let sources: Vec<String> = node.references().map(str::to_string).collect();
        for source in &sources {
            self.visit(source, Some(name))?;
        }

        self.emit(node);
        self.state.insert(name.to_string(), VisitState::Visited);
        Ok(())
    }

    fn emit(&mut self, node: &OperationNode) {
        let cell = self.layout.cell;
        let (position, rotation) = if node.separate {
            // Reserved lane below the grid, one slot per separate node.
            let x = self.label_slot as f64 * cell;
            self.label_slot += 1;
            self.records.push(PlacementRecord::Label {
                name: format!("{}Label", node.name),
                position: [x, -2.0 * cell, cell / 2.0],
                rotation: [0.0, 0.0, -90.0],
                text: node.name.clone(),
            });
            ([x, -cell, 0.0], [0.0; 3])
        } else {
            let x = (self.grid_slot % self.layout.row_width) as f64 * cell;
            let y = (self.grid_slot / self.layout.row_width) as f64 * cell;
            self.grid_slot += 1;
            ([x, y, 0.0], [0.0; 3])
        };

        self.records.push(PlacementRecord::Math {
            name: node.name.clone(),
            position,
            rotation,
            operation: node.function,
            channel_a: ChannelBinding::from(&node.input_a),
            channel_b: ChannelBinding::from(&node.input_b),
        });
    }

    fn emit_captions(&mut self) {
        let cell = self.layout.cell;
        for (i, eq) in self.store.equations().enumerate() {
            self.records.push(PlacementRecord::Label {
                name: format!("{}Text", eq.id),
                position: [i as f64 * cell, -3.0 * cell, cell / 2.0],
                rotation: [0.0, 0.0, -90.0],
                text: eq.equation_text.clone(),
            });
        }
    }
}
