//! The typed placement commands handed to the external sink, and the layout
//! settings that position them.

use std::io;

use serde::{Deserialize, Serialize};

use crate::graph::{FunctionKind, InputSlot};

/// How an input channel is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelAxis {
    /// Driven by the named source nodes.
    Custom,
    /// No wires; the channel holds its fixed value.
    AlwaysOn,
}

/// One input channel of a math placement: either a fixed value or a list of
/// source node names the runtime merges into the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub axis: ChannelAxis,
    pub value: f64,
    pub sources: Vec<String>,
}

impl From<&InputSlot> for ChannelBinding {
    fn from(slot: &InputSlot) -> Self {
        match slot {
            InputSlot::Fixed(v) => ChannelBinding {
                axis: ChannelAxis::AlwaysOn,
                value: *v,
                sources: Vec::new(),
            },
            InputSlot::Sources(list) => ChannelBinding {
                axis: ChannelAxis::Custom,
                value: 1.0,
                sources: list.to_vec(),
            },
        }
    }
}

/// One placement command. Producers are always emitted before the consumers
/// that name them in a channel's source list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlacementRecord {
    /// A math-operation node.
    Math {
        name: String,
        position: [f64; 3],
        rotation: [f64; 3],
        operation: FunctionKind,
        channel_a: ChannelBinding,
        channel_b: ChannelBinding,
    },
    /// A fixed text label.
    Label {
        name: String,
        position: [f64; 3],
        rotation: [f64; 3],
        text: String,
    },
    /// A range-remapping node. Part of the sink vocabulary for interactive
    /// hosts; the core graph walk never synthesizes one.
    Remap {
        name: String,
        position: [f64; 3],
        rotation: [f64; 3],
        min_in: f64,
        max_in: f64,
        min_out: f64,
        max_out: f64,
        sources: Vec<String>,
    },
}

impl PlacementRecord {
    pub fn name(&self) -> &str {
        match self {
            PlacementRecord::Math { name, .. }
            | PlacementRecord::Label { name, .. }
            | PlacementRecord::Remap { name, .. } => name,
        }
    }

    /// A remap placement with the conventional symmetric unit ranges.
    pub fn remap(name: impl Into<String>, position: [f64; 3], sources: Vec<String>) -> Self {
        PlacementRecord::Remap {
            name: name.into(),
            position,
            rotation: [0.0; 3],
            min_in: -1.0,
            max_in: 1.0,
            min_out: -1.0,
            max_out: 1.0,
            sources,
        }
    }
}

/// Grid-layout settings for the exporter. Hosts may deserialize this from
/// their own configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance between adjacent grid slots.
    pub cell: f64,
    /// Slots per row before the walk wraps to the next row.
    pub row_width: usize,
    /// Emit one label per registered equation carrying its source text.
    pub caption_equations: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell: 10.0,
            row_width: 11,
            caption_equations: false,
        }
    }
}

/// Writes a record sequence as JSON, the shipped stand-in for the
/// game-specific creation writer.
pub fn write_json<W: io::Write>(writer: W, records: &[PlacementRecord]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, records)
}
