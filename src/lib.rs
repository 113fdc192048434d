//! Compiles infix equations into a live graph of named operation nodes and
//! serializes that graph into placement commands for a visual dataflow
//! circuit.
//!
//! The pipeline: [`compiler`] turns equation text into postfix order and a
//! node list, [`store::GraphStore`] holds every node in one mutable,
//! name-keyed namespace with an incremental wiring API, and [`export`]
//! walks the store dependency-first to emit one typed placement record per
//! node. The crate never evaluates expressions; numeric semantics belong to
//! the external runtime that consumes the exported graph.

pub mod compiler;
pub mod export;
pub mod graph;
pub mod store;

pub use compiler::ParseError;
pub use export::{export, ExportError, LayoutConfig, PlacementRecord};
pub use graph::{EquationGraph, FunctionKind, InputSlot, OperationNode};
pub use store::{GraphStore, SlotPatch, StoreError};
