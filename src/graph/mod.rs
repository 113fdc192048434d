//! Defines the core data structures for the operation graph.
pub mod node;
pub mod ops;

// Re-export key types for convenient access
pub use node::{EquationGraph, InputSlot, OperationNode};
pub use ops::FunctionKind;
