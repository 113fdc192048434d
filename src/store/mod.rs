//! The live, incrementally-editable collection of all operation nodes.
pub mod registry;

pub use registry::{GraphStore, SlotPatch, StoreError};
