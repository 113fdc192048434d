//! Serializes the live graph into placement commands for the external sink.
pub mod record;
pub mod walker;

pub use record::{write_json, ChannelAxis, ChannelBinding, LayoutConfig, PlacementRecord};
pub use walker::{export, ExportError};
