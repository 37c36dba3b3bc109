pub mod config;
pub mod dimension;
pub mod document;
pub mod error;
pub mod factory;
pub mod id;
pub mod metrics;
pub mod model;
pub mod placeholder;
pub mod raster;

pub use config::EditorConfig;
pub use dimension::{CanvasConfig, DimensionEngine, Orientation, PaperPreset, SubscriptionId};
pub use document::{DocumentState, deserialize_nodes, now_timestamp, serialize_scene};
pub use error::{LabelError, Result};
pub use id::NodeId;
pub use metrics::{FallbackMeasurer, GlyphMeasurer, TextMeasurer, auto_size, measure_wrapped};
pub use model::*;
pub use placeholder::{
    ImageKind, PlaceholderFamily, PlaceholderId, PlaceholderProps, PlaceholderState,
    PlaceholderVisual, RasterFit, RasterSource, create_placeholder, sample_value,
};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
