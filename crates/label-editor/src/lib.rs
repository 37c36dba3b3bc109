pub mod canvas;
pub mod hit;
pub mod input;
pub mod jobs;
pub mod list_layout;
pub mod persistence;
pub mod selection;
pub mod text_edit;

pub use canvas::{Canvas, DoubleClickOutcome, MountTarget};
pub use input::{InputEvent, Modifiers};
pub use jobs::{JobId, JobOutcome, RasterGenerator, RasterJob, RasterRequest};
pub use list_layout::{LayoutAxis, LayoutState, ListLayout};
pub use persistence::{DocumentStore, MemoryStore};
pub use selection::{HandleAnchor, SelectionHandles};
pub use text_edit::{OverlayDescriptor, StyleChange, TextEditor};
