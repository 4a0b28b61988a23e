//! swathlab: channel alignment and label masks for satellite swath imagery
//!
//! Heterogeneous per-channel arrays read from netCDF (different native
//! resolutions, nadir or oblique view geometry, arbitrary dimension order)
//! are projected onto one canonical grid as display layers, and
//! hand-drawn label masks are loaded and saved on that same grid.

pub mod types;
pub mod config;
pub mod core;
pub mod io;
pub mod session;
pub mod viewer;

// Re-export main types and functions for easier access
pub use types::{
    AggregateMode, ChannelDescriptor, Granularity, LabelRaster, Raster, RgbRaster, SwathError,
    SwathResult, ViewGeometry,
};

pub use config::{LayerConfig, LayerEntry, LayerKind, LayerSpec};
pub use core::{GridGeometry, LayerComposer, MaskStore};
pub use io::{MemoryScene, SceneDirectory, SingleDataset};
pub use session::{infer_grid, LabellingSession};
pub use viewer::{HeadlessViewer, LayerSink};
