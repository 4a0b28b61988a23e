//! Channel alignment and layer composition

pub mod grid;
pub mod channel_loader;
pub mod resolution;
pub mod view_geometry;
pub mod composer;
pub mod mask_store;

// Re-export main types
pub use grid::{AxisBinding, AxisBindings, GridGeometry};
pub use channel_loader::{ChannelLoader, ChannelSlice, RawChannel};
pub use resolution::{ResolutionNormalizer, FINE_RESOLUTION_FACTOR};
pub use view_geometry::{ViewGeometryAligner, OBLIQUE_OFFSET_COARSE, OBLIQUE_OFFSET_FINE};
pub use composer::{BuiltLayer, Composition, ImageLayer, LabelLayer, LayerComposer, LayerFailure, RgbLayer};
pub use mask_store::{LabelMask, LabelView, MaskStore, PersistReport};
