use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Real-valued sample of a channel (radiance, brightness temperature, ...)
pub type SwathReal = f32;

/// Value stored in a label mask (0 = unlabeled, 1 = labeled)
pub type LabelValue = i32;

/// 2D raster on the canonical grid (rows x columns)
pub type Raster = Array2<SwathReal>;

/// False-colour composite (rows x columns x rgb)
pub type RgbRaster = Array3<SwathReal>;

/// 2D integer label raster (rows x columns)
pub type LabelRaster = Array2<LabelValue>;

/// Block-reduction function used when coarsening a fine-resolution channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateMode {
    Mean,
    StandardDeviation,
}

impl FromStr for AggregateMode {
    type Err = SwathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(AggregateMode::Mean),
            "sdev" => Ok(AggregateMode::StandardDeviation),
            _ => Err(SwathError::Config(format!(
                "Invalid aggregate name {} should be either \"mean\" or \"sdev\"",
                s
            ))),
        }
    }
}

impl std::fmt::Display for AggregateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateMode::Mean => write!(f, "mean"),
            AggregateMode::StandardDeviation => write!(f, "sdev"),
        }
    }
}

/// Viewing geometry of the sensor for a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewGeometry {
    /// Full-width nadir swath, already on the canonical frame
    Nadir,
    /// Narrower rear-looking swath, offset cross-track
    Oblique,
}

impl FromStr for ViewGeometry {
    type Err = SwathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nadir" | "n" => Ok(ViewGeometry::Nadir),
            "oblique" | "o" => Ok(ViewGeometry::Oblique),
            _ => Err(SwathError::Config(format!("Invalid view geometry: {}", s))),
        }
    }
}

/// Native sampling of a channel relative to the canonical grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// Oversampled (2x along both axes), needs coarsening
    Fine,
    /// Already at canonical resolution
    Coarse,
}

impl FromStr for Granularity {
    type Err = SwathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fine" | "0.5km" => Ok(Granularity::Fine),
            "coarse" | "1km" => Ok(Granularity::Coarse),
            _ => Err(SwathError::Config(format!("Invalid resolution: {}", s))),
        }
    }
}

/// Declared family of a channel: which view it was acquired with and at what sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub view: ViewGeometry,
    pub granularity: Granularity,
}

impl Default for ChannelDescriptor {
    fn default() -> Self {
        Self {
            view: ViewGeometry::Nadir,
            granularity: Granularity::Coarse,
        }
    }
}

impl ChannelDescriptor {
    /// Infer the channel family from an SLSTR-style channel name,
    /// `S<n>_<quantity>_<stripe><view>` e.g. `S3_radiance_an`, `S8_BT_io`.
    ///
    /// Stripes `a` and `b` are sampled on the 0.5 km grid; the view suffix
    /// `o` marks the oblique swath. Names outside this convention are
    /// treated as nadir channels at canonical resolution.
    pub fn from_channel_name(channel: &str) -> Self {
        let suffix = match channel.rsplit('_').next() {
            Some(s) if s.len() == 2 && channel.contains('_') => s.as_bytes(),
            _ => return Self::default(),
        };

        let view = match suffix[1] {
            b'o' => ViewGeometry::Oblique,
            b'n' => ViewGeometry::Nadir,
            _ => return Self::default(),
        };
        let granularity = match suffix[0] {
            b'a' | b'b' => Granularity::Fine,
            _ => Granularity::Coarse,
        };

        Self { view, granularity }
    }

    pub fn is_fine(&self) -> bool {
        self.granularity == Granularity::Fine
    }
}

/// Error types for channel alignment and layer composition
#[derive(Debug, thiserror::Error)]
pub enum SwathError {
    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing resource: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SwathError {
    /// Short stable label for failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            SwathError::Shape(_) => "shape",
            SwathError::Config(_) => "config",
            SwathError::MissingResource(_) => "missing-resource",
            SwathError::InvalidFormat(_) => "format",
            SwathError::Io(_) => "io",
            SwathError::NetCdf(_) => "netcdf",
            SwathError::Toml(_) => "toml",
        }
    }
}

/// Result type for swath operations
pub type SwathResult<T> = Result<T, SwathError>;
