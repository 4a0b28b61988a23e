//! I/O modules for reading channel datasets and label masks

pub mod mask_file;
pub mod memory;
pub mod netcdf_reader;

use crate::core::RawChannel;
use crate::types::SwathResult;
use std::path::PathBuf;

pub use mask_file::{read_mask, write_mask};
pub use memory::MemoryScene;
pub use netcdf_reader::{NetCdfDataset, SceneDirectory, SingleDataset};

/// An open source dataset; closed when dropped
pub trait Dataset {
    /// Read one named variable with its native dimension order
    fn read_variable(&self, name: &str) -> SwathResult<RawChannel>;
}

/// Resolves channel names to open datasets
pub trait DatasetProvider {
    /// Open the dataset holding `channel`, or the provider's only dataset when `None`
    fn open(&self, channel: Option<&str>) -> SwathResult<Box<dyn Dataset>>;

    /// Location of an auxiliary file (e.g. a label mask) next to the data
    fn resource_path(&self, filename: &str) -> PathBuf {
        PathBuf::from(filename)
    }
}
