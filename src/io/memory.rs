use crate::core::RawChannel;
use crate::io::{Dataset, DatasetProvider};
use crate::types::{SwathError, SwathResult};
use std::collections::HashMap;
use std::path::PathBuf;

/// Variables of one in-memory dataset
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    variables: HashMap<String, RawChannel>,
}

impl Dataset for MemoryDataset {
    fn read_variable(&self, name: &str) -> SwathResult<RawChannel> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| SwathError::Config(format!("Variable {} not found", name)))
    }
}

/// Scene held entirely in memory, keyed by channel name
///
/// Variables inserted without a channel are served when no channel is
/// requested, mirroring a single-file dataset.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    channels: HashMap<Option<String>, MemoryDataset>,
    root: PathBuf,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that auxiliary files resolve against
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    pub fn insert(&mut self, channel: Option<&str>, variable: RawChannel) {
        self.channels
            .entry(channel.map(str::to_string))
            .or_default()
            .variables
            .insert(variable.name.clone(), variable);
    }
}

impl DatasetProvider for MemoryScene {
    fn open(&self, channel: Option<&str>) -> SwathResult<Box<dyn Dataset>> {
        let key = channel.map(str::to_string);
        match self.channels.get(&key) {
            Some(dataset) => Ok(Box::new(dataset.clone())),
            None => Err(SwathError::MissingResource(
                self.root.join(format!("{}.nc", channel.unwrap_or("<dataset>"))),
            )),
        }
    }

    fn resource_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}
