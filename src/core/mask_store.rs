use crate::io::mask_file;
use crate::types::{LabelRaster, LabelValue, SwathError, SwathResult};
use ndarray::ArrayViewMut2;
use std::path::{Path, PathBuf};

/// A label raster on the canonical grid together with where it is saved
#[derive(Debug, Clone)]
pub struct LabelMask {
    pub name: String,
    pub colour: String,
    pub file_path: PathBuf,
    pub data: LabelRaster,
}

impl LabelMask {
    /// Number of cells carrying a non-zero label
    pub fn labeled_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Mutable access to one mask raster granted to the viewer for a session
pub struct LabelView<'a> {
    pub name: &'a str,
    pub colour: &'a str,
    pub raster: ArrayViewMut2<'a, LabelValue>,
}

/// Outcome of persisting every mask at the end of a session
#[derive(Debug, Default)]
pub struct PersistReport {
    pub saved: Vec<PathBuf>,
    pub failures: Vec<(String, SwathError)>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the label masks of a session: load or initialise, lend, persist
#[derive(Debug)]
pub struct MaskStore {
    shape: (usize, usize),
    dims: (String, String),
    masks: Vec<LabelMask>,
}

impl MaskStore {
    /// Store for masks of `shape`, written with dimension names `dims`
    pub fn new(shape: (usize, usize), dims: (String, String)) -> Self {
        Self {
            shape,
            dims,
            masks: Vec::new(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Load the mask at `path` if present, else start from an all-zero raster.
    ///
    /// A mask with the same name replaces the previous one.
    pub fn load_or_init<P: AsRef<Path>>(
        &mut self,
        name: &str,
        colour: &str,
        path: P,
    ) -> SwathResult<&LabelMask> {
        let path = path.as_ref();
        let data = if path.exists() {
            log::info!("Loading existing labels for {} from {}", name, path.display());
            mask_file::read_mask(path, self.shape)?
        } else {
            log::info!("No labels at {}, starting {} empty", path.display(), name);
            LabelRaster::zeros(self.shape)
        };

        let mask = LabelMask {
            name: name.to_string(),
            colour: colour.to_string(),
            file_path: path.to_path_buf(),
            data,
        };

        let index = match self.masks.iter().position(|m| m.name == name) {
            Some(i) => {
                self.masks[i] = mask;
                i
            }
            None => {
                self.masks.push(mask);
                self.masks.len() - 1
            }
        };
        Ok(&self.masks[index])
    }

    pub fn get(&self, name: &str) -> Option<&LabelMask> {
        self.masks.iter().find(|m| m.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LabelMask> {
        self.masks.iter_mut().find(|m| m.name == name)
    }

    pub fn masks(&self) -> &[LabelMask] {
        &self.masks
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Mutable raster views for the interactive session, in load order
    pub fn views_mut(&mut self) -> Vec<LabelView<'_>> {
        self.masks
            .iter_mut()
            .map(|m| LabelView {
                name: m.name.as_str(),
                colour: m.colour.as_str(),
                raster: m.data.view_mut(),
            })
            .collect()
    }

    /// Write one mask to its file, overwriting existing content
    pub fn persist(&self, mask: &LabelMask) -> SwathResult<()> {
        let (rows, cols) = mask.data.dim();
        if (rows, cols) != self.shape {
            return Err(SwathError::Shape(format!(
                "Mask {} has shape {:?} should be {:?}",
                mask.name,
                (rows, cols),
                self.shape
            )));
        }
        mask_file::write_mask(
            &mask.file_path,
            &mask.name,
            (self.dims.0.as_str(), self.dims.1.as_str()),
            &mask.data,
        )
    }

    /// Persist every mask; a failure is recorded and the rest still attempted
    pub fn persist_all(&self) -> PersistReport {
        let mut report = PersistReport::default();
        for mask in &self.masks {
            log::info!("Saving labels from {} to {}", mask.name, mask.file_path.display());
            match self.persist(mask) {
                Ok(()) => {
                    log::info!("Saved {} ({} labeled cells)", mask.name, mask.labeled_count());
                    report.saved.push(mask.file_path.clone());
                }
                Err(e) => {
                    log::error!("Failed to write labels file for {}: {}", mask.name, e);
                    report.failures.push((mask.name.clone(), e));
                }
            }
        }
        report
    }
}
