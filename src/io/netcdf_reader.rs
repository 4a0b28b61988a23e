use crate::core::RawChannel;
use crate::io::{Dataset, DatasetProvider};
use crate::types::{SwathError, SwathResult};
use ndarray::{ArrayD, IxDyn};
use std::path::{Path, PathBuf};

/// A netCDF file opened for reading
pub struct NetCdfDataset {
    path: PathBuf,
    file: netcdf::File,
}

impl NetCdfDataset {
    pub fn open<P: AsRef<Path>>(path: P) -> SwathResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SwathError::MissingResource(path.to_path_buf()));
        }
        log::debug!("Opening netCDF dataset {}", path.display());
        let file = netcdf::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all variables in the file
    pub fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }
}

impl Dataset for NetCdfDataset {
    /// Read a numeric variable as f32, masking `_FillValue` to NaN and
    /// applying `scale_factor` / `add_offset` when present
    fn read_variable(&self, name: &str) -> SwathResult<RawChannel> {
        let var = self.file.variable(name).ok_or_else(|| {
            SwathError::Config(format!(
                "Variable {} not found in {}",
                name,
                self.path.display()
            ))
        })?;

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let raw: Vec<f32> = var.get_values::<f32, _>(..)?;

        let fill_value = get_f32_attr(&var, "_FillValue");
        let scale_factor = get_f32_attr(&var, "scale_factor").unwrap_or(1.0);
        let add_offset = get_f32_attr(&var, "add_offset").unwrap_or(0.0);

        let values: Vec<f32> = raw
            .into_iter()
            .map(|v| match fill_value {
                Some(fill) if v == fill => f32::NAN,
                _ => v * scale_factor + add_offset,
            })
            .collect();

        let data = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
            SwathError::InvalidFormat(format!("Failed to reshape {}: {}", name, e))
        })?;

        log::debug!("Read {} {:?} {:?} from {}", name, dims, shape, self.path.display());
        RawChannel::new(name, dims, data)
    }
}

/// An SLSTR scene directory holding one `<channel>.nc` file per channel
#[derive(Debug, Clone)]
pub struct SceneDirectory {
    root: PathBuf,
}

impl SceneDirectory {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn channel_path(&self, channel: &str) -> PathBuf {
        self.root.join(format!("{}.nc", channel))
    }
}

impl DatasetProvider for SceneDirectory {
    fn open(&self, channel: Option<&str>) -> SwathResult<Box<dyn Dataset>> {
        let channel = channel.ok_or_else(|| {
            SwathError::Config("A channel file is required to read from a scene directory".to_string())
        })?;
        Ok(Box::new(NetCdfDataset::open(self.channel_path(channel))?))
    }

    fn resource_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

/// A single netCDF file serving every channel
#[derive(Debug, Clone)]
pub struct SingleDataset {
    path: PathBuf,
}

impl SingleDataset {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetProvider for SingleDataset {
    fn open(&self, _channel: Option<&str>) -> SwathResult<Box<dyn Dataset>> {
        Ok(Box::new(NetCdfDataset::open(&self.path)?))
    }

    fn resource_path(&self, filename: &str) -> PathBuf {
        match self.path.parent() {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        }
    }
}

/// Check if a variable has an attribute with the given name
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}
