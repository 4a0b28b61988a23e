//! Label masks persisted as single-variable netCDF files

use crate::types::{LabelRaster, LabelValue, SwathError, SwathResult};
use ndarray::Array2;
use std::path::Path;

/// netCDF variable name for a label layer name
pub fn variable_name(label: &str) -> String {
    let name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => name,
        _ => format!("mask_{}", name),
    }
}

/// Write `data` to `path` as one integer variable, replacing any existing file
pub fn write_mask<P: AsRef<Path>>(
    path: P,
    label: &str,
    dims: (&str, &str),
    data: &LabelRaster,
) -> SwathResult<()> {
    let path = path.as_ref();
    let (rows, cols) = data.dim();
    log::debug!("Writing {}x{} mask {} to {}", rows, cols, label, path.display());

    let mut file = netcdf::create(path)?;
    file.add_dimension(dims.0, rows)?;
    file.add_dimension(dims.1, cols)?;

    let mut var = file.add_variable::<LabelValue>(&variable_name(label), &[dims.0, dims.1])?;
    var.put_attribute("description", format!("mask for label: {}", label))?;
    var.put_attribute("date_created", chrono::Utc::now().to_rfc3339())?;

    let standard = data.as_standard_layout();
    let values = standard
        .as_slice()
        .ok_or_else(|| SwathError::InvalidFormat("Mask raster is not contiguous".to_string()))?;
    var.put_values(values, ..)?;

    Ok(())
}

/// Read the single 2D variable of a mask file, which must have `shape`
pub fn read_mask<P: AsRef<Path>>(path: P, shape: (usize, usize)) -> SwathResult<LabelRaster> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SwathError::MissingResource(path.to_path_buf()));
    }

    let file = netcdf::open(path)?;
    let mut candidates = file.variables().filter(|v| v.dimensions().len() == 2);
    let var = candidates.next().ok_or_else(|| {
        SwathError::InvalidFormat(format!("No 2D mask variable in {}", path.display()))
    })?;
    if candidates.next().is_some() {
        return Err(SwathError::InvalidFormat(format!(
            "More than one 2D variable in {}, cannot pick the mask",
            path.display()
        )));
    }

    let dims = var.dimensions();
    let found = (dims[0].len(), dims[1].len());
    if found != shape {
        return Err(SwathError::Shape(format!(
            "Mask {} has shape {:?} should be {:?}",
            path.display(),
            found,
            shape
        )));
    }

    let values: Vec<LabelValue> = var.get_values::<LabelValue, _>(..)?;
    Array2::from_shape_vec(shape, values)
        .map_err(|e| SwathError::InvalidFormat(format!("Failed to reshape mask: {}", e)))
}
