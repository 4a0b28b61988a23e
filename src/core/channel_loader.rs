use crate::core::grid::AxisBindings;
use crate::io::Dataset;
use crate::types::{Raster, SwathError, SwathReal, SwathResult};
use ndarray::{ArrayD, Axis, Ix2};

/// A variable exactly as read from a source dataset, before any reduction
#[derive(Debug, Clone)]
pub struct RawChannel {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayD<SwathReal>,
}

impl RawChannel {
    pub fn new(name: impl Into<String>, dims: Vec<String>, data: ArrayD<SwathReal>) -> SwathResult<Self> {
        let name = name.into();
        if dims.len() != data.ndim() {
            return Err(SwathError::Shape(format!(
                "Variable {} has {} dimension names for a {}-dimensional array",
                name,
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self { name, dims, data })
    }
}

/// One 2D projection of a channel on the canonical axes
#[derive(Debug, Clone)]
pub struct ChannelSlice {
    /// Variable name, or `{variable}[{dim}={index}]` when split along an extra dimension
    pub label: String,
    pub data: Raster,
}

/// Reads variables and rearranges them onto the canonical row/column axes
pub struct ChannelLoader<'a> {
    axes: &'a AxisBindings,
}

impl<'a> ChannelLoader<'a> {
    pub fn new(axes: &'a AxisBindings) -> Self {
        Self { axes }
    }

    /// Read `variable` from `dataset` and project it onto the canonical axes
    pub fn load(
        &self,
        dataset: &dyn Dataset,
        variable: &str,
        allow_extra_dim: bool,
    ) -> SwathResult<Vec<ChannelSlice>> {
        let raw = dataset.read_variable(variable)?;
        self.project(raw, allow_extra_dim)
    }

    /// Load a variable that must reduce to exactly one 2D array
    pub fn load_single(&self, dataset: &dyn Dataset, variable: &str) -> SwathResult<Raster> {
        let mut slices = self.load(dataset, variable, false)?;
        slices
            .pop()
            .map(|s| s.data)
            .ok_or_else(|| SwathError::Shape(format!("Variable {} produced no data", variable)))
    }

    /// Squeeze unit dimensions, transpose row before column, split any extra
    /// dimension and apply the configured flips.
    ///
    /// When a third non-unit dimension remains it is always the leading
    /// non-canonical one; with `allow_extra_dim` one slice per index is
    /// produced, otherwise it is an error. Two or more extra dimensions are
    /// always an error.
    pub fn project(&self, raw: RawChannel, allow_extra_dim: bool) -> SwathResult<Vec<ChannelSlice>> {
        let RawChannel { name, mut dims, mut data } = raw;
        log::debug!("Projecting {} with dims {:?} shape {:?}", name, dims, data.shape());

        // squeeze, back to front so earlier indices stay valid
        for axis in (0..data.ndim()).rev() {
            if data.len_of(Axis(axis)) == 1 {
                data = data.index_axis_move(Axis(axis), 0);
                dims.remove(axis);
            }
        }

        match dims.len() {
            0 | 1 => {
                return Err(SwathError::Shape(format!(
                    "{} should have two dimensions with size > 1, found {:?}",
                    name, dims
                )))
            }
            2 => {}
            3 if allow_extra_dim => {}
            3 => {
                return Err(SwathError::Shape(format!(
                    "{} should not have more than two dimensions with size > 1, found {:?}",
                    name, dims
                )))
            }
            _ => {
                return Err(SwathError::Shape(format!(
                    "{} has more than one extra dimension with size > 1: {:?}",
                    name, dims
                )))
            }
        }

        let row = self.position_of(&name, &dims, self.axes.row_name())?;
        let col = self.position_of(&name, &dims, self.axes.col_name())?;
        let others: Vec<usize> = (0..dims.len())
            .filter(|i| Some(*i) != row && Some(*i) != col)
            .collect();

        // canonical axes claim their slots, remaining dims fill the gap in native order
        let mut order: Vec<usize> = Vec::with_capacity(dims.len());
        let mut rest = others.iter().copied();
        let extra = if dims.len() == 3 { rest.next() } else { None };
        order.extend(extra);
        match (row, col) {
            (Some(r), Some(c)) => order.extend([r, c]),
            (Some(r), None) => {
                order.push(r);
                order.extend(rest);
            }
            (None, Some(c)) => {
                order.extend(rest);
                order.push(c);
            }
            (None, None) => order.extend(rest),
        }

        let data = data.permuted_axes(order.as_slice());
        let dims: Vec<String> = order.iter().map(|&i| dims[i].clone()).collect();

        let slices = match extra {
            None => vec![ChannelSlice {
                label: name.clone(),
                data: self.finish(&name, data)?,
            }],
            Some(_) => {
                let extra_dim = &dims[0];
                (0..data.len_of(Axis(0)))
                    .map(|index| {
                        let label = format!("{}[{}={}]", name, extra_dim, index);
                        let plane = data.index_axis(Axis(0), index).to_owned();
                        let data = self.finish(&label, plane)?;
                        Ok(ChannelSlice { label, data })
                    })
                    .collect::<SwathResult<Vec<_>>>()?
            }
        };

        log::debug!(
            "{} projected to {} slice(s) of shape {:?}",
            name,
            slices.len(),
            slices.first().map(|s| s.data.dim())
        );
        Ok(slices)
    }

    fn position_of(&self, name: &str, dims: &[String], axis: Option<&str>) -> SwathResult<Option<usize>> {
        match axis {
            None => Ok(None),
            Some(axis) => dims
                .iter()
                .position(|d| d == axis)
                .map(Some)
                .ok_or_else(|| {
                    SwathError::Shape(format!(
                        "{} has no dimension '{}' with size > 1 (dimensions: {:?})",
                        name, axis, dims
                    ))
                }),
        }
    }

    /// Convert to 2D, flip as configured and return in standard layout
    fn finish(&self, label: &str, data: ArrayD<SwathReal>) -> SwathResult<Raster> {
        let mut plane = data
            .into_dimensionality::<Ix2>()
            .map_err(|e| SwathError::Shape(format!("{} is not two-dimensional: {}", label, e)))?;
        if self.axes.flip_rows() {
            plane.invert_axis(Axis(0));
        }
        if self.axes.flip_cols() {
            plane.invert_axis(Axis(1));
        }
        Ok(plane.as_standard_layout().into_owned())
    }
}
