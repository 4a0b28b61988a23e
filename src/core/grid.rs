use crate::types::{SwathError, SwathResult};
use std::str::FromStr;

/// Row count of the SLSTR 1 km nadir grid
pub const SLSTR_1KM_ROWS: usize = 1200;
/// Column count of the SLSTR 1 km nadir grid
pub const SLSTR_1KM_COLUMNS: usize = 1500;

/// A named source dimension bound to one output axis, optionally reversed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisBinding {
    pub name: String,
    pub flip: bool,
}

impl AxisBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flip: false,
        }
    }

    pub fn flipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flip: true,
        }
    }
}

impl FromStr for AxisBinding {
    type Err = SwathError;

    /// Parse `name` or `-name`, the leading `-` requesting a flip
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, flip) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if name.is_empty() {
            return Err(SwathError::Config(format!("Empty axis name in '{}'", s)));
        }
        Ok(Self {
            name: name.to_string(),
            flip,
        })
    }
}

/// Which source dimensions land on the output row and column axes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisBindings {
    pub row: Option<AxisBinding>,
    pub col: Option<AxisBinding>,
}

impl AxisBindings {
    pub fn new(row: Option<AxisBinding>, col: Option<AxisBinding>) -> SwathResult<Self> {
        if let (Some(r), Some(c)) = (&row, &col) {
            if r.name == c.name {
                return Err(SwathError::Config(format!(
                    "Row and column axes must differ, both bound to '{}'",
                    r.name
                )));
            }
        }
        Ok(Self { row, col })
    }

    pub fn row_name(&self) -> Option<&str> {
        self.row.as_ref().map(|b| b.name.as_str())
    }

    pub fn col_name(&self) -> Option<&str> {
        self.col.as_ref().map(|b| b.name.as_str())
    }

    pub fn flip_rows(&self) -> bool {
        self.row.as_ref().map_or(false, |b| b.flip)
    }

    pub fn flip_cols(&self) -> bool {
        self.col.as_ref().map_or(false, |b| b.flip)
    }
}

/// The canonical output grid every layer is projected onto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridGeometry {
    pub axes: AxisBindings,
    shape: (usize, usize),
}

impl GridGeometry {
    /// Create a grid, validating the axis bindings and the target shape once
    pub fn new(axes: AxisBindings, shape: (usize, usize)) -> SwathResult<Self> {
        if shape.0 == 0 || shape.1 == 0 {
            return Err(SwathError::Config(format!(
                "Grid shape must be non-empty, got {:?}",
                shape
            )));
        }
        Ok(Self { axes, shape })
    }

    /// The SLSTR L1 1 km nadir grid: rows x columns = 1200 x 1500
    pub fn slstr_1km() -> SwathResult<Self> {
        let axes = AxisBindings::new(
            Some(AxisBinding::new("rows")),
            Some(AxisBinding::new("columns")),
        )?;
        Self::new(axes, (SLSTR_1KM_ROWS, SLSTR_1KM_COLUMNS))
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.0
    }

    pub fn cols(&self) -> usize {
        self.shape.1
    }

    /// Dimension names used when writing arrays on this grid
    pub fn dim_names(&self) -> (String, String) {
        let row = self.axes.row_name().unwrap_or("rows").to_string();
        let col = self.axes.col_name().unwrap_or("columns").to_string();
        (row, col)
    }

    /// Fail with a shape error unless `shape` is exactly the canonical shape
    pub fn check_shape(&self, what: &str, shape: (usize, usize)) -> SwathResult<()> {
        if shape != self.shape {
            return Err(SwathError::Shape(format!(
                "Data for {} has incompatible shape: {:?} should be {:?}",
                what, shape, self.shape
            )));
        }
        Ok(())
    }
}
