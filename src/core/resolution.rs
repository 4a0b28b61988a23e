use crate::types::{AggregateMode, Raster, SwathError, SwathResult};
use ndarray::Array2;

/// Oversampling of the fine channel family relative to the canonical grid
pub const FINE_RESOLUTION_FACTOR: usize = 2;

/// Block aggregation from a fine native grid down to the canonical grid
#[derive(Debug, Clone)]
pub struct ResolutionNormalizer {
    canonical: (usize, usize),
    factor: usize,
}

impl ResolutionNormalizer {
    /// Create a normalizer for the standard 2x oversampled channel family
    pub fn new(canonical: (usize, usize)) -> Self {
        Self::with_factor(canonical, FINE_RESOLUTION_FACTOR)
    }

    pub fn with_factor(canonical: (usize, usize), factor: usize) -> Self {
        Self {
            canonical,
            factor: factor.max(1),
        }
    }

    /// Shape a fine-resolution channel is expected to have
    pub fn fine_shape(&self) -> (usize, usize) {
        (self.canonical.0 * self.factor, self.canonical.1 * self.factor)
    }

    /// Reduce each non-overlapping `factor x factor` block to one value.
    ///
    /// Missing (NaN) samples are skipped; a block with no valid samples, or
    /// a single one under [`AggregateMode::StandardDeviation`], yields NaN.
    /// Input already at canonical shape is returned unchanged.
    pub fn normalize(&self, array: Raster, aggregate: AggregateMode) -> SwathResult<Raster> {
        let (rows, cols) = array.dim();
        if (rows, cols) == self.canonical {
            return Ok(array);
        }
        if (rows, cols) != self.fine_shape() {
            return Err(SwathError::Shape(format!(
                "Cannot coarsen {}x{} by {} onto the {}x{} grid",
                rows, cols, self.factor, self.canonical.0, self.canonical.1
            )));
        }

        log::debug!(
            "Coarsening {}x{} -> {}x{} ({})",
            rows,
            cols,
            self.canonical.0,
            self.canonical.1,
            aggregate
        );

        let (out_rows, out_cols) = self.canonical;
        let mut output = Array2::<f32>::zeros((out_rows, out_cols));
        let mut block: Vec<f64> = Vec::with_capacity(self.factor * self.factor);

        for out_row in 0..out_rows {
            for out_col in 0..out_cols {
                block.clear();
                let start_row = out_row * self.factor;
                let start_col = out_col * self.factor;
                for in_row in start_row..start_row + self.factor {
                    for in_col in start_col..start_col + self.factor {
                        let v = array[[in_row, in_col]];
                        if !v.is_nan() {
                            block.push(v as f64);
                        }
                    }
                }

                output[[out_row, out_col]] = match aggregate {
                    AggregateMode::Mean => block_mean(&block),
                    AggregateMode::StandardDeviation => block_sample_std(&block),
                } as f32;
            }
        }

        Ok(output)
    }
}

fn block_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn block_sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = block_mean(values);
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
