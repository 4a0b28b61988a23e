//! Placement of the narrow oblique swath on the nadir frame.
//!
//! The SLSTR oblique view covers a narrower cross-track footprint than the
//! nadir view. Both grids carry a `track_offset` in their manifests giving
//! the column of the sub-satellite track; the oblique swath is placed at
//! `nadir_track_offset - oblique_track_offset` columns into the nadir frame:
//!
//! * 0.5 km stripes: 1996 - 900 = 1096
//! * 1 km channels:   998 - 450 = 548
//!
//! These are calibration constants and are not recomputed per scene.

use crate::core::resolution::FINE_RESOLUTION_FACTOR;
use crate::types::{Raster, SwathError, SwathResult, ViewGeometry};
use ndarray::{s, Array2};

/// Column offset of the oblique swath on the 0.5 km grid
pub const OBLIQUE_OFFSET_FINE: usize = 1096;

/// Column offset of the oblique swath on the 1 km grid
pub const OBLIQUE_OFFSET_COARSE: usize = 548;

/// Shifts and pads oblique channels into the canonical coordinate frame
#[derive(Debug, Clone)]
pub struct ViewGeometryAligner {
    canonical: (usize, usize),
    fine_factor: usize,
    fine_offset: usize,
    coarse_offset: usize,
}

impl ViewGeometryAligner {
    /// Aligner using the SLSTR track-offset constants
    pub fn new(canonical: (usize, usize)) -> Self {
        Self::with_offsets(canonical, OBLIQUE_OFFSET_FINE, OBLIQUE_OFFSET_COARSE)
    }

    pub fn with_offsets(canonical: (usize, usize), fine_offset: usize, coarse_offset: usize) -> Self {
        Self {
            canonical,
            fine_factor: FINE_RESOLUTION_FACTOR,
            fine_offset,
            coarse_offset,
        }
    }

    /// Canvas shape and column offset for a resolution stage
    pub fn frame(&self, is_fine_resolution: bool) -> ((usize, usize), usize) {
        if is_fine_resolution {
            (
                (self.canonical.0 * self.fine_factor, self.canonical.1 * self.fine_factor),
                self.fine_offset,
            )
        } else {
            (self.canonical, self.coarse_offset)
        }
    }

    /// Place `array` on the canonical frame for its viewing geometry.
    ///
    /// Nadir data is returned unchanged. Oblique data is copied into columns
    /// `[offset, offset + width)` of a NaN-filled canvas; it is never cropped.
    pub fn align(
        &self,
        array: Raster,
        view: ViewGeometry,
        is_fine_resolution: bool,
    ) -> SwathResult<Raster> {
        if view == ViewGeometry::Nadir {
            return Ok(array);
        }

        let ((rows, cols), offset) = self.frame(is_fine_resolution);
        let (in_rows, in_cols) = array.dim();

        if in_rows != rows {
            return Err(SwathError::Shape(format!(
                "Oblique data has {} rows, expected {} for the {} frame",
                in_rows,
                rows,
                if is_fine_resolution { "fine" } else { "coarse" }
            )));
        }
        if in_cols > cols.saturating_sub(offset) {
            return Err(SwathError::Shape(format!(
                "Oblique data is {} columns wide, at most {} fit after offset {} in a {}-column frame",
                in_cols,
                cols.saturating_sub(offset),
                offset,
                cols
            )));
        }

        log::debug!(
            "Aligning oblique {}x{} into {}x{} at column {}",
            in_rows,
            in_cols,
            rows,
            cols,
            offset
        );

        let mut canvas = Array2::<f32>::from_elem((rows, cols), f32::NAN);
        canvas
            .slice_mut(s![.., offset..offset + in_cols])
            .assign(&array);
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nadir_is_identity() {
        let aligner = ViewGeometryAligner::new((3, 4));
        let data = Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f32);
        let out = aligner.align(data.clone(), ViewGeometry::Nadir, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_oblique_padding() {
        let aligner = ViewGeometryAligner::with_offsets((2, 8), 5, 3);
        let data = Array2::from_elem((2, 4), 1.0f32);
        let out = aligner.align(data, ViewGeometry::Oblique, false).unwrap();

        assert_eq!(out.dim(), (2, 8));
        for row in out.rows() {
            let valid: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_nan())
                .map(|(i, _)| i)
                .collect();
            assert_eq!(valid, vec![3, 4, 5, 6]);
        }
    }

    #[test]
    fn test_fine_frame_uses_fine_offset() {
        let aligner = ViewGeometryAligner::with_offsets((2, 8), 5, 3);
        let data = Array2::from_elem((4, 6), 2.0f32);
        let out = aligner.align(data, ViewGeometry::Oblique, true).unwrap();
        assert_eq!(out.dim(), (4, 16));
        assert!(out[[0, 4]].is_nan());
        assert_eq!(out[[0, 5]], 2.0);
        assert_eq!(out[[3, 10]], 2.0);
        assert!(out[[3, 11]].is_nan());
    }

    #[test]
    fn test_oblique_too_wide_rejected() {
        let aligner = ViewGeometryAligner::with_offsets((2, 8), 5, 3);
        let data = Array2::from_elem((2, 6), 1.0f32);
        assert!(matches!(
            aligner.align(data, ViewGeometry::Oblique, false),
            Err(SwathError::Shape(_))
        ));
    }

    #[test]
    fn test_slstr_constants_fit() {
        let aligner = ViewGeometryAligner::new((1200, 1500));
        let ((rows, cols), offset) = aligner.frame(true);
        assert_eq!((rows, cols), (2400, 3000));
        assert!(offset + 1800 <= cols);
        let ((_, cols), offset) = aligner.frame(false);
        assert!(offset + 900 <= cols);
    }
}
