use crate::error::{PansharpenError, Result};
use crate::geo::GeoTransform;
use ndarray::{Array2, Array3, ArrayView2, Axis};

/// Warps a band stack from one pixel grid onto another.
pub trait Resampler: Sync {
    /// Resample `src` (bands, rows, cols) georeferenced by `src_transform` in
    /// `src_crs` onto a `dst_shape` (rows, cols) grid at `dst_transform` in
    /// `dst_crs`.
    fn reproject(
        &self,
        src: &Array3<f32>,
        dst_shape: (usize, usize),
        src_transform: &GeoTransform,
        src_crs: &str,
        dst_transform: &GeoTransform,
        dst_crs: &str,
    ) -> Result<Array3<f32>>;
}

/// Bilinear resampling between grids in the same CRS.
///
/// Destination pixel centers are mapped into source pixel space; samples
/// within half a pixel of the source edge clamp to the edge pixel, samples
/// beyond the source footprint stay zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bilinear;

impl Bilinear {
    fn sample(src: &ArrayView2<f32>, x: f64, y: f64) -> Option<f32> {
        let (height, width) = src.dim();
        if x < -0.5 || y < -0.5 || x > width as f64 - 0.5 || y > height as f64 - 0.5 {
            return None;
        }

        let x0 = (x.floor().max(0.0) as usize).min(width - 1);
        let y0 = (y.floor().max(0.0) as usize).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);

        let dx = (x - x0 as f64).clamp(0.0, 1.0) as f32;
        let dy = (y - y0 as f64).clamp(0.0, 1.0) as f32;

        let v00 = src[[y0, x0]];
        let v01 = src[[y0, x1]];
        let v10 = src[[y1, x0]];
        let v11 = src[[y1, x1]];

        let top = v00 * (1.0 - dx) + v01 * dx;
        let bottom = v10 * (1.0 - dx) + v11 * dx;
        Some(top * (1.0 - dy) + bottom * dy)
    }
}

impl Resampler for Bilinear {
    fn reproject(
        &self,
        src: &Array3<f32>,
        dst_shape: (usize, usize),
        src_transform: &GeoTransform,
        src_crs: &str,
        dst_transform: &GeoTransform,
        dst_crs: &str,
    ) -> Result<Array3<f32>> {
        if src_crs != dst_crs {
            return Err(PansharpenError::UnsupportedReprojection(
                src_crs.to_string(),
                dst_crs.to_string(),
            ));
        }

        let (rows, cols) = dst_shape;
        let mut dst = Array3::<f32>::zeros((src.len_of(Axis(0)), rows, cols));
        if src.len_of(Axis(1)) == 0 || src.len_of(Axis(2)) == 0 {
            return Ok(dst);
        }

        let to_src = src_transform.inverse()?;

        // Source coordinates of every destination pixel center, shared by all bands.
        let coords: Array2<(f64, f64)> = Array2::from_shape_fn((rows, cols), |(row, col)| {
            let (x, y) = dst_transform.apply(col as f64 + 0.5, row as f64 + 0.5);
            let (src_col, src_row) = to_src.apply(x, y);
            (src_col - 0.5, src_row - 0.5)
        });

        for (mut dst_band, src_band) in dst.axis_iter_mut(Axis(0)).zip(src.axis_iter(Axis(0))) {
            for (out, &(x, y)) in dst_band.iter_mut().zip(coords.iter()) {
                if let Some(value) = Bilinear::sample(&src_band, x, y) {
                    *out = value;
                }
            }
        }

        Ok(dst)
    }
}
