use crate::chunking::Window;
use crate::error::{PansharpenError, Result};
use gdal::GeoTransformEx;
use log::debug;

/// Values this close to an integer are snapped before floor/ceil.
const PIXEL_SNAP_EPSILON: f64 = 1e-6;

/// Affine geotransform in GDAL coefficient order:
/// `x = gt[0] + col * gt[1] + row * gt[2]`, `y = gt[3] + col * gt[4] + row * gt[5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        Self(coefficients)
    }

    /// Pixel (col, row) to world (x, y).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        GeoTransformEx::apply(&self.0, col, row)
    }

    /// World to pixel transform, through `GDALInvGeoTransform`.
    pub fn inverse(&self) -> Result<GeoTransform> {
        self.0
            .invert()
            .map(GeoTransform)
            .map_err(|_| PansharpenError::DegenerateTransform(self.0))
    }

    /// Transform of a window: this transform translated to the window origin.
    pub fn window_transform(&self, window: &Window) -> GeoTransform {
        let (x, y) = self.apply(window.col_start as f64, window.row_start as f64);
        let gt = &self.0;
        GeoTransform([x, gt[1], gt[2], y, gt[4], gt[5]])
    }

    /// World bounds of a window.
    pub fn window_bounds(&self, window: &Window) -> Bounds {
        let corners = [
            self.apply(window.col_start as f64, window.row_start as f64),
            self.apply(window.col_stop as f64, window.row_start as f64),
            self.apply(window.col_start as f64, window.row_stop as f64),
            self.apply(window.col_stop as f64, window.row_stop as f64),
        ];
        Bounds::enclosing(&corners)
    }

    /// Smallest integer pixel window covering the world bounds.
    pub fn pixel_window_for_bounds(&self, bounds: &Bounds) -> Result<Window> {
        let inverse = self.inverse()?;
        let corners = [
            inverse.apply(bounds.left, bounds.top),
            inverse.apply(bounds.right, bounds.top),
            inverse.apply(bounds.left, bounds.bottom),
            inverse.apply(bounds.right, bounds.bottom),
        ];

        let mut col_min = f64::INFINITY;
        let mut col_max = f64::NEG_INFINITY;
        let mut row_min = f64::INFINITY;
        let mut row_max = f64::NEG_INFINITY;
        for &(col, row) in &corners {
            col_min = col_min.min(col);
            col_max = col_max.max(col);
            row_min = row_min.min(row);
            row_max = row_max.max(row);
        }

        let window = Window::new(
            snap(row_min).floor() as isize,
            snap(row_max).ceil() as isize,
            snap(col_min).floor() as isize,
            snap(col_max).ceil() as isize,
        );
        debug!("Bounds {:?} -> pixel window {:?}", bounds, window);
        Ok(window)
    }
}

fn snap(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < PIXEL_SNAP_EPSILON {
        rounded
    } else {
        value
    }
}

/// World-coordinate bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    fn enclosing(points: &[(f64, f64)]) -> Self {
        let mut bounds = Bounds {
            left: f64::INFINITY,
            bottom: f64::INFINITY,
            right: f64::NEG_INFINITY,
            top: f64::NEG_INFINITY,
        };
        for &(x, y) in points {
            bounds.left = bounds.left.min(x);
            bounds.right = bounds.right.max(x);
            bounds.bottom = bounds.bottom.min(y);
            bounds.top = bounds.top.max(y);
        }
        bounds
    }
}

/// Fail on the first pair of neighbouring inputs whose CRS differs.
pub fn check_crs<S: AsRef<str>>(crs_list: &[S]) -> Result<()> {
    for pair in crs_list.windows(2) {
        let (a, b) = (pair[0].as_ref(), pair[1].as_ref());
        if a != b {
            return Err(PansharpenError::CrsMismatch(a.to_string(), b.to_string()));
        }
    }
    Ok(())
}
