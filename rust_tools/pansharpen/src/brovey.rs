use crate::dtype::PixelType;
use crate::error::{PansharpenError, Result};
use ndarray::{Array2, Array3, Axis, Zip};

fn check_shapes(rgb: &Array3<f32>, pan: &Array2<f32>) -> Result<()> {
    let (_, rows, cols) = rgb.dim();
    if (rows, cols) != pan.dim() || rgb.len_of(Axis(0)) != 3 {
        return Err(PansharpenError::ShapeMismatch {
            expected: pan.dim(),
            actual: (rows, cols),
        });
    }
    Ok(())
}

/// `pan / ((r + g + b * weight) / (2 + weight))`, elementwise.
///
/// Zero denominators yield infinities or NaN; they are not errors.
pub fn calculate_ratio(rgb: &Array3<f32>, pan: &Array2<f32>, weight: f32) -> Result<Array2<f32>> {
    check_shapes(rgb, pan)?;

    let mut ratio = Array2::<f32>::zeros(pan.dim());
    Zip::from(&mut ratio)
        .and(pan)
        .and(rgb.index_axis(Axis(0), 0))
        .and(rgb.index_axis(Axis(0), 1))
        .and(rgb.index_axis(Axis(0), 2))
        .for_each(|ratio, &p, &r, &g, &b| {
            *ratio = p / ((r + g + b * weight) / (2.0 + weight));
        });
    Ok(ratio)
}

/// Brovey sharpening: each color band scaled by the pan/intensity ratio,
/// clipped to `[0, max(pan_type)]` and cast to the pan storage type.
///
/// Returns the sharpened stack together with the ratio.
pub fn brovey(
    rgb: &Array3<f32>,
    pan: &Array2<f32>,
    weight: f32,
    pan_type: PixelType,
) -> Result<(Array3<f32>, Array2<f32>)> {
    let ratio = calculate_ratio(rgb, pan, weight)?;
    let max = pan_type.max_value().map_or(f32::MAX, |m| m as f32);

    let mut sharp = rgb.clone();
    for mut band in sharp.axis_iter_mut(Axis(0)) {
        Zip::from(&mut band).and(&ratio).for_each(|value, &r| {
            *value = pan_type.cast((r * *value).clamp(0.0, max));
        });
    }
    Ok((sharp, ratio))
}
