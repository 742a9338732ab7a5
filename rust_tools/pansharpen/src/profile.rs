use crate::error::{PansharpenError, Result};

/// Smallest custom tile edge accepted (exclusive).
pub const MIN_CUSTOM_WINDOW: usize = 150;

/// Internal block edge of the output GeoTIFF.
pub const OUTPUT_BLOCK_SIZE: usize = 512;

/// Output band count: red, green, blue, alpha.
pub const OUTPUT_BANDS: usize = 4;

/// Validate a custom tile size; `0` means "use natural blocks" and is always accepted.
pub fn validate_custom_window(size: usize, min: usize) -> Result<()> {
    if size != 0 && size <= min {
        return Err(PansharpenError::InvalidCustomWindow { size, min });
    }
    Ok(())
}

/// GTiff creation options for the pansharpened output.
pub fn create_dataset_options() -> Vec<String> {
    vec![
        "COMPRESS=DEFLATE".to_string(),
        "TILED=YES".to_string(),
        format!("BLOCKXSIZE={}", OUTPUT_BLOCK_SIZE),
        format!("BLOCKYSIZE={}", OUTPUT_BLOCK_SIZE),
        "PHOTOMETRIC=RGB".to_string(),
        "ALPHA=YES".to_string(),
    ]
}
