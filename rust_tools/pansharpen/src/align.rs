use crate::chunking::Window;
use crate::error::Result;
use crate::geo::GeoTransform;
use crate::io::RasterDescriptor;
use log::debug;

/// Color-grid pixels added on every edge of a derived color window.
pub const COLOR_WINDOW_PADDING: isize = 2;

/// Pan window, the color window covering it, and the transform of each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileAlignment {
    pub pan_window: Window,
    pub color_window: Window,
    pub pan_transform: GeoTransform,
    pub color_transform: GeoTransform,
}

/// Color window for a pan window.
///
/// With `half_window` the color raster is assumed pixel-aligned at half the
/// pan resolution and the window is halved. Otherwise the pan window is taken
/// through world coordinates onto the color grid and padded.
pub fn color_window_for(
    pan: &RasterDescriptor,
    color: &RasterDescriptor,
    pan_window: &Window,
    half_window: bool,
) -> Result<Window> {
    if half_window {
        return Ok(pan_window.halve());
    }

    let bounds = pan.window_bounds(pan_window);
    let base = color.pixel_window_for_bounds(&bounds)?;
    Ok(base.pad(COLOR_WINDOW_PADDING))
}

pub fn align_tile(
    pan: &RasterDescriptor,
    color: &RasterDescriptor,
    pan_window: &Window,
    half_window: bool,
) -> Result<TileAlignment> {
    let color_window = color_window_for(pan, color, pan_window, half_window)?;

    let alignment = TileAlignment {
        pan_window: *pan_window,
        color_window,
        pan_transform: pan.window_transform(pan_window),
        color_transform: color.window_transform(&color_window),
    };

    debug!(
        "Pan window {:?} -> color window {:?}",
        alignment.pan_window, alignment.color_window
    );
    Ok(alignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::PixelType;

    fn grid(size: usize, geo_transform: [f64; 6]) -> RasterDescriptor {
        RasterDescriptor {
            path: format!("{}.tif", size),
            width: size,
            height: size,
            band_count: 1,
            pixel_type: PixelType::Uint16,
            projection: "EPSG:32654".to_string(),
            geo_transform: GeoTransform(geo_transform),
            block_size: (256, 256),
        }
    }

    fn pan() -> RasterDescriptor {
        grid(200, [0.0, 1.0, 0.0, 0.0, 0.0, -1.0])
    }

    fn color() -> RasterDescriptor {
        grid(100, [0.0, 2.0, 0.0, 0.0, 0.0, -2.0])
    }

    #[test]
    fn test_general_mode_pads_two_pixels() {
        let window = Window::new(64, 128, 0, 64);

        let aligned = align_tile(&pan(), &color(), &window, false).unwrap();
        assert_eq!(aligned.color_window, Window::new(30, 66, -2, 34));
        assert_eq!(aligned.pan_transform.0, [0.0, 1.0, 0.0, -64.0, 0.0, -1.0]);
        assert_eq!(aligned.color_transform.0, [-4.0, 2.0, 0.0, -60.0, 0.0, -2.0]);
    }

    #[test]
    fn test_half_window_mode() {
        let window = Window::new(64, 128, 0, 64);

        let aligned = align_tile(&pan(), &color(), &window, true).unwrap();
        assert_eq!(aligned.color_window, Window::new(32, 64, 0, 32));
        assert_eq!(aligned.color_transform.0, [0.0, 2.0, 0.0, -64.0, 0.0, -2.0]);
    }

    #[test]
    fn test_half_window_odd_tiles_leave_no_seam() {
        use crate::chunking::TileGrid;
        use crate::resample::{Bilinear, Resampler};
        use ndarray::Array3;

        let pan = grid(600, [0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
        let color = grid(300, [0.0, 2.0, 0.0, 0.0, 0.0, -2.0]);

        for job in TileGrid::new(600, 600, 151).iter() {
            let aligned = align_tile(&pan, &color, &job.window, true).unwrap();
            let inside = aligned.color_window.intersection(&color.extent()).unwrap();
            assert_eq!(inside, aligned.color_window);

            let rgb = Array3::<f32>::from_elem((3, inside.height(), inside.width()), 500.0);
            let up = Bilinear
                .reproject(
                    &rgb,
                    job.window.shape(),
                    &aligned.color_transform,
                    &color.projection,
                    &aligned.pan_transform,
                    &pan.projection,
                )
                .unwrap();
            assert!(
                up.iter().all(|&v| (v - 500.0).abs() < 1e-3),
                "tile {:?} upsampled with gaps",
                job.block
            );
        }
    }

    #[test]
    fn test_offset_grids_landsat() {
        let pan = grid(
            2048,
            [300892.5, 75.00483870967741, 0.0, 4107007.5, 0.0, -75.00475285171103],
        );
        let color = grid(
            1024,
            [300885.0, 150.0193548387097, 0.0, 4107015.0, 0.0, -150.0190114068441],
        );
        let window = Window::new(1536, 1792, 1280, 1536);

        let base = color
            .pixel_window_for_bounds(&pan.window_bounds(&window))
            .unwrap();
        let aligned = align_tile(&pan, &color, &window, false).unwrap();
        assert_eq!(aligned.color_window, base.pad(COLOR_WINDOW_PADDING));
        assert!(base.row_start <= 768 && base.row_stop >= 896);
        assert!(base.col_start <= 640 && base.col_stop >= 768);
    }

    #[test]
    fn test_edge_window_extends_past_color_raster() {
        let window = Window::new(150, 200, 150, 200);

        let aligned = align_tile(&pan(), &color(), &window, false).unwrap();
        assert_eq!(aligned.color_window, Window::new(73, 102, 73, 102));
    }

    #[test]
    fn test_degenerate_color_transform_fails() {
        let flat = grid(100, [0.0; 6]);
        let window = Window::new(0, 10, 0, 10);
        assert!(align_tile(&pan(), &flat, &window, false).is_err());
        assert!(align_tile(&pan(), &flat, &window, true).is_ok());
    }
}
