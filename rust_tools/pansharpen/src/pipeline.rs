use crate::align::align_tile;
use crate::brovey::brovey;
use crate::chunking::{TileJob, Window};
use crate::config::GlobalArgs;
use crate::dtype::{DstDtype, OutputPixel, PixelType};
use crate::error::{PansharpenError, Result};
use crate::geo::GeoTransform;
use crate::io::RasterSource;
use crate::resample::Resampler;
use log::{debug, info};
use ndarray::{s, Array2, Array3, ArrayView3, Axis, Zip};

/// Finished RGBA pixels in the destination type, shape (4, rows, cols).
#[derive(Debug, Clone, PartialEq)]
pub enum TileData {
    Uint8(Array3<u8>),
    Uint16(Array3<u16>),
    Int16(Array3<i16>),
}

impl TileData {
    /// (bands, rows, cols)
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            TileData::Uint8(data) => data.dim(),
            TileData::Uint16(data) => data.dim(),
            TileData::Int16(data) => data.dim(),
        }
    }

    pub fn dtype(&self) -> DstDtype {
        match self {
            TileData::Uint8(_) => DstDtype::Uint8,
            TileData::Uint16(_) => DstDtype::Uint16,
            TileData::Int16(_) => DstDtype::Int16,
        }
    }
}

/// One finished tile and where it goes.
#[derive(Debug, Clone, PartialEq)]
pub struct TileResult {
    pub window: Window,
    pub block: (usize, usize),
    pub data: TileData,
}

/// A pixel grid: transform plus CRS.
#[derive(Debug, Clone, Copy)]
pub struct GridRef<'a> {
    pub transform: GeoTransform,
    pub crs: &'a str,
}

/// Zero all three bands wherever any band is exactly zero.
pub fn mask_nodata(rgb: &mut Array3<f32>) -> Result<()> {
    let (bands, rows, cols) = rgb.dim();
    if bands != 3 {
        return Err(PansharpenError::ColorBandCount(bands));
    }
    for row in 0..rows {
        for col in 0..cols {
            let invalid = (0..3).any(|band| rgb[[band, row, col]] == 0.0);
            if invalid {
                for band in 0..3 {
                    rgb[[band, row, col]] = 0.0;
                }
            }
        }
    }
    Ok(())
}

/// Resample the color stack onto the pan grid. The result must have the
/// pan shape exactly.
pub fn upsample<Z: Resampler + ?Sized>(
    resampler: &Z,
    rgb: &Array3<f32>,
    pan_shape: (usize, usize),
    color: &GridRef,
    pan: &GridRef,
) -> Result<Array3<f32>> {
    let up = resampler.reproject(
        rgb,
        pan_shape,
        &color.transform,
        color.crs,
        &pan.transform,
        pan.crs,
    )?;

    let (bands, rows, cols) = up.dim();
    if (rows, cols) != pan_shape || bands != rgb.len_of(Axis(0)) {
        return Err(PansharpenError::ShapeMismatch {
            expected: pan_shape,
            actual: (rows, cols),
        });
    }
    Ok(up)
}

/// Mask, upsample and Brovey-sharpen a color stack against a pan array.
///
/// `vis` is the (3, rows, cols) color stack on its own grid; the result has
/// the pan array's shape and is cast to `pan_type` values.
pub fn pansharpen_arrays<Z: Resampler + ?Sized>(
    resampler: &Z,
    mut vis: Array3<f32>,
    vis_grid: &GridRef,
    pan: &Array2<f32>,
    pan_grid: &GridRef,
    pan_type: PixelType,
    weight: f32,
) -> Result<Array3<f32>> {
    mask_nodata(&mut vis)?;
    let rgb = upsample(resampler, &vis, pan.dim(), vis_grid, pan_grid)?;
    let (sharp, _ratio) = brovey(&rgb, pan, weight, pan_type)?;
    Ok(sharp)
}

/// Alpha band: `MAX` unless all three bands equal `ndv` exactly, then 0.
pub fn alpha_mask<T: OutputPixel>(rgb: ArrayView3<T>, ndv: f64) -> Array2<T> {
    let (_, rows, cols) = rgb.dim();
    let mut alpha = Array2::<T>::default((rows, cols));
    Zip::from(&mut alpha)
        .and(rgb.index_axis(Axis(0), 0))
        .and(rgb.index_axis(Axis(0), 1))
        .and(rgb.index_axis(Axis(0), 2))
        .for_each(|a, &r, &g, &b| {
            let is_nodata = r.to_f64() == ndv && g.to_f64() == ndv && b.to_f64() == ndv;
            *a = if is_nodata { T::default() } else { T::MAX };
        });
    alpha
}

/// Scale the sharpened stack into the destination type and append alpha.
pub fn rescale<T: OutputPixel>(sharp: &Array3<f32>, divisor: f64, ndv: f64) -> Array3<T> {
    let (_, rows, cols) = sharp.dim();
    let mut out = Array3::<T>::default((4, rows, cols));

    Zip::from(out.slice_mut(s![0..3, .., ..]))
        .and(sharp)
        .for_each(|o, &v| *o = T::from_f64(v as f64 / divisor));

    let alpha = alpha_mask(out.slice(s![0..3, .., ..]), ndv);
    out.index_axis_mut(Axis(0), 3).assign(&alpha);
    out
}

fn to_tile_data(sharp: &Array3<f32>, args: &GlobalArgs) -> TileData {
    let divisor = args.rescale_divisor;
    match args.dst_dtype {
        DstDtype::Uint8 => TileData::Uint8(rescale(sharp, divisor, args.nodata)),
        DstDtype::Uint16 => TileData::Uint16(rescale(sharp, divisor, args.nodata)),
        DstDtype::Int16 => TileData::Int16(rescale(sharp, divisor, args.nodata)),
    }
}

/// Per-tile read → mask → upsample → sharpen → rescale → alpha.
/// Holds no state between tiles.
pub struct FusionPipeline<'a, R: RasterSource, Z: Resampler> {
    pan: &'a R,
    color: [&'a R; 3],
    resampler: &'a Z,
    args: &'a GlobalArgs,
}

impl<'a, R: RasterSource, Z: Resampler> FusionPipeline<'a, R, Z> {
    pub fn new(pan: &'a R, color: [&'a R; 3], resampler: &'a Z, args: &'a GlobalArgs) -> Self {
        Self {
            pan,
            color,
            resampler,
            args,
        }
    }

    pub fn args(&self) -> &GlobalArgs {
        self.args
    }

    pub fn process(&self, job: &TileJob) -> Result<TileResult> {
        let args = self.args;
        let alignment = align_tile(&args.pan, &args.color, &job.window, args.half_window)?;

        let pan = self.pan.read_band(1, &job.window, false)?;

        let bands = self
            .color
            .iter()
            .map(|src| src.read_band(1, &alignment.color_window, true))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = bands.iter().map(|band| band.view()).collect();
        let rgb = ndarray::stack(Axis(0), &views)?;

        if args.verbose {
            info!(
                "Tile {:?}: pan shape {:?}, rgb shape {:?}",
                job.block,
                pan.dim(),
                rgb.dim()
            );
        }

        let sharp = pansharpen_arrays(
            self.resampler,
            rgb,
            &GridRef {
                transform: alignment.color_transform,
                crs: &args.color.projection,
            },
            &pan,
            &GridRef {
                transform: alignment.pan_transform,
                crs: &args.pan.projection,
            },
            args.pan.pixel_type,
            args.weight,
        )?;

        let data = to_tile_data(&sharp, args);
        debug!("Tile {:?} done: {:?}", job.block, data.dim());

        Ok(TileResult {
            window: job.window,
            block: job.block,
            data,
        })
    }
}
