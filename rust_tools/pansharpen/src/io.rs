use crate::chunking::{natural_block_windows, TileGrid, TileJob, Window};
use crate::dtype::{DstDtype, OutputPixel, PixelType};
use crate::error::{PansharpenError, Result};
use crate::geo::{Bounds, GeoTransform};
use crate::pipeline::{TileData, TileResult};
use crate::profile::{create_dataset_options, OUTPUT_BANDS};
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, GdalDataType, RasterBand};
use gdal::{Dataset, DriverManager};
use log::{debug, info, warn};
use ndarray::{s, Array2, Array3};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Immutable metadata of an opened raster.
#[derive(Debug, Clone)]
pub struct RasterDescriptor {
    pub path: String,
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub pixel_type: PixelType,
    pub projection: String,
    pub geo_transform: GeoTransform,
    /// Natural storage block size (x, y).
    pub block_size: (usize, usize),
}

impl RasterDescriptor {
    /// Window spanning the whole raster.
    pub fn extent(&self) -> Window {
        Window::new(0, self.height as isize, 0, self.width as isize)
    }

    pub fn window_transform(&self, window: &Window) -> GeoTransform {
        self.geo_transform.window_transform(window)
    }

    pub fn window_bounds(&self, window: &Window) -> Bounds {
        self.geo_transform.window_bounds(window)
    }

    pub fn pixel_window_for_bounds(&self, bounds: &Bounds) -> Result<Window> {
        self.geo_transform.pixel_window_for_bounds(bounds)
    }

    pub fn natural_block_windows(&self) -> Vec<TileJob> {
        natural_block_windows(self.width, self.height, self.block_size)
    }

    /// Every tile of this raster: natural blocks when `custom_block` is 0,
    /// otherwise square custom tiles.
    pub fn tile_jobs(&self, custom_block: usize) -> Vec<TileJob> {
        if custom_block == 0 {
            debug!(
                "{}: natural {}x{} block windows",
                self.path, self.block_size.0, self.block_size.1
            );
            self.natural_block_windows()
        } else {
            TileGrid::new(self.width, self.height, custom_block)
                .iter()
                .collect()
        }
    }
}

/// Read access to one input raster, shared by all tile workers.
pub trait RasterSource: Sync {
    fn descriptor(&self) -> &RasterDescriptor;

    /// Read band `band` (1-based) as f32. With `boundless`, parts of the
    /// window outside the raster read as zero instead of failing.
    fn read_band(&self, band: usize, window: &Window, boundless: bool) -> Result<Array2<f32>>;
}

/// Destination of finished tiles. Only the scheduler's writer role holds one.
pub trait RasterSink {
    fn write_block(&mut self, result: &TileResult) -> Result<()>;
}

/// Resolve a possibly out-of-bounds read into an in-bounds read plus zero fill.
fn read_window_with<F>(
    descriptor: &RasterDescriptor,
    band: usize,
    window: &Window,
    boundless: bool,
    read_in_bounds: F,
) -> Result<Array2<f32>>
where
    F: FnOnce(&Window) -> Result<Array2<f32>>,
{
    if band == 0 || band > descriptor.band_count {
        return Err(PansharpenError::BandOutOfRange {
            band,
            count: descriptor.band_count,
        });
    }

    let extent = descriptor.extent();
    let inside = window.intersection(&extent);
    if inside == Some(*window) {
        return read_in_bounds(window);
    }
    if !boundless {
        return Err(PansharpenError::WindowOutOfBounds(
            window.row_start,
            window.row_stop,
            window.col_start,
            window.col_stop,
        ));
    }

    let mut data = Array2::<f32>::zeros(window.shape());
    if let Some(inside) = inside {
        let chunk = read_in_bounds(&inside)?;
        let row = (inside.row_start - window.row_start) as usize;
        let col = (inside.col_start - window.col_start) as usize;
        data.slice_mut(s![row..row + inside.height(), col..col + inside.width()])
            .assign(&chunk);
    }
    Ok(data)
}

fn pixel_type_of(band: &RasterBand, path: &str) -> Result<PixelType> {
    match band.band_type() {
        GdalDataType::UInt8 => Ok(PixelType::Uint8),
        GdalDataType::UInt16 => Ok(PixelType::Uint16),
        GdalDataType::Int16 => Ok(PixelType::Int16),
        GdalDataType::UInt32 => Ok(PixelType::Uint32),
        GdalDataType::Int32 => Ok(PixelType::Int32),
        GdalDataType::Float32 => Ok(PixelType::Float32),
        GdalDataType::Float64 => Ok(PixelType::Float64),
        other => Err(PansharpenError::UnsupportedPixelType {
            path: path.to_string(),
            pixel_type: format!("{:?}", other),
        }),
    }
}

/// Extract metadata from a dataset without reading any pixels
pub fn extract_metadata_from_dataset(dataset: &Dataset, path: &str) -> Result<RasterDescriptor> {
    let rasterband: RasterBand = dataset.rasterband(1)?;

    let (width, height) = dataset.raster_size();
    if width == 0 || height == 0 {
        return Err(PansharpenError::InvalidDimensions(width, height));
    }

    Ok(RasterDescriptor {
        path: path.to_string(),
        width,
        height,
        band_count: dataset.raster_count() as usize,
        pixel_type: pixel_type_of(&rasterband, path)?,
        projection: dataset.projection(),
        geo_transform: GeoTransform::new(dataset.geo_transform()?),
        block_size: rasterband.block_size(),
    })
}

/// GDAL-backed input raster. The dataset is opened once and reads are
/// serialized through its own lock, so workers share a single handle.
pub struct GdalRaster {
    descriptor: RasterDescriptor,
    dataset: Mutex<Dataset>,
}

impl GdalRaster {
    pub fn open(path: &str) -> Result<Self> {
        info!("Opening input raster: {}", path);
        let dataset = Dataset::open(path)?;
        let descriptor = extract_metadata_from_dataset(&dataset, path)?;

        debug!(
            "{}: {}x{} x{} {} block={}x{}",
            path,
            descriptor.width,
            descriptor.height,
            descriptor.band_count,
            descriptor.pixel_type,
            descriptor.block_size.0,
            descriptor.block_size.1
        );

        Ok(Self {
            descriptor,
            dataset: Mutex::new(dataset),
        })
    }
}

impl RasterSource for GdalRaster {
    fn descriptor(&self) -> &RasterDescriptor {
        &self.descriptor
    }

    fn read_band(&self, band: usize, window: &Window, boundless: bool) -> Result<Array2<f32>> {
        read_window_with(&self.descriptor, band, window, boundless, |inside| {
            let dataset = self
                .dataset
                .lock()
                .map_err(|_| PansharpenError::PoisonedHandle(self.descriptor.path.clone()))?;
            let rasterband = dataset.rasterband(band)?;
            let (height, width) = inside.shape();

            let buffer = rasterband.read_as::<f32>(
                (inside.col_start, inside.row_start),
                (width, height),
                (width, height),
                None,
            )?;

            let data_vec: Vec<f32> = buffer.into_iter().collect();
            Ok(Array2::from_shape_vec((height, width), data_vec)?)
        })
    }
}

/// Input raster held in memory, one f32 array per band.
pub struct MemoryRaster {
    descriptor: RasterDescriptor,
    bands: Vec<Array2<f32>>,
}

impl MemoryRaster {
    pub fn new(
        name: &str,
        bands: Vec<Array2<f32>>,
        pixel_type: PixelType,
        projection: &str,
        geo_transform: GeoTransform,
    ) -> Result<Self> {
        let (height, width) = bands.first().map(|b| b.dim()).unwrap_or((0, 0));
        if width == 0 || height == 0 || bands.iter().any(|b| b.dim() != (height, width)) {
            return Err(PansharpenError::InvalidDimensions(width, height));
        }

        let descriptor = RasterDescriptor {
            path: name.to_string(),
            width,
            height,
            band_count: bands.len(),
            pixel_type,
            projection: projection.to_string(),
            geo_transform,
            block_size: (width.min(256), height.min(256)),
        };
        Ok(Self { descriptor, bands })
    }

    /// Override the natural block size reported to the planner.
    pub fn with_block_size(mut self, block_size: (usize, usize)) -> Self {
        self.descriptor.block_size = block_size;
        self
    }
}

impl RasterSource for MemoryRaster {
    fn descriptor(&self) -> &RasterDescriptor {
        &self.descriptor
    }

    fn read_band(&self, band: usize, window: &Window, boundless: bool) -> Result<Array2<f32>> {
        read_window_with(&self.descriptor, band, window, boundless, |inside| {
            let data = &self.bands[band - 1];
            Ok(data
                .slice(s![
                    inside.row_start..inside.row_stop,
                    inside.col_start..inside.col_stop
                ])
                .to_owned())
        })
    }
}

/// GTiff output written tile by tile.
pub struct GdalWriter {
    path: PathBuf,
    dataset: Dataset,
}

impl GdalWriter {
    /// Create the RGBA output with the pan raster's size, transform and CRS.
    pub fn create(path: &str, pan: &RasterDescriptor, dtype: DstDtype) -> Result<Self> {
        info!("Creating output dataset: {} ({})", path, dtype);

        let driver = DriverManager::get_driver_by_name("GTiff")?;

        let mut gdal_options = CslStringList::new();
        for opt in create_dataset_options() {
            gdal_options.add_string(&opt)?;
        }

        let (width, height) = (pan.width, pan.height);
        let mut dataset = match dtype {
            DstDtype::Uint8 => driver.create_with_band_type_with_options::<u8, _>(
                path,
                width,
                height,
                OUTPUT_BANDS,
                &gdal_options,
            )?,
            DstDtype::Uint16 => driver.create_with_band_type_with_options::<u16, _>(
                path,
                width,
                height,
                OUTPUT_BANDS,
                &gdal_options,
            )?,
            DstDtype::Int16 => driver.create_with_band_type_with_options::<i16, _>(
                path,
                width,
                height,
                OUTPUT_BANDS,
                &gdal_options,
            )?,
        };

        dataset.set_geo_transform(&pan.geo_transform.0)?;
        dataset.set_projection(&pan.projection)?;

        Ok(Self {
            path: PathBuf::from(path),
            dataset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_bands<T: OutputPixel>(&mut self, data: &Array3<T>, window: &Window) -> Result<()> {
        for (i, band_data) in data.outer_iter().enumerate() {
            let band_index = i + 1;
            let mut raster_band = self.dataset.rasterband(band_index)?;

            let (height, width) = band_data.dim();
            let mut buffer = Buffer::new((width, height), band_data.iter().copied().collect());

            raster_band.write(
                (window.col_start, window.row_start),
                (width, height),
                &mut buffer,
            )?;
        }
        Ok(())
    }

    /// Flush and close the output. A failed flush is returned, not dropped.
    pub fn finish(self) -> Result<()> {
        let GdalWriter { path, mut dataset } = self;
        dataset.flush_cache()?;
        drop(dataset);
        info!("Closed output dataset: {}", path.display());
        Ok(())
    }

    /// Close and remove a partially written output.
    pub fn discard(self) {
        let GdalWriter { path, dataset } = self;
        drop(dataset);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        } else {
            info!("Removed partial output: {}", path.display());
        }
    }
}

impl RasterSink for GdalWriter {
    fn write_block(&mut self, result: &TileResult) -> Result<()> {
        match &result.data {
            TileData::Uint8(data) => self.write_bands(data, &result.window)?,
            TileData::Uint16(data) => self.write_bands(data, &result.window)?,
            TileData::Int16(data) => self.write_bands(data, &result.window)?,
        }

        debug!(
            "Wrote tile {:?} at ({},{}) size {}x{}",
            result.block,
            result.window.col_start,
            result.window.row_start,
            result.window.width(),
            result.window.height()
        );
        Ok(())
    }
}

/// Sink that keeps every tile in memory.
#[derive(Default)]
pub struct MemorySink {
    pub results: Vec<TileResult>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RasterSink for MemorySink {
    fn write_block(&mut self, result: &TileResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }
}
