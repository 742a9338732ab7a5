use gdal::raster::{Buffer, GdalDataType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Array3};
use pansharpen::geo::GeoTransform;
use pansharpen::{
    calculate_pansharpen, execute_into_file, plan_run, Bilinear, DstDtype, GdalWriter,
    MemoryRaster, PansharpenConfig, PansharpenError, PixelType, RasterSink, RasterSource,
    TileData, TileJob, TileResult, Window,
};
use std::path::Path;
use tempfile::TempDir;

fn write_band(path: &Path, size: usize, pixel_size: f64, epsg: u32, value: impl Fn(usize, usize) -> u16) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<u16, _>(path, size, size, 1)
        .unwrap();
    dataset
        .set_geo_transform(&[500000.0, pixel_size, 0.0, 4000000.0, 0.0, -pixel_size])
        .unwrap();
    let wkt = SpatialRef::from_epsg(epsg).unwrap().to_wkt().unwrap();
    dataset.set_projection(&wkt).unwrap();

    let data: Vec<u16> = (0..size * size).map(|i| value(i / size, i % size)).collect();
    let mut buffer = Buffer::new((size, size), data);
    let mut band = dataset.rasterband(1).unwrap();
    band.write((0, 0), (size, size), &mut buffer).unwrap();
}

fn scene(dir: &TempDir, blue_epsg: u32) -> PansharpenConfig {
    let pan = dir.path().join("b8.tif");
    let red = dir.path().join("b4.tif");
    let green = dir.path().join("b3.tif");
    let blue = dir.path().join("b2.tif");

    write_band(&pan, 400, 15.0, 32613, |r, c| (9000 + (r * 3 + c) % 2000) as u16);
    write_band(&red, 200, 30.0, 32613, |r, c| (5000 + (r + c) % 1000) as u16);
    write_band(&green, 200, 30.0, 32613, |r, c| (5500 + (r * 2 + c) % 1000) as u16);
    write_band(&blue, 200, 30.0, blue_epsg, |r, c| (6000 + (r + c * 2) % 1000) as u16);

    let mut config = PansharpenConfig::new(
        pan.to_str().unwrap(),
        [red.to_str().unwrap(), green.to_str().unwrap(), blue.to_str().unwrap()],
        dir.path().join("pansharpened.tif").to_str().unwrap(),
    );
    config.dst_dtype = DstDtype::Uint8;
    config.custom_window = 200;
    config.jobs = 2;
    config
}

#[test]
fn test_geotiff_scene_produces_rgba_output() {
    let dir = TempDir::new().unwrap();
    let config = scene(&dir, 32613);

    let summary = calculate_pansharpen(&config).unwrap();
    assert_eq!(summary.tiles_written, 4);

    let output = Dataset::open(&config.dst_path).unwrap();
    assert_eq!(output.raster_size(), (400, 400));
    assert_eq!(output.raster_count(), 4);
    assert_eq!(output.geo_transform().unwrap(), [500000.0, 15.0, 0.0, 4000000.0, 0.0, -15.0]);

    let alpha_band = output.rasterband(4).unwrap();
    assert_eq!(alpha_band.band_type(), GdalDataType::UInt8);
    let alpha = alpha_band
        .read_as::<u8>((0, 0), (400, 400), (400, 400), None)
        .unwrap();
    assert!(alpha.data().iter().all(|&a| a == u8::MAX));

    let red = output
        .rasterband(1)
        .unwrap()
        .read_as::<u8>((0, 0), (400, 400), (400, 400), None)
        .unwrap();
    assert!(red.data().iter().all(|&v| v > 0));
}

#[test]
fn test_crs_mismatch_creates_no_output() {
    let dir = TempDir::new().unwrap();
    let config = scene(&dir, 3857);

    let err = calculate_pansharpen(&config).unwrap_err();
    assert!(matches!(err, PansharpenError::CrsMismatch(..)));
    assert_eq!(err.exit_code(), 3);
    assert!(!Path::new(&config.dst_path).exists());
}

#[test]
fn test_missing_input_is_not_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let mut config = scene(&dir, 32613);
    config.pan_path = dir.path().join("missing.tif").to_string_lossy().into_owned();

    let err = calculate_pansharpen(&config).unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(!Path::new(&config.dst_path).exists());
}

fn memory_band(name: &str, size: usize, pixel_size: f64, base: f32) -> MemoryRaster {
    MemoryRaster::new(
        name,
        vec![Array2::from_shape_fn((size, size), |(r, c)| base + ((r + c) % 300) as f32)],
        PixelType::Uint16,
        "EPSG:32613",
        GeoTransform([500000.0, pixel_size, 0.0, 4000000.0, 0.0, -pixel_size]),
    )
    .unwrap()
}

#[test]
fn test_failed_tile_removes_partial_output() {
    let dir = TempDir::new().unwrap();
    let dst = dir.path().join("partial.tif");

    let pan = memory_band("B8", 400, 15.0, 9000.0);
    let red = memory_band("B4", 200, 30.0, 5000.0);
    let green = memory_band("B3", 200, 30.0, 5500.0);
    let blue = memory_band("B2", 200, 30.0, 6000.0);

    let mut config = PansharpenConfig::new("B8", ["B4", "B3", "B2"], dst.to_str().unwrap());
    config.custom_window = 200;
    let mut plan = plan_run(
        &config,
        pan.descriptor(),
        [red.descriptor(), green.descriptor(), blue.descriptor()],
    )
    .unwrap();
    // Past the bottom of the pan raster: its read fails once the output exists.
    plan.jobs.push(TileJob {
        window: Window::new(400, 600, 0, 200),
        block: (2, 0),
    });

    let writer = GdalWriter::create(dst.to_str().unwrap(), pan.descriptor(), DstDtype::Uint16).unwrap();
    assert!(dst.exists());

    let err = execute_into_file(&plan, &pan, [&red, &green, &blue], &Bilinear, 1, writer).unwrap_err();
    assert!(matches!(err, PansharpenError::WindowOutOfBounds(..)));
    assert_eq!(err.exit_code(), 1);
    assert!(!dst.exists());
}

#[test]
fn test_finished_writer_is_readable() {
    let dir = TempDir::new().unwrap();
    let dst = dir.path().join("written.tif");
    let pan = memory_band("B8", 64, 15.0, 9000.0);

    let mut writer = GdalWriter::create(dst.to_str().unwrap(), pan.descriptor(), DstDtype::Uint8).unwrap();
    let data = Array3::from_shape_fn((4, 32, 32), |(band, _, _)| if band == 3 { 255u8 } else { 40 + band as u8 });
    writer
        .write_block(&TileResult {
            window: Window::new(32, 64, 0, 32),
            block: (1, 0),
            data: TileData::Uint8(data),
        })
        .unwrap();
    writer.finish().unwrap();

    let output = Dataset::open(&dst).unwrap();
    let green = output
        .rasterband(2)
        .unwrap()
        .read_as::<u8>((0, 32), (32, 32), (32, 32), None)
        .unwrap();
    assert!(green.data().iter().all(|&v| v == 41));
    let untouched = output
        .rasterband(4)
        .unwrap()
        .read_as::<u8>((32, 0), (32, 32), (32, 32), None)
        .unwrap();
    assert!(untouched.data().iter().all(|&v| v == 0));
}
