use crate::error::{PansharpenError, Result};
use gdal::raster::GdalType;
use std::fmt;
use std::str::FromStr;

/// Storage type of an input raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Uint8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Largest representable value, `None` for floating point types.
    pub fn max_value(self) -> Option<f64> {
        match self {
            PixelType::Uint8 => Some(u8::MAX as f64),
            PixelType::Uint16 => Some(u16::MAX as f64),
            PixelType::Int16 => Some(i16::MAX as f64),
            PixelType::Uint32 => Some(u32::MAX as f64),
            PixelType::Int32 => Some(i32::MAX as f64),
            PixelType::Float32 | PixelType::Float64 => None,
        }
    }

    /// Round-trip a value through this storage type: truncation toward zero,
    /// saturation at the type bounds, NaN mapped to zero.
    pub fn cast(self, value: f32) -> f32 {
        match self {
            PixelType::Uint8 => (value as u8) as f32,
            PixelType::Uint16 => (value as u16) as f32,
            PixelType::Int16 => (value as i16) as f32,
            PixelType::Uint32 => (value as u32) as f32,
            PixelType::Int32 => (value as i32) as f32,
            PixelType::Float32 | PixelType::Float64 => value,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Int16 => "int16",
            PixelType::Uint32 => "uint32",
            PixelType::Int32 => "int32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pixel type of the pansharpened output.
///
/// Resolved once from the command line; the rescale divisor derived from it
/// maps the 16-bit working range onto the destination range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DstDtype {
    Uint8,
    #[default]
    Uint16,
    Int16,
}

impl DstDtype {
    pub fn max_value(self) -> f64 {
        match self {
            DstDtype::Uint8 => u8::MAX as f64,
            DstDtype::Uint16 => u16::MAX as f64,
            DstDtype::Int16 => i16::MAX as f64,
        }
    }

    /// `65535 / max(dst)`: 1 for uint16, 257 for uint8.
    pub fn rescale_divisor(self) -> f64 {
        u16::MAX as f64 / self.max_value()
    }

    pub fn name(self) -> &'static str {
        match self {
            DstDtype::Uint8 => "uint8",
            DstDtype::Uint16 => "uint16",
            DstDtype::Int16 => "int16",
        }
    }
}

impl FromStr for DstDtype {
    type Err = PansharpenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "uint8" => Ok(DstDtype::Uint8),
            "uint16" => Ok(DstDtype::Uint16),
            "int16" => Ok(DstDtype::Int16),
            _ => Err(PansharpenError::UnsupportedDtype(s.to_string())),
        }
    }
}

impl fmt::Display for DstDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust element types that can back an output band.
pub trait OutputPixel: GdalType + Copy + PartialEq + Default + Send + Sync + 'static {
    const MAX: Self;

    /// Truncating, saturating conversion (NaN becomes zero).
    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;
}

impl OutputPixel for u8 {
    const MAX: Self = u8::MAX;

    fn from_f64(value: f64) -> Self {
        value as u8
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl OutputPixel for u16 {
    const MAX: Self = u16::MAX;

    fn from_f64(value: f64) -> Self {
        value as u16
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl OutputPixel for i16 {
    const MAX: Self = i16::MAX;

    fn from_f64(value: f64) -> Self {
        value as i16
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}
