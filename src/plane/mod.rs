//! # Plane Module
//!
//! In-memory representation of a single 2D pixel plane and the element types
//! an image may carry.
//!
//! A [`Plane`] owns a row-major buffer of one numeric element type. All planes
//! of one image share the same [`PixelType`] and full-resolution shape; the
//! reduced levels of the pyramid are derived from them with [`halve`].

mod resize;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use resize::{halve, halved_extent};

/// Position of a plane inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneIndex {
    /// Focal plane
    pub z: usize,
    /// Channel
    pub c: usize,
    /// Timepoint
    pub t: usize,
}

impl PlaneIndex {
    /// Create a new plane index
    pub fn new(z: usize, c: usize, t: usize) -> Self {
        Self { z, c, t }
    }
}

impl fmt::Display for PlaneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(z={}, c={}, t={})", self.z, self.c, self.t)
    }
}

/// Enumerate every plane index of an image in export order: t outer, c middle, z inner.
pub fn plane_order(size_z: usize, size_c: usize, size_t: usize) -> impl Iterator<Item = PlaneIndex> {
    (0..size_t).flat_map(move |t| {
        (0..size_c).flat_map(move |c| (0..size_z).map(move |z| PlaneIndex::new(z, c, t)))
    })
}

/// Numeric element type of an image's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    #[serde(alias = "float")]
    Float32,
    #[serde(alias = "double")]
    Float64,
}

impl PixelType {
    /// Size of one element in bytes
    pub fn element_size(&self) -> usize {
        match self {
            PixelType::Int8 | PixelType::Uint8 => 1,
            PixelType::Int16 | PixelType::Uint16 => 2,
            PixelType::Int32 | PixelType::Uint32 | PixelType::Float32 => 4,
            PixelType::Float64 => 8,
        }
    }

    /// NumPy dtype descriptor (little-endian where byte order applies)
    pub fn npy_descr(&self) -> &'static str {
        match self {
            PixelType::Int8 => "|i1",
            PixelType::Int16 => "<i2",
            PixelType::Int32 => "<i4",
            PixelType::Uint8 => "|u1",
            PixelType::Uint16 => "<u2",
            PixelType::Uint32 => "<u4",
            PixelType::Float32 => "<f4",
            PixelType::Float64 => "<f8",
        }
    }

    /// Parse a NumPy dtype descriptor. Big-endian descriptors are not accepted.
    pub fn from_npy_descr(descr: &str) -> Option<Self> {
        let pixel_type = match descr {
            "|i1" | "<i1" | "i1" => PixelType::Int8,
            "<i2" => PixelType::Int16,
            "<i4" => PixelType::Int32,
            "|u1" | "<u1" | "u1" => PixelType::Uint8,
            "<u2" => PixelType::Uint16,
            "<u4" => PixelType::Uint32,
            "<f4" => PixelType::Float32,
            "<f8" => PixelType::Float64,
            _ => return None,
        };
        Some(pixel_type)
    }

    /// All supported pixel type names
    pub fn variants() -> &'static [&'static str] {
        &["int8", "int16", "int32", "uint8", "uint16", "uint32", "float32", "float64"]
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelType::Int8 => "int8",
            PixelType::Int16 => "int16",
            PixelType::Int32 => "int32",
            PixelType::Uint8 => "uint8",
            PixelType::Uint16 => "uint16",
            PixelType::Uint32 => "uint32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "int8" => Ok(PixelType::Int8),
            "int16" => Ok(PixelType::Int16),
            "int32" => Ok(PixelType::Int32),
            "uint8" => Ok(PixelType::Uint8),
            "uint16" => Ok(PixelType::Uint16),
            "uint32" => Ok(PixelType::Uint32),
            "float32" | "float" => Ok(PixelType::Float32),
            "float64" | "double" => Ok(PixelType::Float64),
            _ => Err(format!(
                "Unknown pixel type '{}'. Valid options: {}",
                s,
                PixelType::variants().join(", ")
            )),
        }
    }
}

/// Typed, row-major pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Apply an expression to the buffer inside any [`PlaneData`] variant.
macro_rules! with_plane_data {
    ($data:expr, $buf:ident => $body:expr) => {
        match $data {
            $crate::plane::PlaneData::Int8($buf) => $body,
            $crate::plane::PlaneData::Int16($buf) => $body,
            $crate::plane::PlaneData::Int32($buf) => $body,
            $crate::plane::PlaneData::Uint8($buf) => $body,
            $crate::plane::PlaneData::Uint16($buf) => $body,
            $crate::plane::PlaneData::Uint32($buf) => $body,
            $crate::plane::PlaneData::Float32($buf) => $body,
            $crate::plane::PlaneData::Float64($buf) => $body,
        }
    };
}

/// Like [`with_plane_data!`], re-wrapping the result in the same variant.
macro_rules! map_plane_data {
    ($data:expr, $buf:ident => $body:expr) => {
        match $data {
            $crate::plane::PlaneData::Int8($buf) => $crate::plane::PlaneData::Int8($body),
            $crate::plane::PlaneData::Int16($buf) => $crate::plane::PlaneData::Int16($body),
            $crate::plane::PlaneData::Int32($buf) => $crate::plane::PlaneData::Int32($body),
            $crate::plane::PlaneData::Uint8($buf) => $crate::plane::PlaneData::Uint8($body),
            $crate::plane::PlaneData::Uint16($buf) => $crate::plane::PlaneData::Uint16($body),
            $crate::plane::PlaneData::Uint32($buf) => $crate::plane::PlaneData::Uint32($body),
            $crate::plane::PlaneData::Float32($buf) => $crate::plane::PlaneData::Float32($body),
            $crate::plane::PlaneData::Float64($buf) => $crate::plane::PlaneData::Float64($body),
        }
    };
}

pub(crate) use map_plane_data;
pub(crate) use with_plane_data;

impl PlaneData {
    /// Element type of the buffer
    pub fn pixel_type(&self) -> PixelType {
        match self {
            PlaneData::Int8(_) => PixelType::Int8,
            PlaneData::Int16(_) => PixelType::Int16,
            PlaneData::Int32(_) => PixelType::Int32,
            PlaneData::Uint8(_) => PixelType::Uint8,
            PlaneData::Uint16(_) => PixelType::Uint16,
            PlaneData::Uint32(_) => PixelType::Uint32,
            PlaneData::Float32(_) => PixelType::Float32,
            PlaneData::Float64(_) => PixelType::Float64,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        with_plane_data!(self, buf => buf.len())
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a buffer of `len` elements of `pixel_type`, each produced by `f`
    /// and converted with an `as` cast.
    pub fn from_fn(pixel_type: PixelType, len: usize, f: impl Fn(usize) -> f64) -> Self {
        match pixel_type {
            PixelType::Int8 => PlaneData::Int8((0..len).map(|i| f(i) as i8).collect()),
            PixelType::Int16 => PlaneData::Int16((0..len).map(|i| f(i) as i16).collect()),
            PixelType::Int32 => PlaneData::Int32((0..len).map(|i| f(i) as i32).collect()),
            PixelType::Uint8 => PlaneData::Uint8((0..len).map(|i| f(i) as u8).collect()),
            PixelType::Uint16 => PlaneData::Uint16((0..len).map(|i| f(i) as u16).collect()),
            PixelType::Uint32 => PlaneData::Uint32((0..len).map(|i| f(i) as u32).collect()),
            PixelType::Float32 => PlaneData::Float32((0..len).map(|i| f(i) as f32).collect()),
            PixelType::Float64 => PlaneData::Float64((0..len).map(f).collect()),
        }
    }
}

/// Element types that can back a [`Plane`].
pub trait PlaneElement: Copy + 'static {
    /// Pixel type tag for this element
    const PIXEL_TYPE: PixelType;

    /// Wrap a buffer into [`PlaneData`]
    fn wrap(values: Vec<Self>) -> PlaneData;

    /// Borrow the buffer if `data` holds this element type
    fn view(data: &PlaneData) -> Option<&[Self]>;
}

macro_rules! impl_plane_element {
    ($ty:ty, $variant:ident) => {
        impl PlaneElement for $ty {
            const PIXEL_TYPE: PixelType = PixelType::$variant;

            fn wrap(values: Vec<Self>) -> PlaneData {
                PlaneData::$variant(values)
            }

            fn view(data: &PlaneData) -> Option<&[Self]> {
                match data {
                    PlaneData::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

impl_plane_element!(i8, Int8);
impl_plane_element!(i16, Int16);
impl_plane_element!(i32, Int32);
impl_plane_element!(u8, Uint8);
impl_plane_element!(u16, Uint16);
impl_plane_element!(u32, Uint32);
impl_plane_element!(f32, Float32);
impl_plane_element!(f64, Float64);

/// Errors raised when assembling a plane
#[derive(Debug, thiserror::Error)]
pub enum PlaneError {
    /// Buffer length does not match height × width
    #[error("plane buffer holds {actual} elements, expected {height}x{width}")]
    ShapeMismatch {
        height: usize,
        width: usize,
        actual: usize,
    },

    /// A plane must have at least one pixel in each dimension
    #[error("plane dimensions must be non-zero, got {height}x{width}")]
    EmptyShape { height: usize, width: usize },
}

/// A 2D pixel plane of shape (height, width).
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    height: usize,
    width: usize,
    data: PlaneData,
}

impl Plane {
    /// Create a plane, checking the buffer length against the shape.
    pub fn new(height: usize, width: usize, data: PlaneData) -> Result<Self, PlaneError> {
        if height == 0 || width == 0 {
            return Err(PlaneError::EmptyShape { height, width });
        }
        if data.len() != height * width {
            return Err(PlaneError::ShapeMismatch {
                height,
                width,
                actual: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Create a plane from a typed buffer.
    pub fn from_elements<T: PlaneElement>(
        height: usize,
        width: usize,
        values: Vec<T>,
    ) -> Result<Self, PlaneError> {
        Self::new(height, width, T::wrap(values))
    }

    /// Plane filled with a single value
    pub fn filled<T: PlaneElement>(height: usize, width: usize, value: T) -> Result<Self, PlaneError> {
        Self::from_elements(height, width, vec![value; height * width])
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn pixel_type(&self) -> PixelType {
        self.data.pixel_type()
    }

    pub fn data(&self) -> &PlaneData {
        &self.data
    }

    pub fn into_data(self) -> PlaneData {
        self.data
    }

    /// Borrow the pixels as `T` if the element type matches.
    pub fn as_slice<T: PlaneElement>(&self) -> Option<&[T]> {
        T::view(&self.data)
    }
}
