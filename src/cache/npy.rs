//! Minimal NumPy `.npy` (format version 1.0) codec for 2D planes.
//!
//! Only little-endian, C-ordered, two-dimensional arrays of the supported
//! [`PixelType`]s are read and written, which is everything the plane cache
//! ever produces.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::error::CacheError;
use crate::plane::{PixelType, Plane, PlaneData};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const HEADER_ALIGNMENT: usize = 64;
// magic + version + u16 header length
const PREAMBLE_LEN: usize = 10;

/// Serialize `plane` as a `.npy` stream.
pub fn write_plane<W: Write>(writer: &mut W, plane: &Plane) -> Result<(), CacheError> {
    let header = header_for(plane);
    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_u16::<LittleEndian>(header.len() as u16)?;
    writer.write_all(header.as_bytes())?;

    match plane.data() {
        PlaneData::Int8(values) => {
            for &v in values {
                writer.write_i8(v)?;
            }
        }
        PlaneData::Uint8(values) => writer.write_all(values)?,
        PlaneData::Int16(values) => {
            for &v in values {
                writer.write_i16::<LittleEndian>(v)?;
            }
        }
        PlaneData::Uint16(values) => {
            for &v in values {
                writer.write_u16::<LittleEndian>(v)?;
            }
        }
        PlaneData::Int32(values) => {
            for &v in values {
                writer.write_i32::<LittleEndian>(v)?;
            }
        }
        PlaneData::Uint32(values) => {
            for &v in values {
                writer.write_u32::<LittleEndian>(v)?;
            }
        }
        PlaneData::Float32(values) => {
            for &v in values {
                writer.write_f32::<LittleEndian>(v)?;
            }
        }
        PlaneData::Float64(values) => {
            for &v in values {
                writer.write_f64::<LittleEndian>(v)?;
            }
        }
    }
    Ok(())
}

/// Deserialize a plane from a `.npy` stream.
pub fn read_plane<R: Read>(reader: &mut R) -> Result<Plane, CacheError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(CacheError::InvalidFormat("missing .npy magic string".to_string()));
    }
    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>()? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
        other => {
            return Err(CacheError::InvalidFormat(format!(
                "unsupported .npy format version {}",
                other
            )))
        }
    };

    let mut header = Vec::new();
    reader.by_ref().take(header_len as u64).read_to_end(&mut header)?;
    if header.len() != header_len {
        return Err(CacheError::InvalidFormat("truncated .npy header".to_string()));
    }
    let header = String::from_utf8(header)
        .map_err(|_| CacheError::InvalidFormat("header is not valid UTF-8".to_string()))?;
    let NpyHeader {
        pixel_type,
        height,
        width,
    } = parse_header(&header)?;

    let len = height
        .checked_mul(width)
        .ok_or_else(|| CacheError::InvalidFormat("shape overflows".to_string()))?;
    let byte_len = len
        .checked_mul(pixel_type.element_size())
        .ok_or_else(|| CacheError::InvalidFormat("shape overflows".to_string()))?;

    // Allocation follows the bytes actually present, never the header alone.
    let mut payload = Vec::new();
    reader.by_ref().take(byte_len as u64).read_to_end(&mut payload)?;
    if payload.len() != byte_len {
        return Err(CacheError::InvalidFormat(format!(
            "expected {} bytes of pixel data, found {}",
            byte_len,
            payload.len()
        )));
    }
    let reader = &mut payload.as_slice();

    let data = match pixel_type {
        PixelType::Int8 => {
            let mut values = vec![0i8; len];
            reader.read_i8_into(&mut values)?;
            PlaneData::Int8(values)
        }
        PixelType::Uint8 => {
            let mut values = vec![0u8; len];
            reader.read_exact(&mut values)?;
            PlaneData::Uint8(values)
        }
        PixelType::Int16 => {
            let mut values = vec![0i16; len];
            reader.read_i16_into::<LittleEndian>(&mut values)?;
            PlaneData::Int16(values)
        }
        PixelType::Uint16 => {
            let mut values = vec![0u16; len];
            reader.read_u16_into::<LittleEndian>(&mut values)?;
            PlaneData::Uint16(values)
        }
        PixelType::Int32 => {
            let mut values = vec![0i32; len];
            reader.read_i32_into::<LittleEndian>(&mut values)?;
            PlaneData::Int32(values)
        }
        PixelType::Uint32 => {
            let mut values = vec![0u32; len];
            reader.read_u32_into::<LittleEndian>(&mut values)?;
            PlaneData::Uint32(values)
        }
        PixelType::Float32 => {
            let mut values = vec![0f32; len];
            reader.read_f32_into::<LittleEndian>(&mut values)?;
            PlaneData::Float32(values)
        }
        PixelType::Float64 => {
            let mut values = vec![0f64; len];
            reader.read_f64_into::<LittleEndian>(&mut values)?;
            PlaneData::Float64(values)
        }
    };

    Ok(Plane::new(height, width, data)?)
}

fn header_for(plane: &Plane) -> String {
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': ({}, {}), }}",
        plane.pixel_type().npy_descr(),
        plane.height(),
        plane.width()
    );
    // Pad with spaces so the data starts on an aligned offset; the header ends in '\n'.
    let unpadded = PREAMBLE_LEN + header.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');
    header
}

#[derive(Debug, PartialEq)]
struct NpyHeader {
    pixel_type: PixelType,
    height: usize,
    width: usize,
}

/// Value that follows `'key':` in the header dictionary, up to the next
/// top-level comma or closing brace.
fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{}':", key);
    let start = header.find(&pattern)? + pattern.len();
    let rest = header[start..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else {
        rest.find([',', '}'])?
    };
    Some(rest[..end].trim())
}

fn parse_header(header: &str) -> Result<NpyHeader, CacheError> {
    let invalid = |msg: &str| CacheError::InvalidFormat(format!("{}: {}", msg, header.trim()));

    let descr = header_value(header, "descr").ok_or_else(|| invalid("missing descr"))?;
    let descr = descr.trim_matches(|c: char| c == '\'' || c == '"');
    let pixel_type =
        PixelType::from_npy_descr(descr).ok_or_else(|| invalid("unsupported dtype"))?;

    match header_value(header, "fortran_order") {
        Some("False") => {}
        Some(_) => return Err(invalid("only C-ordered arrays are supported")),
        None => return Err(invalid("missing fortran_order")),
    }

    let shape = header_value(header, "shape").ok_or_else(|| invalid("missing shape"))?;
    let dims: Vec<usize> = shape
        .trim_matches(|c: char| c == '(' || c == ')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| invalid("malformed shape"))?;
    match dims.as_slice() {
        [height, width] => Ok(NpyHeader {
            pixel_type,
            height: *height,
            width: *width,
        }),
        _ => Err(invalid("expected a 2D array")),
    }
}
