use super::error::PyramidError;
use super::planner::level_count;
use crate::plane::{PixelType, PlaneIndex};
use crate::source::ImageDescriptor;

/// Geometry and chunking of one image pyramid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidConfig {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    pub pixel_type: PixelType,

    /// Number of resolution levels, including full resolution
    pub level_count: usize,

    /// Square spatial chunk edge. `None` chunks each level by whole planes.
    pub chunk_size: Option<usize>,
}

impl PyramidConfig {
    /// Configuration for an image, with the default level count and
    /// whole-plane chunks.
    pub fn for_image(descriptor: &ImageDescriptor) -> Self {
        Self {
            size_x: descriptor.size_x,
            size_y: descriptor.size_y,
            size_z: descriptor.size_z,
            size_c: descriptor.size_c,
            size_t: descriptor.size_t,
            pixel_type: descriptor.pixel_type,
            level_count: level_count(descriptor.size_x, descriptor.size_y),
            chunk_size: None,
        }
    }

    pub fn with_level_count(mut self, level_count: usize) -> Self {
        self.level_count = level_count;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Names of the leading (non-spatial) array dimensions, in array order.
    /// Only dimensions with more than one entry are present.
    pub fn leading_dimensions(&self) -> Vec<&'static str> {
        [("t", self.size_t), ("c", self.size_c), ("z", self.size_z)]
            .into_iter()
            .filter(|&(_, size)| size > 1)
            .map(|(name, _)| name)
            .collect()
    }

    /// Extents of the leading array dimensions
    pub fn leading_shape(&self) -> Vec<u64> {
        [self.size_t, self.size_c, self.size_z]
            .into_iter()
            .filter(|&size| size > 1)
            .map(|size| size as u64)
            .collect()
    }

    /// Array coordinates of a plane over the leading dimensions
    pub fn coordinates(&self, index: PlaneIndex) -> Vec<u64> {
        [
            (index.t, self.size_t),
            (index.c, self.size_c),
            (index.z, self.size_z),
        ]
        .into_iter()
        .filter(|&(_, size)| size > 1)
        .map(|(i, _)| i as u64)
        .collect()
    }

    pub fn validate(&self) -> Result<(), PyramidError> {
        let sizes = [self.size_x, self.size_y, self.size_z, self.size_c, self.size_t];
        if sizes.contains(&0) {
            return Err(PyramidError::InvalidConfig(format!(
                "image extents must be non-zero, got x={} y={} z={} c={} t={}",
                self.size_x, self.size_y, self.size_z, self.size_c, self.size_t
            )));
        }
        if self.level_count == 0 {
            return Err(PyramidError::InvalidConfig(
                "level count must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == Some(0) {
            return Err(PyramidError::InvalidConfig(
                "chunk size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
