use log::{debug, info};

use super::config::PyramidConfig;
use super::error::PyramidError;
use super::stats::PyramidStats;
use crate::cache::PlaneCache;
use crate::plane::{halve, plane_order, Plane, PlaneIndex};
use crate::source::PlaneSource;
use crate::store::{ArrayLayout, LevelArray, StorageBackend};

/// Result of a pyramid build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidOutput {
    /// Level array names relative to the image group, full resolution first.
    /// Empty when every plane was absent.
    pub paths: Vec<String>,
    pub stats: PyramidStats,
}

/// Writes every plane of one image into a stack of progressively halved
/// level arrays inside one group.
///
/// Planes are visited t outer, c middle, z inner. A plane comes from the
/// cache when present there, otherwise it is pulled from the source, which
/// therefore must yield exactly the planes of [`required_planes`] in that
/// order. Level arrays are created on the first present plane.
///
/// [`required_planes`]: PyramidBuilder::required_planes
pub struct PyramidBuilder<'a, S: StorageBackend> {
    store: &'a mut S,
    group: String,
    config: PyramidConfig,
    cache: Option<(&'a PlaneCache, u64)>,
    arrays: Vec<S::Array>,
    stats: PyramidStats,
}

impl<'a, S: StorageBackend> PyramidBuilder<'a, S> {
    /// Create a builder writing into `group` of `store`.
    pub fn new(store: &'a mut S, group: &str, config: PyramidConfig) -> Result<Self, PyramidError> {
        config.validate()?;
        Ok(Self {
            store,
            group: group.to_string(),
            config,
            cache: None,
            arrays: Vec::new(),
            stats: PyramidStats::default(),
        })
    }

    /// Read and write full-resolution planes through `cache` under `image_id`.
    pub fn with_cache(mut self, cache: &'a PlaneCache, image_id: u64) -> Self {
        self.cache = Some((cache, image_id));
        self
    }

    pub fn config(&self) -> &PyramidConfig {
        &self.config
    }

    fn is_cached(&self, index: PlaneIndex) -> bool {
        self.cache
            .map(|(cache, image_id)| cache.has(image_id, index))
            .unwrap_or(false)
    }

    /// Planes the source must produce, in order: every plane not already cached.
    pub fn required_planes(&self) -> Vec<PlaneIndex> {
        let c = &self.config;
        plane_order(c.size_z, c.size_c, c.size_t)
            .filter(|&index| !self.is_cached(index))
            .collect()
    }

    /// Consume the plane stream and write every level.
    pub fn build(mut self, source: &mut dyn PlaneSource) -> Result<PyramidOutput, PyramidError> {
        let c = &self.config;
        let order: Vec<PlaneIndex> = plane_order(c.size_z, c.size_c, c.size_t).collect();

        for index in order {
            let plane = match self.cache {
                Some((cache, image_id)) if cache.has(image_id, index) => {
                    self.stats.cache_hits += 1;
                    Some(cache.load(image_id, index)?)
                }
                _ => {
                    let plane = self.pull(source, index)?;
                    if let (Some((cache, image_id)), Some(plane)) = (self.cache, plane.as_ref()) {
                        cache.store(image_id, index, plane)?;
                    }
                    plane
                }
            };

            match plane {
                Some(plane) => self.write_levels(index, plane)?,
                None => {
                    debug!("Plane {} is absent, leaving it unwritten", index);
                    self.stats.planes_absent += 1;
                }
            }
        }

        info!("{}", self.stats);
        Ok(PyramidOutput {
            paths: self.arrays.iter().map(|a| level_name(a.path())).collect(),
            stats: self.stats,
        })
    }

    /// Pull the next plane from the source, checking it is the one expected.
    fn pull(
        &mut self,
        source: &mut dyn PlaneSource,
        expected: PlaneIndex,
    ) -> Result<Option<Plane>, PyramidError> {
        let item = source
            .next_plane()
            .ok_or(PyramidError::SourceExhausted(expected))??;
        self.stats.planes_fetched += 1;
        if item.index != expected {
            return Err(PyramidError::OutOfOrder {
                expected,
                actual: item.index,
            });
        }
        Ok(item.plane)
    }

    fn write_levels(&mut self, index: PlaneIndex, plane: Plane) -> Result<(), PyramidError> {
        let c = &self.config;
        if plane.shape() != (c.size_y, c.size_x) {
            return Err(PyramidError::PlaneShape {
                index,
                height: plane.height(),
                width: plane.width(),
                expected_height: c.size_y,
                expected_width: c.size_x,
            });
        }
        if plane.pixel_type() != c.pixel_type {
            return Err(PyramidError::PixelType {
                index,
                expected: c.pixel_type,
                found: plane.pixel_type(),
            });
        }

        let coords = c.coordinates(index);
        let mut plane = plane;
        for level in 0..c.level_count {
            if self.arrays.len() <= level {
                let array = self.create_level(level, &plane)?;
                self.arrays.push(array);
            }
            self.arrays[level].write_plane(&coords, &plane)?;
            if level + 1 < self.config.level_count {
                plane = halve(&plane);
            }
        }
        self.stats.planes_written += 1;
        Ok(())
    }

    fn create_level(&mut self, level: usize, plane: &Plane) -> Result<S::Array, PyramidError> {
        let c = &self.config;
        let (height, width) = (plane.height() as u64, plane.width() as u64);

        let mut shape = c.leading_shape();
        let mut chunk_shape = vec![1; shape.len()];
        shape.extend([height, width]);
        match c.chunk_size {
            Some(edge) => chunk_shape.extend([edge as u64, edge as u64]),
            None => chunk_shape.extend([height, width]),
        }
        let mut dimension_names: Vec<String> =
            c.leading_dimensions().into_iter().map(String::from).collect();
        dimension_names.extend(["y".to_string(), "x".to_string()]);

        let layout = ArrayLayout::new(shape, chunk_shape, c.pixel_type)
            .with_dimension_names(dimension_names);
        let array = self
            .store
            .create_array(&self.group, &level.to_string(), &layout)?;
        self.stats.levels_created += 1;
        debug!("Level {} array {} shape {:?}", level, array.path(), layout.shape);
        Ok(array)
    }
}

/// Last path segment of an array path
fn level_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
