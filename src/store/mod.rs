//! # Store Module
//!
//! The chunked-array storage backend, seen through two small traits:
//!
//! - [`StorageBackend`]: groups, arrays, and group attributes addressed by
//!   `/`-rooted node paths (`/`, `/A/1/0`).
//! - [`LevelArray`]: one created array that accepts whole 2D planes at a
//!   coordinate over its leading dimensions.
//!
//! [`ZarrStore`] implements both on top of `zarrs` (Zarr v3), backed by the
//! filesystem or by memory.

mod error;
mod zarr;

use serde_json::{Map, Value};

use crate::plane::{PixelType, Plane};

pub use error::StoreError;
pub use zarr::{ZarrArray, ZarrStore};

/// Shape, chunking and element type of an array to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLayout {
    pub shape: Vec<u64>,
    pub chunk_shape: Vec<u64>,
    pub pixel_type: PixelType,
    /// One name per dimension, or empty for unnamed dimensions
    pub dimension_names: Vec<String>,
}

impl ArrayLayout {
    pub fn new(shape: Vec<u64>, chunk_shape: Vec<u64>, pixel_type: PixelType) -> Self {
        Self {
            shape,
            chunk_shape,
            pixel_type,
            dimension_names: Vec::new(),
        }
    }

    pub fn with_dimension_names(mut self, names: Vec<String>) -> Self {
        self.dimension_names = names;
        self
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Check that the layout describes at least a 2D array with one non-zero
    /// chunk extent per dimension.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.rank() < 2 {
            return Err(StoreError::InvalidLayout(format!(
                "rank {} is below 2",
                self.rank()
            )));
        }
        if self.chunk_shape.len() != self.rank() {
            return Err(StoreError::InvalidLayout(format!(
                "chunk shape {:?} does not match shape {:?}",
                self.chunk_shape, self.shape
            )));
        }
        if self.chunk_shape.contains(&0) {
            return Err(StoreError::InvalidLayout(format!(
                "chunk shape {:?} has a zero extent",
                self.chunk_shape
            )));
        }
        if !self.dimension_names.is_empty() && self.dimension_names.len() != self.rank() {
            return Err(StoreError::InvalidLayout(format!(
                "{} dimension names for rank {}",
                self.dimension_names.len(),
                self.rank()
            )));
        }
        Ok(())
    }
}

/// A created array that accepts whole planes.
pub trait LevelArray {
    /// Node path of the array
    fn path(&self) -> &str;

    /// Layout the array was created with
    fn layout(&self) -> &ArrayLayout;

    /// Write `plane` into the last two dimensions at `coords`, one index per
    /// leading dimension.
    fn write_plane(&mut self, coords: &[u64], plane: &Plane) -> Result<(), StoreError>;
}

/// Hierarchical chunked-array store.
pub trait StorageBackend {
    type Array: LevelArray;

    /// Create the group at `path` if it does not exist yet. Existing
    /// attributes are preserved.
    fn require_group(&mut self, path: &str) -> Result<(), StoreError>;

    /// Create array `name` inside `group`.
    fn create_array(
        &mut self,
        group: &str,
        name: &str,
        layout: &ArrayLayout,
    ) -> Result<Self::Array, StoreError>;

    /// Merge a JSON object into the attributes of `group`, see [`merge_json`].
    fn merge_attributes(&mut self, group: &str, attributes: Value) -> Result<(), StoreError>;
}

/// Join a child name onto a `/`-rooted node path.
pub fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    format!("{}/{}", parent, child)
}

/// Recursively merge `update` into `target`: objects merge key by key, any
/// other value replaces what was there.
pub fn merge_json(target: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_json(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "0"), "/0");
        assert_eq!(join_path("/A/1", "2"), "/A/1/2");
        assert_eq!(join_path("/A/", "/1"), "/A/1");
    }

    #[test]
    fn test_merge_json_nested() {
        let mut target = json!({"ome": {"version": "0.5", "multiscales": [1]}, "_creator": {"name": "a"}})
            .as_object()
            .cloned()
            .unwrap();
        let update = json!({"ome": {"omero": {"id": 1}, "multiscales": [2]}})
            .as_object()
            .cloned()
            .unwrap();
        merge_json(&mut target, update);

        assert_eq!(
            Value::Object(target),
            json!({
                "ome": {"version": "0.5", "multiscales": [2], "omero": {"id": 1}},
                "_creator": {"name": "a"}
            })
        );
    }

    #[test]
    fn test_layout_validation() {
        let layout = ArrayLayout::new(vec![2, 4, 4], vec![1, 4, 4], PixelType::Uint8);
        assert!(layout.validate().is_ok());
        assert!(ArrayLayout::new(vec![4], vec![4], PixelType::Uint8).validate().is_err());
        assert!(ArrayLayout::new(vec![4, 4], vec![0, 4], PixelType::Uint8).validate().is_err());
        assert!(layout
            .clone()
            .with_dimension_names(vec!["y".into(), "x".into()])
            .validate()
            .is_err());
    }
}
