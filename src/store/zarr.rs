use std::collections::HashMap;
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};
use zarrs::array::chunk_grid::ChunkGrid;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::filesystem::FilesystemStore;
use zarrs::group::{Group, GroupBuilder};
use zarrs::node::{node_exists, NodePath};
use zarrs::storage::store::MemoryStore;
use zarrs::storage::{ReadableWritableListableStorage, ReadableWritableListableStorageTraits};

use super::{join_path, merge_json, ArrayLayout, LevelArray, StorageBackend, StoreError};
use crate::plane::{with_plane_data, PixelType, Plane};

/// Zarr v3 data type and zero fill value for a pixel type
fn zarr_type(pixel_type: PixelType) -> (DataType, FillValue) {
    match pixel_type {
        PixelType::Int8 => (DataType::Int8, FillValue::from(0i8)),
        PixelType::Int16 => (DataType::Int16, FillValue::from(0i16)),
        PixelType::Int32 => (DataType::Int32, FillValue::from(0i32)),
        PixelType::Uint8 => (DataType::UInt8, FillValue::from(0u8)),
        PixelType::Uint16 => (DataType::UInt16, FillValue::from(0u16)),
        PixelType::Uint32 => (DataType::UInt32, FillValue::from(0u32)),
        PixelType::Float32 => (DataType::Float32, FillValue::from(0.0f32)),
        PixelType::Float64 => (DataType::Float64, FillValue::from(0.0f64)),
    }
}

fn chunk_grid(chunk_shape: &[u64]) -> Result<ChunkGrid, StoreError> {
    let extents = chunk_shape
        .iter()
        .map(|&extent| {
            NonZeroU64::new(extent).ok_or_else(|| {
                StoreError::InvalidLayout(format!("chunk shape {:?} has a zero extent", chunk_shape))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChunkGrid::from(extents))
}

/// Zarr v3 hierarchy in a filesystem directory or in memory.
///
/// Group attributes are kept in memory as well and the full set is rewritten
/// on every merge, so metadata written in several steps (multiscales, then
/// omero, then the creator stamp) accumulates in one `zarr.json`.
pub struct ZarrStore {
    storage: ReadableWritableListableStorage,
    attributes: HashMap<String, Map<String, Value>>,
}

impl ZarrStore {
    /// Create (or reopen) a store rooted at a directory. The root group is
    /// created immediately.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let store = FilesystemStore::new(path)
            .map_err(|e| StoreError::OpenError(format!("{}: {}", path.display(), e)))?;
        debug!("Opened Zarr store at {}", path.display());
        Self::with_storage(Arc::new(store))
    }

    /// Store held entirely in memory
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_storage(Arc::new(MemoryStore::new()))
    }

    fn with_storage(storage: ReadableWritableListableStorage) -> Result<Self, StoreError> {
        let mut store = Self {
            storage,
            attributes: HashMap::new(),
        };
        store.require_group("/")?;
        Ok(store)
    }

    /// Underlying key-value storage
    pub fn storage(&self) -> ReadableWritableListableStorage {
        self.storage.clone()
    }

    /// Attributes of a group as persisted in the store
    pub fn attributes(&self, group: &str) -> Result<Map<String, Value>, StoreError> {
        let group = Group::open(self.storage.clone(), group)?;
        Ok(group.attributes().clone())
    }

    /// Open an existing array for reading
    pub fn open_array(
        &self,
        path: &str,
    ) -> Result<Array<dyn ReadableWritableListableStorageTraits>, StoreError> {
        Ok(Array::open(self.storage.clone(), path)?)
    }

    fn write_group(&self, path: &str, attributes: &Map<String, Value>) -> Result<(), StoreError> {
        let mut group = GroupBuilder::new().build(self.storage.clone(), path)?;
        *group.attributes_mut() = attributes.clone();
        group.store_metadata()?;
        Ok(())
    }
}

impl StorageBackend for ZarrStore {
    type Array = ZarrArray;

    fn require_group(&mut self, path: &str) -> Result<(), StoreError> {
        if self.attributes.contains_key(path) {
            return Ok(());
        }
        let node = NodePath::new(path)
            .map_err(|e| StoreError::OpenError(format!("{}: {}", path, e)))?;
        // A group from an earlier run keeps its attributes. Only a missing
        // node starts empty, unreadable metadata is an error.
        let existing = if node_exists(&self.storage, &node)? {
            Group::open(self.storage.clone(), path)?.attributes().clone()
        } else {
            Map::new()
        };
        self.write_group(path, &existing)?;
        self.attributes.insert(path.to_string(), existing);
        Ok(())
    }

    fn create_array(
        &mut self,
        group: &str,
        name: &str,
        layout: &ArrayLayout,
    ) -> Result<ZarrArray, StoreError> {
        layout.validate()?;
        let path = join_path(group, name);
        let (data_type, fill_value) = zarr_type(layout.pixel_type);

        let mut builder = ArrayBuilder::new(
            layout.shape.clone(),
            data_type,
            chunk_grid(&layout.chunk_shape)?,
            fill_value,
        );
        if !layout.dimension_names.is_empty() {
            let names: Vec<&str> = layout.dimension_names.iter().map(String::as_str).collect();
            builder.dimension_names(Some(names));
        }
        let array = builder.build(self.storage.clone(), &path)?;
        array.store_metadata()?;
        debug!(
            "Created array {} shape {:?} chunks {:?} ({})",
            path, layout.shape, layout.chunk_shape, layout.pixel_type
        );

        Ok(ZarrArray {
            path,
            layout: layout.clone(),
            array,
        })
    }

    fn merge_attributes(&mut self, group: &str, attributes: Value) -> Result<(), StoreError> {
        let Value::Object(update) = attributes else {
            return Err(StoreError::InvalidAttributes {
                group: group.to_string(),
            });
        };
        self.require_group(group)?;
        let current = self.attributes.entry(group.to_string()).or_default();
        merge_json(current, update);
        let merged = current.clone();
        self.write_group(group, &merged)
    }
}

/// One level array inside a [`ZarrStore`]
pub struct ZarrArray {
    path: String,
    layout: ArrayLayout,
    array: Array<dyn ReadableWritableListableStorageTraits>,
}

impl LevelArray for ZarrArray {
    fn path(&self) -> &str {
        &self.path
    }

    fn layout(&self) -> &ArrayLayout {
        &self.layout
    }

    fn write_plane(&mut self, coords: &[u64], plane: &Plane) -> Result<(), StoreError> {
        let rank = self.layout.rank();
        let invalid = |reason: String| StoreError::InvalidWrite {
            path: self.path.clone(),
            reason,
        };

        if coords.len() + 2 != rank {
            return Err(invalid(format!(
                "{} coordinates for a rank {} array",
                coords.len(),
                rank
            )));
        }
        if plane.pixel_type() != self.layout.pixel_type {
            return Err(StoreError::PixelTypeMismatch {
                path: self.path.clone(),
                expected: self.layout.pixel_type,
                found: plane.pixel_type(),
            });
        }
        let (height, width) = (plane.height() as u64, plane.width() as u64);
        if [height, width] != self.layout.shape[rank - 2..] {
            return Err(invalid(format!(
                "plane is {}x{}, array planes are {}x{}",
                height,
                width,
                self.layout.shape[rank - 2],
                self.layout.shape[rank - 1]
            )));
        }
        if let Some((dim, &coord)) = coords
            .iter()
            .enumerate()
            .find(|&(dim, &coord)| coord >= self.layout.shape[dim])
        {
            return Err(invalid(format!(
                "coordinate {} outside dimension {} of extent {}",
                coord, dim, self.layout.shape[dim]
            )));
        }

        let mut ranges: Vec<_> = coords.iter().map(|&c| c..c + 1).collect();
        ranges.push(0..height);
        ranges.push(0..width);
        let subset = ArraySubset::new_with_ranges(&ranges);

        with_plane_data!(plane.data(), buf => {
            self.array.store_array_subset_elements(&subset, buf.as_slice())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_write_plane_into_rank3_array() {
        let mut store = ZarrStore::in_memory().unwrap();
        let layout = ArrayLayout::new(vec![2, 2, 3], vec![1, 2, 3], PixelType::Uint16);
        let mut array = store.create_array("/", "0", &layout).unwrap();
        assert_eq!(array.path(), "/0");

        let plane = Plane::from_elements(2, 3, vec![1u16, 2, 3, 4, 5, 6]).unwrap();
        array.write_plane(&[1], &plane).unwrap();

        let read = store.open_array("/0").unwrap();
        assert_eq!(read.shape(), &[2, 2, 3]);
        let values = read
            .retrieve_array_subset_elements::<u16>(&ArraySubset::new_with_ranges(&[0..2, 0..2, 0..3]))
            .unwrap();
        assert_eq!(values, vec![0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_write_plane_checks() {
        let mut store = ZarrStore::in_memory().unwrap();
        let layout = ArrayLayout::new(vec![2, 2, 2], vec![1, 2, 2], PixelType::Uint8);
        let mut array = store.create_array("/", "0", &layout).unwrap();
        let plane = Plane::filled(2, 2, 1u8).unwrap();

        assert!(matches!(
            array.write_plane(&[2], &plane),
            Err(StoreError::InvalidWrite { .. })
        ));
        assert!(matches!(
            array.write_plane(&[0, 0], &plane),
            Err(StoreError::InvalidWrite { .. })
        ));
        assert!(matches!(
            array.write_plane(&[0], &Plane::filled(2, 2, 1u16).unwrap()),
            Err(StoreError::PixelTypeMismatch { .. })
        ));
        assert!(matches!(
            array.write_plane(&[0], &Plane::filled(1, 2, 1u8).unwrap()),
            Err(StoreError::InvalidWrite { .. })
        ));
    }

    #[test]
    fn test_attributes_accumulate() {
        let mut store = ZarrStore::in_memory().unwrap();
        store.require_group("/A").unwrap();
        store
            .merge_attributes("/A", json!({"ome": {"version": "0.5"}}))
            .unwrap();
        store
            .merge_attributes("/A", json!({"ome": {"well": {"images": []}}}))
            .unwrap();
        store.require_group("/A").unwrap();

        let attributes = store.attributes("/A").unwrap();
        assert_eq!(
            Value::Object(attributes),
            json!({"ome": {"version": "0.5", "well": {"images": []}}})
        );
        assert!(matches!(
            store.merge_attributes("/A", json!([1, 2])),
            Err(StoreError::InvalidAttributes { .. })
        ));
    }

    #[test]
    fn test_filesystem_store_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("1.zarr");
        let mut store = ZarrStore::create(&root).unwrap();
        store.merge_attributes("/", json!({"_creator": {"name": "x"}})).unwrap();
        let layout = ArrayLayout::new(vec![4, 4], vec![4, 4], PixelType::Float32)
            .with_dimension_names(vec!["y".into(), "x".into()]);
        store.create_array("/", "0", &layout).unwrap();

        assert!(root.join("zarr.json").is_file());
        assert!(root.join("0").join("zarr.json").is_file());

        // A second handle on the same directory sees the persisted attributes.
        let reopened = ZarrStore::create(&root).unwrap();
        assert_eq!(reopened.attributes("/").unwrap()["_creator"]["name"], "x");
    }

    #[test]
    fn test_unreadable_group_metadata_is_an_error() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("1.zarr");
        let group_dir = root.join("A");
        std::fs::create_dir_all(&group_dir).unwrap();
        std::fs::write(group_dir.join("zarr.json"), "{not json").unwrap();

        let mut store = ZarrStore::create(&root).unwrap();
        assert!(store.require_group("/A").is_err());
        assert!(store.merge_attributes("/A", json!({"ome": {}})).is_err());
        assert_eq!(
            std::fs::read_to_string(group_dir.join("zarr.json")).unwrap(),
            "{not json"
        );
    }
}
