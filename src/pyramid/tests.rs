use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tempfile::tempdir;
use zarrs::array_subset::ArraySubset;

use super::*;
use crate::cache::PlaneCache;
use crate::plane::{halve, PixelType, Plane, PlaneIndex};
use crate::source::{ImageSource, SourceError, SourcePlane, SyntheticImage};
use crate::store::{ArrayLayout, LevelArray, StorageBackend, StoreError, ZarrStore};

type Writes = Rc<RefCell<Vec<(String, Vec<u64>, Plane)>>>;

/// Backend that records created layouts and every plane write
#[derive(Default)]
struct RecordingStore {
    layouts: Vec<(String, ArrayLayout)>,
    writes: Writes,
}

struct RecordingArray {
    path: String,
    layout: ArrayLayout,
    writes: Writes,
}

impl LevelArray for RecordingArray {
    fn path(&self) -> &str {
        &self.path
    }

    fn layout(&self) -> &ArrayLayout {
        &self.layout
    }

    fn write_plane(&mut self, coords: &[u64], plane: &Plane) -> Result<(), StoreError> {
        self.writes
            .borrow_mut()
            .push((self.path.clone(), coords.to_vec(), plane.clone()));
        Ok(())
    }
}

impl StorageBackend for RecordingStore {
    type Array = RecordingArray;

    fn require_group(&mut self, _path: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn create_array(
        &mut self,
        group: &str,
        name: &str,
        layout: &ArrayLayout,
    ) -> Result<RecordingArray, StoreError> {
        let path = crate::store::join_path(group, name);
        self.layouts.push((path.clone(), layout.clone()));
        Ok(RecordingArray {
            path,
            layout: layout.clone(),
            writes: self.writes.clone(),
        })
    }

    fn merge_attributes(&mut self, _group: &str, _attributes: Value) -> Result<(), StoreError> {
        Ok(())
    }
}

fn build_image<S: StorageBackend>(
    store: &mut S,
    image: &SyntheticImage,
    config: PyramidConfig,
) -> Result<PyramidOutput, PyramidError> {
    let builder = PyramidBuilder::new(store, "/", config)?;
    let mut source = image.open_planes(builder.required_planes())?;
    builder.build(source.as_mut())
}

fn read_all_u8(store: &ZarrStore, path: &str) -> Vec<u8> {
    let array = store.open_array(path).unwrap();
    let ranges: Vec<_> = array.shape().iter().map(|&n| 0..n).collect();
    array
        .retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&ranges))
        .unwrap()
}

#[test]
fn test_channel_only_image_has_rank_three() {
    let image = SyntheticImage::with_shape(1, 4, 4, 1, 3, 1, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor()).with_level_count(2);
    let mut store = ZarrStore::in_memory().unwrap();

    let output = build_image(&mut store, &image, config).unwrap();

    assert_eq!(output.paths, vec!["0", "1"]);
    assert_eq!(store.open_array("/0").unwrap().shape(), &[3, 4, 4]);
    assert_eq!(store.open_array("/1").unwrap().shape(), &[3, 2, 2]);
    assert_eq!(output.stats.planes_written, 3);
    assert_eq!(output.stats.levels_created, 2);
}

#[test]
fn test_single_plane_default_levels() {
    let image = SyntheticImage::with_shape(1, 4, 4, 1, 1, 1, PixelType::Uint8);
    let mut store = ZarrStore::in_memory().unwrap();
    let config = PyramidConfig::for_image(image.descriptor());
    assert_eq!(config.level_count, 1);

    let output = build_image(&mut store, &image, config).unwrap();

    assert_eq!(output.paths, vec!["0"]);
    assert_eq!(store.open_array("/0").unwrap().shape(), &[4, 4]);
    let expected = image.plane(PlaneIndex::new(0, 0, 0)).unwrap();
    assert_eq!(read_all_u8(&store, "/0"), expected.as_slice::<u8>().unwrap());
}

#[test]
fn test_levels_are_derived_from_previous_level() {
    let image = SyntheticImage::with_shape(1, 8, 6, 1, 1, 1, PixelType::Uint16);
    let config = PyramidConfig::for_image(image.descriptor()).with_level_count(3);
    let mut store = RecordingStore::default();

    build_image(&mut store, &image, config).unwrap();

    let writes = store.writes.borrow();
    assert_eq!(writes.len(), 3);
    let level0 = image.plane(PlaneIndex::new(0, 0, 0)).unwrap();
    let level1 = halve(&level0);
    let level2 = halve(&level1);
    assert_eq!(writes[0].2, level0);
    assert_eq!(writes[1].2, level1);
    assert_eq!(writes[2].2, level2);
    assert_eq!(level2.shape(), (1, 2));
}

#[test]
fn test_coordinates_skip_singleton_axes() {
    let image = SyntheticImage::with_shape(1, 2, 2, 1, 2, 2, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor());
    let mut store = RecordingStore::default();

    build_image(&mut store, &image, config).unwrap();

    assert_eq!(store.layouts.len(), 1);
    let layout = &store.layouts[0].1;
    assert_eq!(layout.shape, vec![2, 2, 2, 2]);
    assert_eq!(layout.dimension_names, vec!["t", "c", "y", "x"]);

    let coords: Vec<Vec<u64>> = store.writes.borrow().iter().map(|w| w.1.clone()).collect();
    assert_eq!(coords, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
}

#[test]
fn test_configured_chunk_size() {
    let image = SyntheticImage::with_shape(1, 8, 8, 3, 1, 1, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor())
        .with_level_count(2)
        .with_chunk_size(Some(4));
    let mut store = RecordingStore::default();

    build_image(&mut store, &image, config).unwrap();

    assert_eq!(store.layouts[0].1.chunk_shape, vec![1, 4, 4]);
    assert_eq!(store.layouts[1].1.shape, vec![3, 4, 4]);
    assert_eq!(store.layouts[1].1.chunk_shape, vec![1, 4, 4]);
}

#[test]
fn test_whole_plane_chunks_by_default() {
    let image = SyntheticImage::with_shape(1, 8, 6, 2, 1, 1, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor()).with_level_count(2);
    let mut store = RecordingStore::default();

    build_image(&mut store, &image, config).unwrap();

    assert_eq!(store.layouts[0].1.chunk_shape, vec![1, 6, 8]);
    assert_eq!(store.layouts[1].1.chunk_shape, vec![1, 3, 4]);
}

#[test]
fn test_absent_plane_is_left_unwritten() {
    let image = SyntheticImage::with_shape(1, 2, 2, 2, 1, 1, PixelType::Uint8)
        .with_absent(PlaneIndex::new(1, 0, 0));
    let config = PyramidConfig::for_image(image.descriptor());
    let mut store = ZarrStore::in_memory().unwrap();

    let output = build_image(&mut store, &image, config).unwrap();

    assert_eq!(output.stats.planes_absent, 1);
    assert_eq!(output.stats.planes_written, 1);
    let values = read_all_u8(&store, "/0");
    let first = image.plane(PlaneIndex::new(0, 0, 0)).unwrap();
    assert_eq!(&values[..4], first.as_slice::<u8>().unwrap());
    assert_eq!(&values[4..], &[0, 0, 0, 0]);
}

#[test]
fn test_all_absent_image_creates_nothing() {
    let image = SyntheticImage::with_shape(1, 2, 2, 1, 1, 1, PixelType::Uint8)
        .with_absent(PlaneIndex::new(0, 0, 0));
    let config = PyramidConfig::for_image(image.descriptor());
    let mut store = RecordingStore::default();

    let output = build_image(&mut store, &image, config).unwrap();

    assert!(output.paths.is_empty());
    assert!(store.layouts.is_empty());
}

#[test]
fn test_cached_run_never_touches_the_source() {
    let dir = tempdir().unwrap();
    let cache = PlaneCache::new(dir.path());
    let image = SyntheticImage::with_shape(5, 4, 4, 2, 2, 1, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor()).with_level_count(2);

    let mut first = ZarrStore::in_memory().unwrap();
    let builder = PyramidBuilder::new(&mut first, "/", config.clone())
        .unwrap()
        .with_cache(&cache, 5);
    assert_eq!(builder.required_planes().len(), 4);
    let mut source = image.open_planes(builder.required_planes()).unwrap();
    let output = builder.build(source.as_mut()).unwrap();
    drop(source);
    assert_eq!(output.stats.planes_fetched, 4);
    assert_eq!(image.fetched(), 4);

    let mut second = ZarrStore::in_memory().unwrap();
    let builder = PyramidBuilder::new(&mut second, "/", config)
        .unwrap()
        .with_cache(&cache, 5);
    assert!(builder.required_planes().is_empty());
    let mut failing = std::iter::from_fn(|| {
        Some(Err::<SourcePlane, _>(SourceError::Unavailable("offline".into())))
    });
    let output = builder.build(&mut failing).unwrap();
    assert_eq!(output.stats.cache_hits, 4);
    assert_eq!(output.stats.planes_fetched, 0);

    assert_eq!(read_all_u8(&first, "/0"), read_all_u8(&second, "/0"));
    assert_eq!(read_all_u8(&first, "/1"), read_all_u8(&second, "/1"));
}

#[test]
fn test_partially_cached_run_fetches_the_rest() {
    let dir = tempdir().unwrap();
    let cache = PlaneCache::new(dir.path());
    let image = SyntheticImage::with_shape(6, 2, 2, 3, 1, 1, PixelType::Uint8);
    let cached = PlaneIndex::new(1, 0, 0);
    cache
        .store(6, cached, &image.plane(cached).unwrap())
        .unwrap();

    let mut store = RecordingStore::default();
    let config = PyramidConfig::for_image(image.descriptor());
    let builder = PyramidBuilder::new(&mut store, "/", config)
        .unwrap()
        .with_cache(&cache, 6);
    assert_eq!(
        builder.required_planes(),
        vec![PlaneIndex::new(0, 0, 0), PlaneIndex::new(2, 0, 0)]
    );
    let mut source = image.open_planes(builder.required_planes()).unwrap();
    let output = builder.build(source.as_mut()).unwrap();

    assert_eq!(output.stats.cache_hits, 1);
    assert_eq!(output.stats.planes_fetched, 2);
    assert!(cache.has(6, PlaneIndex::new(0, 0, 0)));
    assert!(cache.has(6, PlaneIndex::new(2, 0, 0)));
}

#[test]
fn test_out_of_order_source_is_rejected() {
    let image = SyntheticImage::with_shape(1, 2, 2, 2, 1, 1, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor());
    let mut store = RecordingStore::default();
    let builder = PyramidBuilder::new(&mut store, "/", config).unwrap();

    let mut source = image
        .open_planes(vec![PlaneIndex::new(1, 0, 0), PlaneIndex::new(0, 0, 0)])
        .unwrap();
    let result = builder.build(source.as_mut());

    assert!(matches!(
        result,
        Err(PyramidError::OutOfOrder { expected, actual })
            if expected == PlaneIndex::new(0, 0, 0) && actual == PlaneIndex::new(1, 0, 0)
    ));
}

#[test]
fn test_exhausted_source_is_fatal() {
    let image = SyntheticImage::with_shape(1, 2, 2, 2, 1, 1, PixelType::Uint8);
    let config = PyramidConfig::for_image(image.descriptor());
    let mut store = RecordingStore::default();
    let builder = PyramidBuilder::new(&mut store, "/", config).unwrap();

    let mut source = image.open_planes(vec![PlaneIndex::new(0, 0, 0)]).unwrap();
    let result = builder.build(source.as_mut());

    assert!(matches!(
        result,
        Err(PyramidError::SourceExhausted(index)) if index == PlaneIndex::new(1, 0, 0)
    ));
}

#[test]
fn test_source_errors_propagate() {
    let config = PyramidConfig::for_image(
        SyntheticImage::with_shape(1, 2, 2, 1, 1, 1, PixelType::Uint8).descriptor(),
    );
    let mut store = RecordingStore::default();
    let builder = PyramidBuilder::new(&mut store, "/", config).unwrap();
    let mut failing = std::iter::once(Err::<SourcePlane, _>(SourceError::Unavailable(
        "gone".into(),
    )));

    assert!(matches!(
        builder.build(&mut failing),
        Err(PyramidError::SourceError(SourceError::Unavailable(_)))
    ));
}

#[test]
fn test_wrong_plane_shape_is_rejected() {
    let config = PyramidConfig::for_image(
        SyntheticImage::with_shape(1, 4, 4, 1, 1, 1, PixelType::Uint8).descriptor(),
    );
    let mut store = RecordingStore::default();
    let builder = PyramidBuilder::new(&mut store, "/", config).unwrap();
    let plane = Plane::filled(2, 4, 0u8).unwrap();
    let mut source = std::iter::once(Ok(SourcePlane::present(PlaneIndex::new(0, 0, 0), plane)));

    assert!(matches!(
        builder.build(&mut source),
        Err(PyramidError::PlaneShape { height: 2, .. })
    ));
}

#[test]
fn test_invalid_config() {
    let mut config = PyramidConfig::for_image(
        SyntheticImage::with_shape(1, 4, 4, 1, 1, 1, PixelType::Uint8).descriptor(),
    );
    config.level_count = 0;
    let mut store = RecordingStore::default();
    assert!(matches!(
        PyramidBuilder::new(&mut store, "/", config),
        Err(PyramidError::InvalidConfig(_))
    ));
}
