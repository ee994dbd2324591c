//! # Plane Cache
//!
//! Optional on-disk store of full-resolution planes, keyed by image id and
//! plane index. An export that is interrupted and re-run reads the planes it
//! already fetched from here instead of requesting them from the source again.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! └── {image_id}/
//!     ├── 000-000-000.npy     # z-c-t, zero padded
//!     ├── 001-000-000.npy
//!     └── ...
//! ```
//!
//! Entries are never invalidated: the presence of a file is enough to
//! suppress a fetch. The cache grows without bound and outlives the export
//! that created it.

mod error;
pub mod npy;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::plane::{Plane, PlaneIndex};

pub use error::CacheError;

/// File name of a plane inside an image directory: `{z:03}-{c:03}-{t:03}.npy`.
pub fn plane_file_name(index: PlaneIndex) -> String {
    format!("{:03}-{:03}-{:03}.npy", index.z, index.c, index.t)
}

/// Directory-backed plane cache
#[derive(Debug, Clone)]
pub struct PlaneCache {
    root: PathBuf,
}

impl PlaneCache {
    /// Create a cache rooted at `root`. Nothing is created on disk until the
    /// first [`store`](Self::store).
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for one plane of one image
    pub fn entry_path(&self, image_id: u64, index: PlaneIndex) -> PathBuf {
        self.root
            .join(image_id.to_string())
            .join(plane_file_name(index))
    }

    /// Whether a plane is cached
    pub fn has(&self, image_id: u64, index: PlaneIndex) -> bool {
        self.entry_path(image_id, index).is_file()
    }

    /// Read a cached plane.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if there is no entry for the plane.
    pub fn load(&self, image_id: u64, index: PlaneIndex) -> Result<Plane, CacheError> {
        let path = self.entry_path(image_id, index);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(path))
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Cache hit for image {} plane {}", image_id, index);
        npy::read_plane(&mut BufReader::new(file))
    }

    /// Persist a plane, creating the image directory if needed.
    ///
    /// An existing entry is left untouched; storing the same plane twice in
    /// one run indicates a caller bug and is reported as a warning.
    pub fn store(&self, image_id: u64, index: PlaneIndex, plane: &Plane) -> Result<(), CacheError> {
        let path = self.entry_path(image_id, index);
        if path.exists() {
            warn!(
                "Cache entry {} already exists, keeping the existing plane",
                path.display()
            );
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write under a temporary name so an interrupted run never leaves a
        // truncated entry that would later count as a hit.
        let partial = path.with_extension("npy.partial");
        {
            let mut writer = BufWriter::new(File::create(&partial)?);
            npy::write_plane(&mut writer, plane)?;
            writer.flush()?;
        }
        fs::rename(&partial, &path)?;
        debug!("Cached image {} plane {} at {}", image_id, index, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_entry_path_layout() {
        let cache = PlaneCache::new("/tmp/cache");
        let path = cache.entry_path(42, PlaneIndex::new(3, 12, 101));
        assert_eq!(path, PathBuf::from("/tmp/cache/42/003-012-101.npy"));
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempdir().unwrap();
        let cache = PlaneCache::new(dir.path());
        let index = PlaneIndex::new(1, 0, 2);
        let plane = Plane::from_elements(2, 3, vec![1u16, 2, 3, 4, 5, 6]).unwrap();

        assert!(!cache.has(7, index));
        cache.store(7, index, &plane).unwrap();
        assert!(cache.has(7, index));
        assert!(dir.path().join("7").join("001-000-002.npy").is_file());
        assert!(!dir.path().join("7").join("001-000-002.npy.partial").exists());

        let loaded = cache.load(7, index).unwrap();
        assert_eq!(loaded, plane);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let cache = PlaneCache::new(dir.path());
        let result = cache.load(1, PlaneIndex::new(0, 0, 0));
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_existing_entry_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let cache = PlaneCache::new(dir.path());
        let index = PlaneIndex::new(0, 0, 0);

        let first = Plane::filled(2, 2, 1u8).unwrap();
        let second = Plane::filled(2, 2, 2u8).unwrap();
        cache.store(5, index, &first).unwrap();
        cache.store(5, index, &second).unwrap();

        assert_eq!(cache.load(5, index).unwrap(), first);
    }

    #[test]
    fn test_images_are_isolated() {
        let dir = tempdir().unwrap();
        let cache = PlaneCache::new(dir.path());
        let index = PlaneIndex::new(0, 0, 0);
        cache.store(1, index, &Plane::filled(1, 1, 0i32).unwrap()).unwrap();

        assert!(cache.has(1, index));
        assert!(!cache.has(2, index));
    }
}
