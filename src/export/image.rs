use std::path::{Path, PathBuf};

use log::info;

use super::error::ExportError;
use crate::cache::PlaneCache;
use crate::ngff::{
    marshal, write_creator, write_multiscales, write_omero, Creator, Dataset, Multiscale, Omero,
    NGFF_VERSION,
};
use crate::pyramid::{
    level_count_with_target, PyramidBuilder, PyramidConfig, PyramidOutput, PyramidStats, TARGET_SIZE,
};
use crate::source::{ImageSource, SourceError, SourcePlane};
use crate::store::{StorageBackend, ZarrStore};

/// Options shared by image and plate export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Plane cache root. Planes found here are not requested from the source.
    pub cache_dir: Option<PathBuf>,
    /// Square spatial chunk edge, whole planes when `None`
    pub chunk_size: Option<usize>,
    /// Largest extent of the smallest pyramid level
    pub min_level_size: usize,
    pub creator: Creator,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            chunk_size: None,
            min_level_size: TARGET_SIZE,
            creator: Creator::default(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.chunk_size == Some(0) {
            return Err(ExportError::InvalidOptions(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if self.min_level_size == 0 {
            return Err(ExportError::InvalidOptions(
                "minimum level size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of exporting one image into a group
#[derive(Debug, Clone)]
pub struct ImageExport {
    pub image_id: u64,
    /// Level array names, full resolution first
    pub paths: Vec<String>,
    pub stats: PyramidStats,
}

impl ImageExport {
    pub fn level_count(&self) -> usize {
        self.paths.len()
    }
}

/// Name of the hierarchy written for an image or plate id
pub fn output_name(id: u64) -> String {
    format!("{}.zarr", id)
}

/// Write the pyramid of `image` into `group` together with its multiscales
/// and omero records.
pub fn add_image<S, I>(
    store: &mut S,
    group: &str,
    image: &I,
    options: &ExportOptions,
) -> Result<ImageExport, ExportError>
where
    S: StorageBackend,
    I: ImageSource + ?Sized,
{
    let descriptor = image.descriptor();
    store.require_group(group)?;

    let levels = level_count_with_target(descriptor.size_x, descriptor.size_y, options.min_level_size);
    let config = PyramidConfig::for_image(descriptor)
        .with_level_count(levels)
        .with_chunk_size(options.chunk_size);

    let cache = options.cache_dir.as_ref().map(PlaneCache::new);
    let mut builder = PyramidBuilder::new(store, group, config)?;
    if let Some(cache) = cache.as_ref() {
        builder = builder.with_cache(cache, descriptor.id);
    }

    let required = builder.required_planes();
    let PyramidOutput { paths, stats } = if required.is_empty() {
        // Fully cached: no need to reach the source at all.
        builder.build(&mut std::iter::empty::<Result<SourcePlane, SourceError>>())?
    } else {
        let mut source = image.open_planes(required)?;
        builder.build(source.as_mut())?
    };

    let (axes, transformations) = marshal(
        descriptor.size_t,
        descriptor.size_c,
        descriptor.size_z,
        &descriptor.physical_sizes,
        paths.len(),
    );
    let multiscale = Multiscale {
        name: (!descriptor.name.is_empty()).then(|| descriptor.name.clone()),
        axes,
        datasets: Dataset::zip(&paths, transformations),
    };
    write_multiscales(store, group, &multiscale)?;
    write_omero(store, group, &Omero::for_image(descriptor))?;

    Ok(ImageExport {
        image_id: descriptor.id,
        paths,
        stats,
    })
}

/// Export one image to `<output_dir>/<id>.zarr` and return that path.
pub fn export_image<I>(image: &I, output_dir: &Path, options: &ExportOptions) -> Result<PathBuf, ExportError>
where
    I: ImageSource + ?Sized,
{
    options.validate()?;
    let path = output_dir.join(output_name(image.descriptor().id));
    info!("Exporting to {} (NGFF {})", path.display(), NGFF_VERSION);

    let mut store = ZarrStore::create(&path)?;
    let export = add_image(&mut store, "/", image, options)?;
    write_creator(&mut store, "/", &options.creator)?;

    info!(
        "Finished image {}: {} levels, {}",
        export.image_id,
        export.level_count(),
        export.stats
    );
    Ok(path)
}
