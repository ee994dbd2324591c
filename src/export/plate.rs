use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::error::ExportError;
use super::image::{add_image, output_name, ExportOptions};
use super::progress::Progress;
use crate::ngff::{
    write_creator, write_plate, write_well, Acquisition, PlateRecord, PlateWell, WellImage,
    NGFF_VERSION,
};
use crate::source::{ImageSource, Plate};
use crate::store::{join_path, StorageBackend, ZarrStore};

/// Result of exporting a plate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateExport {
    pub plate_id: u64,
    /// Images written
    pub images: usize,
    /// Wells holding at least one image, as `(row, column)` indices
    pub wells: Vec<(usize, usize)>,
    /// One more than the highest field index written
    pub field_count: usize,
}

/// Write every image of `plate` under `<row>/<column>/<field>` of the store
/// root, then the plate record.
///
/// Wells are visited in plate order and fields in index order. The well
/// record is rewritten after each image so an interrupted export leaves
/// consistent well metadata behind. Wells sharing a grid position add to one
/// record.
///
/// # Errors
///
/// Returns [`ExportError::EmptyPlate`] when no well holds an image. No plate
/// record is written in that case.
pub fn add_plate<S, I>(
    store: &mut S,
    plate: &Plate<I>,
    options: &ExportOptions,
) -> Result<PlateExport, ExportError>
where
    S: StorageBackend,
    I: ImageSource,
{
    let mut progress = Progress::new(plate.position_count());
    let mut wells = BTreeSet::new();
    let mut well_images: BTreeMap<(usize, usize), Vec<WellImage>> = BTreeMap::new();
    let mut images_written = 0;
    let mut field_count = 0;

    for well in &plate.wells {
        let (row, column) = plate.well_labels(well)?;
        let row_group = join_path("/", row);
        let column_group = join_path(&row_group, column);

        for field in plate.fields.clone() {
            progress.advance();
            let Some(sample) = well.sample(field) else {
                continue;
            };

            let field_name = field.to_string();
            let field_group = join_path(&column_group, &field_name);
            wells.insert((well.row, well.column));
            let images = well_images.entry((well.row, well.column)).or_default();
            images.retain(|image| image.path != field_name);
            images.push(WellImage {
                path: field_name,
                acquisition: sample.acquisition,
            });

            store.require_group(&row_group)?;
            store.require_group(&column_group)?;
            let export = add_image(store, &field_group, &sample.image, options)?;
            write_well(store, &column_group, images)?;
            debug!("Image {} written to {}", export.image_id, field_group);

            images_written += 1;
            field_count = field_count.max(field + 1);
            info!("{}", progress.status());
        }
    }

    if wells.is_empty() {
        return Err(ExportError::EmptyPlate(plate.id));
    }

    let mut well_records = Vec::with_capacity(wells.len());
    for &(row_index, column_index) in &wells {
        let (row, column) = plate.labels(row_index, column_index)?;
        well_records.push(PlateWell::new(row, column, row_index, column_index));
    }
    let acquisitions = plate.acquisitions.iter().map(Acquisition::from).collect();
    let record = PlateRecord::new(
        &plate.name,
        &plate.row_labels,
        &plate.column_labels,
        well_records,
        field_count,
        acquisitions,
    );
    write_plate(store, "/", &record)?;

    Ok(PlateExport {
        plate_id: plate.id,
        images: images_written,
        wells: wells.into_iter().collect(),
        field_count,
    })
}

/// Export a plate to `<output_dir>/<id>.zarr` and return that path.
pub fn export_plate<I: ImageSource>(
    plate: &Plate<I>,
    output_dir: &Path,
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    options.validate()?;
    let path = output_dir.join(output_name(plate.id));
    info!("Exporting to {} (NGFF {})", path.display(), NGFF_VERSION);

    let mut store = ZarrStore::create(&path)?;
    let export = add_plate(&mut store, plate, options)?;
    write_creator(&mut store, "/", &options.creator)?;

    info!(
        "Finished plate {}: {} images in {} wells",
        export.plate_id,
        export.images,
        export.wells.len()
    );
    Ok(path)
}
