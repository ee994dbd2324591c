use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use ngff_export::export::{export_image, export_plate};
use ngff_export::source::{DirectoryImage, ImageSource, Plate};

use super::ExportArgs;

/// Export an image directory
pub fn run_image(input: PathBuf, args: &ExportArgs) -> Result<()> {
    let options = args.options()?;
    let image = DirectoryImage::open(&input)
        .with_context(|| format!("Failed to open image directory: {}", input.display()))?;

    let descriptor = image.descriptor();
    info!("ngff-export - image to OME-NGFF");
    info!("Input:  {} (image {})", input.display(), descriptor.id);
    info!(
        "Size:   x={} y={} z={} c={} t={} ({})",
        descriptor.size_x,
        descriptor.size_y,
        descriptor.size_z,
        descriptor.size_c,
        descriptor.size_t,
        descriptor.pixel_type
    );
    if let Some(cache_dir) = &options.cache_dir {
        info!("Cache:  {}", cache_dir.display());
    }

    let output = export_image(&image, args.output(), &options)
        .with_context(|| format!("Failed to export image {}", descriptor.id))?;
    println!("Exported image {} to {}", descriptor.id, output.display());
    Ok(())
}

/// Export a plate described by a plate.json file
pub fn run_plate(input: PathBuf, args: &ExportArgs) -> Result<()> {
    let options = args.options()?;
    let plate = Plate::load(&input)
        .with_context(|| format!("Failed to load plate: {}", input.display()))?;

    info!("ngff-export - plate to OME-NGFF");
    info!("Input:  {} (plate {})", input.display(), plate.id);
    info!(
        "Grid:   {} rows x {} columns, fields {}..={}",
        plate.row_labels.len(),
        plate.column_labels.len(),
        plate.fields.start(),
        plate.fields.end()
    );

    let output = export_plate(&plate, args.output(), &options)
        .with_context(|| format!("Failed to export plate {}", plate.id))?;
    println!("Exported plate {} to {}", plate.id, output.display());
    Ok(())
}
