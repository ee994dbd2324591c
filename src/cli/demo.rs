use anyhow::{Context, Result};
use log::info;

use ngff_export::export::{export_image, export_plate};
use ngff_export::plane::PixelType;
use ngff_export::source::{synthetic_plate, Length, PhysicalSizes, SyntheticImage};

use super::ExportArgs;

/// Id of the generated image or plate
const DEMO_ID: u64 = 1;

/// Export generated demo data
pub fn run(
    plate: bool,
    size: usize,
    size_z: usize,
    size_c: usize,
    size_t: usize,
    args: &ExportArgs,
) -> Result<()> {
    let options = args.options()?;
    std::fs::create_dir_all(args.output())
        .with_context(|| format!("Failed to create {}", args.output().display()))?;

    let output = if plate {
        info!("Generating a 2x3 demo plate of {}x{} images", size, size);
        let plate = synthetic_plate(DEMO_ID, 2, 3, 2, size, PixelType::Uint16);
        export_plate(&plate, args.output(), &options).context("Failed to export demo plate")?
    } else {
        info!(
            "Generating a {}x{} demo image (z={} c={} t={})",
            size, size, size_z, size_c, size_t
        );
        let image = SyntheticImage::with_shape(DEMO_ID, size, size, size_z, size_c, size_t, PixelType::Uint16)
            .with_physical_sizes(PhysicalSizes {
                x: Some(Length::micrometers(0.325)),
                y: Some(Length::micrometers(0.325)),
                z: (size_z > 1).then(|| Length::micrometers(1.0)),
            });
        export_image(&image, args.output(), &options).context("Failed to export demo image")?
    };

    println!("Demo data written to {}", output.display());
    Ok(())
}
