//! # Export Module
//!
//! Walks images and plates and writes their NGFF hierarchies.
//!
//! ## Layout
//!
//! ```text
//! {id}.zarr/                 # image export
//! ├── zarr.json              # ome.multiscales, ome.omero, _creator
//! ├── 0/                     # full resolution
//! └── 1/ ...
//!
//! {id}.zarr/                 # plate export
//! ├── zarr.json              # ome.plate, _creator
//! └── {row}/{column}/        # ome.well
//!     └── {field}/           # one image group as above
//! ```

mod error;
mod image;
mod plate;
mod progress;


pub use error::ExportError;
pub use image::{add_image, export_image, output_name, ExportOptions, ImageExport};
pub use plate::{add_plate, export_plate, PlateExport};
pub use progress::Progress;
