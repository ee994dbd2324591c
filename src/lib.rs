//! # ngff-export - Multiresolution OME-NGFF Export
//!
//! `ngff_export` converts plane-addressable images, and plates of such images,
//! into OME-NGFF (Zarr v3) hierarchies with a multiresolution pyramid per
//! image.
//!
//! ## Key Features
//!
//! - **Streaming Pyramid Builder**: Planes are pulled one at a time in t, c, z
//!   order and written into every resolution level before the next plane is
//!   requested.
//!
//! - **Resumable Exports**: An optional plane cache keeps every fetched
//!   full-resolution plane as a `.npy` file. Re-running an export reads cached
//!   planes instead of asking the source again.
//!
//! - **Sparse Images**: Sources may report planes as absent. Their positions
//!   are left unwritten and read back as zero.
//!
//! - **Plate Layout**: Plates are written as `<row>/<column>/<field>` image
//!   groups with well and plate records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ngff_export::export::{export_image, ExportOptions};
//! use ngff_export::plane::PixelType;
//! use ngff_export::source::SyntheticImage;
//!
//! let image = SyntheticImage::with_shape(1, 1024, 1024, 1, 3, 1, PixelType::Uint16);
//! let path = export_image(&image, "out".as_ref(), &ExportOptions::default())?;
//! println!("Wrote {}", path.display());
//! # Ok::<(), ngff_export::export::ExportError>(())
//! ```
//!
//! ## Modules
//!
//! - [`plane`]: pixel planes, pixel types, and order-0 halving
//! - [`cache`]: the on-disk plane cache
//! - [`source`]: image and plate sources
//! - [`store`]: the chunked-array storage backend
//! - [`pyramid`]: level planning and the pyramid builder
//! - [`ngff`]: axes, coordinate transformations, and NGFF records
//! - [`export`]: image and plate export

pub mod cache;
pub mod export;
pub mod ngff;
pub mod plane;
pub mod pyramid;
pub mod source;
pub mod store;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::cache::{CacheError, PlaneCache};
    pub use crate::export::{
        add_image, add_plate, export_image, export_plate, ExportError, ExportOptions,
    };
    pub use crate::ngff::{marshal, Axis, CoordinateTransformation, Creator};
    pub use crate::plane::{halve, PixelType, Plane, PlaneData, PlaneIndex};
    pub use crate::pyramid::{
        level_count, PyramidBuilder, PyramidConfig, PyramidError, PyramidOutput, PyramidStats,
    };
    pub use crate::source::{
        DirectoryImage, ImageDescriptor, ImageSource, Plate, PlaneSource, SourceError,
        SourcePlane, SyntheticImage,
    };
    pub use crate::store::{ArrayLayout, LevelArray, StorageBackend, StoreError, ZarrStore};
}
