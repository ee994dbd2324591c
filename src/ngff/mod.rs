//! # NGFF Metadata Module
//!
//! OME-NGFF records and the functions that write them into group attributes.
//!
//! Every record lives under the `ome` attribute key next to the NGFF
//! `version`:
//!
//! ```json
//! {
//!   "ome": {
//!     "version": "0.5",
//!     "multiscales": [{"axes": [...], "datasets": [{"path": "0", "coordinateTransformations": [...]}]}],
//!     "omero": {"channels": [...], "rdefs": {...}}
//!   },
//!   "_creator": {"name": "ngff-export", "version": "..."}
//! }
//! ```
//!
//! Well groups carry `ome.well`, the plate root carries `ome.plate`.

mod axes;
mod metadata;

pub use axes::{
    marshal, marshal_axes, marshal_transformations, Axis, AxisType, CoordinateTransformation,
    DEFAULT_ZOOM,
};
pub use metadata::{
    write_creator, write_multiscales, write_omero, write_plate, write_well, Acquisition, Creator,
    Dataset, Multiscale, NamedEntry, Omero, OmeroChannel, OmeroWindow, PlateRecord, PlateWell,
    Rdefs, WellImage, WellRecord, NGFF_VERSION, OME_KEY,
};
