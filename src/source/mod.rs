//! # Source Module
//!
//! Where pixel planes come from.
//!
//! - [`PlaneSource`]: a strictly sequential pull source of planes. Given a list
//!   of wanted plane indices it yields exactly one item per index, in that
//!   order. An item carries its own index so the consumer can verify the order.
//! - [`ImageSource`]: an image with a descriptor that can open a
//!   [`PlaneSource`] for any subset of its planes.
//!
//! Two image sources ship with the crate: [`DirectoryImage`] reads an
//! `image.json` descriptor and `.npy` planes from disk, [`SyntheticImage`]
//! generates deterministic planes for demos and tests. Plates of such images
//! are described by [`Plate`].

mod descriptor;
mod directory;
mod error;
mod plate;
mod synthetic;

use crate::plane::{Plane, PlaneIndex};

pub use descriptor::{
    ChannelInfo, ChannelWindow, ImageDescriptor, Length, PhysicalSizes, RenderingDefaults,
};
pub use directory::DirectoryImage;
pub use error::SourceError;
pub use plate::{Plate, PlateAcquisition, Well, WellSample};
pub use synthetic::{synthetic_plate, SyntheticImage};

/// One item pulled from a [`PlaneSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePlane {
    /// Index the plane belongs to
    pub index: PlaneIndex,
    /// The pixels, or `None` when the image has no plane at this position
    pub plane: Option<Plane>,
}

impl SourcePlane {
    /// A present plane
    pub fn present(index: PlaneIndex, plane: Plane) -> Self {
        Self {
            index,
            plane: Some(plane),
        }
    }

    /// An absence marker
    pub fn absent(index: PlaneIndex) -> Self {
        Self { index, plane: None }
    }
}

/// Sequential pull source of planes.
///
/// Implementations yield exactly one item per requested plane index, in the
/// requested order, and `None` once every requested plane was produced.
/// Consumers must not pull ahead of the order they requested.
pub trait PlaneSource {
    /// Pull the next plane.
    fn next_plane(&mut self) -> Option<Result<SourcePlane, SourceError>>;
}

impl<I> PlaneSource for I
where
    I: Iterator<Item = Result<SourcePlane, SourceError>>,
{
    fn next_plane(&mut self) -> Option<Result<SourcePlane, SourceError>> {
        self.next()
    }
}

/// An image that can produce its planes on demand.
pub trait ImageSource {
    /// Dimensions, pixel type, and rendering information of the image
    fn descriptor(&self) -> &ImageDescriptor;

    /// Open a source yielding the given planes in the given order.
    fn open_planes(
        &self,
        planes: Vec<PlaneIndex>,
    ) -> Result<Box<dyn PlaneSource + '_>, SourceError>;
}
