use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use super::descriptor::ImageDescriptor;
use super::error::SourceError;
use super::{ImageSource, PlaneSource, SourcePlane};
use crate::cache::{npy, plane_file_name};
use crate::plane::{Plane, PlaneIndex};

/// An image stored on disk as a directory of `.npy` planes.
///
/// ```text
/// {root}/
/// ├── image.json          # ImageDescriptor
/// ├── 000-000-000.npy     # z-c-t, same naming as the plane cache
/// └── ...
/// ```
///
/// A plane without a file is reported as absent.
#[derive(Debug, Clone)]
pub struct DirectoryImage {
    root: PathBuf,
    descriptor: ImageDescriptor,
}

impl DirectoryImage {
    /// Name of the descriptor file inside the image directory
    pub const DESCRIPTOR_FILE: &'static str = "image.json";

    /// Open an image directory and validate its descriptor.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, SourceError> {
        let root = root.as_ref().to_path_buf();
        let file = File::open(root.join(Self::DESCRIPTOR_FILE))?;
        let descriptor: ImageDescriptor = serde_json::from_reader(BufReader::new(file))?;
        descriptor.validate()?;
        debug!(
            "Opened image {} ({}) at {}",
            descriptor.id,
            descriptor.name,
            root.display()
        );
        Ok(Self { root, descriptor })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, index: PlaneIndex) -> Result<Option<Plane>, SourceError> {
        let path = self.root.join(plane_file_name(index));
        if !path.is_file() {
            return Ok(None);
        }
        let plane = npy::read_plane(&mut BufReader::new(File::open(&path)?))?;

        let d = &self.descriptor;
        if plane.shape() != (d.size_y, d.size_x) || plane.pixel_type() != d.pixel_type {
            return Err(SourceError::PlaneMismatch {
                index,
                height: d.size_y,
                width: d.size_x,
                pixel_type: d.pixel_type,
                found_height: plane.height(),
                found_width: plane.width(),
                found_type: plane.pixel_type(),
            });
        }
        Ok(Some(plane))
    }
}

impl ImageSource for DirectoryImage {
    fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    fn open_planes(
        &self,
        planes: Vec<PlaneIndex>,
    ) -> Result<Box<dyn PlaneSource + '_>, SourceError> {
        Ok(Box::new(planes.into_iter().map(move |index| {
            self.read(index).map(|plane| SourcePlane { index, plane })
        })))
    }
}
