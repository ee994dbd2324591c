use std::cell::Cell;
use std::collections::BTreeSet;

use super::descriptor::{ChannelInfo, ImageDescriptor, PhysicalSizes};
use super::error::SourceError;
use super::plate::{Plate, PlateAcquisition, Well};
use super::{ImageSource, PlaneSource, SourcePlane};
use crate::plane::{PixelType, Plane, PlaneData, PlaneIndex};

const CHANNEL_COLORS: [&str; 4] = ["FF0000", "00FF00", "0000FF", "FFFFFF"];

/// Generated image with deterministic pixel values.
///
/// Pixel `(y, x)` of plane `(z, c, t)` holds
/// `(y * size_x + x + 17 * (z + 5c + 11t)) mod 251`, so every value fits the
/// narrowest pixel type and neighbouring planes differ.
#[derive(Debug, Clone)]
pub struct SyntheticImage {
    descriptor: ImageDescriptor,
    absent: BTreeSet<PlaneIndex>,
    offline: bool,
    fetched: Cell<usize>,
}

impl SyntheticImage {
    pub fn new(descriptor: ImageDescriptor) -> Self {
        Self {
            descriptor,
            absent: BTreeSet::new(),
            offline: false,
            fetched: Cell::new(0),
        }
    }

    /// Image with one labelled channel per `size_c` and default rendering.
    pub fn with_shape(
        id: u64,
        size_x: usize,
        size_y: usize,
        size_z: usize,
        size_c: usize,
        size_t: usize,
        pixel_type: PixelType,
    ) -> Self {
        let channels = (0..size_c)
            .map(|c| ChannelInfo {
                label: format!("channel {}", c),
                color: CHANNEL_COLORS[c % CHANNEL_COLORS.len()].to_string(),
                ..ChannelInfo::default()
            })
            .collect();
        let descriptor = ImageDescriptor::new(id, format!("synthetic {}", id), size_x, size_y, pixel_type)
            .with_dimensions(size_z, size_c, size_t)
            .with_channels(channels);
        Self::new(descriptor)
    }

    pub fn with_physical_sizes(mut self, physical_sizes: PhysicalSizes) -> Self {
        self.descriptor.physical_sizes = physical_sizes;
        self
    }

    /// Report the given plane as absent
    pub fn with_absent(mut self, index: PlaneIndex) -> Self {
        self.absent.insert(index);
        self
    }

    /// Make every [`open_planes`](ImageSource::open_planes) call fail, as a
    /// source whose server went away would.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Number of planes produced so far, absent markers included
    pub fn fetched(&self) -> usize {
        self.fetched.get()
    }

    /// The plane this image produces at `index`, or `None` if it is absent.
    pub fn plane(&self, index: PlaneIndex) -> Option<Plane> {
        if self.absent.contains(&index) {
            return None;
        }
        let d = &self.descriptor;
        let offset = 17 * (index.z + 5 * index.c + 11 * index.t);
        let data = PlaneData::from_fn(d.pixel_type, d.size_x * d.size_y, |i| ((i + offset) % 251) as f64);
        Plane::new(d.size_y, d.size_x, data).ok()
    }
}

impl ImageSource for SyntheticImage {
    fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    fn open_planes(
        &self,
        planes: Vec<PlaneIndex>,
    ) -> Result<Box<dyn PlaneSource + '_>, SourceError> {
        if self.offline {
            return Err(SourceError::Unavailable(format!(
                "image {} is offline",
                self.descriptor.id
            )));
        }
        Ok(Box::new(planes.into_iter().map(move |index| {
            self.fetched.set(self.fetched.get() + 1);
            Ok(SourcePlane {
                index,
                plane: self.plane(index),
            })
        })))
    }
}

/// A plate of synthetic single-plane images, every well fully populated.
///
/// Image ids are `plate_id * 1000 + n` with `n` counting from 1 in well and
/// field order. All fields belong to one acquisition with id `plate_id`.
pub fn synthetic_plate(
    plate_id: u64,
    rows: usize,
    columns: usize,
    fields: usize,
    size: usize,
    pixel_type: PixelType,
) -> Plate<SyntheticImage> {
    let row_labels = (0..rows).map(row_label).collect();
    let column_labels = (1..=columns).map(|c| c.to_string()).collect();
    let acquisition_id = plate_id as i64;

    let mut next_id = plate_id * 1000;
    let mut wells = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        for column in 0..columns {
            let mut well = Well::new(row, column);
            for field in 0..fields {
                next_id += 1;
                let image = SyntheticImage::with_shape(next_id, size, size, 1, 1, 1, pixel_type);
                well = well.with_sample(field, image, Some(acquisition_id));
            }
            wells.push(well);
        }
    }

    let mut acquisition = PlateAcquisition::new(acquisition_id, "synthetic run");
    acquisition.maximum_field_count = Some(fields);
    Plate::new(plate_id, format!("synthetic plate {}", plate_id), row_labels, column_labels)
        .with_wells(wells)
        .with_acquisitions(vec![acquisition])
}

/// Spreadsheet-style row label: A..Z, then AA, AB, ...
fn row_label(mut row: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (row % 26) as u8);
        if row < 26 {
            break;
        }
        row = row / 26 - 1;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}
