use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::axes::{Axis, CoordinateTransformation};
use crate::source::{ChannelInfo, ImageDescriptor, PlateAcquisition};
use crate::store::{StorageBackend, StoreError};

/// NGFF version written into every record
pub const NGFF_VERSION: &str = "0.5";

/// Attribute key holding the NGFF records of a group
pub const OME_KEY: &str = "ome";

/// One resolution level of a multiscale image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub path: String,
    #[serde(rename = "coordinateTransformations")]
    pub coordinate_transformations: Vec<CoordinateTransformation>,
}

impl Dataset {
    /// Pair level paths with their transformations, level by level
    pub fn zip(paths: &[String], transformations: Vec<Vec<CoordinateTransformation>>) -> Vec<Self> {
        paths
            .iter()
            .zip(transformations)
            .map(|(path, coordinate_transformations)| Dataset {
                path: path.clone(),
                coordinate_transformations,
            })
            .collect()
    }
}

/// Multiscale image record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Multiscale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub axes: Vec<Axis>,
    pub datasets: Vec<Dataset>,
}

/// One field entry of a well record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellImage {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellRecord {
    pub images: Vec<WellImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

/// Well reference inside a plate record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateWell {
    pub path: String,
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    #[serde(rename = "columnIndex")]
    pub column_index: usize,
}

impl PlateWell {
    pub fn new(row_label: &str, column_label: &str, row_index: usize, column_index: usize) -> Self {
        Self {
            path: format!("{}/{}", row_label, column_label),
            row_index,
            column_index,
        }
    }
}

/// Acquisition entry of a plate record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquisition {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximumfieldcount: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starttime: Option<i64>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endtime: Option<i64>,
}

impl From<&PlateAcquisition> for Acquisition {
    fn from(acquisition: &PlateAcquisition) -> Self {
        let millis = |time: &Option<DateTime<Utc>>| time.map(|t| t.timestamp_millis());
        Self {
            id: acquisition.id,
            name: acquisition.name.clone(),
            maximumfieldcount: acquisition.maximum_field_count,
            description: acquisition
                .description
                .clone()
                .filter(|description| !description.is_empty()),
            starttime: millis(&acquisition.start_time),
            endtime: millis(&acquisition.end_time),
        }
    }
}

/// Plate record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rows: Vec<NamedEntry>,
    pub columns: Vec<NamedEntry>,
    pub wells: Vec<PlateWell>,
    pub field_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisitions: Option<Vec<Acquisition>>,
}

impl PlateRecord {
    /// Plate record from row and column labels. Acquisitions are omitted
    /// when the list is empty.
    pub fn new(
        name: &str,
        row_labels: &[String],
        column_labels: &[String],
        wells: Vec<PlateWell>,
        field_count: usize,
        acquisitions: Vec<Acquisition>,
    ) -> Self {
        let named = |labels: &[String]| {
            labels
                .iter()
                .map(|name| NamedEntry { name: name.clone() })
                .collect()
        };
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            rows: named(row_labels),
            columns: named(column_labels),
            wells,
            field_count,
            acquisitions: (!acquisitions.is_empty()).then_some(acquisitions),
        }
    }
}

/// Display window of an omero channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmeroWindow {
    pub min: f64,
    pub max: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmeroChannel {
    pub label: String,
    pub color: String,
    pub inverted: bool,
    pub family: Option<String>,
    pub coefficient: Option<f64>,
    pub window: OmeroWindow,
    pub active: bool,
}

impl From<&ChannelInfo> for OmeroChannel {
    fn from(channel: &ChannelInfo) -> Self {
        Self {
            label: channel.label.clone(),
            color: channel.color.trim_start_matches('#').to_uppercase(),
            inverted: channel.inverted,
            family: channel.family.clone(),
            coefficient: channel.coefficient,
            window: OmeroWindow {
                min: channel.window.min,
                max: channel.window.max,
                start: channel.window.start,
                end: channel.window.end,
            },
            active: channel.active,
        }
    }
}

/// Rendering defaults of an omero record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rdefs {
    /// `greyscale` or `color`
    pub model: String,
    #[serde(rename = "defaultZ")]
    pub default_z: usize,
    #[serde(rename = "defaultT")]
    pub default_t: usize,
}

/// OMERO rendering record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omero {
    pub id: u64,
    pub channels: Vec<OmeroChannel>,
    pub rdefs: Rdefs,
    pub version: String,
}

impl Omero {
    pub fn for_image(descriptor: &ImageDescriptor) -> Self {
        let rendering = &descriptor.rendering;
        Self {
            id: 1,
            channels: descriptor.channels.iter().map(OmeroChannel::from).collect(),
            rdefs: Rdefs {
                model: if rendering.greyscale { "greyscale" } else { "color" }.to_string(),
                default_z: rendering.default_z,
                default_t: rendering.default_t,
            },
            version: NGFF_VERSION.to_string(),
        }
    }
}

/// Provenance stamp written as the top-level `_creator` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub version: String,
}

impl Default for Creator {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn write_ome<S: StorageBackend>(
    store: &mut S,
    group: &str,
    key: &str,
    record: Value,
) -> Result<(), StoreError> {
    store.merge_attributes(
        group,
        json!({ OME_KEY: { "version": NGFF_VERSION, key: record } }),
    )
}

/// Write the multiscales record of an image group
pub fn write_multiscales<S: StorageBackend>(
    store: &mut S,
    group: &str,
    multiscale: &Multiscale,
) -> Result<(), StoreError> {
    write_ome(store, group, "multiscales", json!([multiscale]))
}

/// Write (or replace) the well record of a well group
pub fn write_well<S: StorageBackend>(
    store: &mut S,
    group: &str,
    images: &[WellImage],
) -> Result<(), StoreError> {
    let record = WellRecord {
        images: images.to_vec(),
    };
    write_ome(store, group, "well", serde_json::to_value(record)?)
}

/// Write the plate record of a plate root group
pub fn write_plate<S: StorageBackend>(
    store: &mut S,
    group: &str,
    plate: &PlateRecord,
) -> Result<(), StoreError> {
    write_ome(store, group, "plate", serde_json::to_value(plate)?)
}

/// Write the omero rendering record of an image group
pub fn write_omero<S: StorageBackend>(
    store: &mut S,
    group: &str,
    omero: &Omero,
) -> Result<(), StoreError> {
    write_ome(store, group, "omero", serde_json::to_value(omero)?)
}

/// Stamp a group with the `_creator` attribute
pub fn write_creator<S: StorageBackend>(
    store: &mut S,
    group: &str,
    creator: &Creator,
) -> Result<(), StoreError> {
    store.merge_attributes(group, json!({ "_creator": creator }))
}
