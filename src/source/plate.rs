use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::directory::DirectoryImage;
use super::error::SourceError;

/// A plate acquisition run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateAcquisition {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub maximum_field_count: Option<usize>,
    #[serde(default)]
    pub description: Option<String>,
    /// Start of the run, epoch milliseconds on the wire
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    /// End of the run, epoch milliseconds on the wire
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
}

impl PlateAcquisition {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            maximum_field_count: None,
            description: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// One field of a well
#[derive(Debug, Clone)]
pub struct WellSample<I> {
    pub image: I,
    /// Acquisition the field was imaged in
    pub acquisition: Option<i64>,
}

/// A well: grid position plus its fields keyed by field index
#[derive(Debug, Clone)]
pub struct Well<I> {
    /// Row index into [`Plate::row_labels`]
    pub row: usize,
    /// Column index into [`Plate::column_labels`]
    pub column: usize,
    pub samples: BTreeMap<usize, WellSample<I>>,
}

impl<I> Well<I> {
    pub fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            samples: BTreeMap::new(),
        }
    }

    /// Add a field, replacing any sample already at that index
    pub fn with_sample(mut self, field: usize, image: I, acquisition: Option<i64>) -> Self {
        self.samples.insert(field, WellSample { image, acquisition });
        self
    }

    /// Sample at a field index, if the well has one
    pub fn sample(&self, field: usize) -> Option<&WellSample<I>> {
        self.samples.get(&field)
    }
}

/// A plate: a grid of wells, each holding a number of fields (images).
#[derive(Debug, Clone)]
pub struct Plate<I> {
    pub id: u64,
    pub name: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// Field indices visited in every well
    pub fields: RangeInclusive<usize>,
    pub acquisitions: Vec<PlateAcquisition>,
    pub wells: Vec<Well<I>>,
}

impl<I> Plate<I> {
    /// Plate with the given grid labels. The field range is derived from the
    /// wells' samples unless set explicitly.
    pub fn new(id: u64, name: impl Into<String>, row_labels: Vec<String>, column_labels: Vec<String>) -> Self {
        Self {
            id,
            name: name.into(),
            row_labels,
            column_labels,
            fields: 0..=0,
            acquisitions: Vec::new(),
            wells: Vec::new(),
        }
    }

    /// Add wells and recompute the field range from their samples.
    ///
    /// Wells sharing a grid position are merged into the first of them. A
    /// later sample replaces an earlier one at the same field.
    pub fn with_wells(mut self, wells: Vec<Well<I>>) -> Self {
        let mut merged: Vec<Well<I>> = Vec::with_capacity(wells.len());
        for well in wells {
            match merged
                .iter_mut()
                .find(|w| (w.row, w.column) == (well.row, well.column))
            {
                Some(existing) => {
                    for (field, sample) in well.samples {
                        if existing.samples.insert(field, sample).is_some() {
                            warn!(
                                "Plate {}: well ({}, {}) field {} given twice, keeping the last",
                                self.id, well.row, well.column, field
                            );
                        }
                    }
                }
                None => merged.push(well),
            }
        }
        self.wells = merged;
        self.fields = field_range(&self.wells);
        self
    }

    pub fn with_acquisitions(mut self, acquisitions: Vec<PlateAcquisition>) -> Self {
        self.acquisitions = acquisitions;
        self
    }

    /// Number of well × field positions visited during export
    pub fn position_count(&self) -> usize {
        let field_count = self.fields.end().saturating_sub(*self.fields.start()) + 1;
        self.row_labels.len() * self.column_labels.len() * field_count
    }

    /// Labels of a well as `(row, column)`.
    pub fn well_labels(&self, well: &Well<I>) -> Result<(&str, &str), SourceError> {
        self.labels(well.row, well.column)
    }

    /// Labels of the grid position `(row, column)`.
    pub fn labels(&self, row: usize, column: usize) -> Result<(&str, &str), SourceError> {
        let row_label = self.row_labels.get(row).ok_or_else(|| {
            SourceError::InvalidDescriptor(format!(
                "plate {}: well row {} outside {} rows",
                self.id,
                row,
                self.row_labels.len()
            ))
        })?;
        let column_label = self.column_labels.get(column).ok_or_else(|| {
            SourceError::InvalidDescriptor(format!(
                "plate {}: well column {} outside {} columns",
                self.id,
                column,
                self.column_labels.len()
            ))
        })?;
        Ok((row_label.as_str(), column_label.as_str()))
    }
}

fn field_range<I>(wells: &[Well<I>]) -> RangeInclusive<usize> {
    let mut fields = wells.iter().flat_map(|w| w.samples.keys().copied());
    match fields.next() {
        Some(first) => {
            let (min, max) = fields.fold((first, first), |(lo, hi), f| (lo.min(f), hi.max(f)));
            min..=max
        }
        None => 0..=0,
    }
}

#[derive(Debug, Deserialize)]
struct PlateFile {
    id: u64,
    #[serde(default)]
    name: String,
    rows: Vec<String>,
    columns: Vec<String>,
    #[serde(default)]
    fields: Option<[usize; 2]>,
    #[serde(default)]
    acquisitions: Vec<PlateAcquisition>,
    #[serde(default)]
    wells: Vec<WellFile>,
}

#[derive(Debug, Deserialize)]
struct WellFile {
    row: usize,
    column: usize,
    #[serde(default)]
    samples: Vec<SampleFile>,
}

#[derive(Debug, Deserialize)]
struct SampleFile {
    field: usize,
    /// Image directory, relative to the plate file
    image: PathBuf,
    #[serde(default)]
    acquisition: Option<i64>,
}

impl Plate<DirectoryImage> {
    /// Load a plate from a `plate.json` file.
    ///
    /// ```json
    /// {
    ///   "id": 1, "name": "screen", "rows": ["A", "B"], "columns": ["1", "2"],
    ///   "acquisitions": [{"id": 7, "name": "run", "start_time": 1600000000000}],
    ///   "wells": [{"row": 0, "column": 1, "samples": [{"field": 0, "image": "a2f0", "acquisition": 7}]}]
    /// }
    /// ```
    ///
    /// Image paths are relative to the directory containing the plate file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let file: PlateFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;

        let invalid =
            |reason: String| SourceError::InvalidDescriptor(format!("plate {}: {}", file.id, reason));
        if let Some([first, last]) = file.fields {
            if first > last {
                return Err(invalid(format!("field range {}..={} is empty", first, last)));
            }
        }

        let mut positions = BTreeSet::new();
        let mut wells = Vec::with_capacity(file.wells.len());
        for well in file.wells {
            if !positions.insert((well.row, well.column)) {
                return Err(invalid(format!(
                    "well ({}, {}) listed more than once",
                    well.row, well.column
                )));
            }
            let mut loaded = Well::new(well.row, well.column);
            for sample in well.samples {
                if loaded.samples.contains_key(&sample.field) {
                    return Err(invalid(format!(
                        "well ({}, {}) lists field {} more than once",
                        well.row, well.column, sample.field
                    )));
                }
                if let Some([first, last]) = file.fields {
                    if !(first..=last).contains(&sample.field) {
                        return Err(invalid(format!(
                            "well ({}, {}) field {} outside field range {}..={}",
                            well.row, well.column, sample.field, first, last
                        )));
                    }
                }
                let image = DirectoryImage::open(base.join(&sample.image))?;
                loaded = loaded.with_sample(sample.field, image, sample.acquisition);
            }
            wells.push(loaded);
        }

        let mut plate = Plate::new(file.id, file.name, file.rows, file.columns)
            .with_wells(wells)
            .with_acquisitions(file.acquisitions);
        if let Some([first, last]) = file.fields {
            plate.fields = first..=last;
        }
        debug!(
            "Loaded plate {} with {} wells from {}",
            plate.id,
            plate.wells.len(),
            path.display()
        );
        Ok(plate)
    }
}
