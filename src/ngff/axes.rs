use serde::{Deserialize, Serialize};

use crate::source::PhysicalSizes;

/// Zoom factor between successive levels along x and y
pub const DEFAULT_ZOOM: f64 = 2.0;

/// Kind of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Time,
    Channel,
    Space,
}

/// One named dimension of a multiscale image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Axis {
    fn new(name: &str, axis_type: AxisType, unit: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            axis_type,
            unit,
        }
    }
}

/// Transformation from array indices to physical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CoordinateTransformation {
    /// Per-axis scale factors for the listed axes
    Scale {
        scale: Vec<f64>,
        #[serde(rename = "axisIndices")]
        axis_indices: Vec<usize>,
    },
}

/// Axis list for an image: t, c, z when their extent exceeds one, then y, x.
///
/// Spatial axes carry the lower-cased unit of their physical size when known.
pub fn marshal_axes(size_t: usize, size_c: usize, size_z: usize, sizes: &PhysicalSizes) -> Vec<Axis> {
    let unit = |name: &str| sizes.get(name).map(|length| length.unit.to_lowercase());

    let mut axes = Vec::with_capacity(5);
    if size_t > 1 {
        axes.push(Axis::new("t", AxisType::Time, None));
    }
    if size_c > 1 {
        axes.push(Axis::new("c", AxisType::Channel, None));
    }
    if size_z > 1 {
        axes.push(Axis::new("z", AxisType::Space, unit("z")));
    }
    for name in ["y", "x"] {
        axes.push(Axis::new(name, AxisType::Space, unit(name)));
    }
    axes
}

/// One transformation list per level.
///
/// Axes with a known physical size get `size * zoom^level` along x and y and
/// their unscaled size along z. A level's list is empty when no size is known.
pub fn marshal_transformations(
    axes: &[Axis],
    sizes: &PhysicalSizes,
    levels: usize,
    zoom: f64,
) -> Vec<Vec<CoordinateTransformation>> {
    (0..levels)
        .map(|level| {
            let factor = zoom.powi(level as i32);
            let (scale, axis_indices): (Vec<f64>, Vec<usize>) = axes
                .iter()
                .enumerate()
                .filter_map(|(i, axis)| {
                    let size = sizes.get(&axis.name)?;
                    let value = match axis.name.as_str() {
                        "x" | "y" => size.value * factor,
                        _ => size.value,
                    };
                    Some((value, i))
                })
                .unzip();

            if scale.is_empty() {
                Vec::new()
            } else {
                vec![CoordinateTransformation::Scale {
                    scale,
                    axis_indices,
                }]
            }
        })
        .collect()
}

/// Axes and per-level transformations for an image with `levels` levels,
/// using [`DEFAULT_ZOOM`].
pub fn marshal(
    size_t: usize,
    size_c: usize,
    size_z: usize,
    sizes: &PhysicalSizes,
    levels: usize,
) -> (Vec<Axis>, Vec<Vec<CoordinateTransformation>>) {
    let axes = marshal_axes(size_t, size_c, size_z, sizes);
    let transformations = marshal_transformations(&axes, sizes, levels, DEFAULT_ZOOM);
    (axes, transformations)
}
