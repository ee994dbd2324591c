use serde::{Deserialize, Serialize};

use super::error::SourceError;
use crate::plane::PixelType;

fn one() -> usize {
    1
}

/// A physical length: value plus unit name (e.g. `micrometer`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: String,
}

impl Length {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// Length in micrometers
    pub fn micrometers(value: f64) -> Self {
        Self::new(value, "micrometer")
    }
}

/// Physical size of one pixel along each spatial axis, where known
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSizes {
    #[serde(default)]
    pub x: Option<Length>,
    #[serde(default)]
    pub y: Option<Length>,
    #[serde(default)]
    pub z: Option<Length>,
}

impl PhysicalSizes {
    /// Physical size for an axis name (`x`, `y` or `z`)
    pub fn get(&self, axis: &str) -> Option<&Length> {
        match axis {
            "x" => self.x.as_ref(),
            "y" => self.y.as_ref(),
            "z" => self.z.as_ref(),
            _ => None,
        }
    }

    /// True when no axis has a known size
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }
}

/// Display window of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelWindow {
    pub min: f64,
    pub max: f64,
    pub start: f64,
    pub end: f64,
}

impl Default for ChannelWindow {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 255.0,
            start: 0.0,
            end: 255.0,
        }
    }
}

/// Rendering settings of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelInfo {
    pub label: String,
    /// Hex RGB color without the leading `#`
    pub color: String,
    pub inverted: bool,
    pub family: Option<String>,
    pub coefficient: Option<f64>,
    pub window: ChannelWindow,
    pub active: bool,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        Self {
            label: String::new(),
            color: "FFFFFF".to_string(),
            inverted: false,
            family: Some("linear".to_string()),
            coefficient: Some(1.0),
            window: ChannelWindow::default(),
            active: true,
        }
    }
}

/// Image-level rendering defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingDefaults {
    pub greyscale: bool,
    pub default_z: usize,
    pub default_t: usize,
}

/// Everything the exporter needs to know about an image besides its pixels.
///
/// This is also the schema of the `image.json` file read by
/// [`DirectoryImage`](super::DirectoryImage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub size_x: usize,
    pub size_y: usize,
    #[serde(default = "one")]
    pub size_z: usize,
    #[serde(default = "one")]
    pub size_c: usize,
    #[serde(default = "one")]
    pub size_t: usize,
    pub pixel_type: PixelType,
    #[serde(default)]
    pub physical_sizes: PhysicalSizes,
    #[serde(default)]
    pub channels: Vec<ChannelInfo>,
    #[serde(default)]
    pub rendering: RenderingDefaults,
}

impl ImageDescriptor {
    /// Single-plane image of the given size
    pub fn new(id: u64, name: impl Into<String>, size_x: usize, size_y: usize, pixel_type: PixelType) -> Self {
        Self {
            id,
            name: name.into(),
            size_x,
            size_y,
            size_z: 1,
            size_c: 1,
            size_t: 1,
            pixel_type,
            physical_sizes: PhysicalSizes::default(),
            channels: Vec::new(),
            rendering: RenderingDefaults::default(),
        }
    }

    /// Set the z, c, t extents
    pub fn with_dimensions(mut self, size_z: usize, size_c: usize, size_t: usize) -> Self {
        self.size_z = size_z;
        self.size_c = size_c;
        self.size_t = size_t;
        self
    }

    /// Set the physical pixel sizes
    pub fn with_physical_sizes(mut self, physical_sizes: PhysicalSizes) -> Self {
        self.physical_sizes = physical_sizes;
        self
    }

    /// Set the channel list
    pub fn with_channels(mut self, channels: Vec<ChannelInfo>) -> Self {
        self.channels = channels;
        self
    }

    /// Total number of planes (z × c × t)
    pub fn plane_count(&self) -> usize {
        self.size_z * self.size_c * self.size_t
    }

    /// Check that every extent is non-zero and the channel list, if given,
    /// matches the channel count.
    pub fn validate(&self) -> Result<(), SourceError> {
        let extents = [
            ("size_x", self.size_x),
            ("size_y", self.size_y),
            ("size_z", self.size_z),
            ("size_c", self.size_c),
            ("size_t", self.size_t),
        ];
        if let Some((name, _)) = extents.iter().find(|(_, size)| *size == 0) {
            return Err(SourceError::InvalidDescriptor(format!(
                "image {}: {} must be at least 1",
                self.id, name
            )));
        }
        if !self.channels.is_empty() && self.channels.len() != self.size_c {
            return Err(SourceError::InvalidDescriptor(format!(
                "image {}: {} channels described but size_c is {}",
                self.id,
                self.channels.len(),
                self.size_c
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults() {
        let json = r#"{"id": 12, "size_x": 640, "size_y": 480, "pixel_type": "uint16"}"#;
        let descriptor: ImageDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.size_z, 1);
        assert_eq!(descriptor.size_c, 1);
        assert_eq!(descriptor.size_t, 1);
        assert!(descriptor.physical_sizes.is_empty());
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_descriptor_physical_sizes() {
        let json = r#"{
            "id": 3, "size_x": 10, "size_y": 10, "size_z": 4, "pixel_type": "uint8",
            "physical_sizes": {"x": {"value": 0.65, "unit": "micrometer"}, "z": {"value": 2.0, "unit": "micrometer"}}
        }"#;
        let descriptor: ImageDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.physical_sizes.get("x").unwrap().value, 0.65);
        assert!(descriptor.physical_sizes.get("y").is_none());
        assert_eq!(descriptor.physical_sizes.get("z").unwrap().value, 2.0);
        assert_eq!(descriptor.plane_count(), 4);
    }

    #[test]
    fn test_validate_rejects_zero_extent() {
        let descriptor = ImageDescriptor::new(1, "bad", 10, 10, PixelType::Uint8).with_dimensions(0, 1, 1);
        assert!(matches!(
            descriptor.validate(),
            Err(SourceError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_validate_rejects_channel_count_mismatch() {
        let descriptor = ImageDescriptor::new(1, "bad", 10, 10, PixelType::Uint8)
            .with_dimensions(1, 2, 1)
            .with_channels(vec![ChannelInfo::default()]);
        assert!(descriptor.validate().is_err());
    }
}
