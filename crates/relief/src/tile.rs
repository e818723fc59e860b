//! Tile addressing and the elevation payload returned for each tile.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Address of a terrain tile in a quad-tree tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct TileId {
    /// Zoom level (0 = root).
    pub level: u32,
    pub row: u32,
    pub col: u32,
}

impl TileId {
    pub const fn new(level: u32, row: u32, col: u32) -> Self {
        Self { level, row, col }
    }

    /// Get the tile covering this one at the next coarser level.
    pub fn parent(self) -> Option<TileId> {
        if self.level == 0 {
            None
        } else {
            Some(TileId::new(self.level - 1, self.row / 2, self.col / 2))
        }
    }

    /// Get the four tiles covering this one at the next finer level.
    pub fn children(self) -> [TileId; 4] {
        let level = self.level + 1;
        let row = self.row * 2;
        let col = self.col * 2;
        [
            TileId::new(level, row, col),
            TileId::new(level, row, col + 1),
            TileId::new(level, row + 1, col),
            TileId::new(level, row + 1, col + 1),
        ]
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.row, self.col)
    }
}

/// Bounds of a tile in the source's spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Elevation samples for one tile plus the metadata describing them.
///
/// `values` is a row-major grid of `width * height` samples in meters. On the
/// wire it is base64 of little-endian `f32`s, so infinities and NaN survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    #[serde(with = "sample_encoding")]
    #[schema(value_type = String, format = Byte)]
    pub values: Vec<f32>,
    pub width: u32,
    pub height: u32,
    pub extent: Extent,
    /// Maximum error of the encoded samples, in meters.
    pub max_z_error: f32,
    /// Sentinel used by the source for cells without data.
    pub no_data_value: f32,
}

impl TileData {
    /// Applies `f` to every sample in order, keeping all metadata as is.
    pub fn map_values(mut self, f: impl Fn(f32) -> f32) -> Self {
        for value in &mut self.values {
            *value = f(*value);
        }
        self
    }

    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Base64 of the little-endian bytes of each `f32` sample.
pub mod sample_encoding {
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn encode(values: &[f32]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        BASE64.encode(bytes)
    }

    pub fn decode(text: &str) -> Result<Vec<f32>, String> {
        let bytes = BASE64.decode(text).map_err(|e| e.to_string())?;
        if bytes.len() % 4 != 0 {
            return Err(format!("{} bytes is not a whole number of f32 samples", bytes.len()));
        }
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(values))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tile() -> TileData {
        TileData {
            values: vec![1.0, 2.0, 3.0, 4.0],
            width: 2,
            height: 2,
            extent: Extent::new(0.0, 0.0, 10.0, 10.0),
            max_z_error: 0.5,
            no_data_value: -9999.0,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TileId::new(7, 12, 40).to_string(), "7/12/40");
    }

    #[test]
    fn test_parent_of_root() {
        assert_eq!(TileId::new(0, 0, 0).parent(), None);
    }

    #[test]
    fn test_children_round_trip_to_parent() {
        let tile = TileId::new(4, 3, 9);
        for child in tile.children() {
            assert_eq!(child.level, 5);
            assert_eq!(child.parent(), Some(tile));
        }
    }

    #[test]
    fn test_map_values_keeps_order_and_metadata() {
        let tile = sample_tile();
        let mapped = tile.clone().map_values(|v| v + 10.0);
        assert_eq!(mapped.values, vec![11.0, 12.0, 13.0, 14.0]);
        assert_eq!(mapped.extent, tile.extent);
        assert_eq!(mapped.max_z_error, tile.max_z_error);
        assert_eq!(mapped.no_data_value, tile.no_data_value);
        assert_eq!(mapped.sample_count(), mapped.values.len());
    }

    #[test]
    fn test_non_finite_samples_survive_json() {
        let mut tile = sample_tile();
        tile.values = vec![f32::NEG_INFINITY, f32::INFINITY, 5.0, -0.0];

        let json = serde_json::to_string(&tile).unwrap();
        assert!(!json.contains("null"));

        let back: TileData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.values, tile.values);
        assert!(back.values[0].is_infinite() && back.values[0] < 0.0);
    }

    #[test]
    fn test_values_are_little_endian_base64() {
        // 1.0f32 = 00 00 80 3f
        assert_eq!(sample_encoding::encode(&[1.0]), "AACAPw==");
        assert_eq!(sample_encoding::decode("AACAPw==").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_decode_rejects_partial_sample() {
        // Three bytes.
        assert!(sample_encoding::decode("AACA").is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample_tile()).unwrap();
        assert!(json.get("maxZError").is_some());
        assert!(json.get("noDataValue").is_some());
        assert_eq!(json["extent"]["xmax"], 10.0);
    }
}
