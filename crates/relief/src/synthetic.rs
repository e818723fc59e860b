//! Perlin noise terrain, served through the same tile interface as a real
//! elevation service.
//!
//! Useful for running the viewer offline and for tests. Tiles use a
//! geographic quad-tree: level 0 is a single tile covering the globe in
//! degrees, and every level doubles the rows and columns.

use async_trait::async_trait;
use noise::{NoiseFn, Perlin};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    errors::SourceError,
    source::ElevationSource,
    tile::{Extent, TileData, TileId},
};

const WORLD: Extent = Extent::new(-180.0, -90.0, 180.0, 90.0);

/// Deepest level served; deeper tiles would overflow the row/col space.
pub const MAX_LEVEL: u32 = 24;

/// Generates elevation tiles from multiple octaves of Perlin noise.
#[derive(Debug)]
pub struct SyntheticSource {
    perlin: Perlin,
    /// Base elevation in meters.
    base_elevation: f64,
    /// Amplitude of terrain variation in meters.
    height_scale: f64,
    /// Spatial frequency, per degree.
    frequency: f64,
    octaves: u32,
    /// Samples per tile edge.
    tile_size: u32,
    loaded: AtomicBool,
}

impl SyntheticSource {
    /// Creates a source with rolling mid-altitude terrain.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 500.0,
            height_scale: 1500.0,
            frequency: 0.05,
            octaves: 5,
            tile_size: 65,
            loaded: AtomicBool::new(false),
        }
    }

    /// Ice-sheet terrain: a high plateau with a few ranges poking through.
    pub fn antarctica(seed: u32) -> Self {
        Self {
            base_elevation: 2300.0, // Mean ice surface ~2300m
            height_scale: 1800.0,
            frequency: 0.03,
            octaves: 6,
            ..Self::new(seed)
        }
    }

    pub fn with_base_elevation(mut self, elevation: f64) -> Self {
        self.base_elevation = elevation;
        self
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    pub fn with_frequency(mut self, freq: f64) -> Self {
        self.frequency = freq;
        self
    }

    /// Sets the number of samples along each tile edge (at least 2).
    pub fn with_tile_size(mut self, size: u32) -> Self {
        self.tile_size = size.max(2);
        self
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Elevation at a lon/lat position, using fractal Brownian motion.
    pub fn elevation_at(&self, lon: f64, lat: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([lon * frequency, lat * frequency]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        self.base_elevation + (total / max_amplitude) * self.height_scale
    }

    /// Extent of `tile` in degrees, or `None` outside the quad-tree.
    pub fn tile_extent(tile: TileId) -> Option<Extent> {
        if tile.level > MAX_LEVEL {
            return None;
        }
        let count = 1u32 << tile.level;
        if tile.row >= count || tile.col >= count {
            return None;
        }

        let span_x = WORLD.width() / count as f64;
        let span_y = WORLD.height() / count as f64;
        let xmin = WORLD.xmin + tile.col as f64 * span_x;
        let ymax = WORLD.ymax - tile.row as f64 * span_y;

        Some(Extent::new(xmin, ymax - span_y, xmin + span_x, ymax))
    }

    fn render(&self, extent: Extent) -> Vec<f32> {
        let size = self.tile_size as usize;
        let step_x = extent.width() / (size - 1) as f64;
        let step_y = extent.height() / (size - 1) as f64;

        let mut values = Vec::with_capacity(size * size);
        for row in 0..size {
            let lat = extent.ymax - row as f64 * step_y;
            for col in 0..size {
                let lon = extent.xmin + col as f64 * step_x;
                values.push(self.elevation_at(lon, lat) as f32);
            }
        }
        values
    }
}

#[async_trait]
impl ElevationSource for SyntheticSource {
    async fn load(&self) -> Result<(), SourceError> {
        self.loaded.store(true, Ordering::Release);
        tracing::debug!("Synthetic elevation source ready");
        Ok(())
    }

    async fn fetch_tile(&self, tile: TileId) -> Result<TileData, SourceError> {
        if !self.loaded.load(Ordering::Acquire) {
            return Err(SourceError::NotLoaded);
        }
        let extent = Self::tile_extent(tile).ok_or(SourceError::TileOutOfRange { tile })?;

        Ok(TileData {
            values: self.render(extent),
            width: self.tile_size,
            height: self.tile_size,
            extent,
            max_z_error: 0.0,
            no_data_value: f32::MIN,
        })
    }

    fn describe(&self) -> String {
        format!("synthetic terrain ({}px tiles)", self.tile_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_consistency() {
        let source = SyntheticSource::new(42);
        let a = source.elevation_at(-62.5, -64.8);
        let b = source.elevation_at(-62.5, -64.8);
        assert!((a - b).abs() < 0.001);
    }

    #[test]
    fn test_elevation_range() {
        let source = SyntheticSource::antarctica(7);
        let elev = source.elevation_at(2.46, -84.0);
        assert!(elev >= source.base_elevation - source.height_scale);
        assert!(elev <= source.base_elevation + source.height_scale);
    }

    #[test]
    fn test_root_tile_covers_world() {
        assert_eq!(SyntheticSource::tile_extent(TileId::new(0, 0, 0)), Some(WORLD));
    }

    #[test]
    fn test_tile_extent_quadrant() {
        let extent = SyntheticSource::tile_extent(TileId::new(1, 1, 1)).unwrap();
        assert_eq!(extent, Extent::new(0.0, -90.0, 180.0, 0.0));
    }

    #[test]
    fn test_tile_extent_out_of_range() {
        assert!(SyntheticSource::tile_extent(TileId::new(2, 4, 0)).is_none());
        assert!(SyntheticSource::tile_extent(TileId::new(MAX_LEVEL + 1, 0, 0)).is_none());
    }

    #[tokio::test]
    async fn test_fetch_requires_load() {
        let source = SyntheticSource::new(1);
        let err = source.fetch_tile(TileId::new(0, 0, 0)).await.unwrap_err();
        assert!(matches!(err, SourceError::NotLoaded));
    }

    #[tokio::test]
    async fn test_tile_shape() {
        let source = SyntheticSource::new(3).with_tile_size(9);
        source.load().await.unwrap();

        let data = source.fetch_tile(TileId::new(3, 6, 2)).await.unwrap();
        assert_eq!(data.width, 9);
        assert_eq!(data.height, 9);
        assert_eq!(data.values.len(), data.sample_count());
    }

    #[tokio::test]
    async fn test_adjacent_tiles_share_edge() {
        let source = SyntheticSource::new(11).with_tile_size(5);
        source.load().await.unwrap();

        let left = source.fetch_tile(TileId::new(2, 1, 1)).await.unwrap();
        let right = source.fetch_tile(TileId::new(2, 1, 2)).await.unwrap();

        for row in 0..5 {
            let last_of_left = left.values[row * 5 + 4];
            let first_of_right = right.values[row * 5];
            assert!((last_of_left - first_of_right).abs() < 1e-3);
        }
    }
}
