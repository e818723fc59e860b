//! Vertical exaggeration of elevation tiles.
//!
//! [`ExaggeratedElevationSource`] wraps any other [`ElevationSource`] and
//! multiplies every sample it returns by a fixed factor, so relief reads
//! clearly from far away. Everything else about the wrapped source (tile
//! addressing, metadata, failures) is passed through as is.

use async_trait::async_trait;

use crate::{
    errors::SourceError,
    source::ElevationSource,
    tile::{TileData, TileId},
};

/// Factor applied when none is configured.
pub const DEFAULT_EXAGGERATION: f32 = 5.0;

/// Decorator that scales the samples of an inner elevation source.
#[derive(Debug, Clone)]
pub struct ExaggeratedElevationSource<S> {
    inner: S,
    exaggeration: f32,
}

impl<S: ElevationSource> ExaggeratedElevationSource<S> {
    /// Wraps `inner` using [`DEFAULT_EXAGGERATION`].
    pub fn new(inner: S) -> Self {
        Self::with_exaggeration(inner, DEFAULT_EXAGGERATION)
    }

    pub fn with_exaggeration(inner: S, exaggeration: f32) -> Self {
        Self {
            inner,
            exaggeration,
        }
    }

    pub fn exaggeration(&self) -> f32 {
        self.exaggeration
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ElevationSource> ElevationSource for ExaggeratedElevationSource<S> {
    async fn load(&self) -> Result<(), SourceError> {
        self.inner.load().await
    }

    async fn fetch_tile(&self, tile: TileId) -> Result<TileData, SourceError> {
        let data = self.inner.fetch_tile(tile).await?;
        // No clamping, and no-data sentinels are scaled like any other sample.
        let factor = self.exaggeration;
        Ok(data.map_values(|v| v * factor))
    }

    fn describe(&self) -> String {
        format!("{} x{}", self.inner.describe(), self.exaggeration)
    }
}
