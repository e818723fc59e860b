//! The tile data source capability shared by every elevation backend.
//!
//! A source is loaded once, then asked for tiles concurrently by the HTTP
//! layer. Implementations must be `Send + Sync` so a single instance can sit
//! behind an `Arc` and serve all requests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::SourceError,
    tile::{TileData, TileId},
};

/// Something that can hand out elevation tiles.
#[async_trait]
pub trait ElevationSource: Send + Sync {
    /// Prepare the source (connect, read service metadata).
    async fn load(&self) -> Result<(), SourceError>;

    /// Fetch the elevation samples for a single tile.
    async fn fetch_tile(&self, tile: TileId) -> Result<TileData, SourceError>;

    /// Short human readable name used in log lines.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

#[async_trait]
impl<S: ElevationSource + ?Sized> ElevationSource for Arc<S> {
    async fn load(&self) -> Result<(), SourceError> {
        (**self).load().await
    }

    async fn fetch_tile(&self, tile: TileId) -> Result<TileData, SourceError> {
        (**self).fetch_tile(tile).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Shared handle to a source, as stored in the router.
pub type SharedSource = Arc<dyn ElevationSource>;
