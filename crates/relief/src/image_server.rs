//! Client for a tiled elevation image service.
//!
//! The service describes its tiling scheme at `{endpoint}?f=json` and serves
//! each tile at `{endpoint}/tile/{level}/{row}/{col}` as a row-major grid of
//! little-endian `f32` heights. Services publishing a compressed tile format
//! (LERC and friends) are rejected when loading.

use async_trait::async_trait;
use bytes::Buf;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::{
    errors::SourceError,
    source::ElevationSource,
    tile::{Extent, TileData, TileId},
};

/// Global terrain service used by default.
pub const WORLD_ELEVATION_URL: &str =
    "https://elevation3d.arcgis.com/arcgis/rest/services/WorldElevation3D/Terrain3D/ImageServer";

const DEFAULT_NO_DATA: f32 = f32::MIN;

/// Tiling metadata published by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub tile_info: TileInfo,
    #[serde(default)]
    pub no_data_value: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileInfo {
    pub rows: u32,
    pub cols: u32,
    /// Tile encoding; absent means raw `f32`.
    #[serde(default)]
    pub format: Option<String>,
    pub origin: Origin,
    pub lods: Vec<Lod>,
}

impl TileInfo {
    /// Whether tiles are served as an uncompressed `f32` grid.
    pub fn is_raw_float(&self) -> bool {
        match self.format.as_deref() {
            None => true,
            Some(format) => ["raw", "f32", "float32"]
                .iter()
                .any(|raw| format.eq_ignore_ascii_case(raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

/// One level of detail: ground units per pixel at `level`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Lod {
    pub level: u32,
    pub resolution: f64,
}

impl ServiceInfo {
    /// Extent covered by `tile`, or `None` if the level is not published.
    pub fn tile_extent(&self, tile: TileId) -> Option<Extent> {
        let info = &self.tile_info;
        let lod = info.lods.iter().find(|lod| lod.level == tile.level)?;

        let span_x = info.cols as f64 * lod.resolution;
        let span_y = info.rows as f64 * lod.resolution;
        let xmin = info.origin.x + tile.col as f64 * span_x;
        let ymax = info.origin.y - tile.row as f64 * span_y;

        Some(Extent::new(xmin, ymax - span_y, xmin + span_x, ymax))
    }
}

/// Elevation source backed by a remote image service.
pub struct ImageServerSource {
    client: reqwest::Client,
    endpoint: String,
    info: OnceCell<ServiceInfo>,
}

impl ImageServerSource {
    /// Creates a source for the default world elevation service.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: WORLD_ELEVATION_URL.to_string(),
            info: OnceCell::new(),
        }
    }

    /// Sets a custom service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Uses an existing HTTP client (shared connection pool, custom timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Service metadata, once loaded.
    pub fn info(&self) -> Option<&ServiceInfo> {
        self.info.get()
    }

    async fn fetch_info(&self) -> Result<ServiceInfo, SourceError> {
        let url = format!("{}?f=json", self.endpoint);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status(),
                url,
            });
        }

        let text = response.text().await?;
        let info: ServiceInfo = serde_json::from_str(&text)?;

        if !info.tile_info.is_raw_float() {
            let format = info.tile_info.format.clone().unwrap_or_default();
            tracing::error!(
                "Elevation service {} serves {format} tiles, only raw f32 grids are supported",
                self.endpoint
            );
            return Err(SourceError::UnsupportedFormat { format });
        }

        tracing::info!(
            "Loaded elevation service {}: {}x{} tiles, {} levels",
            self.endpoint,
            info.tile_info.cols,
            info.tile_info.rows,
            info.tile_info.lods.len()
        );

        Ok(info)
    }
}

impl Default for ImageServerSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes a row-major little-endian `f32` grid of `rows * cols` samples.
pub fn decode_grid(
    tile: TileId,
    mut bytes: impl Buf,
    rows: u32,
    cols: u32,
) -> Result<Vec<f32>, SourceError> {
    let count = rows as usize * cols as usize;
    let expected = count * std::mem::size_of::<f32>();
    if bytes.remaining() != expected {
        return Err(SourceError::Decode {
            tile,
            expected,
            actual: bytes.remaining(),
        });
    }

    let mut values = Vec::with_capacity(count);
    while bytes.has_remaining() {
        values.push(bytes.get_f32_le());
    }
    Ok(values)
}

#[async_trait]
impl ElevationSource for ImageServerSource {
    async fn load(&self) -> Result<(), SourceError> {
        self.info.get_or_try_init(|| self.fetch_info()).await?;
        Ok(())
    }

    async fn fetch_tile(&self, tile: TileId) -> Result<TileData, SourceError> {
        let info = self.info.get().ok_or(SourceError::NotLoaded)?;
        let extent = info
            .tile_extent(tile)
            .ok_or(SourceError::TileOutOfRange { tile })?;

        let url = format!(
            "{}/tile/{}/{}/{}",
            self.endpoint, tile.level, tile.row, tile.col
        );
        let response = self.client.get(&url).send().await?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => return Err(SourceError::TileNotFound { tile }),
            status if !status.is_success() => {
                return Err(SourceError::Status { status, url });
            }
            _ => {}
        }

        let bytes = response.bytes().await?;
        let rows = info.tile_info.rows;
        let cols = info.tile_info.cols;
        let values = decode_grid(tile, bytes, rows, cols)?;

        Ok(TileData {
            values,
            width: cols,
            height: rows,
            extent,
            // Raw float grids are lossless.
            max_z_error: 0.0,
            no_data_value: info.no_data_value.unwrap_or(DEFAULT_NO_DATA),
        })
    }

    fn describe(&self) -> String {
        format!("image service {}", self.endpoint)
    }
}
