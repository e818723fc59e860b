use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::tile::TileId;

/// Failure of an elevation source, either while loading or while fetching a tile.
///
/// Decorating sources hand this back untouched, so a caller sees exactly what
/// the underlying service reported.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Elevation service returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Service metadata parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tile {tile} not found")]
    TileNotFound { tile: TileId },

    #[error("Tile {tile} is outside the tiling scheme")]
    TileOutOfRange { tile: TileId },

    #[error("Tile {tile} has {actual} bytes, expected {expected}")]
    Decode {
        tile: TileId,
        expected: usize,
        actual: usize,
    },

    #[error("Elevation service serves {format:?} tiles, expected raw f32 grids")]
    UnsupportedFormat { format: String },

    #[error("Elevation source has not been loaded")]
    NotLoaded,

    #[error("Elevation source failed: {0}")]
    Other(String),
}

/// Invalid service configuration read from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("Unknown elevation source {0:?}, expected \"image-server\" or \"synthetic\"")]
    UnknownSource(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Source(
                e @ (SourceError::TileNotFound { .. } | SourceError::TileOutOfRange { .. }),
            ) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Source(SourceError::NotLoaded) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Elevation source not ready".to_string(),
            ),
            AppError::Source(e) => {
                error!("Elevation source error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Elevation source unavailable".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tile_is_not_found() {
        let err = AppError::from(SourceError::TileNotFound {
            tile: TileId::new(3, 1, 2),
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unloaded_source_is_unavailable() {
        let err = AppError::from(SourceError::NotLoaded);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_upstream_failure_is_bad_gateway() {
        let err = AppError::from(SourceError::Other("boom".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_source_error_message_is_transparent() {
        let err = AppError::from(SourceError::TileOutOfRange {
            tile: TileId::new(1, 5, 0),
        });
        assert_eq!(err.to_string(), "Tile 1/5/0 is outside the tiling scheme");
    }
}
