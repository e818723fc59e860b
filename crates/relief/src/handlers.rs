//! HTTP request handlers for the relief API.

use std::sync::Arc;

use axum::{Extension, extract::Path, http::StatusCode, response::Json};
use utoipa::OpenApi;

use crate::{
    ApiDoc,
    errors::AppError,
    scene::SceneDocument,
    source::SharedSource,
    tile::{TileData, TileId},
};

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check passed")
    )
)]
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Get the exaggerated elevation samples for one terrain tile.
#[utoipa::path(
    get,
    path = "/tiles/{level}/{row}/{col}",
    tag = "tiles",
    params(
        ("level" = u32, Path, description = "Zoom level"),
        ("row" = u32, Path, description = "Tile row"),
        ("col" = u32, Path, description = "Tile column")
    ),
    responses(
        (status = 200, description = "Tile elevation data", body = TileData),
        (status = 404, description = "Tile not available"),
        (status = 502, description = "Elevation source failed"),
        (status = 503, description = "Elevation source not loaded")
    )
)]
pub async fn get_tile(
    Extension(source): Extension<SharedSource>,
    Path((level, row, col)): Path<(u32, u32, u32)>,
) -> Result<Json<TileData>, AppError> {
    let tile = TileId::new(level, row, col);

    let data = source.fetch_tile(tile).await.inspect_err(|e| {
        tracing::warn!("Tile {tile} failed: {e}");
    })?;

    tracing::debug!("Served tile {tile} ({} samples)", data.values.len());
    Ok(Json(data))
}

/// Get the scene description the browser viewer builds from.
#[utoipa::path(
    get,
    path = "/scene",
    tag = "scene",
    responses(
        (status = 200, description = "Scene document", body = SceneDocument)
    )
)]
pub async fn get_scene(Extension(scene): Extension<Arc<SceneDocument>>) -> Json<SceneDocument> {
    Json(scene.as_ref().clone())
}

/// OpenAPI description of this service.
pub async fn get_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
