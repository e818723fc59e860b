pub mod config;
pub mod errors;
pub mod exaggeration;
pub mod handlers;
pub mod image_server;
pub mod scene;
pub mod source;
pub mod synthetic;
pub mod tile;

use std::{path::Path, sync::Arc};

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
};
use utoipa::OpenApi;

use crate::{
    config::{ServiceConfig, SourceKind},
    errors::ConfigError,
    exaggeration::ExaggeratedElevationSource,
    handlers::{get_openapi, get_scene, get_tile, health_check},
    image_server::ImageServerSource,
    scene::SceneDocument,
    source::SharedSource,
    synthetic::SyntheticSource,
};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health_check, handlers::get_tile, handlers::get_scene),
    components(schemas(tile::TileData, tile::Extent, scene::SceneDocument)),
    tags(
        (name = "tiles", description = "Exaggerated terrain tiles"),
        (name = "scene", description = "Viewer scene description")
    )
)]
pub struct ApiDoc;

/// Builds the underlying source from config and wraps it in the
/// exaggeration layer. The returned source is not loaded yet.
pub fn build_source(config: &ServiceConfig) -> SharedSource {
    match &config.source {
        SourceKind::ImageServer { url } => Arc::new(ExaggeratedElevationSource::with_exaggeration(
            ImageServerSource::new().with_endpoint(url.clone()),
            config.exaggeration,
        )),
        SourceKind::Synthetic { seed } => Arc::new(ExaggeratedElevationSource::with_exaggeration(
            SyntheticSource::antarctica(*seed),
            config.exaggeration,
        )),
    }
}

pub fn build_scene(config: &ServiceConfig) -> Result<SceneDocument, ConfigError> {
    let scene = SceneDocument::antarctica(config.exaggeration, config.stations_url.clone());
    scene.validate()?;
    Ok(scene)
}

pub fn create_router(source: SharedSource, scene: SceneDocument, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/scene", get(get_scene))
        .route("/tiles/{level}/{row}/{col}", get(get_tile))
        .route("/api-docs/openapi.json", get(get_openapi))
        // Viewer page and station CSV
        .fallback_service(ServeDir::new(static_dir))
        .layer(Extension(source))
        .layer(Extension(Arc::new(scene)))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}

/// Loads the elevation source, then serves until the listener closes.
///
/// A source that fails to load aborts startup with its own error.
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let scene = build_scene(&config)?;
    let source = build_source(&config);

    tracing::info!("Loading elevation source: {}", source.describe());
    source.load().await?;

    let app = create_router(source, scene, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
