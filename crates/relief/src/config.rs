//! Service configuration, read from environment variables.

use std::{env, path::PathBuf};

use crate::{
    errors::ConfigError,
    exaggeration::DEFAULT_EXAGGERATION,
    image_server::WORLD_ELEVATION_URL,
};

/// Which backend feeds the exaggeration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Remote tiled elevation service at the given URL.
    ImageServer { url: String },
    /// Offline Perlin terrain.
    Synthetic { seed: u32 },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub source: SourceKind,
    pub exaggeration: f32,
    /// Directory with the viewer front end and station CSV.
    pub static_dir: PathBuf,
    /// Station CSV location, relative to the viewer page.
    pub stations_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            source: SourceKind::ImageServer {
                url: WORLD_ELEVATION_URL.to_string(),
            },
            exaggeration: DEFAULT_EXAGGERATION,
            static_dir: PathBuf::from("./static"),
            stations_url: "antartica.csv".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let exaggeration = match lookup("EXAGGERATION") {
            Some(value) => parse_factor("EXAGGERATION", &value)?,
            None => defaults.exaggeration,
        };

        let source = match lookup("ELEVATION_SOURCE").as_deref() {
            None | Some("image-server") => SourceKind::ImageServer {
                url: lookup("ELEVATION_URL").unwrap_or_else(|| WORLD_ELEVATION_URL.to_string()),
            },
            Some("synthetic") => {
                let seed = match lookup("SYNTHETIC_SEED") {
                    Some(value) => value.parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                        name: "SYNTHETIC_SEED",
                        value,
                    })?,
                    None => 42,
                };
                SourceKind::Synthetic { seed }
            }
            Some(other) => return Err(ConfigError::UnknownSource(other.to_string())),
        };

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);
        let stations_url = lookup("STATIONS_URL").unwrap_or(defaults.stations_url);

        Ok(Self {
            port,
            source,
            exaggeration,
            static_dir,
            stations_url,
        })
    }
}

fn parse_factor(name: &'static str, value: &str) -> Result<f32, ConfigError> {
    let factor = value
        .trim()
        .parse::<f32>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })?;

    if !factor.is_finite() {
        return Err(ConfigError::NotFinite {
            name,
            value: factor,
        });
    }
    Ok(factor)
}
