//! Declarative description of the 3D scene handed to the browser viewer.
//!
//! The browser mapping engine does all rendering, camera control, label
//! placement and search. This document only tells it what to build: the
//! basemap, where to get exaggerated terrain tiles, the station layer loaded
//! from CSV, and which widgets to show.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{errors::ConfigError, exaggeration::DEFAULT_EXAGGERATION};

/// Route template the viewer uses to request terrain tiles.
pub const TILE_URL_TEMPLATE: &str = "/tiles/{level}/{row}/{col}";

/// The only label placement the engine accepts for labels with callouts.
pub const CALLOUT_LABEL_PLACEMENT: &str = "above-center";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub basemap: String,
    pub ground: Ground,
    pub camera: Camera,
    pub environment: Environment,
    pub popup: Popup,
    pub alpha_compositing: bool,
    pub quality_profile: String,
    pub stations: StationLayer,
    pub search: SearchWidget,
}

/// Terrain surface: exaggerated tiles served by this service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ground {
    pub tile_url_template: String,
    pub exaggeration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub latitude: f64,
    pub longitude: f64,
    /// Height above the ellipsoid, in meters.
    pub z: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Sun position date, RFC 3339.
    pub lighting_date: String,
    pub direct_shadows_enabled: bool,
    pub ambient_occlusion_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub dock_enabled: bool,
    pub dock_button_enabled: bool,
    pub dock_breakpoint: bool,
}

/// Point layer of research stations, read by the browser from a CSV file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationLayer {
    pub url: String,
    pub elevation_mode: String,
    pub return_z: bool,
    pub symbol: PointSymbol,
    pub label: Label,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointSymbol {
    pub primitive: String,
    pub size: f32,
    pub color: String,
    pub outline_color: String,
    pub outline_size: f32,
    pub vertical_offset: VerticalOffset,
    pub callout: Option<Callout>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Field template, e.g. `{Stationname} - {Country}`.
    pub expression: String,
    pub placement: String,
    pub color: String,
    /// RGBA, alpha in 0..=1.
    pub halo_color: Vec<f32>,
    pub halo_size: f32,
    pub size: f32,
    pub vertical_offset: VerticalOffset,
    pub callout: Option<Callout>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerticalOffset {
    pub screen_length: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_world_length: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_world_length: Option<f32>,
}

/// Line connecting a symbol or label to its anchor on the ground.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Callout {
    pub size: f32,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchWidget {
    pub position: String,
}

impl SceneDocument {
    /// Antarctic station scene with the given terrain exaggeration.
    pub fn antarctica(exaggeration: f32, stations_url: impl Into<String>) -> Self {
        Self {
            basemap: "gray".to_string(),
            ground: Ground {
                tile_url_template: TILE_URL_TEMPLATE.to_string(),
                exaggeration,
            },
            camera: Camera {
                latitude: -84.0,
                longitude: 2.4609375,
                z: 10_000_000.0,
                tilt: None,
            },
            environment: Environment {
                lighting_date: "2015-01-01T00:00:00-04:00".to_string(),
                direct_shadows_enabled: false,
                ambient_occlusion_enabled: false,
            },
            popup: Popup {
                dock_enabled: true,
                dock_button_enabled: true,
                dock_breakpoint: false,
            },
            alpha_compositing: true,
            quality_profile: "high".to_string(),
            stations: StationLayer {
                url: stations_url.into(),
                elevation_mode: "relative-to-ground".to_string(),
                return_z: false,
                symbol: PointSymbol {
                    primitive: "circle".to_string(),
                    size: 8.0,
                    color: "#4c397f".to_string(),
                    outline_color: "white".to_string(),
                    outline_size: 1.0,
                    vertical_offset: VerticalOffset {
                        screen_length: 20.0,
                        max_world_length: None,
                        min_world_length: None,
                    },
                    callout: Some(Callout {
                        size: 1.5,
                        color: "#4c397f".to_string(),
                        border_color: None,
                    }),
                },
                label: Label {
                    expression: "{Stationname} - {Country}".to_string(),
                    placement: CALLOUT_LABEL_PLACEMENT.to_string(),
                    color: "black".to_string(),
                    halo_color: vec![255.0, 255.0, 255.0, 0.7],
                    halo_size: 2.0,
                    size: 10.0,
                    vertical_offset: VerticalOffset {
                        screen_length: 150.0,
                        max_world_length: Some(2000.0),
                        min_world_length: Some(30.0),
                    },
                    callout: Some(Callout {
                        size: 0.5,
                        color: "black".to_string(),
                        border_color: Some("rgba(255, 255, 255, 0.7)".to_string()),
                    }),
                },
            },
            search: SearchWidget {
                position: "top-right".to_string(),
            },
        }
    }

    /// Checks combinations the viewer engine would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ground.exaggeration.is_finite() {
            return Err(ConfigError::InvalidScene(format!(
                "exaggeration must be finite, got {}",
                self.ground.exaggeration
            )));
        }

        let label = &self.stations.label;
        if label.callout.is_some() && label.placement != CALLOUT_LABEL_PLACEMENT {
            return Err(ConfigError::InvalidScene(format!(
                "labels with callouts must use {CALLOUT_LABEL_PLACEMENT:?} placement, got {:?}",
                label.placement
            )));
        }

        if self.stations.url.trim().is_empty() {
            return Err(ConfigError::InvalidScene(
                "station layer url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::antarctica(DEFAULT_EXAGGERATION, "antartica.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_is_valid() {
        let scene = SceneDocument::default();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.ground.exaggeration, 5.0);
        assert_eq!(scene.stations.url, "antartica.csv");
    }

    #[test]
    fn test_callout_label_requires_above_center() {
        let mut scene = SceneDocument::default();
        scene.stations.label.placement = "center-right".to_string();
        assert!(matches!(scene.validate(), Err(ConfigError::InvalidScene(_))));

        scene.stations.label.callout = None;
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_non_finite_exaggeration_rejected() {
        let scene = SceneDocument::antarctica(f32::NAN, "stations.csv");
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(SceneDocument::default()).unwrap();
        assert_eq!(json["ground"]["tileUrlTemplate"], TILE_URL_TEMPLATE);
        assert_eq!(json["camera"]["latitude"], -84.0);
        assert!(json["camera"].get("tilt").is_none());
        assert_eq!(json["stations"]["label"]["expression"], "{Stationname} - {Country}");
        assert_eq!(json["search"]["position"], "top-right");
    }
}
