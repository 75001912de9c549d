//! Engine configuration.
//!
//! Every threshold the engine and the hosting session agree on is grouped
//! here, serialisable to JSON and validated before use. Presets are exposed
//! through [`EngineProfile`] in the same way performance presets resolve to
//! a concrete option set.

use crate::{
    core::{
        constants::{
            DEFAULT_ANALYSIS_THRESHOLD_DBM, DEFAULT_CENTER, DEFAULT_MAX_RECOMMENDATIONS,
            DEFAULT_ZOOM, EXCELLENT_SIGNAL_DBM, FIT_BOUNDS_PADDING, GAP_CELL_AREA_KM2,
            GAP_SIGNAL_DBM, GEOLOCATION_ZOOM, GOOD_SIGNAL_DBM, HEATMAP_FLOOR_DBM, HEATMAP_SPAN_DB,
            INVALIDATE_SIZE_DELAY_MS, MARKER_HIT_RADIUS, MAX_SELECTED_RECOMMENDATIONS, MAX_ZOOM,
            NEARBY_TOWER_RADIUS_KM, RECOMMENDATION_HIT_RADIUS, TOWER_ID_OFFSET,
        },
        geo::LatLng,
    },
    layers::{style::SignalCategory, tile::TileLayerOptions},
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Named configuration presets
#[derive(Debug, Clone, PartialEq)]
pub enum EngineProfile {
    /// Mouse-driven desktop hosts
    Desktop,
    /// Touch hosts: larger hit targets, slower layout settling
    Touch,
    Custom(EngineConfig),
}

impl EngineProfile {
    pub fn resolve(&self) -> EngineConfig {
        match self {
            Self::Desktop => EngineConfig::default(),
            Self::Touch => EngineConfig {
                interaction: InteractionConfig {
                    marker_hit_radius: 16.0,
                    recommendation_hit_radius: 28.0,
                    invalidate_size_delay_ms: 250,
                    ..InteractionConfig::default()
                },
                ..EngineConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self::Desktop
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: SignalThresholds,
    pub tiles: TileLayerOptions,
    pub interaction: InteractionConfig,
    pub analysis: AnalysisConfig,
    /// Added to tower ids so they never collide with measurement ids
    pub tower_id_offset: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: SignalThresholds::default(),
            tiles: TileLayerOptions::default(),
            interaction: InteractionConfig::default(),
            analysis: AnalysisConfig::default(),
            tower_id_offset: TOWER_ID_OFFSET,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.interaction.validate()?;
        self.analysis.validate()?;

        if self.tiles.max_zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "tile max_zoom {} exceeds {}",
                self.tiles.max_zoom, MAX_ZOOM
            )));
        }
        if self.tiles.url_template.is_empty() {
            return Err(MapError::Config("tile url_template is empty".to_string()));
        }
        if self.interaction.default_zoom > self.tiles.max_zoom {
            return Err(MapError::Config(format!(
                "default zoom {} exceeds tile max_zoom {}",
                self.interaction.default_zoom, self.tiles.max_zoom
            )));
        }
        if self.analysis.geolocation_zoom > self.tiles.max_zoom {
            return Err(MapError::Config(format!(
                "geolocation zoom {} exceeds tile max_zoom {}",
                self.analysis.geolocation_zoom, self.tiles.max_zoom
            )));
        }
        if self.tower_id_offset <= 0 {
            return Err(MapError::Config(
                "tower_id_offset must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// dBm thresholds for marker coloring and heatmap normalisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// At or above: excellent
    pub excellent_dbm: f64,
    /// At or above (and below excellent): good; below: poor
    pub good_dbm: f64,
    /// Maps to intensity 0.0
    pub heatmap_floor_dbm: f64,
    /// dB range mapped onto intensity [0, 1]
    pub heatmap_span_db: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            excellent_dbm: EXCELLENT_SIGNAL_DBM,
            good_dbm: GOOD_SIGNAL_DBM,
            heatmap_floor_dbm: HEATMAP_FLOOR_DBM,
            heatmap_span_db: HEATMAP_SPAN_DB,
        }
    }
}

impl SignalThresholds {
    pub fn categorize(&self, dbm: f64) -> SignalCategory {
        if dbm >= self.excellent_dbm {
            SignalCategory::Excellent
        } else if dbm >= self.good_dbm {
            SignalCategory::Good
        } else {
            SignalCategory::Poor
        }
    }

    /// `(dbm - floor) / span`, clamped to [0, 1]
    pub fn intensity(&self, dbm: f64) -> f64 {
        ((dbm - self.heatmap_floor_dbm) / self.heatmap_span_db).clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.excellent_dbm > self.good_dbm) {
            return Err(MapError::Config(format!(
                "excellent threshold {} must be above good threshold {}",
                self.excellent_dbm, self.good_dbm
            )));
        }
        if !(self.heatmap_span_db > 0.0) {
            return Err(MapError::Config(
                "heatmap_span_db must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Viewport and input tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pixels kept around markers when fitting the view
    pub fit_padding: f64,
    /// Delay of the one-shot re-measure after mount
    pub invalidate_size_delay_ms: u64,
    pub marker_hit_radius: f64,
    pub recommendation_hit_radius: f64,
    pub default_center: LatLng,
    pub default_zoom: u8,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            fit_padding: FIT_BOUNDS_PADDING,
            invalidate_size_delay_ms: INVALIDATE_SIZE_DELAY_MS,
            marker_hit_radius: MARKER_HIT_RADIUS,
            recommendation_hit_radius: RECOMMENDATION_HIT_RADIUS,
            default_center: LatLng::from(DEFAULT_CENTER),
            default_zoom: DEFAULT_ZOOM,
        }
    }
}

impl InteractionConfig {
    pub fn invalidate_size_delay(&self) -> Duration {
        Duration::from_millis(self.invalidate_size_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fit_padding >= 0.0) {
            return Err(MapError::Config("fit_padding must be >= 0".to_string()));
        }
        if !(self.marker_hit_radius > 0.0) || !(self.recommendation_hit_radius > 0.0) {
            return Err(MapError::Config("hit radii must be positive".to_string()));
        }
        if !self.default_center.is_valid() {
            return Err(MapError::Config(format!(
                "default center ({}, {}) out of range",
                self.default_center.lat, self.default_center.lng
            )));
        }
        Ok(())
    }
}

/// Coverage analysis and recommendation parameters used by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Threshold sent with a coverage analysis request
    pub threshold_dbm: f64,
    /// Grid samples strictly below this become gaps
    pub gap_threshold_dbm: f64,
    /// Area attributed to each gap sample
    pub gap_cell_area_km2: f64,
    pub max_recommendations: usize,
    pub max_selected: usize,
    pub nearby_radius_km: f64,
    pub geolocation_zoom: u8,
    pub geolocation_timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_dbm: DEFAULT_ANALYSIS_THRESHOLD_DBM,
            gap_threshold_dbm: GAP_SIGNAL_DBM,
            gap_cell_area_km2: GAP_CELL_AREA_KM2,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            max_selected: MAX_SELECTED_RECOMMENDATIONS,
            nearby_radius_km: NEARBY_TOWER_RADIUS_KM,
            geolocation_zoom: GEOLOCATION_ZOOM,
            geolocation_timeout_ms: 10_000,
        }
    }
}

impl AnalysisConfig {
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gap_cell_area_km2 > 0.0) {
            return Err(MapError::Config(
                "gap_cell_area_km2 must be positive".to_string(),
            ));
        }
        if self.max_recommendations == 0 || self.max_selected == 0 {
            return Err(MapError::Config(
                "recommendation limits must be at least 1".to_string(),
            ));
        }
        if !(self.nearby_radius_km > 0.0) {
            return Err(MapError::Config(
                "nearby_radius_km must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tower_id_offset, 10_000);
        assert_eq!(config.interaction.fit_padding, 50.0);
        assert_eq!(config.analysis.max_recommendations, 5);
        assert_eq!(config.tiles.max_zoom, 19);
    }

    #[test]
    fn test_profiles() {
        let desktop = EngineProfile::Desktop.resolve();
        let touch = EngineProfile::Touch.resolve();

        assert!(touch.interaction.marker_hit_radius > desktop.interaction.marker_hit_radius);
        assert!(touch.validate().is_ok());
        assert_eq!(EngineProfile::Custom(desktop.clone()).resolve(), desktop);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = EngineConfig::default();
        config.thresholds.excellent_dbm = -90.0;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
    }

    #[test]
    fn test_rejects_non_positive_offset() {
        let config = EngineConfig {
            tower_id_offset: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_partial_override() {
        let config =
            EngineConfig::from_json(r#"{ "interaction": { "fit_padding": 20.0 } }"#).unwrap();
        assert_eq!(config.interaction.fit_padding, 20.0);
        assert_eq!(config.interaction.marker_hit_radius, 8.0);
        assert_eq!(config.thresholds.good_dbm, -85.0);

        let round = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(round, config);
    }

    #[test]
    fn test_json_invalid_is_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "tiles": { "max_zoom": 22 } }"#),
            Err(MapError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(MapError::Serialization(_))
        ));
    }

    #[test]
    fn test_threshold_intensity() {
        let t = SignalThresholds::default();
        assert_eq!(t.intensity(-120.0), 0.0);
        assert_eq!(t.intensity(-40.0), 1.0);
    }
}
