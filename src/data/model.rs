//! Snapshot data handed from the hosting session to the map engine, and the
//! wire records exchanged with the backend.
//!
//! Everything here is an immutable value. The engine never keeps any of it
//! beyond the reconciliation pass that rendered it.

use crate::{
    core::geo::LatLng,
    layers::style::Color,
};
use serde::{Deserialize, Serialize};

/// Explicit glyph color that overrides the dBm band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarkerColor {
    /// Fixed tower color (purple)
    Tower,
    Custom(Color),
}

/// Domain a rendered marker originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerCategory {
    Measurement,
    Tower,
}

impl MarkerCategory {
    /// Classifies an id by the tower namespace offset
    pub fn from_id(id: i64, tower_id_offset: i64) -> Self {
        if id >= tower_id_offset {
            MarkerCategory::Tower
        } else {
            MarkerCategory::Measurement
        }
    }
}

/// A point glyph on the marker layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub id: i64,
    pub position: LatLng,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<MarkerColor>,
    pub signal_strength_dbm: Option<f64>,
}

impl PointMarker {
    pub fn new(id: i64, position: LatLng, title: impl Into<String>) -> Self {
        Self {
            id,
            position,
            title: title.into(),
            description: None,
            color: None,
            signal_strength_dbm: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: MarkerColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_signal(mut self, dbm: f64) -> Self {
        self.signal_strength_dbm = Some(dbm);
        self
    }
}

/// One weighted sample of the heat field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub position: LatLng,
    /// Normalised to [0, 1]
    pub intensity: f64,
}

impl HeatmapPoint {
    /// Creates a point, clamping the intensity into [0, 1]
    pub fn new(position: LatLng, intensity: f64) -> Self {
        Self {
            position,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }
}

/// Quality category assigned to a grid sample by the analysis service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CoverageQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    /// Any category the engine does not recognise
    Unknown(String),
}

impl CoverageQuality {
    pub fn label(&self) -> &str {
        match self {
            CoverageQuality::Excellent => "excellent",
            CoverageQuality::Good => "good",
            CoverageQuality::Fair => "fair",
            CoverageQuality::Poor => "poor",
            CoverageQuality::Unknown(other) => other,
        }
    }
}

impl From<String> for CoverageQuality {
    fn from(value: String) -> Self {
        match value.as_str() {
            "excellent" => CoverageQuality::Excellent,
            "good" => CoverageQuality::Good,
            "fair" => CoverageQuality::Fair,
            "poor" => CoverageQuality::Poor,
            _ => CoverageQuality::Unknown(value),
        }
    }
}

impl From<&str> for CoverageQuality {
    fn from(value: &str) -> Self {
        CoverageQuality::from(value.to_string())
    }
}

impl From<CoverageQuality> for String {
    fn from(value: CoverageQuality) -> Self {
        value.label().to_string()
    }
}

/// One sample of the analysed coverage grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGridPoint {
    pub lat: f64,
    pub lng: f64,
    pub signal_dbm: f64,
    pub quality: CoverageQuality,
}

impl CoverageGridPoint {
    pub fn new(lat: f64, lng: f64, signal_dbm: f64, quality: impl Into<CoverageQuality>) -> Self {
        Self {
            lat,
            lng,
            signal_dbm,
            quality: quality.into(),
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Aggregate figures of one coverage analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub coverage_pct: f64,
    pub gap_area_km2: f64,
    pub total_area_km2: f64,
    pub avg_signal_dbm: Option<f64>,
    pub grid_points_analyzed: u64,
}

impl CoverageStats {
    /// One-line human summary
    pub fn summary(&self) -> String {
        let avg = match self.avg_signal_dbm {
            Some(dbm) => format!("{:.1} dBm", dbm),
            None => "N/A".to_string(),
        };
        format!(
            "coverage {:.1}% | gap area {:.2} km² of {:.2} km² | avg signal {} | {} grid points",
            self.coverage_pct, self.gap_area_km2, self.total_area_km2, avg, self.grid_points_analyzed
        )
    }
}

/// Response of the coverage analysis endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAnalysis {
    pub grid: Vec<CoverageGridPoint>,
    pub stats: CoverageStats,
}

/// Request of the coverage analysis endpoint; `polygon` holds closed `[lat, lng]` pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRequest {
    pub polygon: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub threshold_dbm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn to_lat_lng(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

impl From<LatLng> for Location {
    fn from(value: LatLng) -> Self {
        Self {
            latitude: value.lat,
            longitude: value.lng,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High priority",
            Priority::Medium => "Medium priority",
            Priority::Low => "Low priority",
        }
    }
}

/// Candidate tower location returned by the recommendation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub id: String,
    pub location: Location,
    pub score: f64,
    pub priority: Priority,
    pub population_reached: u64,
    pub reason: String,
    pub gap_count: u32,
}

impl Recommendation {
    pub fn position(&self) -> LatLng {
        self.location.to_lat_lng()
    }
}

/// A poorly covered area submitted for recommendations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapDescriptor {
    pub latitude: f64,
    pub longitude: f64,
    pub area_km2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub gaps: Vec<GapDescriptor>,
    pub max_recommendations: usize,
    /// Operator filter, `"all"` when unfiltered
    pub operator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

/// A signal measurement record as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMeasurement {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub signal_strength_dbm: f64,
    #[serde(default)]
    pub operator: Option<String>,
    pub signal_type: String,
    #[serde(default)]
    pub measured_at: String,
}

/// A cell tower record as served by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub operator: String,
    pub cell_id: String,
}

/// Everything the engine renders in one pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapSnapshot {
    pub center: LatLng,
    pub zoom: u8,
    pub markers: Vec<PointMarker>,
    pub heatmap: Vec<HeatmapPoint>,
    pub show_heatmap: bool,
    pub polygon: Vec<LatLng>,
    pub coverage_grid: Vec<CoverageGridPoint>,
    pub recommendations: Vec<Recommendation>,
    pub selected_recommendation: Option<String>,
    /// Surface clicks place polygon vertices instead of navigating
    pub drawing: bool,
}
