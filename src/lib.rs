//! # signalmap
//!
//! A layer-synchronising map engine for signal coverage data.
//!
//! The engine renders point measurements, towers, a signal heatmap, a
//! user-drawn analysis polygon, a sampled coverage grid and tower-placement
//! recommendations onto one shared viewport. Each category is rebuilt from an
//! immutable snapshot handed over by the hosting page, and a drawing mode lets
//! the user capture a polygon boundary by clicking on the surface.

pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod plugins;
pub mod prelude;
pub mod rendering;
pub mod session;
pub mod spatial;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::EngineConfig,
    controller::{InteractionMode, MapController},
    geo::{LatLng, LatLngBounds, Point},
    host::HostElement,
    viewport::Viewport,
};

pub use data::model::{
    CoverageGridPoint, CoverageQuality, CoverageStats, HeatmapPoint, MapSnapshot, MarkerCategory,
    MarkerColor, PointMarker, Priority, Recommendation,
};

pub use layers::{
    base::LayerTrait,
    reconciler::{LayerReconciler, ReconcileOutcome},
};

pub use input::{events::InputEvent, handler::MapCallbacks};

pub use plugins::draw::{ClosedPolygon, DrawingEvent, DrawingSession, DrawingState};

pub use rendering::context::{DrawCommand, RenderContext};

pub use session::{analysis::AnalysisService, MapSession};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Map surface is not initialized")]
    NotInitialized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Geolocation unavailable: {0}")]
    GeolocationUnavailable(String),

    #[error("Geolocation permission denied")]
    GeolocationDenied,

    #[error("Analysis request failed: {0}")]
    AnalysisRequestFailed(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initialises `env_logger` from `RUST_LOG`; safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
