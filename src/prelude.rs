//! Prelude module for common signalmap types and traits
//!
//! `use signalmap::prelude::*;` brings in the engine, the snapshot model and
//! the session types most hosts need.

pub use crate::core::{
    bounds::Bounds,
    config::{AnalysisConfig, EngineConfig, EngineProfile, InteractionConfig, SignalThresholds},
    controller::{CursorHint, InteractionMode, MapController},
    geo::{LatLng, LatLngBounds, Point},
    host::HostElement,
    viewport::Viewport,
};

pub use crate::data::model::{
    CoverageGridPoint, CoverageQuality, CoverageStats, HeatmapPoint, MapSnapshot, MarkerCategory,
    MarkerColor, PointMarker, Priority, Recommendation, SignalMeasurement, Tower,
};

pub use crate::layers::{
    base::{LayerTrait, LayerType},
    manager::LayerManager,
    reconciler::{LayerReconciler, ReconcileOutcome, ReconcileReport},
    style::Color,
    tile::TileLayerOptions,
};

pub use crate::plugins::draw::{ClosedPolygon, DrawingEvent, DrawingSession, DrawingState};

pub use crate::input::{
    events::{InputEvent, MouseButton},
    handler::{Action, InputHandler, MapCallbacks},
};

pub use crate::spatial::index::{SpatialIndex, SpatialItem};

pub use crate::rendering::context::{DrawCommand, RenderContext};

pub use crate::session::{
    analysis::{AnalysisService, DataSource},
    geolocation::{FixedLocation, GeolocationProvider, Unsupported},
    http::HttpBackend,
    LocateOutcome, MapSession, RecommendationOutcome, SelectionChange,
};

pub use crate::ui::popup::Popup;

#[cfg(feature = "egui")]
pub use crate::ui::painter::paint_context;

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
