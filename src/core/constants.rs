//! Engine-wide constants.
//!
//! Every threshold the map layers depend on lives here under a name, so the
//! values the hosting page and the renderer agree on are never guessed from
//! call sites. `EngineConfig` starts from these defaults.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level the base layer serves.
pub const MAX_ZOOM: u8 = 19;

/// Lowest zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Default view (São Paulo) used until data or geolocation recentres the map.
pub const DEFAULT_CENTER: (f64, f64) = (-23.5505, -46.6333);

/// Default zoom for a freshly mounted surface.
pub const DEFAULT_ZOOM: u8 = 13;

/// Zoom applied after a successful geolocation fix.
pub const GEOLOCATION_ZOOM: u8 = 14;

/// Two views closer than this (degrees) are considered the same view.
pub const VIEW_EPSILON: f64 = 1e-9;

/// Offset added to tower ids so they never collide with measurement ids.
pub const TOWER_ID_OFFSET: i64 = 10_000;

/// Signal at or above this value is "excellent" (dBm).
pub const EXCELLENT_SIGNAL_DBM: f64 = -70.0;

/// Signal at or above this value (and below excellent) is "good" (dBm).
pub const GOOD_SIGNAL_DBM: f64 = -85.0;

/// dBm that maps to heatmap intensity 0.0.
pub const HEATMAP_FLOOR_DBM: f64 = -120.0;

/// dB span that maps onto the heatmap intensity range [0, 1].
pub const HEATMAP_SPAN_DB: f64 = 80.0;

/// Grid points below this signal are treated as coverage gaps (dBm).
pub const GAP_SIGNAL_DBM: f64 = -95.0;

/// Area represented by one 100 m x 100 m grid cell.
pub const GAP_CELL_AREA_KM2: f64 = 0.01;

/// Padding kept around markers when fitting the view (pixels).
pub const FIT_BOUNDS_PADDING: f64 = 50.0;

/// Delay before the one-shot re-measure of the host element.
pub const INVALIDATE_SIZE_DELAY_MS: u64 = 100;

/// Pixel radius within which a click hits a marker glyph.
pub const MARKER_HIT_RADIUS: f64 = 8.0;

/// Pixel radius within which a click hits a recommendation star.
pub const RECOMMENDATION_HIT_RADIUS: f64 = 20.0;

/// Recommendations requested from the analysis service.
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 5;

/// Recommendations a user may select at once.
pub const MAX_SELECTED_RECOMMENDATIONS: usize = 3;

/// Radius for the nearby-tower lookup after geolocation.
pub const NEARBY_TOWER_RADIUS_KM: f64 = 5.0;

/// Default dBm threshold sent with a coverage analysis.
pub const DEFAULT_ANALYSIS_THRESHOLD_DBM: f64 = -85.0;

/// Minimum vertex count of a submittable polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// OpenStreetMap tile template installed as the base layer.
pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Attribution shown for the base layer.
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
