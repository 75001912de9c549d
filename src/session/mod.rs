//! The hosting session.
//!
//! `MapSession` owns the authoritative application state: loaded
//! measurements and towers, filters, the drawing session, the analysis
//! results and the recommendation selection. It builds the immutable
//! [`MapSnapshot`] the controller reconciles against and talks to the
//! backend through the [`DataSource`] and [`AnalysisService`] seams.

pub mod analysis;
pub mod geolocation;
pub mod http;

use crate::{
    core::{config::EngineConfig, geo::LatLng},
    data::{
        conversion::{grid_gaps, heatmap_points, measurement_to_marker, tower_to_marker},
        model::{
            CoverageGridPoint, CoverageRequest, CoverageStats, GapDescriptor, MapSnapshot,
            Recommendation, RecommendationRequest, SignalMeasurement, Tower,
        },
    },
    layers::recommendation::recommendation_id,
    plugins::draw::{DrawingEvent, DrawingSession, DrawingState},
    prelude::HashSet,
    MapError, Result,
};
use std::sync::Arc;

pub use analysis::{AnalysisService, DataSource};
pub use geolocation::{FixedLocation, GeolocationProvider, Unsupported};
pub use http::HttpBackend;

/// Sizes of the collections fetched by [`MapSession::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub measurements: usize,
    pub towers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationOutcome {
    /// The grid has no gap; nothing was requested
    NoGaps,
    /// This many recommendations were stored
    Generated(usize),
}

/// Result of toggling one recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected,
    Deselected,
    /// The selection is full; nothing changed
    LimitReached,
}

/// Result of a geolocation recentre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateOutcome {
    pub center: LatLng,
    /// Towers found around the position, `None` when that lookup failed
    pub nearby_towers: Option<usize>,
}

pub struct MapSession {
    config: EngineConfig,
    data: Arc<dyn DataSource>,
    analysis: Arc<dyn AnalysisService>,
    geolocation: Arc<dyn GeolocationProvider>,

    measurements: Vec<SignalMeasurement>,
    towers: Vec<Tower>,
    operator_filter: Option<String>,
    signal_type_filter: Option<String>,
    show_heatmap: bool,
    show_towers: bool,
    center: LatLng,
    zoom: u8,

    drawing: DrawingSession,
    coverage_grid: Vec<CoverageGridPoint>,
    coverage_stats: Option<CoverageStats>,
    recommendations: Vec<Recommendation>,
    selected: Vec<String>,
}

impl MapSession {
    pub fn new(
        config: EngineConfig,
        data: Arc<dyn DataSource>,
        analysis: Arc<dyn AnalysisService>,
    ) -> Self {
        let center = config.interaction.default_center;
        let zoom = config.interaction.default_zoom;
        Self {
            config,
            data,
            analysis,
            geolocation: Arc::new(Unsupported),
            measurements: Vec::new(),
            towers: Vec::new(),
            operator_filter: None,
            signal_type_filter: None,
            show_heatmap: false,
            show_towers: true,
            center,
            zoom,
            drawing: DrawingSession::new(),
            coverage_grid: Vec::new(),
            coverage_stats: None,
            recommendations: Vec::new(),
            selected: Vec::new(),
        }
    }

    /// Session backed by one client for both data and analysis
    pub fn with_backend<B>(config: EngineConfig, backend: Arc<B>) -> Self
    where
        B: DataSource + AnalysisService + 'static,
    {
        Self::new(config, backend.clone(), backend)
    }

    pub fn with_geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = provider;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetches measurements and towers concurrently.
    ///
    /// A failed fetch degrades to an empty collection. The view is centred on
    /// the first measurement, else the first tower, else left alone.
    pub async fn load(&mut self) -> LoadSummary {
        let (measurements, towers) = futures::join!(self.data.measurements(), self.data.towers());

        self.measurements = measurements.unwrap_or_else(|e| {
            log::warn!("failed to load measurements: {}", e);
            Vec::new()
        });
        self.towers = towers.unwrap_or_else(|e| {
            log::warn!("failed to load towers: {}", e);
            Vec::new()
        });

        let first = self
            .measurements
            .first()
            .map(|m| (m.latitude, m.longitude))
            .or_else(|| self.towers.first().map(|t| (t.latitude, t.longitude)));
        match first.map(|(lat, lng)| LatLng::try_new(lat, lng)) {
            Some(Ok(center)) => self.center = center,
            Some(Err(e)) => log::warn!("not centring on first record: {}", e),
            None => log::info!("no measurements or towers to centre on"),
        }

        let summary = LoadSummary {
            measurements: self.measurements.len(),
            towers: self.towers.len(),
        };
        log::info!(
            "loaded {} measurements and {} towers",
            summary.measurements,
            summary.towers
        );
        summary
    }

    pub fn measurements(&self) -> &[SignalMeasurement] {
        &self.measurements
    }

    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// `None` shows every operator
    pub fn set_operator_filter(&mut self, operator: Option<String>) {
        self.operator_filter = operator.filter(|op| !op.is_empty() && op != "all");
    }

    pub fn operator_filter(&self) -> Option<&str> {
        self.operator_filter.as_deref()
    }

    /// `None` shows every signal type
    pub fn set_signal_type_filter(&mut self, signal_type: Option<String>) {
        self.signal_type_filter = signal_type.filter(|t| !t.is_empty() && t != "all");
    }

    pub fn signal_type_filter(&self) -> Option<&str> {
        self.signal_type_filter.as_deref()
    }

    /// Measurements passing both filters
    pub fn filtered_measurements(&self) -> Vec<&SignalMeasurement> {
        self.measurements
            .iter()
            .filter(|m| match &self.operator_filter {
                Some(op) => m.operator.as_deref() == Some(op.as_str()),
                None => true,
            })
            .filter(|m| match &self.signal_type_filter {
                Some(kind) => &m.signal_type == kind,
                None => true,
            })
            .collect()
    }

    /// Distinct non-empty operators, in first-seen order
    pub fn operators(&self) -> Vec<String> {
        let mut seen = HashSet::default();
        self.measurements
            .iter()
            .filter_map(|m| m.operator.as_deref())
            .filter(|op| !op.is_empty() && seen.insert(*op))
            .map(str::to_string)
            .collect()
    }

    pub fn show_heatmap(&self) -> bool {
        self.show_heatmap
    }

    pub fn set_show_heatmap(&mut self, show: bool) {
        self.show_heatmap = show;
    }

    pub fn show_towers(&self) -> bool {
        self.show_towers
    }

    pub fn set_show_towers(&mut self, show: bool) {
        self.show_towers = show;
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<()> {
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "({}, {})",
                center.lat, center.lng
            )));
        }
        self.center = center;
        self.zoom = zoom.min(self.config.tiles.max_zoom);
        Ok(())
    }

    /// Everything the controller should render right now
    pub fn snapshot(&self) -> MapSnapshot {
        let filtered = self.filtered_measurements();

        let mut markers: Vec<_> = filtered.iter().map(|m| measurement_to_marker(m)).collect();
        if self.show_towers {
            markers.extend(
                self.towers
                    .iter()
                    .filter_map(|t| tower_to_marker(t, self.config.tower_id_offset)),
            );
        }

        let visible: Vec<SignalMeasurement> = filtered.into_iter().cloned().collect();

        MapSnapshot {
            center: self.center,
            zoom: self.zoom,
            markers,
            heatmap: heatmap_points(&visible, &self.config.thresholds),
            show_heatmap: self.show_heatmap,
            polygon: self.drawing.vertices().to_vec(),
            coverage_grid: self.coverage_grid.clone(),
            recommendations: self.recommendations.clone(),
            selected_recommendation: self.selected.first().cloned(),
            drawing: self.drawing.is_drawing(),
        }
    }

    pub fn drawing_state(&self) -> DrawingState {
        self.drawing.state()
    }

    pub fn polygon(&self) -> &[LatLng] {
        self.drawing.vertices()
    }

    /// Enters drawing mode with a fresh vertex list
    pub fn start_drawing(&mut self) -> Result<DrawingEvent> {
        self.drawing.start_drawing()
    }

    /// Routes a surface click; places a vertex while drawing, otherwise ignored
    pub fn handle_map_click(&mut self, lat: f64, lon: f64) -> Result<Option<DrawingEvent>> {
        if !self.drawing.is_drawing() {
            return Ok(None);
        }
        self.drawing.add_vertex(lat, lon).map(Some)
    }

    /// Drops the polygon together with the analysis built on it
    pub fn clear_polygon(&mut self) -> Result<DrawingEvent> {
        let event = self.drawing.clear()?;
        self.coverage_grid.clear();
        self.coverage_stats = None;
        self.clear_recommendations();
        Ok(event)
    }

    pub fn coverage_grid(&self) -> &[CoverageGridPoint] {
        &self.coverage_grid
    }

    pub fn coverage_stats(&self) -> Option<&CoverageStats> {
        self.coverage_stats.as_ref()
    }

    /// Submits the drawn polygon for coverage analysis.
    ///
    /// Uses the configured threshold unless `threshold_dbm` is given. On
    /// success the grid and stats replace the previous ones and drawing mode
    /// ends; on failure nothing changes and `AnalysisRequestFailed` is returned.
    pub async fn analyze_coverage(&mut self, threshold_dbm: Option<f64>) -> Result<CoverageStats> {
        if !self.drawing.is_drawing() {
            return Err(MapError::Validation(
                "no polygon is being drawn".to_string(),
            ));
        }
        let ring = self.drawing.closed_ring()?;

        let request = CoverageRequest {
            polygon: ring.to_pairs(),
            operator: self.operator_filter.clone(),
            threshold_dbm: threshold_dbm.unwrap_or(self.config.analysis.threshold_dbm),
        };
        log::info!(
            "requesting coverage analysis for {} vertices at {} dBm",
            request.polygon.len(),
            request.threshold_dbm
        );

        let analysis = self
            .analysis
            .analyze_coverage(&request)
            .await
            .map_err(analysis_failure)?;

        self.drawing.submit()?;
        log::info!(
            "coverage analysis returned {} grid points, {:.1}% covered",
            analysis.grid.len(),
            analysis.stats.coverage_pct
        );
        self.coverage_grid = analysis.grid;
        self.coverage_stats = Some(analysis.stats.clone());
        self.clear_recommendations();
        Ok(analysis.stats)
    }

    /// Grid samples below the gap threshold
    pub fn gaps(&self) -> Vec<GapDescriptor> {
        grid_gaps(
            &self.coverage_grid,
            self.config.analysis.gap_threshold_dbm,
            self.config.analysis.gap_cell_area_km2,
        )
    }

    /// Asks for tower placements covering the current gaps
    pub async fn request_recommendations(&mut self) -> Result<RecommendationOutcome> {
        let gaps = self.gaps();
        if gaps.is_empty() {
            log::info!("no coverage gaps; skipping recommendation request");
            return Ok(RecommendationOutcome::NoGaps);
        }

        let request = RecommendationRequest {
            gaps,
            max_recommendations: self.config.analysis.max_recommendations,
            operator: self
                .operator_filter
                .clone()
                .unwrap_or_else(|| "all".to_string()),
        };
        log::info!("requesting recommendations for {} gaps", request.gaps.len());

        let response = self
            .analysis
            .recommend_towers(&request)
            .await
            .map_err(analysis_failure)?;

        self.recommendations = response
            .recommendations
            .into_iter()
            .enumerate()
            .map(|(index, mut rec)| {
                rec.id = recommendation_id(&rec, index);
                rec
            })
            .collect();
        self.selected.clear();

        log::info!("{} recommendations generated", self.recommendations.len());
        Ok(RecommendationOutcome::Generated(self.recommendations.len()))
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    /// Recommendations ordered by priority, then by descending score
    pub fn sorted_recommendations(&self) -> Vec<&Recommendation> {
        let mut sorted: Vec<_> = self.recommendations.iter().collect();
        sorted.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.score.total_cmp(&a.score))
        });
        sorted
    }

    /// Adds or removes `id` from the selection, up to the configured limit
    pub fn toggle_recommendation(&mut self, id: &str) -> Result<SelectionChange> {
        if !self.recommendations.iter().any(|r| r.id == id) {
            return Err(MapError::Validation(format!(
                "unknown recommendation '{}'",
                id
            )));
        }

        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            return Ok(SelectionChange::Deselected);
        }
        if self.selected.len() >= self.config.analysis.max_selected {
            return Ok(SelectionChange::LimitReached);
        }
        self.selected.push(id.to_string());
        Ok(SelectionChange::Selected)
    }

    /// Selects the best recommendations up to the limit, or clears the
    /// selection when every recommendation is already selected
    pub fn toggle_select_all(&mut self) {
        if !self.recommendations.is_empty() && self.selected.len() == self.recommendations.len() {
            self.selected.clear();
            return;
        }
        self.selected = self
            .sorted_recommendations()
            .into_iter()
            .take(self.config.analysis.max_selected)
            .map(|r| r.id.clone())
            .collect();
    }

    pub fn selected_recommendations(&self) -> &[String] {
        &self.selected
    }

    /// The highlighted recommendation: the first one selected
    pub fn selected_recommendation(&self) -> Option<&str> {
        self.selected.first().map(String::as_str)
    }

    pub fn clear_recommendations(&mut self) {
        self.recommendations.clear();
        self.selected.clear();
    }

    /// Recentres on the user's position and loads the towers around it.
    ///
    /// When no position is available the view is left unchanged. A failed
    /// tower lookup keeps the new view and the previous tower set.
    pub async fn locate(&mut self) -> Result<LocateOutcome> {
        let analysis = &self.config.analysis;
        let center = geolocation::locate(self.geolocation.as_ref(), analysis.geolocation_timeout())
            .await
            .map_err(|e| {
                log::warn!("geolocation failed: {}", e);
                e
            })?;

        self.center = center;
        self.zoom = analysis.geolocation_zoom;
        log::info!("located at ({:.4}, {:.4})", center.lat, center.lng);

        let nearby = match self
            .data
            .nearby_towers(center, analysis.nearby_radius_km)
            .await
        {
            Ok(towers) => {
                let count = towers.len();
                self.towers = towers;
                self.show_towers = true;
                log::info!("{} towers nearby", count);
                Some(count)
            }
            Err(e) => {
                log::warn!("failed to fetch nearby towers: {}", e);
                None
            }
        };

        Ok(LocateOutcome {
            center,
            nearby_towers: nearby,
        })
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.drawing.teardown();
    }
}

fn analysis_failure(error: MapError) -> MapError {
    log::error!("analysis request failed: {}", error);
    match error {
        MapError::AnalysisRequestFailed(_) => error,
        other => MapError::AnalysisRequestFailed(other.to_string()),
    }
}
