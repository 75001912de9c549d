//! Full-rebuild reconciliation of snapshot categories onto the surface.
//!
//! The reconciler remembers the last value it applied for each category. When
//! a snapshot differs, the category's layer is rebuilt from scratch and
//! swapped in with [`LayerManager::replace_layer`]; unchanged categories are
//! left alone, so a heatmap toggle never touches markers or the polygon.

use crate::{
    core::{config::EngineConfig, geo::LatLng, geo::LatLngBounds, viewport::Viewport},
    data::{
        conversion::find_id_violations,
        model::{CoverageGridPoint, HeatmapPoint, MapSnapshot, PointMarker, Recommendation},
    },
    layers::{
        base::{LayerTrait, LayerType},
        coverage::CoverageGridLayer,
        heatmap::HeatmapLayer,
        manager::LayerManager,
        marker::MarkerLayer,
        polygon::PolygonLayer,
        recommendation::RecommendationLayer,
    },
    prelude::HashMap,
    Result,
};

/// What a reconciliation pass did to one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Same data as last pass; nothing touched
    Unchanged,
    /// Previous primitives removed and `count` new ones inserted
    Rebuilt { count: usize },
    /// The category became empty and its layer was removed
    Removed,
    /// Empty marker set: layer cleared, view left as it was
    NoData,
    /// Only visibility changed; data kept
    Toggled { visible: bool },
}

impl ReconcileOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged)
    }
}

/// Per-category result of [`LayerReconciler::reconcile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The snapshot's requested center/zoom was applied
    pub view_applied: bool,
    /// The view was refitted to the marker bounds
    pub view_fitted: bool,
    pub markers: ReconcileOutcome,
    pub heatmap: ReconcileOutcome,
    pub polygon: ReconcileOutcome,
    pub coverage_grid: ReconcileOutcome,
    pub recommendations: ReconcileOutcome,
}

impl ReconcileReport {
    fn unchanged() -> Self {
        Self {
            view_applied: false,
            view_fitted: false,
            markers: ReconcileOutcome::Unchanged,
            heatmap: ReconcileOutcome::Unchanged,
            polygon: ReconcileOutcome::Unchanged,
            coverage_grid: ReconcileOutcome::Unchanged,
            recommendations: ReconcileOutcome::Unchanged,
        }
    }

    /// The marker snapshot was empty
    pub fn no_data(&self) -> bool {
        self.markers == ReconcileOutcome::NoData
    }
}

/// Last applied value of every category
#[derive(Debug, Default)]
struct Applied {
    view: Option<(LatLng, u8)>,
    markers: Option<Vec<PointMarker>>,
    heatmap: Option<Vec<HeatmapPoint>>,
    show_heatmap: Option<bool>,
    polygon: Option<Vec<LatLng>>,
    coverage_grid: Option<Vec<CoverageGridPoint>>,
    recommendations: Option<(Vec<Recommendation>, Option<String>)>,
}

/// Turns snapshots into layer generations
#[derive(Debug, Default)]
pub struct LayerReconciler {
    applied: Applied,
    generations: HashMap<LayerType, u64>,
}

impl LayerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything applied, so the next pass rebuilds every category
    pub fn reset(&mut self) {
        self.applied = Applied::default();
        self.generations.clear();
    }

    /// Number of times the category's layer has been rebuilt or removed
    pub fn generation(&self, layer_type: LayerType) -> u64 {
        self.generations.get(&layer_type).copied().unwrap_or(0)
    }

    fn bump(&mut self, layer_type: LayerType) {
        *self.generations.entry(layer_type).or_insert(0) += 1;
    }

    /// Applies `snapshot` to the surface's layers and viewport
    pub fn reconcile(
        &mut self,
        snapshot: &MapSnapshot,
        layers: &mut LayerManager,
        viewport: &mut Viewport,
        config: &EngineConfig,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::unchanged();

        report.view_applied = self.apply_view(snapshot, viewport)?;

        if self.applied.markers.as_ref() != Some(&snapshot.markers) {
            report.markers = self.rebuild_markers(&snapshot.markers, layers, config)?;
            if let ReconcileOutcome::Rebuilt { .. } = report.markers {
                if let Some(bounds) = LatLngBounds::from_points(
                    &snapshot.markers.iter().map(|m| m.position).collect::<Vec<_>>(),
                ) {
                    viewport.fit_bounds(&bounds, config.interaction.fit_padding);
                    report.view_fitted = true;
                }
            }
            self.applied.markers = Some(snapshot.markers.clone());
        }

        report.heatmap = self.reconcile_heatmap(snapshot, layers)?;

        if self.applied.polygon.as_ref() != Some(&snapshot.polygon) {
            report.polygon = self.swap(
                LayerType::Polygon,
                layers,
                (!snapshot.polygon.is_empty())
                    .then(|| Box::new(PolygonLayer::new(snapshot.polygon.clone())) as Box<dyn LayerTrait>),
            )?;
            self.applied.polygon = Some(snapshot.polygon.clone());
        }

        if self.applied.coverage_grid.as_ref() != Some(&snapshot.coverage_grid) {
            report.coverage_grid = self.swap(
                LayerType::CoverageGrid,
                layers,
                (!snapshot.coverage_grid.is_empty())
                    .then(|| Box::new(CoverageGridLayer::new(snapshot.coverage_grid.clone())) as Box<dyn LayerTrait>),
            )?;
            self.applied.coverage_grid = Some(snapshot.coverage_grid.clone());
        }

        let recommendations = (
            snapshot.recommendations.clone(),
            snapshot.selected_recommendation.clone(),
        );
        if self.applied.recommendations.as_ref() != Some(&recommendations) {
            report.recommendations = self.swap(
                LayerType::Recommendations,
                layers,
                (!snapshot.recommendations.is_empty()).then(|| {
                    Box::new(RecommendationLayer::new(
                        &snapshot.recommendations,
                        snapshot.selected_recommendation.as_deref(),
                    )) as Box<dyn LayerTrait>
                }),
            )?;
            self.applied.recommendations = Some(recommendations);
        }

        log::debug!("reconciled snapshot: {:?}", report);
        Ok(report)
    }

    /// Moves the viewport only when the requested view itself changed, so a
    /// pan or a marker fit is not undone by an unrelated snapshot
    fn apply_view(&mut self, snapshot: &MapSnapshot, viewport: &mut Viewport) -> Result<bool> {
        let requested = (snapshot.center, snapshot.zoom);
        let unchanged = self.applied.view.map_or(false, |(center, zoom)| {
            zoom == requested.1 && center.approx_eq(&requested.0, crate::constants::VIEW_EPSILON)
        });
        if unchanged {
            return Ok(false);
        }

        self.applied.view = Some(requested);
        if viewport.is_at(&requested.0, requested.1) {
            return Ok(false);
        }
        viewport.set_center(requested.0)?;
        viewport.set_zoom(requested.1);
        Ok(true)
    }

    fn rebuild_markers(
        &mut self,
        markers: &[PointMarker],
        layers: &mut LayerManager,
        config: &EngineConfig,
    ) -> Result<ReconcileOutcome> {
        if markers.is_empty() {
            if layers.remove_layer(LayerType::Markers.layer_id()).is_some() {
                self.bump(LayerType::Markers);
            }
            log::info!("marker snapshot is empty; keeping current view");
            return Ok(ReconcileOutcome::NoData);
        }

        let violations = find_id_violations(markers, config.tower_id_offset);
        if !violations.is_empty() {
            log::warn!("marker id namespace violations: {:?}", violations);
        }

        let layer = MarkerLayer::new(markers, &config.thresholds);
        let count = layer.primitive_count();
        layers.replace_layer(Box::new(layer))?;
        self.bump(LayerType::Markers);
        log::debug!("rebuilt marker layer with {} glyphs", count);
        Ok(ReconcileOutcome::Rebuilt { count })
    }

    fn reconcile_heatmap(
        &mut self,
        snapshot: &MapSnapshot,
        layers: &mut LayerManager,
    ) -> Result<ReconcileOutcome> {
        if self.applied.heatmap.as_ref() != Some(&snapshot.heatmap) {
            let outcome = if snapshot.heatmap.is_empty() {
                self.swap(LayerType::Heatmap, layers, None)?
            } else {
                let mut layer = HeatmapLayer::new(snapshot.heatmap.clone());
                layer.set_visible(snapshot.show_heatmap);
                self.swap(LayerType::Heatmap, layers, Some(Box::new(layer)))?
            };
            self.applied.heatmap = Some(snapshot.heatmap.clone());
            self.applied.show_heatmap = Some(snapshot.show_heatmap);
            return Ok(outcome);
        }

        if self.applied.show_heatmap != Some(snapshot.show_heatmap) {
            self.applied.show_heatmap = Some(snapshot.show_heatmap);
            let visible = snapshot.show_heatmap;
            if layers
                .with_layer_mut(LayerType::Heatmap.layer_id(), |layer| layer.set_visible(visible))
                .is_some()
            {
                return Ok(ReconcileOutcome::Toggled { visible });
            }
        }

        Ok(ReconcileOutcome::Unchanged)
    }

    /// Removes the category's previous layer and inserts `next`, if any
    fn swap(
        &mut self,
        layer_type: LayerType,
        layers: &mut LayerManager,
        next: Option<Box<dyn LayerTrait>>,
    ) -> Result<ReconcileOutcome> {
        let outcome = match next {
            Some(layer) => {
                let count = layer.primitive_count();
                layers.replace_layer(layer)?;
                ReconcileOutcome::Rebuilt { count }
            }
            None => match layers.remove_layer(layer_type.layer_id()) {
                Some(_) => ReconcileOutcome::Removed,
                None => return Ok(ReconcileOutcome::Unchanged),
            },
        };
        self.bump(layer_type);
        log::debug!("{} layer: {:?}", layer_type, outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    fn setup() -> (LayerReconciler, LayerManager, Viewport, EngineConfig) {
        (
            LayerReconciler::new(),
            LayerManager::new(),
            Viewport::new(LatLng::new(-23.5505, -46.6333), 13, Point::new(800.0, 600.0)).unwrap(),
            EngineConfig::default(),
        )
    }

    fn snapshot() -> MapSnapshot {
        MapSnapshot {
            center: LatLng::new(-23.5505, -46.6333),
            zoom: 13,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_markers_report_no_data_and_keep_view() {
        let (mut reconciler, mut layers, mut viewport, config) = setup();
        let before = viewport.clone();

        let report = reconciler
            .reconcile(&snapshot(), &mut layers, &mut viewport, &config)
            .unwrap();

        assert!(report.no_data());
        assert!(!report.view_fitted);
        assert_eq!(viewport, before);
    }

    #[test]
    fn test_same_snapshot_is_unchanged() {
        let (mut reconciler, mut layers, mut viewport, config) = setup();
        let mut snap = snapshot();
        snap.polygon = vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)];

        let first = reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();
        assert_eq!(first.polygon, ReconcileOutcome::Rebuilt { count: 3 });

        let second = reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();
        assert_eq!(second, ReconcileReport::unchanged());
        assert_eq!(reconciler.generation(LayerType::Polygon), 1);
    }

    #[test]
    fn test_clearing_category_removes_layer() {
        let (mut reconciler, mut layers, mut viewport, config) = setup();
        let mut snap = snapshot();
        snap.coverage_grid = vec![CoverageGridPoint::new(-23.55, -46.63, -90.0, "fair")];
        reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();
        assert!(layers.contains(LayerType::CoverageGrid.layer_id()));

        snap.coverage_grid.clear();
        let report = reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();
        assert_eq!(report.coverage_grid, ReconcileOutcome::Removed);
        assert!(!layers.contains(LayerType::CoverageGrid.layer_id()));
    }

    #[test]
    fn test_view_applied_only_when_requested_view_changes() {
        let (mut reconciler, mut layers, mut viewport, config) = setup();
        let mut snap = snapshot();
        reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();

        viewport.pan(Point::new(100.0, 0.0));
        let panned = viewport.center;
        reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();
        assert_eq!(viewport.center, panned);

        snap.zoom = 15;
        let report = reconciler
            .reconcile(&snap, &mut layers, &mut viewport, &config)
            .unwrap();
        assert!(report.view_applied);
        assert_eq!(viewport.zoom, 15);
    }
}
