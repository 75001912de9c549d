//! End-to-end behaviour of the controller, reconciler and drawing session.

use signalmap::{
    layers::style::Color,
    prelude::*,
    rendering::context::PointRenderStyle,
};
use std::sync::Mutex;

const MARKER_RADIUS: f32 = 6.0;
const GRID_RADIUS: f32 = 3.0;

/// Everything the callbacks reported, in order
#[derive(Default)]
struct Recorded {
    markers: Mutex<Vec<(i64, MarkerCategory)>>,
    map_clicks: Mutex<Vec<(f64, f64)>>,
    recommendations: Mutex<Vec<String>>,
}

impl Recorded {
    fn total(&self) -> usize {
        self.markers.lock().unwrap().len()
            + self.map_clicks.lock().unwrap().len()
            + self.recommendations.lock().unwrap().len()
    }
}

fn recording_callbacks() -> (MapCallbacks, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let (m, c, r) = (recorded.clone(), recorded.clone(), recorded.clone());
    let callbacks = MapCallbacks::new()
        .on_marker_click(move |marker, category| {
            m.markers.lock().unwrap().push((marker.id, category));
        })
        .on_map_click(move |lat, lon| {
            c.map_clicks.lock().unwrap().push((lat, lon));
        })
        .on_recommendation_click(move |rec| {
            r.recommendations.lock().unwrap().push(rec.id.clone());
        });
    (callbacks, recorded)
}

fn mounted() -> (MapController, HostElement, Arc<Recorded>) {
    let host = HostElement::new("map", Point::new(800.0, 600.0));
    let (callbacks, recorded) = recording_callbacks();
    let mut controller = MapController::new(EngineConfig::default(), callbacks).unwrap();
    controller.initialize(&host).unwrap();
    (controller, host, recorded)
}

fn measurement(id: i64, lat: f64, lng: f64, dbm: f64) -> PointMarker {
    PointMarker::new(id, LatLng::new(lat, lng), format!("m{}", id))
        .with_description(format!("{} dBm", dbm))
        .with_signal(dbm)
}

fn snapshot_with(markers: Vec<PointMarker>) -> MapSnapshot {
    MapSnapshot {
        center: LatLng::new(-23.55, -46.63),
        zoom: 13,
        markers,
        ..Default::default()
    }
}

/// Clicks the container pixel under `position` and processes the event
fn click_at(controller: &mut MapController, host: &HostElement, position: LatLng) {
    let pixel = controller.viewport().unwrap().lat_lng_to_pixel(&position);
    host.dispatch(InputEvent::click(pixel));
    controller.process_events().unwrap();
}

fn rendered_points(controller: &mut MapController) -> Vec<PointRenderStyle> {
    let mut context = RenderContext::new(800, 600).unwrap();
    controller.render(&mut context).unwrap();
    context
        .get_drawing_queue()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::Point { style, .. } => Some(style.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_marker_count_matches_snapshot() {
    let (mut controller, _host, _) = mounted();

    let markers: Vec<_> = (0..7)
        .map(|i| measurement(i, -23.55 + i as f64 * 0.001, -46.63, -80.0))
        .collect();
    let report = controller.apply_snapshot(&snapshot_with(markers)).unwrap();

    assert_eq!(report.markers, ReconcileOutcome::Rebuilt { count: 7 });
    assert_eq!(controller.primitive_count(LayerType::Markers), Some(7));
    assert_eq!(
        rendered_points(&mut controller)
            .iter()
            .filter(|s| s.radius == MARKER_RADIUS)
            .count(),
        7
    );
}

#[test]
fn test_previous_generation_is_not_clickable() {
    let (mut controller, host, recorded) = mounted();

    let old = measurement(1, -23.550, -46.630, -65.0);
    controller
        .apply_snapshot(&snapshot_with(vec![
            old.clone(),
            measurement(2, -23.560, -46.640, -90.0),
        ]))
        .unwrap();
    click_at(&mut controller, &host, old.position);
    assert_eq!(
        *recorded.markers.lock().unwrap(),
        vec![(1, MarkerCategory::Measurement)]
    );

    controller
        .apply_snapshot(&snapshot_with(vec![
            measurement(3, -23.500, -46.600, -70.0),
            measurement(4, -23.520, -46.580, -72.0),
        ]))
        .unwrap();
    assert_eq!(controller.primitive_count(LayerType::Markers), Some(2));

    click_at(&mut controller, &host, old.position);
    assert_eq!(recorded.markers.lock().unwrap().len(), 1);
    assert!(controller.popup().is_none());
}

#[test]
fn test_fit_bounds_contains_every_marker() {
    let (mut controller, _host, _) = mounted();

    let markers = vec![
        measurement(1, -23.60, -46.70, -60.0),
        measurement(2, -23.45, -46.55, -75.0),
        measurement(3, -23.52, -46.68, -95.0),
        measurement(4, -23.58, -46.52, -88.0),
    ];
    let report = controller.apply_snapshot(&snapshot_with(markers.clone())).unwrap();
    assert!(report.view_fitted);

    let bounds = controller.viewport().unwrap().bounds();
    for marker in &markers {
        assert!(bounds.contains(&marker.position), "{:?} not in view", marker.position);
    }
}

#[test]
fn test_fit_bounds_wide_latitude_spans() {
    let mut failures = Vec::new();
    for south in (-80..=80).step_by(5) {
        for north in (south + 5..=84).step_by(5) {
            let (mut controller, _host, _) = mounted();
            let markers = vec![
                measurement(1, south as f64, -46.6, -60.0),
                measurement(2, north as f64, -46.5, -90.0),
            ];
            controller.apply_snapshot(&snapshot_with(markers.clone())).unwrap();

            let bounds = controller.viewport().unwrap().bounds();
            for marker in &markers {
                if !bounds.contains(&marker.position) {
                    failures.push((south, north, marker.position.lat));
                }
            }
        }
    }
    assert!(failures.is_empty(), "markers outside the fitted view: {:?}", failures);
}

#[test]
fn test_empty_markers_leave_view_and_report_no_data() {
    let (mut controller, _host, _) = mounted();
    controller
        .apply_snapshot(&snapshot_with(vec![measurement(1, -23.6, -46.7, -60.0)]))
        .unwrap();
    let before = controller.viewport().unwrap().clone();

    let report = controller.apply_snapshot(&snapshot_with(vec![])).unwrap();
    assert!(report.no_data());
    assert!(!report.view_fitted);
    assert_eq!(controller.viewport().unwrap(), &before);
    assert_eq!(controller.primitive_count(LayerType::Markers), None);
}

#[test]
fn test_submit_closes_triangle() {
    let mut drawing = DrawingSession::new();
    drawing.start_drawing().unwrap();
    for (lat, lon) in [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        drawing.add_vertex(lat, lon).unwrap();
    }

    let ring = drawing.submit().unwrap();
    assert_eq!(
        ring.to_pairs(),
        vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]
    );
    assert_eq!(drawing.state(), DrawingState::Browse);
}

#[test]
fn test_two_vertex_submit_is_rejected() {
    let mut drawing = DrawingSession::new();
    drawing.start_drawing().unwrap();
    drawing.add_vertex(0.0, 0.0).unwrap();
    drawing.add_vertex(0.0, 1.0).unwrap();

    assert!(matches!(drawing.submit(), Err(MapError::Validation(_))));
    assert_eq!(drawing.state(), DrawingState::Drawing);
    assert_eq!(
        drawing.vertices(),
        &[LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)]
    );
}

#[test]
fn test_clear_discards_vertices() {
    let mut drawing = DrawingSession::new();
    drawing.start_drawing().unwrap();
    drawing.add_vertex(0.5, 0.5).unwrap();

    assert_eq!(drawing.clear().unwrap(), DrawingEvent::Cleared);
    assert!(drawing.vertices().is_empty());
    assert_eq!(drawing.state(), DrawingState::Browse);
}

#[test]
fn test_grid_color_follows_category_markers_follow_dbm() {
    let (mut controller, _host, _) = mounted();

    let snapshot = MapSnapshot {
        coverage_grid: vec![CoverageGridPoint::new(-23.55, -46.63, -50.0, "poor")],
        ..snapshot_with(vec![measurement(1, -23.55, -46.63, -50.0)])
    };
    controller.apply_snapshot(&snapshot).unwrap();

    let points = rendered_points(&mut controller);
    let grid: Vec<_> = points.iter().filter(|s| s.radius == GRID_RADIUS).collect();
    let markers: Vec<_> = points.iter().filter(|s| s.radius == MARKER_RADIUS).collect();

    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0].fill_color, Color::from_hex("#F44336").unwrap());
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].fill_color, Color::GREEN);
}

#[test]
fn test_colliding_namespaces_render_separately() {
    let (mut controller, host, recorded) = mounted();

    let measurement = measurement(5, -23.55, -46.63, -72.0);
    let tower = PointMarker::new(10_005, LatLng::new(-23.57, -46.65), "Torre Vivo")
        .with_description("Cell ID: 1001")
        .with_color(MarkerColor::Tower);
    controller
        .apply_snapshot(&snapshot_with(vec![measurement.clone(), tower.clone()]))
        .unwrap();
    assert_eq!(controller.primitive_count(LayerType::Markers), Some(2));

    click_at(&mut controller, &host, measurement.position);
    click_at(&mut controller, &host, tower.position);
    assert_eq!(
        *recorded.markers.lock().unwrap(),
        vec![(5, MarkerCategory::Measurement), (10_005, MarkerCategory::Tower)]
    );
}

#[test]
fn test_duplicate_ids_still_render_two_glyphs() {
    let (mut controller, _host, _) = mounted();
    controller
        .apply_snapshot(&snapshot_with(vec![
            measurement(9, -23.55, -46.63, -60.0),
            measurement(9, -23.56, -46.64, -90.0),
        ]))
        .unwrap();
    assert_eq!(controller.primitive_count(LayerType::Markers), Some(2));
}

#[test]
fn test_repeated_mount_cycles_leak_nothing() {
    let host = HostElement::new("map", Point::new(800.0, 600.0));
    let (callbacks, recorded) = recording_callbacks();

    for _ in 0..4 {
        let mut controller = MapController::new(EngineConfig::default(), callbacks.clone()).unwrap();
        controller.initialize(&host).unwrap();
        assert_eq!(controller.layer_count(), 1);
        assert_eq!(host.listener_count(), 1);

        controller.set_interaction_mode(InteractionMode::Drawing);
        controller.teardown();
        controller.teardown();

        assert_eq!(host.listener_count(), 0);
        assert!(!host.is_bound());
        assert_eq!(host.dispatch(InputEvent::click(Point::new(400.0, 300.0))), 0);
        assert_eq!(controller.process_events().unwrap(), 0);
    }

    // Dropping without an explicit teardown releases too
    {
        let mut controller = MapController::new(EngineConfig::default(), callbacks).unwrap();
        controller.initialize(&host).unwrap();
    }
    assert_eq!(host.listener_count(), 0);
    assert_eq!(recorded.total(), 0);
}

#[test]
fn test_remount_after_teardown_reapplies_snapshot() {
    let (mut controller, host, _) = mounted();
    let snapshot = snapshot_with(vec![measurement(1, -23.55, -46.63, -60.0)]);
    controller.apply_snapshot(&snapshot).unwrap();

    controller.teardown();
    controller.initialize(&host).unwrap();
    let report = controller.apply_snapshot(&snapshot).unwrap();
    assert_eq!(report.markers, ReconcileOutcome::Rebuilt { count: 1 });
    assert_eq!(controller.layer_count(), 2);
}

#[test]
fn test_heatmap_toggle_leaves_other_layers() {
    let (mut controller, _host, _) = mounted();

    let mut snapshot = MapSnapshot {
        heatmap: vec![
            HeatmapPoint::new(LatLng::new(-23.55, -46.63), 0.8),
            HeatmapPoint::new(LatLng::new(-23.56, -46.64), 0.3),
        ],
        polygon: vec![
            LatLng::new(-23.54, -46.62),
            LatLng::new(-23.54, -46.64),
            LatLng::new(-23.56, -46.64),
        ],
        ..snapshot_with(vec![measurement(1, -23.55, -46.63, -60.0)])
    };
    controller.apply_snapshot(&snapshot).unwrap();
    assert_eq!(controller.is_layer_visible(LayerType::Heatmap), Some(false));

    let markers = controller.generation(LayerType::Markers);
    let polygon = controller.generation(LayerType::Polygon);
    let heatmap = controller.generation(LayerType::Heatmap);

    snapshot.show_heatmap = true;
    let report = controller.apply_snapshot(&snapshot).unwrap();
    assert_eq!(report.heatmap, ReconcileOutcome::Toggled { visible: true });
    assert_eq!(report.markers, ReconcileOutcome::Unchanged);
    assert_eq!(report.polygon, ReconcileOutcome::Unchanged);

    assert_eq!(controller.generation(LayerType::Markers), markers);
    assert_eq!(controller.generation(LayerType::Polygon), polygon);
    assert_eq!(controller.generation(LayerType::Heatmap), heatmap);
    assert_eq!(controller.is_layer_visible(LayerType::Heatmap), Some(true));
    assert_eq!(controller.primitive_count(LayerType::Heatmap), Some(2));
}

#[test]
fn test_drawing_snapshot_forwards_clicks_without_touching_polygon() {
    let (mut controller, host, recorded) = mounted();
    let snapshot = MapSnapshot {
        drawing: true,
        ..snapshot_with(vec![measurement(1, -23.55, -46.63, -60.0)])
    };
    controller.apply_snapshot(&snapshot).unwrap();
    assert_eq!(controller.mode(), InteractionMode::Drawing);

    // Even on top of a marker, a drawing click is a map click
    click_at(&mut controller, &host, LatLng::new(-23.55, -46.63));
    assert!(recorded.markers.lock().unwrap().is_empty());
    let clicks = recorded.map_clicks.lock().unwrap();
    assert_eq!(clicks.len(), 1);
    assert!((clicks[0].0 + 23.55).abs() < 1e-3);
    assert!((clicks[0].1 + 46.63).abs() < 1e-3);
    assert_eq!(controller.primitive_count(LayerType::Polygon), None);
}

#[test]
fn test_recommendation_click_opens_popup() {
    let (mut controller, host, recorded) = mounted();
    let rec = Recommendation {
        id: String::new(),
        location: signalmap::data::model::Location {
            latitude: -23.55,
            longitude: -46.63,
        },
        score: 8.456,
        priority: Priority::High,
        population_reached: 12_000,
        reason: "cluster of 4 gaps".to_string(),
        gap_count: 4,
    };
    controller
        .apply_snapshot(&MapSnapshot {
            recommendations: vec![rec.clone()],
            selected_recommendation: Some("rec-0".to_string()),
            ..snapshot_with(vec![measurement(1, -23.55, -46.63, -60.0)])
        })
        .unwrap();

    // The star sits on top of the marker and wins the hit test
    click_at(&mut controller, &host, rec.position());
    assert_eq!(*recorded.recommendations.lock().unwrap(), vec!["rec-0".to_string()]);
    assert!(recorded.markers.lock().unwrap().is_empty());

    let popup = controller.popup().unwrap();
    assert_eq!(popup.title, "Recommended tower");
    assert_eq!(popup.lines[0], "Score: 8.46/10");
}

#[test]
fn test_set_view_is_idempotent() {
    let (mut controller, _host, _) = mounted();
    let center = LatLng::new(-22.9, -43.2);
    assert!(controller.set_view(center, 12).unwrap());
    assert!(!controller.set_view(center, 12).unwrap());
    assert!(matches!(
        controller.set_view(LatLng::new(95.0, 0.0), 12),
        Err(MapError::InvalidCoordinates(_))
    ));
}

#[test]
fn test_initialize_rejects_unusable_hosts() {
    let (callbacks, _) = recording_callbacks();
    let mut controller = MapController::new(EngineConfig::default(), callbacks).unwrap();

    let detached = HostElement::detached("gone");
    assert!(matches!(
        controller.initialize(&detached),
        Err(MapError::Initialization(_))
    ));
    assert_eq!(detached.listener_count(), 0);
    assert!(!controller.is_initialized());

    // Zero size at mount is re-measured later
    let host = HostElement::new("map", Point::new(0.0, 0.0));
    controller.initialize(&host).unwrap();
    host.set_size(Point::new(1024.0, 768.0));
    controller.tick(instant::Instant::now() + std::time::Duration::from_secs(1));
    assert_eq!(controller.viewport().unwrap().size, Point::new(1024.0, 768.0));
}
