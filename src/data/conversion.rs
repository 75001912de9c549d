//! Conversions from backend records to renderable snapshot values.

use crate::{
    core::{config::SignalThresholds, geo::LatLng},
    data::model::{
        CoverageGridPoint, GapDescriptor, HeatmapPoint, MarkerCategory, MarkerColor, PointMarker,
        SignalMeasurement, Tower,
    },
    prelude::HashSet,
    MapError, Result,
};

/// Marker for a measurement: `"{operator|N/A} - {TYPE}"`, colored by its dBm
pub fn measurement_to_marker(measurement: &SignalMeasurement) -> PointMarker {
    let operator = measurement
        .operator
        .as_deref()
        .filter(|op| !op.is_empty())
        .unwrap_or("N/A");

    PointMarker::new(
        measurement.id,
        LatLng::new(measurement.latitude, measurement.longitude),
        format!("{} - {}", operator, measurement.signal_type.to_uppercase()),
    )
    .with_description(format!("{} dBm", measurement.signal_strength_dbm))
    .with_signal(measurement.signal_strength_dbm)
}

/// Marker for a tower, moved into the tower id namespace and colored purple.
/// `None` when the offset id does not fit in an `i64`.
pub fn tower_to_marker(tower: &Tower, tower_id_offset: i64) -> Option<PointMarker> {
    let Some(id) = tower.id.checked_add(tower_id_offset) else {
        log::warn!(
            "skipping tower {}: id overflows with offset {}",
            tower.id,
            tower_id_offset
        );
        return None;
    };

    Some(
        PointMarker::new(
            id,
            LatLng::new(tower.latitude, tower.longitude),
            format!("Torre {}", tower.operator),
        )
        .with_description(format!("Cell ID: {}", tower.cell_id))
        .with_color(MarkerColor::Tower),
    )
}

/// Heat field samples from measurements, intensities normalised from dBm
pub fn heatmap_points(
    measurements: &[SignalMeasurement],
    thresholds: &SignalThresholds,
) -> Vec<HeatmapPoint> {
    measurements
        .iter()
        .map(|m| {
            HeatmapPoint::new(
                LatLng::new(m.latitude, m.longitude),
                thresholds.intensity(m.signal_strength_dbm),
            )
        })
        .collect()
}

/// Grid samples strictly below `threshold_dbm`, each attributed `cell_area_km2`
pub fn grid_gaps(
    grid: &[CoverageGridPoint],
    threshold_dbm: f64,
    cell_area_km2: f64,
) -> Vec<GapDescriptor> {
    grid.iter()
        .filter(|p| p.signal_dbm < threshold_dbm)
        .map(|p| GapDescriptor {
            latitude: p.lat,
            longitude: p.lng,
            area_km2: cell_area_km2,
        })
        .collect()
}

/// A marker id that breaks the measurement/tower namespace convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdViolation {
    /// The same id appears more than once
    Duplicate(i64),
    /// A tower-colored marker sits below the offset, or a plain one above it
    WrongNamespace { id: i64, expected: MarkerCategory },
}

/// Reports every id that violates the namespace convention
pub fn find_id_violations(markers: &[PointMarker], tower_id_offset: i64) -> Vec<IdViolation> {
    let mut seen = HashSet::default();
    let mut reported = HashSet::default();
    let mut violations = Vec::new();

    for marker in markers {
        if !seen.insert(marker.id) && reported.insert(marker.id) {
            violations.push(IdViolation::Duplicate(marker.id));
        }

        let expected = if marker.color == Some(MarkerColor::Tower) {
            MarkerCategory::Tower
        } else {
            MarkerCategory::Measurement
        };
        if MarkerCategory::from_id(marker.id, tower_id_offset) != expected {
            violations.push(IdViolation::WrongNamespace {
                id: marker.id,
                expected,
            });
        }
    }

    violations
}

/// Fails with `Validation` when any id violates the namespace convention
pub fn check_id_namespaces(markers: &[PointMarker], tower_id_offset: i64) -> Result<()> {
    let violations = find_id_violations(markers, tower_id_offset);
    if violations.is_empty() {
        return Ok(());
    }

    log::warn!("{} marker id violations", violations.len());
    Err(MapError::Validation(format!(
        "marker id namespace violated: {:?}",
        violations
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(id: i64, dbm: f64, operator: Option<&str>) -> SignalMeasurement {
        SignalMeasurement {
            id,
            latitude: -23.55,
            longitude: -46.63,
            signal_strength_dbm: dbm,
            operator: operator.map(str::to_string),
            signal_type: "4g".to_string(),
            measured_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_measurement_marker_text() {
        let marker = measurement_to_marker(&measurement(5, -72.0, Some("Vivo")));
        assert_eq!(marker.title, "Vivo - 4G");
        assert_eq!(marker.description.as_deref(), Some("-72 dBm"));
        assert_eq!(marker.signal_strength_dbm, Some(-72.0));
        assert!(marker.color.is_none());

        let anonymous = measurement_to_marker(&measurement(6, -90.0, None));
        assert_eq!(anonymous.title, "N/A - 4G");
    }

    #[test]
    fn test_tower_marker_offset() {
        let tower = Tower {
            id: 5,
            latitude: -23.5,
            longitude: -46.6,
            operator: "Claro".to_string(),
            cell_id: "7241".to_string(),
        };
        let marker = tower_to_marker(&tower, 10_000).unwrap();
        assert_eq!(marker.id, 10_005);
        assert_eq!(marker.title, "Torre Claro");
        assert_eq!(marker.description.as_deref(), Some("Cell ID: 7241"));
        assert_eq!(marker.color, Some(MarkerColor::Tower));
    }

    #[test]
    fn test_tower_id_overflow_is_skipped() {
        let tower = Tower {
            id: i64::MAX - 3,
            latitude: -23.5,
            longitude: -46.6,
            operator: "TIM".to_string(),
            cell_id: "1".to_string(),
        };
        assert_eq!(tower_to_marker(&tower, 10_000), None);
        assert!(tower_to_marker(&tower, 3).is_some());
    }

    #[test]
    fn test_grid_gaps_strictly_below() {
        let grid = vec![
            CoverageGridPoint::new(0.0, 0.0, -95.0, "poor"),
            CoverageGridPoint::new(0.0, 0.1, -95.5, "poor"),
            CoverageGridPoint::new(0.0, 0.2, -60.0, "excellent"),
        ];
        let gaps = grid_gaps(&grid, -95.0, 0.01);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].longitude, 0.1);
        assert_eq!(gaps[0].area_km2, 0.01);
    }

    #[test]
    fn test_namespace_check() {
        let ok = vec![
            measurement_to_marker(&measurement(5, -70.0, Some("Vivo"))),
            PointMarker::new(10_005, LatLng::new(0.0, 0.0), "Torre").with_color(MarkerColor::Tower),
        ];
        assert!(check_id_namespaces(&ok, 10_000).is_ok());

        let clash = vec![
            measurement_to_marker(&measurement(5, -70.0, Some("Vivo"))),
            PointMarker::new(5, LatLng::new(0.0, 0.0), "Torre").with_color(MarkerColor::Tower),
        ];
        let violations = find_id_violations(&clash, 10_000);
        assert!(violations.contains(&IdViolation::Duplicate(5)));
        assert!(violations.contains(&IdViolation::WrongNamespace {
            id: 5,
            expected: MarkerCategory::Tower
        }));
        assert!(check_id_namespaces(&clash, 10_000).is_err());
    }

    #[test]
    fn test_heatmap_points_normalised() {
        let points = heatmap_points(
            &[measurement(1, -80.0, None), measurement(2, -130.0, None)],
            &SignalThresholds::default(),
        );
        assert!((points[0].intensity - 0.5).abs() < 1e-9);
        assert_eq!(points[1].intensity, 0.0);
    }
}
