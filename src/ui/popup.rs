use crate::{
    core::{geo::LatLng, viewport::Viewport},
    data::model::{CoverageGridPoint, PointMarker, Recommendation},
    rendering::context::RenderContext,
    Result,
};

/// Info popup anchored at a geographic position
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub anchor: LatLng,
    pub title: String,
    pub lines: Vec<String>,
}

impl Popup {
    pub fn new(anchor: LatLng, title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            anchor,
            title: title.into(),
            lines,
        }
    }

    /// Title, description and signal of a point marker
    pub fn for_marker(marker: &PointMarker) -> Self {
        let mut lines = Vec::new();
        if let Some(description) = marker.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(description.to_string());
        }
        if let Some(dbm) = marker.signal_strength_dbm {
            lines.push(format!("Signal: {} dBm", dbm));
        }
        Self::new(marker.position, marker.title.clone(), lines)
    }

    /// Raw dBm and the category assigned by the analysis
    pub fn for_grid_point(point: &CoverageGridPoint) -> Self {
        Self::new(
            point.position(),
            "Coverage sample",
            vec![
                format!("Signal: {} dBm", point.signal_dbm),
                format!("Quality: {}", point.quality.label()),
            ],
        )
    }

    pub fn for_recommendation(recommendation: &Recommendation) -> Self {
        Self::new(
            recommendation.position(),
            "Recommended tower",
            vec![
                format!("Score: {:.2}/10", recommendation.score),
                format!("Priority: {}", recommendation.priority.label()),
                format!("Population: ~{}", recommendation.population_reached),
                format!("Reason: {}", recommendation.reason),
                format!("Gaps covered: {}", recommendation.gap_count),
                format!(
                    "Location: {:.4}, {:.4}",
                    recommendation.location.latitude, recommendation.location.longitude
                ),
            ],
        )
    }

    pub fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let anchor = viewport.lat_lng_to_pixel(&self.anchor);
        context.render_popup(&anchor, &self.title, &self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Location, Priority};

    #[test]
    fn test_marker_popup() {
        let marker = PointMarker::new(1, LatLng::new(0.0, 0.0), "Vivo - 4G")
            .with_description("-72 dBm")
            .with_signal(-72.0);
        let popup = Popup::for_marker(&marker);
        assert_eq!(popup.title, "Vivo - 4G");
        assert_eq!(popup.lines, vec!["-72 dBm", "Signal: -72 dBm"]);
    }

    #[test]
    fn test_recommendation_popup_formatting() {
        let popup = Popup::for_recommendation(&Recommendation {
            id: "rec-0".to_string(),
            location: Location {
                latitude: -23.556789,
                longitude: -46.612345,
            },
            score: 7.456,
            priority: Priority::High,
            population_reached: 15000,
            reason: "dense gap cluster".to_string(),
            gap_count: 12,
        });
        assert_eq!(popup.lines[0], "Score: 7.46/10");
        assert_eq!(popup.lines[1], "Priority: High priority");
        assert_eq!(popup.lines[4], "Gaps covered: 12");
        assert_eq!(popup.lines[5], "Location: -23.5568, -46.6123");
    }

    #[test]
    fn test_grid_popup() {
        let popup = Popup::for_grid_point(&CoverageGridPoint::new(0.0, 0.0, -101.5, "poor"));
        assert_eq!(popup.lines, vec!["Signal: -101.5 dBm", "Quality: poor"]);
    }
}
