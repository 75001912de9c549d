use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::model::Recommendation,
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        style::priority_style,
    },
    rendering::context::{RenderContext, StarRenderStyle},
    spatial::{SpatialIndex, SpatialItem},
    Result,
};

const STAR_RADIUS: f32 = 14.0;
const HIGHLIGHTED_STAR_RADIUS: f32 = 18.0;
const STAR_BORDER: f32 = 3.0;

/// Id used for a recommendation that arrived without one
pub fn recommendation_id(recommendation: &Recommendation, index: usize) -> String {
    if recommendation.id.is_empty() {
        format!("rec-{}", index)
    } else {
        recommendation.id.clone()
    }
}

/// Candidate tower sites drawn as priority-colored stars
pub struct RecommendationLayer {
    properties: LayerProperties,
    recommendations: Vec<Recommendation>,
    selected: Option<String>,
    index: SpatialIndex<usize>,
}

impl RecommendationLayer {
    pub fn new(recommendations: &[Recommendation], selected: Option<&str>) -> Self {
        let recommendations: Vec<Recommendation> = recommendations
            .iter()
            .enumerate()
            .map(|(i, rec)| Recommendation {
                id: recommendation_id(rec, i),
                ..rec.clone()
            })
            .collect();

        let items = recommendations
            .iter()
            .enumerate()
            .map(|(i, rec)| SpatialItem::from_lat_lng(rec.id.clone(), rec.position(), i))
            .collect();

        Self {
            properties: LayerProperties::for_type(
                LayerType::Recommendations,
                "Tower recommendations",
            ),
            recommendations,
            selected: selected.map(str::to_string),
            index: SpatialIndex::from_items(items),
        }
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_highlighted(&self, recommendation: &Recommendation) -> bool {
        self.selected.as_deref() == Some(recommendation.id.as_str())
    }

    pub fn hit_test(
        &self,
        viewport: &Viewport,
        pixel: &Point,
        radius: f64,
    ) -> Option<&Recommendation> {
        self.index
            .hit_test(viewport, pixel, radius)
            .and_then(|item| self.recommendations.get(item.data))
    }
}

impl LayerTrait for RecommendationLayer {
    crate::impl_layer_trait!(RecommendationLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        for rec in &self.recommendations {
            let colors = priority_style(rec.priority);
            let highlighted = self.is_highlighted(rec);
            let style = StarRenderStyle {
                fill_color: colors.fill,
                stroke_color: colors.border,
                accent_color: colors.accent,
                stroke_width: STAR_BORDER,
                outer_radius: if highlighted {
                    HIGHLIGHTED_STAR_RADIUS
                } else {
                    STAR_RADIUS
                },
                highlighted,
            };
            context.render_star(&viewport.lat_lng_to_pixel(&rec.position()), &style)?;
        }
        Ok(())
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        let positions: Vec<LatLng> = self.recommendations.iter().map(|r| r.position()).collect();
        LatLngBounds::from_points(&positions)
    }

    fn primitive_count(&self) -> usize {
        self.recommendations.len()
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "recommendations": self.recommendations.len(),
            "selected": self.selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::model::{Location, Priority},
        rendering::context::DrawCommand,
    };

    fn rec(id: &str, lat: f64, priority: Priority) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            location: Location {
                latitude: lat,
                longitude: -46.63,
            },
            score: 8.5,
            priority,
            population_reached: 1200,
            reason: "gap cluster".to_string(),
            gap_count: 4,
        }
    }

    #[test]
    fn test_missing_ids_are_filled() {
        let layer = RecommendationLayer::new(
            &[rec("", -23.55, Priority::High), rec("x", -23.56, Priority::Low)],
            None,
        );
        let ids: Vec<&str> = layer.recommendations().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec-0", "x"]);
    }

    #[test]
    fn test_only_selected_is_highlighted() {
        let viewport =
            Viewport::new(LatLng::new(-23.555, -46.63), 13, Point::new(800.0, 600.0)).unwrap();
        let mut layer = RecommendationLayer::new(
            &[rec("a", -23.55, Priority::High), rec("b", -23.56, Priority::Medium)],
            Some("b"),
        );
        let mut ctx = RenderContext::new(800, 600).unwrap();
        layer.render(&mut ctx, &viewport).unwrap();

        let highlighted: Vec<bool> = ctx
            .get_drawing_queue()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Star { style, .. } => Some(style.highlighted),
                _ => None,
            })
            .collect();
        assert_eq!(highlighted, vec![false, true]);
    }

    #[test]
    fn test_hit_radius() {
        let viewport =
            Viewport::new(LatLng::new(-23.55, -46.63), 13, Point::new(800.0, 600.0)).unwrap();
        let layer = RecommendationLayer::new(&[rec("a", -23.55, Priority::High)], None);
        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(-23.55, -46.63));

        let hit = layer.hit_test(&viewport, &Point::new(pixel.x + 15.0, pixel.y), 20.0);
        assert_eq!(hit.map(|r| r.id.as_str()), Some("a"));
    }
}
