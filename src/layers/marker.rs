use crate::{
    core::{
        config::SignalThresholds,
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::model::PointMarker,
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        style::{marker_color, Color},
    },
    rendering::context::{PointRenderStyle, RenderContext},
    spatial::{SpatialIndex, SpatialItem},
    Result,
};

const GLYPH_RADIUS: f32 = 6.0;
const GLYPH_BORDER: f32 = 2.0;

/// A marker together with its resolved glyph color
#[derive(Debug, Clone)]
pub struct MarkerGlyph {
    pub marker: PointMarker,
    pub color: Color,
}

/// Point markers for measurements and towers, one glyph per input marker
pub struct MarkerLayer {
    properties: LayerProperties,
    glyphs: Vec<MarkerGlyph>,
    /// Indexed by (lng, lat); item data is the glyph ordinal
    index: SpatialIndex<usize>,
}

impl MarkerLayer {
    pub fn new(markers: &[PointMarker], thresholds: &SignalThresholds) -> Self {
        let glyphs: Vec<MarkerGlyph> = markers
            .iter()
            .map(|marker| MarkerGlyph {
                color: marker_color(marker, thresholds),
                marker: marker.clone(),
            })
            .collect();

        // The ordinal keeps items distinct even when two markers share an id
        let items = glyphs
            .iter()
            .enumerate()
            .map(|(ordinal, glyph)| {
                SpatialItem::from_lat_lng(
                    format!("marker:{}:{}", glyph.marker.id, ordinal),
                    glyph.marker.position,
                    ordinal,
                )
            })
            .collect();

        Self {
            properties: LayerProperties::for_type(LayerType::Markers, "Markers"),
            glyphs,
            index: SpatialIndex::from_items(items),
        }
    }

    pub fn glyphs(&self) -> &[MarkerGlyph] {
        &self.glyphs
    }

    /// Marker under the container point, nearest first
    pub fn hit_test(&self, viewport: &Viewport, pixel: &Point, radius: f64) -> Option<&PointMarker> {
        self.index
            .hit_test(viewport, pixel, radius)
            .and_then(|item| self.glyphs.get(item.data))
            .map(|glyph| &glyph.marker)
    }

    pub fn positions(&self) -> Vec<LatLng> {
        self.glyphs.iter().map(|g| g.marker.position).collect()
    }
}

impl LayerTrait for MarkerLayer {
    crate::impl_layer_trait!(MarkerLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        for glyph in &self.glyphs {
            let pixel = viewport.lat_lng_to_pixel(&glyph.marker.position);
            let style = PointRenderStyle {
                fill_color: glyph.color,
                stroke_color: Color::WHITE,
                stroke_width: GLYPH_BORDER,
                radius: GLYPH_RADIUS,
                opacity: self.properties.opacity,
            };
            context.render_point(&pixel, &style)?;
        }
        Ok(())
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(&self.positions())
    }

    fn primitive_count(&self) -> usize {
        self.glyphs.len()
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.properties.id,
            "markers": self.glyphs.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MarkerColor;

    fn viewport() -> Viewport {
        Viewport::new(LatLng::new(-23.55, -46.63), 14, Point::new(800.0, 600.0)).unwrap()
    }

    #[test]
    fn test_glyph_colors() {
        let thresholds = SignalThresholds::default();
        let layer = MarkerLayer::new(
            &[
                PointMarker::new(1, LatLng::new(-23.55, -46.63), "a").with_signal(-60.0),
                PointMarker::new(2, LatLng::new(-23.55, -46.63), "b").with_signal(-80.0),
                PointMarker::new(3, LatLng::new(-23.55, -46.63), "c").with_signal(-100.0),
                PointMarker::new(10_004, LatLng::new(-23.55, -46.63), "t")
                    .with_signal(-50.0)
                    .with_color(MarkerColor::Tower),
            ],
            &thresholds,
        );

        let colors: Vec<Color> = layer.glyphs().iter().map(|g| g.color).collect();
        assert_eq!(
            colors,
            vec![Color::GREEN, Color::ORANGE, Color::RED, Color::PURPLE]
        );
    }

    #[test]
    fn test_hit_test_picks_nearest() {
        let viewport = viewport();
        let near = LatLng::new(-23.55, -46.63);
        let far = LatLng::new(-23.56, -46.64);
        let layer = MarkerLayer::new(
            &[PointMarker::new(1, far, "far"), PointMarker::new(2, near, "near")],
            &SignalThresholds::default(),
        );

        let pixel = viewport.lat_lng_to_pixel(&near);
        let hit = layer.hit_test(&viewport, &pixel, 8.0).unwrap();
        assert_eq!(hit.id, 2);

        let empty_spot = Point::new(pixel.x + 40.0, pixel.y - 40.0);
        assert!(layer.hit_test(&viewport, &empty_spot, 8.0).is_none());
    }

    #[test]
    fn test_render_one_point_per_marker() {
        let viewport = viewport();
        let mut layer = MarkerLayer::new(
            &[
                PointMarker::new(5, LatLng::new(-23.55, -46.63), "m"),
                PointMarker::new(10_005, LatLng::new(-23.55, -46.63), "t")
                    .with_color(MarkerColor::Tower),
            ],
            &SignalThresholds::default(),
        );
        let mut ctx = RenderContext::new(800, 600).unwrap();
        layer.render(&mut ctx, &viewport).unwrap();
        assert_eq!(ctx.get_drawing_queue().len(), 2);
        assert_eq!(layer.primitive_count(), 2);
    }
}
