use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::model::CoverageGridPoint,
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        style::quality_style,
    },
    rendering::context::{PointRenderStyle, RenderContext},
    spatial::{SpatialIndex, SpatialItem},
    Result,
};

const SAMPLE_RADIUS: f32 = 3.0;

/// Coverage analysis samples, styled by their assigned quality category
pub struct CoverageGridLayer {
    properties: LayerProperties,
    samples: Vec<CoverageGridPoint>,
    index: SpatialIndex<usize>,
}

impl CoverageGridLayer {
    pub fn new(samples: Vec<CoverageGridPoint>) -> Self {
        let items = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| SpatialItem::from_lat_lng(format!("grid:{}", i), sample.position(), i))
            .collect();

        Self {
            properties: LayerProperties::for_type(LayerType::CoverageGrid, "Coverage grid"),
            samples,
            index: SpatialIndex::from_items(items),
        }
    }

    pub fn samples(&self) -> &[CoverageGridPoint] {
        &self.samples
    }

    pub fn hit_test(
        &self,
        viewport: &Viewport,
        pixel: &Point,
        radius: f64,
    ) -> Option<&CoverageGridPoint> {
        self.index
            .hit_test(viewport, pixel, radius)
            .and_then(|item| self.samples.get(item.data))
    }
}

impl LayerTrait for CoverageGridLayer {
    crate::impl_layer_trait!(CoverageGridLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        for sample in &self.samples {
            let style = quality_style(&sample.quality);
            let pixel = viewport.lat_lng_to_pixel(&sample.position());
            context.render_point(
                &pixel,
                &PointRenderStyle {
                    fill_color: style.color,
                    stroke_color: style.color,
                    stroke_width: 0.0,
                    radius: SAMPLE_RADIUS,
                    opacity: style.opacity * self.properties.opacity,
                },
            )?;
        }
        Ok(())
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        let positions: Vec<LatLng> = self.samples.iter().map(|s| s.position()).collect();
        LatLngBounds::from_points(&positions)
    }

    fn primitive_count(&self) -> usize {
        self.samples.len()
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({ "samples": self.samples.len() })
    }
}
