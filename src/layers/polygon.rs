use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        style::Color,
    },
    rendering::context::{LineRenderStyle, PointRenderStyle, RenderContext},
    Result,
};

const LINE_WIDTH: f32 = 2.0;
const LINE_OPACITY: f32 = 0.8;
const DASH: [f32; 2] = [5.0, 5.0];
const VERTEX_RADIUS: f32 = 5.0;
const VERTEX_BORDER: f32 = 2.0;
const LABEL_SIZE: f32 = 11.0;

/// The in-progress or submitted analysis boundary.
///
/// Vertices are drawn in the order given. The outline is never closed by the
/// layer itself; a submitted ring already repeats its first vertex.
pub struct PolygonLayer {
    properties: LayerProperties,
    vertices: Vec<LatLng>,
}

impl PolygonLayer {
    pub fn new(vertices: Vec<LatLng>) -> Self {
        Self {
            properties: LayerProperties::for_type(LayerType::Polygon, "Analysis polygon"),
            vertices,
        }
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    /// True when the outline returns to its first vertex
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => self.vertices.len() > 3 && first == last,
            _ => false,
        }
    }

    fn has_outline(&self) -> bool {
        self.vertices.len() >= 2
    }
}

impl LayerTrait for PolygonLayer {
    crate::impl_layer_trait!(PolygonLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let pixels: Vec<Point> = self
            .vertices
            .iter()
            .map(|v| viewport.lat_lng_to_pixel(v))
            .collect();

        if self.has_outline() {
            context.render_line(
                &pixels,
                &LineRenderStyle {
                    color: Color::POLYGON_BLUE,
                    width: LINE_WIDTH,
                    opacity: LINE_OPACITY * self.properties.opacity,
                    dash_pattern: DASH.to_vec(),
                },
            )?;
        }

        let vertex_style = PointRenderStyle {
            fill_color: Color::POLYGON_BLUE,
            stroke_color: Color::WHITE,
            stroke_width: VERTEX_BORDER,
            radius: VERTEX_RADIUS,
            opacity: LINE_OPACITY * self.properties.opacity,
        };

        // A closing vertex sits on top of the first one; it gets no glyph of its own
        let glyphs = if self.is_closed() {
            &pixels[..pixels.len() - 1]
        } else {
            &pixels[..]
        };
        for (i, pixel) in glyphs.iter().enumerate() {
            context.render_point(pixel, &vertex_style)?;
            context.render_label(pixel, &(i + 1).to_string(), Color::BLACK, LABEL_SIZE)?;
        }

        Ok(())
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(&self.vertices)
    }

    fn primitive_count(&self) -> usize {
        let vertices = if self.is_closed() {
            self.vertices.len() - 1
        } else {
            self.vertices.len()
        };
        vertices + usize::from(self.has_outline())
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "vertices": self.vertices.len(),
            "closed": self.is_closed(),
        })
    }
}
