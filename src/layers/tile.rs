use crate::{
    core::{
        constants::{MAX_ZOOM, OSM_ATTRIBUTION, OSM_TILE_URL},
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::RenderContext,
    Result,
};

/// Configuration for the base tile layer
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TileLayerOptions {
    /// URL template for tiles (e.g., "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
    pub url_template: String,
    /// Attribution text
    pub attribution: String,
    /// Maximum zoom level for this tile source
    pub max_zoom: u8,
    pub opacity: f32,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: OSM_TILE_URL.to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
            max_zoom: MAX_ZOOM,
            opacity: 1.0,
        }
    }
}

/// The base map layer.
///
/// Tiles are fetched and painted by the host; the layer only tells it which
/// source to use and at which zoom.
pub struct TileLayer {
    properties: LayerProperties,
    options: TileLayerOptions,
}

impl TileLayer {
    pub fn new(options: TileLayerOptions) -> Self {
        let mut properties = LayerProperties::for_type(LayerType::Tile, "Base map");
        properties.opacity = options.opacity.clamp(0.0, 1.0);
        Self {
            properties,
            options,
        }
    }

    pub fn tile_options(&self) -> &TileLayerOptions {
        &self.options
    }

    /// Zoom at which tiles are requested for `viewport`
    pub fn tile_zoom(&self, viewport: &Viewport) -> u8 {
        viewport.zoom.min(self.options.max_zoom)
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(TileLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        context.render_tile_source(
            &self.options.url_template,
            &self.options.attribution,
            self.tile_zoom(viewport),
            self.properties.opacity,
        )
    }

    fn primitive_count(&self) -> usize {
        1
    }

    fn options(&self) -> serde_json::Value {
        serde_json::to_value(&self.options).unwrap_or(serde_json::Value::Null)
    }
}
