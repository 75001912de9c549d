use crate::{
    core::{geo::LatLngBounds, viewport::Viewport},
    rendering::context::RenderContext,
    Result,
};

/// One overlay group on the map surface.
///
/// Every data category owns exactly one layer; the reconciler swaps a whole
/// layer when its category changes instead of patching primitives in place.
pub trait LayerTrait: Send + Sync {
    /// Get layer ID
    fn id(&self) -> &str;

    /// Get layer name
    fn name(&self) -> &str;

    /// Get layer type
    fn layer_type(&self) -> LayerType;

    /// Check if layer is visible
    fn is_visible(&self) -> bool;

    /// Set layer visibility
    fn set_visible(&mut self, visible: bool);

    /// Get layer opacity (0.0 to 1.0)
    fn opacity(&self) -> f32;

    /// Set layer opacity
    fn set_opacity(&mut self, opacity: f32);

    /// Get layer z-index for ordering
    fn z_index(&self) -> i32;

    /// Set layer z-index
    fn set_z_index(&mut self, z_index: i32);

    /// Queue this layer's primitives
    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()>;

    /// Geographic extent of the layer's content, if it has any
    fn bounds(&self) -> Option<LatLngBounds> {
        None
    }

    /// Check if layer intersects with given bounds
    fn intersects_bounds(&self, bounds: &LatLngBounds) -> bool {
        match self.bounds() {
            Some(layer_bounds) => layer_bounds.intersects(bounds),
            None => true,
        }
    }

    /// Number of visual primitives the layer owns
    fn primitive_count(&self) -> usize;

    /// Get layer options
    fn options(&self) -> serde_json::Value;

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Markers,
    Heatmap,
    Polygon,
    CoverageGrid,
    Recommendations,
}

impl LayerType {
    /// Stable id of the single layer of this type on a surface
    pub fn layer_id(&self) -> &'static str {
        match self {
            LayerType::Tile => "base-tiles",
            LayerType::Markers => "markers",
            LayerType::Heatmap => "heatmap",
            LayerType::Polygon => "polygon",
            LayerType::CoverageGrid => "coverage-grid",
            LayerType::Recommendations => "recommendations",
        }
    }

    /// Stacking order, lowest first
    pub fn default_z_index(&self) -> i32 {
        match self {
            LayerType::Tile => 0,
            LayerType::Heatmap => 10,
            LayerType::CoverageGrid => 20,
            LayerType::Polygon => 30,
            LayerType::Markers => 40,
            LayerType::Recommendations => 50,
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Markers => write!(f, "markers"),
            LayerType::Heatmap => write!(f, "heatmap"),
            LayerType::Polygon => write!(f, "polygon"),
            LayerType::CoverageGrid => write!(f, "coverage-grid"),
            LayerType::Recommendations => write!(f, "recommendations"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(id: String, name: String, layer_type: LayerType) -> Self {
        Self {
            id,
            name,
            layer_type,
            z_index: layer_type.default_z_index(),
            opacity: 1.0,
            visible: true,
        }
    }

    /// Properties for the surface's single layer of `layer_type`
    pub fn for_type(layer_type: LayerType, name: &str) -> Self {
        Self::new(
            layer_type.layer_id().to_string(),
            name.to_string(),
            layer_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::for_type(LayerType::Markers, "Markers");

        assert_eq!(props.id, "markers");
        assert_eq!(props.name, "Markers");
        assert_eq!(props.layer_type, LayerType::Markers);
        assert_eq!(props.z_index, 40);
        assert_eq!(props.opacity, 1.0);
        assert!(props.visible);
    }

    #[test]
    fn test_stacking_order() {
        assert!(LayerType::Tile.default_z_index() < LayerType::Heatmap.default_z_index());
        assert!(
            LayerType::Markers.default_z_index() < LayerType::Recommendations.default_z_index()
        );
    }

    #[test]
    fn test_layer_type_display() {
        assert_eq!(LayerType::Tile.to_string(), "tile");
        assert_eq!(LayerType::CoverageGrid.to_string(), "coverage-grid");
        assert_eq!(LayerType::Markers.to_string(), "markers");
    }
}
