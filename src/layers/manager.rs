use crate::{core::viewport::Viewport, layers::base::LayerTrait, Result};

use crate::rendering::context::RenderContext;

use crate::prelude::HashMap;

/// Manages layers for the map, handling ordering and rendering
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Ordered list of layer IDs for rendering (sorted by z-index)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer to the manager
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        let z_index = layer.z_index();

        if self.layers.contains_key(&layer_id) {
            return Err(crate::MapError::Validation(format!(
                "layer '{}' is already on the surface",
                layer_id
            )));
        }

        self.layers.insert(layer_id.clone(), layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    /// Removes a layer from the manager
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    /// Swaps in `layer`, removing whatever was registered under its id first.
    /// Both steps happen before the next render, so no frame shows the pair.
    pub fn replace_layer(
        &mut self,
        layer: Box<dyn LayerTrait>,
    ) -> Result<Option<Box<dyn LayerTrait>>> {
        let previous = self.remove_layer(layer.id());
        self.add_layer(layer)?;
        Ok(previous)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Gets a layer downcast to its concrete type
    pub fn get_layer_as<T: 'static>(&self, layer_id: &str) -> Option<&T> {
        self.layers
            .get(layer_id)
            .and_then(|l| l.as_any().downcast_ref::<T>())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()))
    }

    /// Lists layer IDs in render order
    pub fn list_layers(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Gets all layers in render order
    pub fn layers(&self) -> Vec<&dyn LayerTrait> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.as_ref()))
            .collect()
    }

    /// Renders all visible layers in order
    pub fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let viewport_bounds = viewport.bounds();

        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(layer_id) {
                if layer.is_visible() && layer.intersects_bounds(&viewport_bounds) {
                    layer.render(context, viewport)?;
                }
            }
        }
        Ok(())
    }

    /// Drops every layer
    pub fn clear(&mut self) {
        self.layers.clear();
        self.render_order.clear();
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::layers::{
        base::LayerType,
        polygon::PolygonLayer,
        tile::{TileLayer, TileLayerOptions},
    };

    #[test]
    fn test_render_order_follows_z_index() {
        let mut manager = LayerManager::new();
        manager
            .add_layer(Box::new(PolygonLayer::new(vec![LatLng::new(0.0, 0.0)])))
            .unwrap();
        manager
            .add_layer(Box::new(TileLayer::new(TileLayerOptions::default())))
            .unwrap();

        assert_eq!(manager.list_layers(), vec!["base-tiles", "polygon"]);
    }

    #[test]
    fn test_replace_keeps_single_layer_per_id() {
        let mut manager = LayerManager::new();
        manager
            .add_layer(Box::new(PolygonLayer::new(vec![LatLng::new(0.0, 0.0)])))
            .unwrap();
        assert!(manager
            .add_layer(Box::new(PolygonLayer::new(Vec::new())))
            .is_err());

        let previous = manager
            .replace_layer(Box::new(PolygonLayer::new(vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(1.0, 1.0),
            ])))
            .unwrap();
        assert_eq!(previous.map(|l| l.primitive_count()), Some(1));
        assert_eq!(manager.len(), 1);

        let layer = manager
            .get_layer_as::<PolygonLayer>(LayerType::Polygon.layer_id())
            .unwrap();
        assert_eq!(layer.vertices().len(), 2);
    }
}
