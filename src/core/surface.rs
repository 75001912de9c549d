use crate::{
    core::{
        config::EngineConfig,
        geo::{LatLng, Point},
        host::{HostElement, ListenerId},
        viewport::Viewport,
    },
    input::events::InputEvent,
    layers::{manager::LayerManager, tile::TileLayer},
    rendering::context::RenderContext,
    MapError, Result,
};
use crossbeam_channel::Receiver;
use instant::Instant;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// The rendering context bound to one host element.
///
/// Owns the viewport and every layer on the map. Holding a `Surface` means
/// holding the host binding and one input listener; both are given back by
/// [`Surface::release`] or on drop.
pub struct Surface {
    id: u64,
    host: HostElement,
    viewport: Viewport,
    layers: LayerManager,
    listener: Option<ListenerId>,
    events: Receiver<InputEvent>,
    dragging_enabled: bool,
    pending_invalidate: Option<Instant>,
}

impl Surface {
    /// Binds a new surface to `host` and installs the base tile layer.
    ///
    /// Fails with `Initialization` when the host is detached, cannot render,
    /// or already belongs to another surface.
    pub fn bind(host: &HostElement, config: &EngineConfig) -> Result<Self> {
        if !host.is_attached() {
            return Err(MapError::Initialization(format!(
                "host '{}' is not attached",
                host.id()
            )));
        }
        if !host.is_renderable() {
            return Err(MapError::Initialization(format!(
                "host '{}' has no rendering capability",
                host.id()
            )));
        }

        let mut viewport = Viewport::new(
            config.interaction.default_center,
            config.interaction.default_zoom,
            host.size(),
        )
        .map_err(|e| MapError::Initialization(e.to_string()))?;
        viewport.set_zoom_limits(crate::constants::MIN_ZOOM, config.tiles.max_zoom);

        let id = NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed);
        host.bind(id).map_err(MapError::Initialization)?;

        let (listener, events) = host.add_listener();
        let mut surface = Self {
            id,
            host: host.clone(),
            viewport,
            layers: LayerManager::new(),
            listener: Some(listener),
            events,
            dragging_enabled: true,
            pending_invalidate: Some(Instant::now() + config.interaction.invalidate_size_delay()),
        };
        // `surface` releases the binding and listener on drop if this fails
        surface
            .layers
            .add_layer(Box::new(TileLayer::new(config.tiles.clone())))?;

        log::info!("surface {} bound to host '{}'", id, host.id());
        Ok(surface)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn host(&self) -> &HostElement {
        &self.host
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Layers and viewport borrowed together for reconciliation
    pub fn parts_mut(&mut self) -> (&mut LayerManager, &mut Viewport) {
        (&mut self.layers, &mut self.viewport)
    }

    pub fn dragging_enabled(&self) -> bool {
        self.dragging_enabled
    }

    pub fn set_dragging_enabled(&mut self, enabled: bool) {
        self.dragging_enabled = enabled;
    }

    /// Moves the view unless it is already there; returns whether it moved.
    /// `zoom` is clamped to the surface's limits before comparing.
    pub fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<bool> {
        let zoom = zoom.clamp(self.viewport.min_zoom, self.viewport.max_zoom);
        if self.viewport.is_at(&center, zoom) {
            return Ok(false);
        }
        self.viewport.set_center(center)?;
        self.viewport.set_zoom(zoom);
        Ok(true)
    }

    /// Input events received since the last call
    pub fn drain_events(&self) -> Vec<InputEvent> {
        self.events.try_iter().collect()
    }

    /// Re-reads the host size; returns whether it changed
    pub fn invalidate_size(&mut self) -> bool {
        let size = self.host.size();
        if size == self.viewport.size {
            return false;
        }
        log::debug!(
            "surface {} resized {:?} -> {:?}",
            self.id,
            self.viewport.size,
            size
        );
        self.viewport.set_size(size);
        true
    }

    pub fn resize(&mut self, size: Point) {
        self.viewport.set_size(size);
    }

    pub fn has_pending_invalidate(&self) -> bool {
        self.pending_invalidate.is_some()
    }

    /// Runs the deferred re-measure once it is due. Never re-arms.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_invalidate {
            Some(due) if now >= due => {
                self.pending_invalidate = None;
                self.invalidate_size();
                true
            }
            _ => false,
        }
    }

    pub fn render(&mut self, context: &mut RenderContext) -> Result<()> {
        self.layers.render(context, &self.viewport)
    }

    pub fn is_released(&self) -> bool {
        self.listener.is_none()
    }

    /// Detaches the listener, unbinds the host and drops every layer.
    /// Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.host.remove_listener(listener);
            self.host.unbind(self.id);
            self.layers.clear();
            self.pending_invalidate = None;
            log::info!("surface {} released", self.id);
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::base::LayerType;

    #[test]
    fn test_bind_installs_one_tile_layer() {
        let host = HostElement::new("map", Point::new(800.0, 600.0));
        let surface = Surface::bind(&host, &EngineConfig::default()).unwrap();

        assert_eq!(surface.layers().len(), 1);
        assert!(surface.layers().contains(LayerType::Tile.layer_id()));
        assert!(host.is_bound());
        assert_eq!(host.listener_count(), 1);
        assert_eq!(surface.viewport().max_zoom, 19);
    }

    #[test]
    fn test_capability_check() {
        let config = EngineConfig::default();
        assert!(matches!(
            Surface::bind(&HostElement::detached("gone"), &config),
            Err(MapError::Initialization(_))
        ));
        assert!(matches!(
            Surface::bind(&HostElement::headless("ssr"), &config),
            Err(MapError::Initialization(_))
        ));

        let host = HostElement::new("map", Point::new(10.0, 10.0));
        host.set_attached(false);
        assert!(matches!(
            Surface::bind(&host, &config),
            Err(MapError::Initialization(_))
        ));
        host.set_attached(true);
        let _first = Surface::bind(&host, &config).unwrap();
        assert!(matches!(
            Surface::bind(&host, &config),
            Err(MapError::Initialization(_))
        ));
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_release_is_idempotent_and_drop_releases() {
        let host = HostElement::new("map", Point::new(800.0, 600.0));
        let mut surface = Surface::bind(&host, &EngineConfig::default()).unwrap();
        surface.release();
        surface.release();
        assert!(surface.is_released());
        assert!(!host.is_bound());
        assert_eq!(host.listener_count(), 0);

        {
            let _scoped = Surface::bind(&host, &EngineConfig::default()).unwrap();
            assert_eq!(host.listener_count(), 1);
        }
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_set_view_clamps_before_comparing() {
        let host = HostElement::new("map", Point::new(800.0, 600.0));
        let mut surface = Surface::bind(&host, &EngineConfig::default()).unwrap();
        let center = LatLng::new(-23.55, -46.63);

        assert!(surface.set_view(center, 25).unwrap());
        assert_eq!(surface.viewport().zoom, 19);
        assert!(!surface.set_view(center, 25).unwrap());
        assert!(!surface.set_view(center, 19).unwrap());
    }

    #[test]
    fn test_deferred_invalidate_runs_once() {
        let host = HostElement::new("map", Point::new(0.0, 0.0));
        let mut surface = Surface::bind(&host, &EngineConfig::default()).unwrap();
        host.set_size(Point::new(640.0, 480.0));

        assert!(!surface.tick(Instant::now()));
        let later = Instant::now() + std::time::Duration::from_secs(1);
        assert!(surface.tick(later));
        assert_eq!(surface.viewport().size, Point::new(640.0, 480.0));
        assert!(!surface.tick(later));
        assert!(!surface.has_pending_invalidate());
    }
}
