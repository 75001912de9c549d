//! The viewport controller.
//!
//! `MapController` owns the single [`Surface`] of a mounted map. It binds the
//! surface to a host element, feeds snapshots through the reconciler, turns
//! host input into callbacks, and gives every resource back on teardown.

use crate::{
    core::{
        config::EngineConfig,
        geo::{LatLng, Point},
        host::HostElement,
        surface::Surface,
        viewport::Viewport,
    },
    data::model::{CoverageGridPoint, MapSnapshot, MarkerCategory, PointMarker, Recommendation},
    input::handler::{Action, InputHandler, MapCallbacks},
    layers::{
        base::LayerType,
        coverage::CoverageGridLayer,
        marker::MarkerLayer,
        reconciler::{LayerReconciler, ReconcileReport},
        recommendation::RecommendationLayer,
    },
    rendering::context::RenderContext,
    ui::popup::Popup,
    MapError, Result,
};
use instant::Instant;

/// How surface clicks are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Clicks hit glyphs, drags pan
    #[default]
    Browse,
    /// Clicks place polygon vertices, dragging is off
    Drawing,
}

/// Pointer cursor the host should show over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Grab,
    Crosshair,
}

/// What a browse-mode click landed on
#[derive(Debug, Clone, PartialEq)]
enum Hit {
    Recommendation(Recommendation),
    Marker(PointMarker),
    GridPoint(CoverageGridPoint),
}

pub struct MapController {
    config: EngineConfig,
    callbacks: MapCallbacks,
    surface: Option<Surface>,
    reconciler: LayerReconciler,
    handler: InputHandler,
    mode: InteractionMode,
    popup: Option<Popup>,
}

impl MapController {
    /// Creates an unmounted controller; the configuration is validated first
    pub fn new(config: EngineConfig, callbacks: MapCallbacks) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            callbacks,
            surface: None,
            reconciler: LayerReconciler::new(),
            handler: InputHandler::new(),
            mode: InteractionMode::Browse,
            popup: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    /// Binds the surface to `host`.
    ///
    /// Mounting again on the same host is a no-op. Mounting on a different
    /// host while one is bound fails; tear down first.
    pub fn initialize(&mut self, host: &HostElement) -> Result<()> {
        if let Some(surface) = &self.surface {
            if surface.host().same_as(host) {
                log::debug!("surface already initialized on host '{}'", host.id());
                return Ok(());
            }
            return Err(MapError::Initialization(format!(
                "controller is bound to host '{}'; tear down before mounting on '{}'",
                surface.host().id(),
                host.id()
            )));
        }

        let mut surface = Surface::bind(host, &self.config).map_err(|e| {
            log::error!("failed to initialize map surface: {}", e);
            e
        })?;
        surface.set_dragging_enabled(self.mode == InteractionMode::Browse);

        self.reconciler.reset();
        self.popup = None;
        self.surface = Some(surface);
        Ok(())
    }

    /// Releases the surface, its listener and its host binding. Safe to repeat.
    pub fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.release();
            log::info!("map controller torn down");
        }
        self.reconciler.reset();
        self.handler.cancel_drag();
        self.popup = None;
    }

    fn surface_mut(&mut self) -> Result<&mut Surface> {
        self.surface.as_mut().ok_or(MapError::NotInitialized)
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.surface.as_ref().map(|s| s.viewport())
    }

    /// Moves the view; `Ok(false)` when already there
    pub fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<bool> {
        self.surface_mut()?.set_view(center, zoom)
    }

    /// Re-measures the host immediately
    pub fn invalidate_size(&mut self) -> Result<bool> {
        Ok(self.surface_mut()?.invalidate_size())
    }

    /// Drives the deferred re-measure scheduled by `initialize`
    pub fn tick(&mut self, now: Instant) -> bool {
        self.surface.as_mut().map_or(false, |s| s.tick(now))
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        if mode == InteractionMode::Drawing {
            self.handler.cancel_drag();
            self.popup = None;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.set_dragging_enabled(mode == InteractionMode::Browse);
        }
        log::debug!("interaction mode: {:?}", mode);
    }

    pub fn cursor(&self) -> CursorHint {
        match self.mode {
            InteractionMode::Drawing => CursorHint::Crosshair,
            InteractionMode::Browse => CursorHint::Grab,
        }
    }

    /// Reconciles every category of `snapshot` onto the surface
    pub fn apply_snapshot(&mut self, snapshot: &MapSnapshot) -> Result<ReconcileReport> {
        self.set_interaction_mode(if snapshot.drawing {
            InteractionMode::Drawing
        } else {
            InteractionMode::Browse
        });

        let surface = self.surface.as_mut().ok_or(MapError::NotInitialized)?;
        let (layers, viewport) = surface.parts_mut();
        let report = self
            .reconciler
            .reconcile(snapshot, layers, viewport, &self.config)?;

        // A popup must not outlive the glyph it was opened on
        if report.markers.is_change()
            || report.coverage_grid.is_change()
            || report.recommendations.is_change()
        {
            self.popup = None;
        }
        Ok(report)
    }

    /// Handles all input received from the host since the last call and
    /// returns how many events were processed
    pub fn process_events(&mut self) -> Result<usize> {
        let events = match self.surface.as_ref() {
            Some(surface) => surface.drain_events(),
            None => return Ok(0),
        };
        let count = events.len();

        for event in events {
            let (zoom, dragging) = match self.surface.as_ref() {
                Some(surface) => (surface.viewport().zoom, surface.dragging_enabled()),
                None => break,
            };
            for action in self.handler.handle_event(event, zoom, dragging) {
                self.apply_action(action)?;
            }
        }
        Ok(count)
    }

    fn apply_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Click { position } => self.click(position),
            Action::Pan { delta } => {
                let surface = self.surface_mut()?;
                if surface.dragging_enabled() {
                    surface.viewport_mut().pan(delta);
                }
                Ok(())
            }
            Action::Zoom { level, .. } => {
                self.surface_mut()?.viewport_mut().set_zoom(level);
                Ok(())
            }
            Action::Resize { size } => {
                self.surface_mut()?.resize(size);
                Ok(())
            }
            Action::StartDrag | Action::EndDrag => Ok(()),
        }
    }

    fn click(&mut self, position: Point) -> Result<()> {
        let surface = self.surface.as_ref().ok_or(MapError::NotInitialized)?;

        if self.mode == InteractionMode::Drawing {
            let at = surface.viewport().pixel_to_lat_lng(&position);
            self.callbacks.map_clicked(at.lat, at.lng);
            return Ok(());
        }

        match hit_test(surface, &self.config, &position) {
            Some(Hit::Recommendation(rec)) => {
                self.callbacks.recommendation_clicked(&rec);
                self.popup = Some(Popup::for_recommendation(&rec));
            }
            Some(Hit::Marker(marker)) => {
                let category = MarkerCategory::from_id(marker.id, self.config.tower_id_offset);
                self.callbacks.marker_clicked(&marker, category);
                self.popup = Some(Popup::for_marker(&marker));
            }
            Some(Hit::GridPoint(point)) => {
                self.popup = Some(Popup::for_grid_point(&point));
            }
            None => self.popup = None,
        }
        Ok(())
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    /// Queues the surface's layers and the open popup
    pub fn render(&mut self, context: &mut RenderContext) -> Result<()> {
        let surface = self.surface.as_mut().ok_or(MapError::NotInitialized)?;
        surface.render(context)?;
        if let Some(popup) = &self.popup {
            popup.render(context, surface.viewport())?;
        }
        Ok(())
    }

    /// Layers currently on the surface, base tiles included
    pub fn layer_count(&self) -> usize {
        self.surface.as_ref().map_or(0, |s| s.layers().len())
    }

    pub fn primitive_count(&self, layer_type: LayerType) -> Option<usize> {
        self.surface
            .as_ref()?
            .layers()
            .get_layer(layer_type.layer_id())
            .map(|layer| layer.primitive_count())
    }

    pub fn is_layer_visible(&self, layer_type: LayerType) -> Option<bool> {
        self.surface
            .as_ref()?
            .layers()
            .get_layer(layer_type.layer_id())
            .map(|layer| layer.is_visible())
    }

    /// How many times the category's layer has been replaced since mount
    pub fn generation(&self, layer_type: LayerType) -> u64 {
        self.reconciler.generation(layer_type)
    }
}

impl Drop for MapController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Topmost glyph under `position`: stars first, then markers, then grid samples
fn hit_test(surface: &Surface, config: &EngineConfig, position: &Point) -> Option<Hit> {
    let layers = surface.layers();
    let viewport = surface.viewport();
    let interaction = &config.interaction;

    if let Some(rec) = layers
        .get_layer_as::<RecommendationLayer>(LayerType::Recommendations.layer_id())
        .and_then(|l| l.hit_test(viewport, position, interaction.recommendation_hit_radius))
    {
        return Some(Hit::Recommendation(rec.clone()));
    }

    if let Some(marker) = layers
        .get_layer_as::<MarkerLayer>(LayerType::Markers.layer_id())
        .and_then(|l| l.hit_test(viewport, position, interaction.marker_hit_radius))
    {
        return Some(Hit::Marker(marker.clone()));
    }

    layers
        .get_layer_as::<CoverageGridLayer>(LayerType::CoverageGrid.layer_id())
        .and_then(|l| l.hit_test(viewport, position, interaction.marker_hit_radius))
        .map(|point| Hit::GridPoint(point.clone()))
}
