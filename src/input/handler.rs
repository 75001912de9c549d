use crate::{
    core::{
        constants::{MAX_ZOOM, MIN_ZOOM},
        geo::Point,
    },
    data::model::{MarkerCategory, PointMarker, Recommendation},
    input::events::{InputEvent, MouseButton},
};
use std::sync::Arc;

pub type MarkerClickCallback = Arc<dyn Fn(&PointMarker, MarkerCategory) + Send + Sync>;
pub type MapClickCallback = Arc<dyn Fn(f64, f64) + Send + Sync>;
pub type RecommendationClickCallback = Arc<dyn Fn(&Recommendation) + Send + Sync>;

/// Callbacks the hosting page hands to the engine.
///
/// Passed explicitly at construction; the engine keeps no global handler slot.
#[derive(Clone, Default)]
pub struct MapCallbacks {
    pub on_marker_click: Option<MarkerClickCallback>,
    /// Only invoked while drawing
    pub on_map_click: Option<MapClickCallback>,
    pub on_recommendation_click: Option<RecommendationClickCallback>,
}

impl MapCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_marker_click<F>(mut self, f: F) -> Self
    where
        F: Fn(&PointMarker, MarkerCategory) + Send + Sync + 'static,
    {
        self.on_marker_click = Some(Arc::new(f));
        self
    }

    pub fn on_map_click<F>(mut self, f: F) -> Self
    where
        F: Fn(f64, f64) + Send + Sync + 'static,
    {
        self.on_map_click = Some(Arc::new(f));
        self
    }

    pub fn on_recommendation_click<F>(mut self, f: F) -> Self
    where
        F: Fn(&Recommendation) + Send + Sync + 'static,
    {
        self.on_recommendation_click = Some(Arc::new(f));
        self
    }

    pub(crate) fn marker_clicked(&self, marker: &PointMarker, category: MarkerCategory) {
        if let Some(callback) = &self.on_marker_click {
            callback(marker, category);
        }
    }

    pub(crate) fn map_clicked(&self, lat: f64, lon: f64) {
        if let Some(callback) = &self.on_map_click {
            callback(lat, lon);
        }
    }

    pub(crate) fn recommendation_clicked(&self, recommendation: &Recommendation) {
        if let Some(callback) = &self.on_recommendation_click {
            callback(recommendation);
        }
    }
}

impl std::fmt::Debug for MapCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCallbacks")
            .field("on_marker_click", &self.on_marker_click.is_some())
            .field("on_map_click", &self.on_map_click.is_some())
            .field("on_recommendation_click", &self.on_recommendation_click.is_some())
            .finish()
    }
}

/// What the controller should do in response to an input event
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Primary click at a container point; hit-testing decides its meaning
    Click { position: Point },
    Pan { delta: Point },
    Zoom { level: u8, focus_point: Option<Point> },
    Resize { size: Point },
    StartDrag,
    EndDrag,
}

/// Translates host input events into map actions
#[derive(Debug, Clone)]
pub struct InputHandler {
    pub enabled: bool,
    pub zoom_on_wheel: bool,
    pub zoom_on_double_click: bool,
    dragging: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            enabled: true,
            zoom_on_wheel: true,
            zoom_on_double_click: true,
            dragging: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Handle one input event; drag events produce nothing while `pan_on_drag` is off
    pub fn handle_event(
        &mut self,
        event: InputEvent,
        current_zoom: u8,
        pan_on_drag: bool,
    ) -> Vec<Action> {
        if !self.enabled {
            return vec![];
        }

        let mut actions = vec![];

        match event {
            InputEvent::Click {
                position,
                button: MouseButton::Left,
            } => {
                actions.push(Action::Click { position });
            }
            InputEvent::Click { .. } | InputEvent::MouseMove { .. } => {}
            InputEvent::DragStart { .. } => {
                if pan_on_drag {
                    self.dragging = true;
                    actions.push(Action::StartDrag);
                }
            }
            InputEvent::Drag { delta } => {
                if pan_on_drag && self.dragging {
                    actions.push(Action::Pan { delta });
                }
            }
            InputEvent::DragEnd => {
                if self.dragging {
                    self.dragging = false;
                    actions.push(Action::EndDrag);
                }
            }
            InputEvent::Scroll { delta, position } => {
                if self.zoom_on_wheel && delta != 0.0 {
                    let level = if delta > 0.0 {
                        current_zoom.saturating_add(1)
                    } else {
                        current_zoom.saturating_sub(1)
                    };
                    actions.push(Action::Zoom {
                        level: level.clamp(MIN_ZOOM, MAX_ZOOM),
                        focus_point: Some(position),
                    });
                }
            }
            InputEvent::DoubleClick { position } => {
                if self.zoom_on_double_click {
                    actions.push(Action::Zoom {
                        level: current_zoom.saturating_add(1).min(MAX_ZOOM),
                        focus_point: Some(position),
                    });
                }
            }
            InputEvent::Resize { size } => {
                actions.push(Action::Resize { size });
            }
        }

        actions
    }

    /// Drops any drag in progress
    pub fn cancel_drag(&mut self) {
        self.dragging = false;
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
