//! Polygon boundary capture.
//!
//! `DrawingSession` is the drawing-mode state machine: `Browse` until drawing
//! starts, `Drawing` while surface clicks become vertices, and `Terminated`
//! once torn down. Submitting hands back a closed ring.

use crate::{
    core::{constants::MIN_POLYGON_VERTICES, geo::LatLng},
    MapError, Result,
};
use geo::Contains;
use geo_types::{Coord, LineString, Polygon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingState {
    Browse,
    Drawing,
    Terminated,
}

/// Notifications emitted by drawing transitions
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    Started,
    PointAdded { index: usize, vertex: LatLng },
    Cleared,
    Submitted { vertex_count: usize },
}

/// A ring whose last vertex repeats the first
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPolygon {
    vertices: Vec<LatLng>,
}

impl ClosedPolygon {
    fn close(mut vertices: Vec<LatLng>) -> Self {
        if let (Some(first), Some(last)) = (vertices.first().copied(), vertices.last()) {
            if first != *last {
                vertices.push(first);
            }
        }
        Self { vertices }
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    /// `[lat, lon]` pairs in ring order, as sent to the analysis service
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.vertices.iter().map(|v| [v.lat, v.lng]).collect()
    }

    pub fn as_line_string(&self) -> LineString<f64> {
        LineString::new(self.vertices.iter().map(|v| Coord::from(*v)).collect())
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(self.as_line_string(), Vec::new())
    }

    /// Whether `point` lies strictly inside the ring
    pub fn contains(&self, point: &LatLng) -> bool {
        self.to_polygon()
            .contains(&geo_types::Point::from(Coord::from(*point)))
    }
}

/// Drawing-mode state machine holding the accumulated vertices
#[derive(Debug, Clone)]
pub struct DrawingSession {
    state: DrawingState,
    vertices: Vec<LatLng>,
}

impl DrawingSession {
    pub fn new() -> Self {
        Self {
            state: DrawingState::Browse,
            vertices: Vec::new(),
        }
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == DrawingState::Drawing
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.state == DrawingState::Terminated {
            return Err(MapError::Validation(
                "drawing session has been torn down".to_string(),
            ));
        }
        Ok(())
    }

    /// Enters drawing mode with an empty vertex list; restarting discards
    /// the vertices placed so far
    pub fn start_drawing(&mut self) -> Result<DrawingEvent> {
        self.ensure_alive()?;
        self.vertices.clear();
        self.state = DrawingState::Drawing;
        log::debug!("drawing started");
        Ok(DrawingEvent::Started)
    }

    /// Appends a vertex; only accepted while drawing
    pub fn add_vertex(&mut self, lat: f64, lon: f64) -> Result<DrawingEvent> {
        self.ensure_alive()?;
        if self.state != DrawingState::Drawing {
            return Err(MapError::Validation(
                "vertices can only be placed in drawing mode".to_string(),
            ));
        }

        let vertex = LatLng::try_new(lat, lon)?;
        self.vertices.push(vertex);
        let index = self.vertices.len() - 1;
        log::debug!("vertex {} at ({:.6}, {:.6})", index + 1, lat, lon);
        Ok(DrawingEvent::PointAdded { index, vertex })
    }

    /// Discards the vertices and returns to browsing
    pub fn clear(&mut self) -> Result<DrawingEvent> {
        self.ensure_alive()?;
        self.vertices.clear();
        self.state = DrawingState::Browse;
        log::debug!("drawing cleared");
        Ok(DrawingEvent::Cleared)
    }

    /// The current vertices as a closed ring, without changing state
    pub fn closed_ring(&self) -> Result<ClosedPolygon> {
        self.ensure_alive()?;
        if self.vertices.len() < MIN_POLYGON_VERTICES {
            return Err(MapError::Validation(format!(
                "a polygon needs at least {} vertices, got {}",
                MIN_POLYGON_VERTICES,
                self.vertices.len()
            )));
        }
        Ok(ClosedPolygon::close(self.vertices.clone()))
    }

    /// Closes the ring and returns to browsing. With fewer than three
    /// vertices nothing changes and `Validation` is returned.
    pub fn submit(&mut self) -> Result<ClosedPolygon> {
        self.ensure_alive()?;
        if self.state != DrawingState::Drawing {
            return Err(MapError::Validation(
                "no polygon is being drawn".to_string(),
            ));
        }

        let ring = self.closed_ring()?;
        self.vertices = ring.vertices().to_vec();
        self.state = DrawingState::Browse;
        log::info!("polygon submitted with {} vertices", ring.vertices().len());
        Ok(ring)
    }

    /// Final transition; reachable from any state and safe to repeat
    pub fn teardown(&mut self) {
        self.vertices.clear();
        self.state = DrawingState::Terminated;
    }
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn(points: &[(f64, f64)]) -> DrawingSession {
        let mut session = DrawingSession::new();
        session.start_drawing().unwrap();
        for (lat, lon) in points {
            session.add_vertex(*lat, *lon).unwrap();
        }
        session
    }

    #[test]
    fn test_submit_closes_ring() {
        let mut session = drawn(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let ring = session.submit().unwrap();

        assert_eq!(
            ring.vertices(),
            &[
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 1.0),
                LatLng::new(1.0, 1.0),
                LatLng::new(0.0, 0.0),
            ]
        );
        assert_eq!(session.state(), DrawingState::Browse);
    }

    #[test]
    fn test_already_closed_ring_is_kept() {
        let mut session = drawn(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(session.submit().unwrap().vertices().len(), 4);
    }

    #[test]
    fn test_short_submit_rejected() {
        let mut session = drawn(&[(0.0, 0.0), (0.0, 1.0)]);
        assert!(matches!(session.submit(), Err(MapError::Validation(_))));
        assert_eq!(session.state(), DrawingState::Drawing);
        assert_eq!(session.vertices().len(), 2);
    }

    #[test]
    fn test_clear_returns_to_browse() {
        let mut session = drawn(&[(0.0, 0.0), (0.0, 1.0)]);
        assert_eq!(session.clear().unwrap(), DrawingEvent::Cleared);
        assert_eq!(session.state(), DrawingState::Browse);
        assert!(session.vertices().is_empty());
    }

    #[test]
    fn test_vertices_rejected_outside_drawing() {
        let mut session = DrawingSession::new();
        assert!(session.add_vertex(0.0, 0.0).is_err());

        let mut session = drawn(&[]);
        assert!(session.add_vertex(91.0, 0.0).is_err());
        assert_eq!(
            session.add_vertex(1.0, 2.0).unwrap(),
            DrawingEvent::PointAdded {
                index: 0,
                vertex: LatLng::new(1.0, 2.0)
            }
        );
    }

    #[test]
    fn test_teardown_is_terminal() {
        let mut session = drawn(&[(0.0, 0.0)]);
        session.teardown();
        session.teardown();
        assert_eq!(session.state(), DrawingState::Terminated);
        assert!(session.start_drawing().is_err());
        assert!(session.clear().is_err());
    }

    #[test]
    fn test_ring_containment() {
        let ring = drawn(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)])
            .submit()
            .unwrap();
        assert!(ring.contains(&LatLng::new(1.0, 1.0)));
        assert!(!ring.contains(&LatLng::new(3.0, 1.0)));
        assert_eq!(ring.to_pairs()[1], [0.0, 2.0]);
    }
}
