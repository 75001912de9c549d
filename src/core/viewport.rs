use crate::core::{
    constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE, VIEW_EPSILON},
    geo::{LatLng, LatLngBounds, Point},
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Web Mercator projection constants
const EARTH_RADIUS: f64 = 6378137.0;
const MAX_LATITUDE: f64 = 85.0511287798;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: u8,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: u8,
    /// The maximum allowed zoom level
    pub max_zoom: u8,
}

impl Viewport {
    /// Creates a new viewport, validating the center and zoom ranges
    pub fn new(center: LatLng, zoom: u8, size: Point) -> Result<Self> {
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "viewport center ({}, {}) out of range",
                center.lat, center.lng
            )));
        }
        if zoom > MAX_ZOOM {
            return Err(MapError::InvalidCoordinates(format!(
                "zoom {} exceeds maximum {}",
                zoom, MAX_ZOOM
            )));
        }

        Ok(Self {
            center,
            zoom,
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        })
    }

    /// Sets the center of the viewport
    pub fn set_center(&mut self, center: LatLng) -> Result<()> {
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "viewport center ({}, {}) out of range",
                center.lat, center.lng
            )));
        }
        self.center = center;
        Ok(())
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.min(MAX_ZOOM);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// True when the viewport already shows `center` at `zoom`
    pub fn is_at(&self, center: &LatLng, zoom: u8) -> bool {
        self.zoom == zoom && self.center.approx_eq(center, VIEW_EPSILON)
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<u8>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powi(z as i32);

        let lat = lat_lng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;

        let world = 2.0 * PI * EARTH_RADIUS;
        let pixel_x = (x + PI * EARTH_RADIUS) / world * scale;
        let pixel_y = (-y + PI * EARTH_RADIUS) / world * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<u8>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powi(z as i32);
        let world = 2.0 * PI * EARTH_RADIUS;

        let x = (pixel.x / scale) * world - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * world;

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    /// World pixel of the top-left corner of the container
    fn pixel_origin(&self) -> Point {
        let center = self.project(&self.center, None);
        center.subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// Pans the viewport so the content moves by `delta` pixels
    pub fn pan(&mut self, delta: Point) {
        let half = Point::new(self.size.x / 2.0, self.size.y / 2.0);
        let target = self.pixel_to_lat_lng(&half.subtract(&delta));
        self.center = LatLng::new(
            target.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            target.lng.clamp(-180.0, 180.0),
        );
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Fits the viewport to contain the given bounds with `padding` pixels on each side
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) {
        // Mercator stretches latitude, so the centre is the projected midpoint
        // of the corners rather than the midpoint in degrees
        let reference = Some(self.max_zoom);
        let south_west = self.project(&bounds.south_west, reference);
        let north_east = self.project(&bounds.north_east, reference);
        let midpoint = Point::new(
            (south_west.x + north_east.x) / 2.0,
            (south_west.y + north_east.y) / 2.0,
        );
        self.center = self.unproject(&midpoint, reference);

        let available = Point::new(self.size.x - 2.0 * padding, self.size.y - 2.0 * padding);
        let mut best_zoom = self.min_zoom;

        for zoom in self.min_zoom..=self.max_zoom {
            let nw = self.project(
                &LatLng::new(bounds.north_east.lat, bounds.south_west.lng),
                Some(zoom),
            );
            let se = self.project(
                &LatLng::new(bounds.south_west.lat, bounds.north_east.lng),
                Some(zoom),
            );

            let width = (se.x - nw.x).abs();
            let height = (se.y - nw.y).abs();

            if width <= available.x && height <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        log::debug!(
            "fit_bounds: center ({:.5}, {:.5}) zoom {}",
            self.center.lat,
            self.center.lng,
            best_zoom
        );
        self.set_zoom(best_zoom);
    }
}
