use crate::core::{
    bounds::Bounds,
    geo::{LatLng, Point},
    viewport::Viewport,
};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A spatial item that can be indexed via an R-tree
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub bounds: Bounds,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, bounds: Bounds, data: T) -> Self {
        Self { id, bounds, data }
    }

    pub fn from_point(id: String, point: Point, data: T) -> Self {
        let bounds = Bounds::new(point, point);
        Self::new(id, bounds, data)
    }

    /// Indexes a geographic position as (x = lng, y = lat)
    pub fn from_lat_lng(id: String, lat_lng: LatLng, data: T) -> Self {
        let point = Point::new(lat_lng.lng, lat_lng.lat);
        Self::from_point(id, point, data)
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SpatialItem<T> {}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let center = self.bounds.center();
        let dx = center.x - point[0];
        let dy = center.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.bounds.contains(&Point::new(point[0], point[1]))
    }
}

/// R-tree backed index used for click hit-testing
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    /// Bulk-loads all items at once
    pub fn from_items(items: Vec<SpatialItem<T>>) -> Self {
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.rtree.insert(item);
    }

    /// Items whose envelope intersects `bounds`
    pub fn query(&self, bounds: &Bounds) -> Vec<&SpatialItem<T>> {
        let envelope =
            AABB::from_corners([bounds.min.x, bounds.min.y], [bounds.max.x, bounds.max.y]);
        self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    /// Among the items inside `bounds`, the one minimising `distance`
    pub fn nearest_in<F>(&self, bounds: &Bounds, mut distance: F) -> Option<&SpatialItem<T>>
    where
        F: FnMut(&SpatialItem<T>) -> f64,
    {
        self.query(bounds)
            .into_iter()
            .map(|item| (distance(item), item))
            .filter(|(d, _)| d.is_finite())
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }

    /// Nearest item, indexed by lat/lng, whose projected position lies within
    /// `radius` pixels of the container point `pixel`
    pub fn hit_test(
        &self,
        viewport: &Viewport,
        pixel: &Point,
        radius: f64,
    ) -> Option<&SpatialItem<T>> {
        let a = viewport.pixel_to_lat_lng(&Point::new(pixel.x - radius, pixel.y - radius));
        let b = viewport.pixel_to_lat_lng(&Point::new(pixel.x + radius, pixel.y + radius));
        let search = Bounds::from_coords(
            a.lng.min(b.lng),
            a.lat.min(b.lat),
            a.lng.max(b.lng),
            a.lat.max(b.lat),
        );

        self.nearest_in(&search, |item| {
            let center = item.bounds.center();
            let projected = viewport.lat_lng_to_pixel(&LatLng::new(center.y, center.x));
            let distance = projected.distance_to(pixel);
            if distance <= radius {
                distance
            } else {
                f64::INFINITY
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }

    pub fn get(&self, id: &str) -> Option<&SpatialItem<T>> {
        self.rtree.iter().find(|item| item.id == id)
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
