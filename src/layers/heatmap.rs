use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::model::HeatmapPoint,
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        style::Color,
    },
    rendering::context::{PointRenderStyle, RenderContext},
    MapError, Result,
};

/// Configuration for the heat field
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    /// Radius of influence for each data point (in pixels)
    pub radius: f64,
    /// Gaussian falloff width (in pixels)
    pub blur: f64,
    /// Accumulated intensity that saturates the gradient
    pub max_intensity: f64,
    /// Gradient stops from low to high intensity
    pub gradient: Vec<(f64, Color)>,
    /// Overall opacity of the heatmap
    pub opacity: f32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius: 25.0,
            blur: 15.0,
            max_intensity: 1.0,
            gradient: vec![
                (0.0, Color::new(0, 0, 255, 0)),
                (0.4, Color::new(0, 0, 255, 160)),
                (0.6, Color::new(0, 255, 255, 180)),
                (0.7, Color::new(0, 255, 0, 200)),
                (0.8, Color::new(255, 255, 0, 220)),
                (1.0, Color::new(255, 0, 0, 255)),
            ],
            opacity: 0.8,
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.radius <= 0.0 || self.blur <= 0.0 || self.max_intensity <= 0.0 {
            return Err(MapError::Config(
                "heatmap radius, blur and max intensity must be positive".to_string(),
            ));
        }
        if self.gradient.len() < 2 {
            return Err(MapError::Config(
                "heatmap gradient needs at least two stops".to_string(),
            ));
        }
        if self.gradient.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(MapError::Config(
                "heatmap gradient stops must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Map accumulated intensity to color using the gradient
    pub fn intensity_to_color(&self, intensity: f64) -> Color {
        let normalized = (intensity / self.max_intensity).clamp(0.0, 1.0);

        let (first, last) = match (self.gradient.first(), self.gradient.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Color::new(0, 0, 0, 0),
        };
        if normalized <= first.0 {
            return first.1;
        }

        for pair in self.gradient.windows(2) {
            let (t1, color1) = pair[0];
            let (t2, color2) = pair[1];
            if normalized >= t1 && normalized <= t2 {
                return color1.lerp(&color2, (normalized - t1) / (t2 - t1));
            }
        }

        last.1
    }
}

/// Cached intensity grid for one view
#[derive(Debug, Clone)]
struct HeatmapCache {
    center: LatLng,
    zoom: u8,
    size: Point,
    grid_data: Vec<Vec<f64>>,
    cell_size: f64,
}

/// Signal intensity field rendered as a colored Gaussian grid
pub struct HeatmapLayer {
    properties: LayerProperties,
    config: HeatmapConfig,
    points: Vec<HeatmapPoint>,
    cache: Option<HeatmapCache>,
}

impl HeatmapLayer {
    pub fn new(points: Vec<HeatmapPoint>) -> Self {
        Self::build(points, HeatmapConfig::default())
    }

    /// Layer with a custom kernel and gradient; the config is validated first
    pub fn with_config(points: Vec<HeatmapPoint>, config: HeatmapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(points, config))
    }

    fn build(points: Vec<HeatmapPoint>, config: HeatmapConfig) -> Self {
        let mut properties = LayerProperties::for_type(LayerType::Heatmap, "Signal heatmap");
        properties.opacity = config.opacity.clamp(0.0, 1.0);
        Self {
            properties,
            config,
            points,
            cache: None,
        }
    }

    pub fn points(&self) -> &[HeatmapPoint] {
        &self.points
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    fn cache_matches(&self, viewport: &Viewport) -> bool {
        self.cache.as_ref().map_or(false, |cache| {
            cache.zoom == viewport.zoom
                && cache.size == viewport.size
                && cache.center.approx_eq(&viewport.center, 1e-12)
        })
    }

    /// Generate heatmap data for the given viewport
    fn generate_heatmap(&mut self, viewport: &Viewport) {
        if self.cache_matches(viewport) {
            return;
        }

        let cell_size = self.config.radius / 2.0;
        let grid_width = (viewport.size.x / cell_size).ceil().max(0.0) as usize;
        let grid_height = (viewport.size.y / cell_size).ceil().max(0.0) as usize;
        let mut grid_data = vec![vec![0.0; grid_width]; grid_height];

        let reach = (self.config.radius / cell_size).ceil() as isize;
        let two_blur_sq = 2.0 * self.config.blur * self.config.blur;

        // Splat each point into the cells inside its radius
        for point in &self.points {
            let pixel = viewport.lat_lng_to_pixel(&point.position);
            let col0 = (pixel.x / cell_size).floor() as isize;
            let row0 = (pixel.y / cell_size).floor() as isize;

            for row in (row0 - reach)..=(row0 + reach) {
                if row < 0 || row as usize >= grid_height {
                    continue;
                }
                for col in (col0 - reach)..=(col0 + reach) {
                    if col < 0 || col as usize >= grid_width {
                        continue;
                    }
                    let cell_center = Point::new(
                        col as f64 * cell_size + cell_size / 2.0,
                        row as f64 * cell_size + cell_size / 2.0,
                    );
                    let distance = cell_center.distance_to(&pixel);
                    if distance <= self.config.radius {
                        let influence = (-distance * distance / two_blur_sq).exp();
                        grid_data[row as usize][col as usize] += point.intensity * influence;
                    }
                }
            }
        }

        self.cache = Some(HeatmapCache {
            center: viewport.center,
            zoom: viewport.zoom,
            size: viewport.size,
            grid_data,
            cell_size,
        });
    }
}

impl LayerTrait for HeatmapLayer {
    crate::impl_layer_trait!(HeatmapLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        if self.points.is_empty() {
            return Ok(());
        }

        self.generate_heatmap(viewport);

        let cache = match &self.cache {
            Some(cache) => cache,
            None => return Ok(()),
        };

        for (row, cells) in cache.grid_data.iter().enumerate() {
            for (col, &intensity) in cells.iter().enumerate() {
                if intensity <= 0.0 {
                    continue;
                }
                let color = self.config.intensity_to_color(intensity);
                let cell_center = Point::new(
                    col as f64 * cache.cell_size + cache.cell_size / 2.0,
                    row as f64 * cache.cell_size + cache.cell_size / 2.0,
                );
                let style = PointRenderStyle {
                    fill_color: color,
                    stroke_color: color,
                    stroke_width: 0.0,
                    radius: (cache.cell_size / 2.0) as f32,
                    opacity: self.properties.opacity * color.a as f32 / 255.0,
                };
                context.render_point(&cell_center, &style)?;
            }
        }

        Ok(())
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        let positions: Vec<LatLng> = self.points.iter().map(|p| p.position).collect();
        LatLngBounds::from_points(&positions)
    }

    fn primitive_count(&self) -> usize {
        self.points.len()
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "radius": self.config.radius,
            "blur": self.config.blur,
            "max_intensity": self.config.max_intensity,
            "points": self.points.len(),
        })
    }
}
