use crate::{core::geo::Point, layers::style::Color, MapError, Result};

/// Styles for different rendering primitives
#[derive(Debug, Clone, PartialEq)]
pub struct PointRenderStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub radius: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineRenderStyle {
    pub color: Color,
    pub width: f32,
    pub opacity: f32,
    /// Alternating dash/gap lengths in pixels; empty for a solid line
    pub dash_pattern: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarRenderStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub accent_color: Color,
    pub stroke_width: f32,
    pub outer_radius: f32,
    /// Drawn as a selection ring around the star
    pub highlighted: bool,
}

/// Draw queue collected by layers in container pixel space
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Drawing primitives queue, painted by whichever backend hosts the map
    pub drawing_queue: Vec<DrawCommand>,
    /// Viewport clipping bounds (min, max) in screen coordinates
    pub clip_bounds: Option<(Point, Point)>,
    /// Whether clipping is enabled
    pub clipping_enabled: bool,
}

/// Commands that can be issued to the render context
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Point {
        position: Point,
        style: PointRenderStyle,
    },
    Line {
        points: Vec<Point>,
        style: LineRenderStyle,
    },
    Star {
        center: Point,
        style: StarRenderStyle,
    },
    Label {
        position: Point,
        text: String,
        color: Color,
        size: f32,
    },
    /// Base layer descriptor; the host fetches and paints the tiles
    TileSource {
        url_template: String,
        attribution: String,
        zoom: u8,
        opacity: f32,
    },
    Popup {
        anchor: Point,
        title: String,
        lines: Vec<String>,
    },
}

impl RenderContext {
    /// Create a new render context
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            width,
            height,
            drawing_queue: Vec::new(),
            clip_bounds: None,
            clipping_enabled: false,
        })
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) -> Result<()> {
        self.drawing_queue.clear();
        Ok(())
    }

    /// Render a point at the given position with the given style
    pub fn render_point(&mut self, position: &Point, style: &PointRenderStyle) -> Result<()> {
        if self.is_clipped(position, style.radius as f64) {
            return Ok(());
        }
        self.drawing_queue.push(DrawCommand::Point {
            position: *position,
            style: style.clone(),
        });
        Ok(())
    }

    /// Render a line with the given points and style
    pub fn render_line(&mut self, points: &[Point], style: &LineRenderStyle) -> Result<()> {
        if points.len() < 2 {
            return Err(MapError::Validation(
                "a line needs at least two points".to_string(),
            ));
        }
        self.drawing_queue.push(DrawCommand::Line {
            points: points.to_vec(),
            style: style.clone(),
        });
        Ok(())
    }

    /// Render a five-pointed star glyph centered on `center`
    pub fn render_star(&mut self, center: &Point, style: &StarRenderStyle) -> Result<()> {
        if self.is_clipped(center, style.outer_radius as f64) {
            return Ok(());
        }
        self.drawing_queue.push(DrawCommand::Star {
            center: *center,
            style: style.clone(),
        });
        Ok(())
    }

    /// Render a text label
    pub fn render_label(&mut self, position: &Point, text: &str, color: Color, size: f32) -> Result<()> {
        self.drawing_queue.push(DrawCommand::Label {
            position: *position,
            text: text.to_string(),
            color,
            size,
        });
        Ok(())
    }

    /// Queue the base tile layer descriptor
    pub fn render_tile_source(
        &mut self,
        url_template: &str,
        attribution: &str,
        zoom: u8,
        opacity: f32,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(MapError::Validation(
                "Opacity must be between 0.0 and 1.0".to_string(),
            ));
        }
        self.drawing_queue.push(DrawCommand::TileSource {
            url_template: url_template.to_string(),
            attribution: attribution.to_string(),
            zoom,
            opacity,
        });
        Ok(())
    }

    /// Queue an info popup anchored at a container point
    pub fn render_popup(&mut self, anchor: &Point, title: &str, lines: &[String]) -> Result<()> {
        self.drawing_queue.push(DrawCommand::Popup {
            anchor: *anchor,
            title: title.to_string(),
            lines: lines.to_vec(),
        });
        Ok(())
    }

    /// Get the current drawing queue
    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    /// Set viewport clipping bounds
    pub fn set_clip_bounds(&mut self, min: Point, max: Point) {
        self.clip_bounds = Some((min, max));
        self.clipping_enabled = true;
    }

    /// Clear clipping bounds
    pub fn clear_clip_bounds(&mut self) {
        self.clip_bounds = None;
        self.clipping_enabled = false;
    }

    /// True when a glyph of `radius` at `position` lies completely outside the clip
    fn is_clipped(&self, position: &Point, radius: f64) -> bool {
        match (self.clipping_enabled, self.clip_bounds) {
            (true, Some((min, max))) => {
                position.x + radius < min.x
                    || position.x - radius > max.x
                    || position.y + radius < min.y
                    || position.y - radius > max.y
            }
            _ => false,
        }
    }

    /// Clear the drawing queue
    pub fn clear_queue(&mut self) {
        self.drawing_queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot() -> PointRenderStyle {
        PointRenderStyle {
            fill_color: Color::RED,
            stroke_color: Color::WHITE,
            stroke_width: 2.0,
            radius: 6.0,
            opacity: 1.0,
        }
    }

    #[test]
    fn test_clipping_drops_offscreen_points() {
        let mut ctx = RenderContext::new(100, 100).unwrap();
        ctx.set_clip_bounds(Point::new(0.0, 0.0), Point::new(100.0, 100.0));

        ctx.render_point(&Point::new(50.0, 50.0), &dot()).unwrap();
        ctx.render_point(&Point::new(-20.0, 50.0), &dot()).unwrap();
        ctx.render_point(&Point::new(-3.0, 50.0), &dot()).unwrap();

        assert_eq!(ctx.get_drawing_queue().len(), 2);
    }

    #[test]
    fn test_line_needs_two_points() {
        let mut ctx = RenderContext::new(100, 100).unwrap();
        let style = LineRenderStyle {
            color: Color::POLYGON_BLUE,
            width: 2.0,
            opacity: 0.8,
            dash_pattern: vec![5.0, 5.0],
        };
        assert!(ctx.render_line(&[Point::new(0.0, 0.0)], &style).is_err());
        assert!(ctx
            .render_line(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &style)
            .is_ok());
    }

    #[test]
    fn test_begin_frame_clears() {
        let mut ctx = RenderContext::new(10, 10).unwrap();
        ctx.render_label(&Point::new(1.0, 1.0), "1", Color::BLACK, 10.0).unwrap();
        ctx.begin_frame().unwrap();
        assert!(ctx.get_drawing_queue().is_empty());
    }
}
