//! Paints a [`RenderContext`] draw queue with egui.
//!
//! Commands are in container pixel space; `origin` is the top-left corner
//! of the map rect on screen. Tile fetching is left to the host, so the base
//! layer descriptor only contributes its attribution line.

use crate::{
    core::geo::Point,
    rendering::context::{DrawCommand, LineRenderStyle, PointRenderStyle, StarRenderStyle},
    rendering::RenderContext,
};
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use std::f32::consts::PI;

const STAR_INNER_RATIO: f32 = 0.45;
const POPUP_WIDTH: f32 = 220.0;
const POPUP_LINE_HEIGHT: f32 = 16.0;

/// Paints every queued command inside `rect`
pub fn paint_context(painter: &Painter, rect: Rect, context: &RenderContext) {
    let painter = painter.with_clip_rect(rect);
    let origin = rect.min;

    // Popups go last so glyphs never cover them
    let (popups, glyphs): (Vec<_>, Vec<_>) = context
        .get_drawing_queue()
        .iter()
        .partition(|command| matches!(command, DrawCommand::Popup { .. }));

    for command in glyphs.into_iter().chain(popups) {
        paint_command(&painter, origin, rect, command);
    }
}

fn to_screen(origin: Pos2, point: &Point) -> Pos2 {
    Pos2::new(origin.x + point.x as f32, origin.y + point.y as f32)
}

fn with_opacity(color: crate::layers::style::Color, opacity: f32) -> Color32 {
    let alpha = color.a as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    color.with_opacity(alpha).into()
}

pub fn paint_command(painter: &Painter, origin: Pos2, rect: Rect, command: &DrawCommand) {
    match command {
        DrawCommand::Point { position, style } => {
            paint_point(painter, to_screen(origin, position), style)
        }
        DrawCommand::Line { points, style } => {
            let points: Vec<Pos2> = points.iter().map(|p| to_screen(origin, p)).collect();
            paint_line(painter, points, style);
        }
        DrawCommand::Star { center, style } => {
            paint_star(painter, to_screen(origin, center), style)
        }
        DrawCommand::Label {
            position,
            text,
            color,
            size,
        } => {
            painter.text(
                to_screen(origin, position),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(*size),
                (*color).into(),
            );
        }
        DrawCommand::TileSource { attribution, .. } => {
            if !attribution.is_empty() {
                painter.text(
                    rect.left_bottom() + Vec2::new(5.0, -5.0),
                    Align2::LEFT_BOTTOM,
                    attribution,
                    FontId::proportional(10.0),
                    Color32::from_gray(120),
                );
            }
        }
        DrawCommand::Popup {
            anchor,
            title,
            lines,
        } => paint_popup(painter, to_screen(origin, anchor), title, lines),
    }
}

fn paint_point(painter: &Painter, center: Pos2, style: &PointRenderStyle) {
    let fill = with_opacity(style.fill_color, style.opacity);
    let stroke = if style.stroke_width > 0.0 {
        Stroke::new(style.stroke_width, Color32::from(style.stroke_color))
    } else {
        Stroke::NONE
    };
    painter.circle(center, style.radius, fill, stroke);
}

fn paint_line(painter: &Painter, points: Vec<Pos2>, style: &LineRenderStyle) {
    let stroke = Stroke::new(style.width, with_opacity(style.color, style.opacity));
    match style.dash_pattern.as_slice() {
        [dash, gap, ..] => painter.extend(Shape::dashed_line(&points, stroke, *dash, *gap)),
        _ => {
            painter.add(Shape::line(points, stroke));
        }
    }
}

/// Outline of a five-pointed star, tip up
fn star_outline(center: Pos2, outer_radius: f32) -> Vec<Pos2> {
    let inner_radius = outer_radius * STAR_INNER_RATIO;
    (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
            let angle = -PI / 2.0 + i as f32 * PI / 5.0;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn paint_star(painter: &Painter, center: Pos2, style: &StarRenderStyle) {
    if style.highlighted {
        painter.circle_stroke(
            center,
            style.outer_radius + 4.0,
            Stroke::new(2.0, Color32::from(style.accent_color)),
        );
    }

    let outline = star_outline(center, style.outer_radius);
    let fill = Color32::from(style.fill_color);

    // The star is concave; fill it as a fan of convex triangles
    for i in 0..outline.len() {
        let next = (i + 1) % outline.len();
        painter.add(Shape::convex_polygon(
            vec![center, outline[i], outline[next]],
            fill,
            Stroke::NONE,
        ));
    }
    painter.add(Shape::closed_line(
        outline,
        Stroke::new(style.stroke_width, Color32::from(style.stroke_color)),
    ));
}

fn paint_popup(painter: &Painter, anchor: Pos2, title: &str, lines: &[String]) {
    let height = POPUP_LINE_HEIGHT * (lines.len() as f32 + 1.0) + 12.0;
    let popup_rect = Rect::from_min_size(
        anchor + Vec2::new(-POPUP_WIDTH / 2.0, -height - 12.0),
        Vec2::new(POPUP_WIDTH, height),
    );

    painter.rect_filled(popup_rect, 4.0, Color32::from_rgba_unmultiplied(255, 255, 255, 235));
    painter.rect_stroke(popup_rect, 4.0, Stroke::new(1.0, Color32::from_gray(100)));
    painter.add(Shape::convex_polygon(
        vec![
            anchor,
            Pos2::new(anchor.x - 6.0, popup_rect.max.y),
            Pos2::new(anchor.x + 6.0, popup_rect.max.y),
        ],
        Color32::from_rgba_unmultiplied(255, 255, 255, 235),
        Stroke::NONE,
    ));

    let mut cursor = popup_rect.min + Vec2::new(8.0, 6.0);
    painter.text(
        cursor,
        Align2::LEFT_TOP,
        title,
        FontId::proportional(14.0),
        Color32::BLACK,
    );
    for line in lines {
        cursor.y += POPUP_LINE_HEIGHT;
        painter.text(
            cursor,
            Align2::LEFT_TOP,
            line,
            FontId::proportional(12.0),
            Color32::from_gray(60),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_outline_alternates_radii() {
        let center = Pos2::new(50.0, 50.0);
        let outline = star_outline(center, 10.0);
        assert_eq!(outline.len(), 10);
        assert!((outline[0].distance(center) - 10.0).abs() < 1e-4);
        assert!((outline[1].distance(center) - 4.5).abs() < 1e-4);
        // Tip points up in screen space
        assert!(outline[0].y < center.y);
    }
}
