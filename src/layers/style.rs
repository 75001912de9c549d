//! Pure mappings from data values to visual styles.
//!
//! Markers are styled from their raw dBm reading, coverage grid samples from
//! the quality category assigned by the analysis service, recommendations
//! from their priority. None of these functions touch layer state.

use crate::{
    core::config::SignalThresholds,
    data::model::{CoverageQuality, MarkerColor, PointMarker, Priority},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "egui")]
use egui::Color32;

/// Serializable RGBA color that converts to `egui::Color32` when the painter is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);
    /// Stroke and vertex color of the analysis polygon (#2196F3)
    pub const POLYGON_BLUE: Color = Color::rgb(0x21, 0x96, 0xF3);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| MapError::Validation(format!("invalid hex color '{}'", hex)))
        };

        match digits.len() {
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(MapError::Validation(format!("invalid hex color '{}'", hex))),
        }
    }

    /// `#RRGGBB`, alpha omitted
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Same color with alpha scaled from an opacity in [0, 1]
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(self.r, self.g, self.b, a)
    }

    /// Linear interpolation between two colors
    pub fn lerp(&self, other: &Color, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

#[cfg(feature = "egui")]
impl From<Color> for Color32 {
    fn from(color: Color) -> Self {
        Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

#[cfg(feature = "egui")]
impl From<Color32> for Color {
    fn from(color: Color32) -> Self {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        Self::new(r, g, b, a)
    }
}

/// Signal band of a raw dBm reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalCategory {
    Excellent,
    Good,
    Poor,
    /// No reading available
    Unknown,
}

impl SignalCategory {
    pub fn color(&self) -> Color {
        match self {
            SignalCategory::Excellent => Color::GREEN,
            SignalCategory::Good => Color::ORANGE,
            SignalCategory::Poor => Color::RED,
            SignalCategory::Unknown => Color::GRAY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalCategory::Excellent => "excellent",
            SignalCategory::Good => "good",
            SignalCategory::Poor => "poor",
            SignalCategory::Unknown => "unknown",
        }
    }
}

/// Normalises dBm to a heatmap intensity in [0, 1] with the default thresholds
pub fn dbm_to_intensity(dbm: f64) -> f64 {
    SignalThresholds::default().intensity(dbm)
}

/// Categorises an optional dBm reading; `None` and NaN are `Unknown`
pub fn signal_category(dbm: Option<f64>, thresholds: &SignalThresholds) -> SignalCategory {
    match dbm {
        Some(value) if !value.is_nan() => thresholds.categorize(value),
        _ => SignalCategory::Unknown,
    }
}

/// Glyph color for a point marker: explicit color first, then the dBm band
pub fn marker_color(marker: &PointMarker, thresholds: &SignalThresholds) -> Color {
    match marker.color {
        Some(MarkerColor::Tower) => Color::PURPLE,
        Some(MarkerColor::Custom(color)) => color,
        None => signal_category(marker.signal_strength_dbm, thresholds).color(),
    }
}

/// Fill color and opacity of a coverage grid sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityStyle {
    pub color: Color,
    pub opacity: f32,
}

/// Maps a grid quality category to its style; the raw dBm never participates
pub fn quality_style(quality: &CoverageQuality) -> QualityStyle {
    let (color, opacity) = match quality {
        CoverageQuality::Excellent => (Color::rgb(0x4C, 0xAF, 0x50), 0.7),
        CoverageQuality::Good => (Color::rgb(0x8B, 0xC3, 0x4A), 0.6),
        CoverageQuality::Fair => (Color::rgb(0xFF, 0xC1, 0x07), 0.6),
        CoverageQuality::Poor => (Color::rgb(0xF4, 0x43, 0x36), 0.5),
        CoverageQuality::Unknown(_) => (Color::rgb(0x9E, 0x9E, 0x9E), 0.4),
    };
    QualityStyle { color, opacity }
}

/// Star glyph colors for a recommendation priority
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityStyle {
    pub fill: Color,
    pub border: Color,
    /// Center dot
    pub accent: Color,
}

pub fn priority_style(priority: Priority) -> PriorityStyle {
    match priority {
        Priority::High => PriorityStyle {
            fill: Color::rgb(0xFF, 0xD7, 0x00),
            border: Color::rgb(0xFF, 0xA5, 0x00),
            accent: Color::BLACK,
        },
        Priority::Medium => PriorityStyle {
            fill: Color::rgb(0xFF, 0xA5, 0x00),
            border: Color::rgb(0xFF, 0x8C, 0x00),
            accent: Color::WHITE,
        },
        Priority::Low => PriorityStyle {
            fill: Color::rgb(0xFF, 0xB6, 0xC1),
            border: Color::rgb(0xFF, 0x69, 0xB4),
            accent: Color::BLACK,
        },
    }
}
