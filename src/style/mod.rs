//! Style configuration and the option shape handed to the renderer.

pub mod export;
pub mod pdf;
pub mod render;
pub mod shapes;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub use export::{Export, ExportFormat, export};
pub use render::{Renderer, StyledRenderer};

/// Canvas size used for previews and raster exports.
pub const CANVAS_SIZE: u32 = 280;
/// Gap between the logo and the surrounding modules, in pixels.
pub const LOGO_MARGIN: u32 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DotType {
    #[default]
    Square,
    Dots,
    Rounded,
    ExtraRounded,
    Classy,
    ClassyRounded,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareType {
    #[default]
    Square,
    Dot,
    ExtraRounded,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotType {
    #[default]
    Square,
    Dot,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    #[default]
    Linear,
    Radial,
}

/// Two-stop gradient applied to the data modules.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Gradient {
    #[serde(rename = "type", default)]
    pub kind: GradientType,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    pub color1: String,
    pub color2: String,
}

/// User-facing style choices.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    pub fg_color: String,
    pub bg_color: String,
    pub dots: DotType,
    pub corner_square: CornerSquareType,
    pub corner_dot: CornerDotType,
    pub gradient: Option<Gradient>,
    /// Logo as a `data:image/...;base64,` URI.
    pub logo: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            fg_color: "#000000".to_string(),
            bg_color: "#ffffff".to_string(),
            dots: DotType::Square,
            corner_square: CornerSquareType::Square,
            corner_dot: CornerDotType::Square,
            gradient: None,
            logo: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradientOptions {
    #[serde(rename = "type")]
    pub kind: GradientType,
    /// Radians.
    pub rotation: f64,
    pub color_stops: Vec<ColorStop>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DotsOptions {
    #[serde(rename = "type")]
    pub kind: DotType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientOptions>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CornersSquareOptions {
    #[serde(rename = "type")]
    pub kind: CornerSquareType,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CornersDotOptions {
    #[serde(rename = "type")]
    pub kind: CornerDotType,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackgroundOptions {
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub cross_origin: String,
    pub margin: u32,
}

/// Everything the renderer needs to draw one symbol.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub dots_options: DotsOptions,
    pub corners_square_options: CornersSquareOptions,
    pub corners_dot_options: CornersDotOptions,
    pub background_options: BackgroundOptions,
    pub image_options: ImageOptions,
}

impl StyleConfig {
    /// Map the style onto renderer options for `data`.
    ///
    /// With a gradient the dots lose their solid color; finder corners always
    /// stay solid in the foreground color.
    pub fn render_options(&self, data: &str) -> RenderOptions {
        let gradient = self.gradient.as_ref().map(|g| GradientOptions {
            kind: g.kind,
            rotation: g.rotation.to_radians(),
            color_stops: vec![
                ColorStop {
                    offset: 0.0,
                    color: g.color1.clone(),
                },
                ColorStop {
                    offset: 1.0,
                    color: g.color2.clone(),
                },
            ],
        });

        RenderOptions {
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            data: data.to_string(),
            image: self.logo.clone(),
            dots_options: DotsOptions {
                kind: self.dots,
                color: if gradient.is_some() {
                    None
                } else {
                    Some(self.fg_color.clone())
                },
                gradient,
            },
            corners_square_options: CornersSquareOptions {
                kind: self.corner_square,
                color: self.fg_color.clone(),
            },
            corners_dot_options: CornersDotOptions {
                kind: self.corner_dot,
                color: self.fg_color.clone(),
            },
            background_options: BackgroundOptions {
                color: self.bg_color.clone(),
            },
            image_options: ImageOptions {
                cross_origin: "anonymous".to_string(),
                margin: LOGO_MARGIN,
            },
        }
    }

    /// Every color must be `#rgb` or `#rrggbb`.
    pub fn check_colors(&self) -> Result<(), render::RenderError> {
        render::parse_color(&self.fg_color)?;
        render::parse_color(&self.bg_color)?;
        if let Some(gradient) = &self.gradient {
            render::parse_color(&gradient.color1)?;
            render::parse_color(&gradient.color2)?;
        }
        Ok(())
    }

    /// Style summary persisted with a saved record.
    pub fn meta(&self) -> Value {
        json!({
            "color": self.fg_color,
            "bgColor": self.bg_color,
            "logo": self.logo.is_some(),
            "style": {
                "dotsStyle": self.dots,
                "cornerSquareStyle": self.corner_square,
                "cornerDotStyle": self.corner_dot,
            }
        })
    }

    /// Rebuild a style from stored `meta`. Unknown or missing fields fall back
    /// to the defaults; logos and gradients are not part of `meta`.
    pub fn from_meta(meta: &Value) -> Self {
        let defaults = StyleConfig::default();
        let text = |key: &str, fallback: String| {
            meta.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        let style = meta.get("style");
        let shape = |key: &str| style.and_then(|s| s.get(key)).cloned();

        StyleConfig {
            fg_color: text("color", defaults.fg_color),
            bg_color: text("bgColor", defaults.bg_color),
            dots: shape("dotsStyle")
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            corner_square: shape("cornerSquareStyle")
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            corner_dot: shape("cornerDotStyle")
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            gradient: None,
            logo: None,
        }
    }
}
