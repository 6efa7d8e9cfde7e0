use std::f64::consts::SQRT_2;
use std::fmt::Write;
use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use super::shapes::{self, Neighbours, RoundedRect, fmt};
use super::{GradientOptions, GradientType, RenderOptions};
use crate::encoder::ContentKind;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] QrError),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("invalid logo: {0}")]
    InvalidLogo(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Title and kind printed on exported documents.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub kind: ContentKind,
}

/// The rendering collaborator.
pub trait Renderer: Send + Sync {
    fn svg(&self, options: &RenderOptions) -> Result<String, RenderError>;
    fn png(&self, options: &RenderOptions) -> Result<Vec<u8>, RenderError>;
    fn pdf(&self, options: &RenderOptions, info: &DocumentInfo) -> Result<Vec<u8>, RenderError>;
}

/// Dark/light modules of an encoded symbol.
#[derive(Debug, Clone)]
pub struct ModuleMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl ModuleMatrix {
    pub fn encode(data: &str, ec: EcLevel) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), ec)?;
        let width = code.width();
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        Ok(Self { width, dark })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: isize, y: isize) -> bool {
        let w = self.width as isize;
        if x < 0 || y < 0 || x >= w || y >= w {
            return false;
        }
        self.dark[(y * w + x) as usize]
    }

    /// Inside one of the three 7x7 finder patterns.
    pub fn in_finder(&self, x: usize, y: usize) -> bool {
        let far = self.width - 7;
        (x < 7 && y < 7) || (x >= far && y < 7) || (x < 7 && y >= far)
    }

    /// Top-left module of each finder pattern.
    pub fn finder_origins(&self) -> [(usize, usize); 3] {
        let far = self.width - 7;
        [(0, 0), (far, 0), (0, far)]
    }
}

pub type Rgb = [u8; 3];

/// Parse `#rgb` or `#rrggbb`.
pub fn parse_color(value: &str) -> Result<Rgb, RenderError> {
    let invalid = || RenderError::InvalidColor(value.to_string());
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(invalid()),
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

fn hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Fill used for the data modules.
#[derive(Debug, Clone)]
enum Paint {
    Solid(Rgb),
    Linear {
        from: Rgb,
        to: Rgb,
        start: (f64, f64),
        end: (f64, f64),
    },
    Radial {
        from: Rgb,
        to: Rgb,
        centre: (f64, f64),
        radius: f64,
    },
}

impl Paint {
    fn new(solid: Option<&str>, gradient: Option<&GradientOptions>, size: f64) -> Result<Self, RenderError> {
        let Some(gradient) = gradient else {
            return Ok(Paint::Solid(parse_color(solid.unwrap_or("#000000"))?));
        };
        let stop = |i: usize| {
            gradient
                .color_stops
                .get(i)
                .map(|s| parse_color(&s.color))
                .unwrap_or_else(|| Err(RenderError::InvalidColor("missing color stop".into())))
        };
        let (from, to) = (stop(0)?, stop(1)?);
        let c = size / 2.0;
        Ok(match gradient.kind {
            GradientType::Linear => {
                let (dx, dy) = (gradient.rotation.cos(), gradient.rotation.sin());
                let half = c * (dx.abs() + dy.abs());
                Paint::Linear {
                    from,
                    to,
                    start: (c - dx * half, c - dy * half),
                    end: (c + dx * half, c + dy * half),
                }
            }
            GradientType::Radial => Paint::Radial {
                from,
                to,
                centre: (c, c),
                radius: c * SQRT_2,
            },
        })
    }

    fn at(&self, px: f64, py: f64) -> Rgb {
        let (from, to, t) = match *self {
            Paint::Solid(color) => return color,
            Paint::Linear {
                from,
                to,
                start,
                end,
            } => {
                let (vx, vy) = (end.0 - start.0, end.1 - start.1);
                let len2 = vx * vx + vy * vy;
                let t = if len2 == 0.0 {
                    0.0
                } else {
                    ((px - start.0) * vx + (py - start.1) * vy) / len2
                };
                (from, to, t)
            }
            Paint::Radial {
                from,
                to,
                centre,
                radius,
            } => {
                let d = ((px - centre.0).powi(2) + (py - centre.1).powi(2)).sqrt();
                (from, to, d / radius)
            }
        };
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        [mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2])]
    }

    /// `fill` attribute value plus any `<defs>` it needs.
    fn svg_fill(&self) -> (String, String) {
        match self {
            Paint::Solid(color) => (hex(*color), String::new()),
            Paint::Linear {
                from,
                to,
                start,
                end,
            } => (
                "url(#dots-gradient)".to_string(),
                format!(
                    r#"<linearGradient id="dots-gradient" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></linearGradient>"#,
                    fmt(start.0),
                    fmt(start.1),
                    fmt(end.0),
                    fmt(end.1),
                    hex(*from),
                    hex(*to)
                ),
            ),
            Paint::Radial {
                from,
                to,
                centre,
                radius,
            } => (
                "url(#dots-gradient)".to_string(),
                format!(
                    r#"<radialGradient id="dots-gradient" gradientUnits="userSpaceOnUse" cx="{}" cy="{}" r="{}"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></radialGradient>"#,
                    fmt(centre.0),
                    fmt(centre.1),
                    fmt(*radius),
                    hex(*from),
                    hex(*to)
                ),
            ),
        }
    }
}

/// Decoded `data:image/...;base64,` logo.
#[derive(Debug, Clone)]
pub struct Logo {
    pub data_uri: String,
    pub bytes: Vec<u8>,
}

impl Logo {
    pub fn from_data_uri(uri: &str) -> Result<Self, RenderError> {
        let (header, body) = uri
            .split_once(',')
            .ok_or_else(|| RenderError::InvalidLogo("not a data URI".into()))?;
        let subtype = header
            .strip_prefix("data:image/")
            .and_then(|h| h.strip_suffix(";base64"))
            .filter(|t| {
                !t.is_empty()
                    && t.bytes().all(|b| {
                        b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-')
                    })
            });
        if subtype.is_none() {
            return Err(RenderError::InvalidLogo(
                "expected a base64 encoded image data URI".into(),
            ));
        }
        let bytes = STANDARD
            .decode(body.trim())
            .map_err(|e| RenderError::InvalidLogo(e.to_string()))?;
        Ok(Self {
            data_uri: format!("{},{}", header, body.trim()),
            bytes,
        })
    }
}

/// Pixel geometry of one rendered symbol.
struct Layout {
    matrix: ModuleMatrix,
    size: f64,
    module: f64,
    offset: f64,
    /// Inclusive-exclusive module range cleared for the logo, on both axes.
    hidden: Option<(usize, usize)>,
}

impl Layout {
    fn new(options: &RenderOptions) -> Result<Self, RenderError> {
        let ec = if options.image.is_some() {
            EcLevel::H
        } else {
            EcLevel::Q
        };
        let matrix = ModuleMatrix::encode(&options.data, ec)?;
        let count = matrix.width();
        let size = options.width.min(options.height) as f64;
        let module = (size / count as f64).floor().max(1.0);
        let offset = ((size - module * count as f64) / 2.0).floor();

        // H level recovers ~30% of the symbol; the logo takes 40% of that
        let hidden = options.image.as_ref().map(|_| {
            let mut side = (count as f64 * (0.4f64 * 0.3).sqrt()).floor() as usize;
            if side % 2 != count % 2 {
                side = side.saturating_sub(1);
            }
            let start = (count - side) / 2;
            (start, start + side)
        });

        Ok(Self {
            matrix,
            size,
            module,
            offset,
            hidden,
        })
    }

    fn is_hidden(&self, x: usize, y: usize) -> bool {
        matches!(self.hidden, Some((a, b)) if x >= a && x < b && y >= a && y < b)
    }

    fn draws_dot(&self, x: isize, y: isize) -> bool {
        if !self.matrix.is_dark(x, y) {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        !self.matrix.in_finder(x, y) && !self.is_hidden(x, y)
    }

    fn dots(&self, kind: super::DotType) -> Vec<RoundedRect> {
        let count = self.matrix.width() as isize;
        let mut dots = Vec::new();
        for y in 0..count {
            for x in 0..count {
                if !self.draws_dot(x, y) {
                    continue;
                }
                let n = Neighbours {
                    left: self.draws_dot(x - 1, y),
                    right: self.draws_dot(x + 1, y),
                    top: self.draws_dot(x, y - 1),
                    bottom: self.draws_dot(x, y + 1),
                };
                dots.push(shapes::dot(
                    kind,
                    self.offset + x as f64 * self.module,
                    self.offset + y as f64 * self.module,
                    self.module,
                    n,
                ));
            }
        }
        dots
    }

    fn finders(&self, options: &RenderOptions) -> Vec<(shapes::Ring, RoundedRect)> {
        self.matrix
            .finder_origins()
            .iter()
            .map(|&(fx, fy)| {
                let x = self.offset + fx as f64 * self.module;
                let y = self.offset + fy as f64 * self.module;
                (
                    shapes::corner_square(options.corners_square_options.kind, x, y, self.module),
                    shapes::corner_dot(options.corners_dot_options.kind, x, y, self.module),
                )
            })
            .collect()
    }

    /// Pixel box (x, y, side) the logo is drawn into.
    fn logo_box(&self, margin: u32) -> Option<(f64, f64, f64)> {
        let (start, end) = self.hidden?;
        let area = (end - start) as f64 * self.module;
        let origin = self.offset + start as f64 * self.module;
        let inner = area - 2.0 * margin as f64;
        if inner >= self.module {
            Some((origin + margin as f64, origin + margin as f64, inner))
        } else {
            Some((origin, origin, area))
        }
    }
}

/// Built-in renderer drawing styled symbols on top of `qrcode`.
#[derive(Debug, Default, Clone)]
pub struct StyledRenderer;

impl StyledRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for StyledRenderer {
    fn svg(&self, options: &RenderOptions) -> Result<String, RenderError> {
        let layout = Layout::new(options)?;
        let background = parse_color(&options.background_options.color)?;
        let corner_color = parse_color(&options.corners_square_options.color)?;
        let corner_dot_color = parse_color(&options.corners_dot_options.color)?;
        let paint = Paint::new(
            options.dots_options.color.as_deref(),
            options.dots_options.gradient.as_ref(),
            layout.size,
        )?;
        let logo = options
            .image
            .as_deref()
            .map(Logo::from_data_uri)
            .transpose()?;

        let (fill, defs) = paint.svg_fill();
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = options.width,
            h = options.height
        );
        if !defs.is_empty() {
            let _ = write!(svg, "<defs>{}</defs>", defs);
        }
        let _ = write!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
            options.width,
            options.height,
            hex(background)
        );

        let dots: String = layout
            .dots(options.dots_options.kind)
            .iter()
            .map(RoundedRect::svg_path)
            .collect();
        let _ = write!(svg, r#"<path d="{}" fill="{}"/>"#, dots, fill);

        for (ring, centre) in layout.finders(options) {
            let _ = write!(
                svg,
                r#"<path d="{}" fill="{}" fill-rule="evenodd"/>"#,
                ring.svg_path(),
                hex(corner_color)
            );
            let _ = write!(
                svg,
                r#"<path d="{}" fill="{}"/>"#,
                centre.svg_path(),
                hex(corner_dot_color)
            );
        }

        if let (Some(logo), Some((x, y, side))) =
            (logo, layout.logo_box(options.image_options.margin))
        {
            let _ = write!(
                svg,
                r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet"/>"#,
                logo.data_uri,
                fmt(x),
                fmt(y),
                fmt(side),
                fmt(side)
            );
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    fn png(&self, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
        let layout = Layout::new(options)?;
        let background = parse_color(&options.background_options.color)?;
        let corner_color = parse_color(&options.corners_square_options.color)?;
        let corner_dot_color = parse_color(&options.corners_dot_options.color)?;
        let paint = Paint::new(
            options.dots_options.color.as_deref(),
            options.dots_options.gradient.as_ref(),
            layout.size,
        )?;

        let mut canvas = RgbaImage::from_pixel(
            options.width,
            options.height,
            Rgba([background[0], background[1], background[2], 255]),
        );

        for dot in layout.dots(options.dots_options.kind) {
            fill_shape(&mut canvas, bounds(&dot), |px, py| {
                dot.contains(px, py).then(|| paint.at(px, py))
            });
        }
        for (ring, centre) in layout.finders(options) {
            fill_shape(&mut canvas, bounds(&ring.outer), |px, py| {
                ring.contains(px, py).then_some(corner_color)
            });
            fill_shape(&mut canvas, bounds(&centre), |px, py| {
                centre.contains(px, py).then_some(corner_dot_color)
            });
        }

        if let (Some(uri), Some((x, y, side))) = (
            options.image.as_deref(),
            layout.logo_box(options.image_options.margin),
        ) {
            let logo = Logo::from_data_uri(uri)?;
            let decoded = image::load_from_memory(&logo.bytes)?;
            let (lw, lh) = fit(decoded.width(), decoded.height(), side as u32);
            let scaled = imageops::resize(&decoded.to_rgba8(), lw, lh, FilterType::Triangle);
            let left = x as i64 + (side as i64 - lw as i64) / 2;
            let top = y as i64 + (side as i64 - lh as i64) / 2;
            imageops::overlay(&mut canvas, &scaled, left, top);
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn pdf(&self, options: &RenderOptions, info: &DocumentInfo) -> Result<Vec<u8>, RenderError> {
        let matrix = ModuleMatrix::encode(
            &options.data,
            if options.image.is_some() {
                EcLevel::H
            } else {
                EcLevel::Q
            },
        )?;
        let foreground = match (&options.dots_options.color, &options.dots_options.gradient) {
            (Some(color), _) => parse_color(color)?,
            (None, Some(gradient)) => parse_color(
                gradient
                    .color_stops
                    .first()
                    .map(|s| s.color.as_str())
                    .unwrap_or("#000000"),
            )?,
            (None, None) => [0, 0, 0],
        };
        let background = parse_color(&options.background_options.color)?;
        super::pdf::document(&matrix, foreground, background, info)
    }
}

fn bounds(rect: &RoundedRect) -> (u32, u32, u32, u32) {
    (
        rect.x.floor().max(0.0) as u32,
        rect.y.floor().max(0.0) as u32,
        (rect.x + rect.w).ceil().max(0.0) as u32,
        (rect.y + rect.h).ceil().max(0.0) as u32,
    )
}

/// Sample each pixel centre inside `bounds` and paint where `color` says so.
fn fill_shape<F>(canvas: &mut RgbaImage, bounds: (u32, u32, u32, u32), color: F)
where
    F: Fn(f64, f64) -> Option<Rgb>,
{
    let (x0, y0, x1, y1) = bounds;
    for py in y0..y1.min(canvas.height()) {
        for px in x0..x1.min(canvas.width()) {
            if let Some(c) = color(px as f64 + 0.5, py as f64 + 0.5) {
                canvas.put_pixel(px, py, Rgba([c[0], c[1], c[2], 255]));
            }
        }
    }
}

/// Largest size with the same aspect ratio that fits in a `side` square.
fn fit(width: u32, height: u32, side: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (side, side);
    }
    if width >= height {
        (side, ((height as u64 * side as u64) / width as u64).max(1) as u32)
    } else {
        (((width as u64 * side as u64) / height as u64).max(1) as u32, side)
    }
}
