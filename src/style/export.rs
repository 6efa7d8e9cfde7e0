use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::RenderOptions;
use super::render::{DocumentInfo, RenderError, Renderer};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

/// A rendered file ready to be offered as a download.
#[derive(Debug, Clone)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Export {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Ask the renderer for one export format.
pub fn export(
    renderer: &dyn Renderer,
    options: &RenderOptions,
    format: ExportFormat,
    info: &DocumentInfo,
) -> Result<Export, RenderError> {
    let bytes = match format {
        ExportFormat::Png => renderer.png(options)?,
        ExportFormat::Svg => renderer.svg(options)?.into_bytes(),
        ExportFormat::Pdf => renderer.pdf(options, info)?,
    };
    Ok(Export {
        filename: format!("{}.{}", info.kind.export_name(), format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}
