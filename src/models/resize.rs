use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// How the requested box is applied to the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResizeMode {
    ExactWidthAndHeight,
    MaxWidth,
    MaxHeight,
    MaxWidthAndHeight,
    UniformFill,
}

impl ResizeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeMode::ExactWidthAndHeight => "exactwidthandheight",
            ResizeMode::MaxWidth => "maxwidth",
            ResizeMode::MaxHeight => "maxheight",
            ResizeMode::MaxWidthAndHeight => "maxwidthandheight",
            ResizeMode::UniformFill => "uniformfill",
        }
    }
}

impl FromStr for ResizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exactwidthandheight" => Ok(ResizeMode::ExactWidthAndHeight),
            "maxwidth" => Ok(ResizeMode::MaxWidth),
            "maxheight" => Ok(ResizeMode::MaxHeight),
            "maxwidthandheight" => Ok(ResizeMode::MaxWidthAndHeight),
            "uniformfill" | "croptotargetaspect" => Ok(ResizeMode::UniformFill),
            _ => Err(format!("Unsupported resize mode: {}", s)),
        }
    }
}

impl TryFrom<String> for ResizeMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResizeMode> for String {
    fn from(mode: ResizeMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded output format of a resized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Avif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Gif,
        OutputFormat::Bmp,
        OutputFormat::Webp,
        OutputFormat::Avif,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    /// File extension used by cache backends.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Avif => "image/avif",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "bmp" => Ok(OutputFormat::Bmp),
            "webp" => Ok(OutputFormat::Webp),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(format!("Unsupported format: {}", s)),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded resize request. Created per incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResizeRequest {
    /// Source path as resolved by the source provider, always starting with `/`.
    pub source_path: String,
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub format: OutputFormat,
}

impl ResizeRequest {
    pub fn new(
        source_path: impl Into<String>,
        width: u32,
        height: u32,
        mode: ResizeMode,
        format: OutputFormat,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            width,
            height,
            mode,
            format,
        }
    }

    pub fn mapping(&self) -> AllowedMapping {
        AllowedMapping {
            width: self.width,
            height: self.height,
            mode: self.mode,
            format: self.format,
        }
    }

    pub fn with_format(&self, format: OutputFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }
}

// Whitelist entry; equality is structural on all four fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedMapping {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub format: OutputFormat,
}
