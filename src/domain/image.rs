// Rendered image domain models
use super::error::PlotError;
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Svg => "image/svg+xml",
        }
    }

    pub fn is_vector(self) -> bool {
        self == OutputFormat::Svg
    }
}

impl FromStr for OutputFormat {
    type Err = PlotError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "bmp" => Ok(OutputFormat::Bmp),
            "svg" => Ok(OutputFormat::Svg),
            _ => Err(PlotError::UnsupportedFormat(token.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Fully buffered render output. Cloning shares the underlying buffer.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub format: OutputFormat,
    pub bytes: Bytes,
}

impl RenderedImage {
    pub fn new(format: OutputFormat, bytes: impl Into<Bytes>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_tokens() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert_eq!("svg".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = "eps".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, PlotError::UnsupportedFormat(ref t) if t == "eps"));
    }

    #[test]
    fn test_rendered_image_clones_share_buffer() {
        let image = RenderedImage::new(OutputFormat::Png, vec![1u8, 2, 3]);
        let copy = image.clone();
        assert_eq!(image.bytes.as_ptr(), copy.bytes.as_ptr());
        assert_eq!(copy.len(), 3);
    }
}
