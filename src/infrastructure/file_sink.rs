// File and stdout delivery
use crate::application::delivery::ImageSink;
use crate::domain::image::RenderedImage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Path value selecting standard output
pub const STDOUT_PATH: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub enum FileSink {
    Stdout,
    Path(PathBuf),
}

impl FileSink {
    pub fn new(path: &str) -> Self {
        if path == STDOUT_PATH {
            FileSink::Stdout
        } else {
            FileSink::Path(PathBuf::from(path))
        }
    }
}

#[async_trait]
impl ImageSink for FileSink {
    fn name(&self) -> String {
        match self {
            FileSink::Stdout => "stdout".to_string(),
            FileSink::Path(path) => format!("'{}'", path.display()),
        }
    }

    async fn deliver(&self, image: &RenderedImage, _title: &str) -> Result<()> {
        match self {
            FileSink::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout
                    .write_all(&image.bytes)
                    .await
                    .context("failed copying plot to stdout")?;
                stdout.flush().await.context("failed flushing stdout")?;
            }
            FileSink::Path(path) => {
                tokio::fs::write(path, &image.bytes)
                    .await
                    .with_context(|| format!("failed creating file {}", path.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::OutputFormat;

    #[test]
    fn test_dash_selects_stdout() {
        assert_eq!(FileSink::new("-"), FileSink::Stdout);
        assert_eq!(
            FileSink::new("plot.png"),
            FileSink::Path(PathBuf::from("plot.png"))
        );
        assert_eq!(FileSink::new("plot.png").name(), "'plot.png'");
    }

    #[tokio::test]
    async fn test_writes_bytes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let image = RenderedImage::new(OutputFormat::Svg, b"<svg/>".to_vec());

        FileSink::Path(path.clone())
            .deliver(&image, "title")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"<svg/>");
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plot.png");
        let image = RenderedImage::new(OutputFormat::Png, vec![1u8]);

        let err = FileSink::Path(path).deliver(&image, "title").await.unwrap_err();

        assert!(format!("{err:#}").contains("failed creating file"));
    }
}
