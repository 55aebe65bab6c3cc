// Renderer trait turning composed charts into image bytes
use crate::domain::chart::Chart;
use crate::domain::error::PlotError;
use crate::domain::image::{OutputFormat, RenderedImage};

pub trait ChartRenderer: Send + Sync {
    /// Draw the whole chart into a fully buffered image
    fn render(&self, chart: &Chart, format: OutputFormat) -> Result<RenderedImage, PlotError>;
}
