// Plot service - Use case for fetching, plotting and delivering a query
use crate::application::chart_renderer::ChartRenderer;
use crate::application::delivery::ImageSink;
use crate::application::metrics_repository::{MetricsRepository, RangeQuery};
use crate::domain::chart::compose;
use crate::domain::error::PlotError;
use crate::domain::image::{OutputFormat, RenderedImage};
use crate::domain::metrics::Matrix;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub query: RangeQuery,
    pub title: String,
    pub format: OutputFormat,
}

#[derive(Clone)]
pub struct PlotService {
    repository: Arc<dyn MetricsRepository>,
    renderer: Arc<dyn ChartRenderer>,
    sinks: Vec<Arc<dyn ImageSink>>,
}

impl PlotService {
    /// Sinks are delivered to in the given order
    pub fn new(
        repository: Arc<dyn MetricsRepository>,
        renderer: Arc<dyn ChartRenderer>,
        sinks: Vec<Arc<dyn ImageSink>>,
    ) -> Self {
        Self {
            repository,
            renderer,
            sinks,
        }
    }

    pub async fn run(&self, request: &PlotRequest) -> Result<RenderedImage, PlotError> {
        tracing::info!("Querying Prometheus {:?}", request.query.query);
        let matrix = self
            .repository
            .query_range(&request.query)
            .await
            .map_err(PlotError::Fetch)?;
        tracing::debug!("Query returned {} series", matrix.len());

        tracing::info!("Creating plot {:?}", request.title);
        let image = self.plot(&matrix, &request.title, request.format)?;

        for sink in &self.sinks {
            let name = sink.name();
            tracing::info!("Writing to {}", name);
            sink.deliver(&image, &request.title)
                .await
                .map_err(|source| PlotError::Sink { sink: name, source })?;
        }

        tracing::info!("Done");
        Ok(image)
    }

    pub fn plot(
        &self,
        matrix: &Matrix,
        title: &str,
        format: OutputFormat,
    ) -> Result<RenderedImage, PlotError> {
        let chart = compose(matrix, title)?;
        self.renderer.render(&chart, format)
    }
}
