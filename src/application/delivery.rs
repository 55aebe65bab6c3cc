// Delivery sink trait for rendered plots
use crate::domain::image::RenderedImage;
use async_trait::async_trait;

#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Short description used in progress and error messages
    fn name(&self) -> String;

    async fn deliver(&self, image: &RenderedImage, title: &str) -> anyhow::Result<()>;
}
