// Domain layer - Metric data, chart composition and rendering outputs
pub mod chart;
pub mod error;
pub mod image;
pub mod legend;
pub mod metrics;
pub mod palette;
