// Pipeline error kinds
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed getting metrics: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error("sample value not float: {value}")]
    ValueParse {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("failed creating line: sample value {value} at {timestamp} is not finite")]
    NonFiniteValue { value: String, timestamp: i64 },

    #[error("unsupported image format: {0:?}")]
    UnsupportedFormat(String),

    #[error("failed rendering plot: {0}")]
    Render(String),

    #[error("failed delivering plot to {sink}: {source:#}")]
    Sink {
        sink: String,
        #[source]
        source: anyhow::Error,
    },
}
