// Repository trait for metrics range queries
use crate::domain::metrics::Matrix;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Number of data points requested per series when none is configured
pub const DEFAULT_POINTS: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub query: String,
    /// Evaluation time, the right edge of the range
    pub time: DateTime<Utc>,
    pub lookback: Duration,
    pub points: u32,
}

impl RangeQuery {
    pub fn new(query: impl Into<String>, time: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            query: query.into(),
            time,
            lookback,
            points: DEFAULT_POINTS,
        }
    }

    /// Left edge of the range, clamped to the earliest representable time
    pub fn start(&self) -> DateTime<Utc> {
        self.time
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Resolution step, never below one second
    pub fn step(&self) -> Duration {
        let secs = self.lookback.num_seconds() / i64::from(self.points.max(1));
        Duration::seconds(secs.max(1))
    }
}

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Evaluate `query` over `[time - lookback, time]`
    async fn query_range(&self, query: &RangeQuery) -> anyhow::Result<Matrix>;
}
