// Metric data domain models

/// One observation as returned by the query engine. The value keeps its
/// textual form until the chart composer parses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub value: String,
}

impl Sample {
    pub fn new(timestamp: i64, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Serialized label set, e.g. `up{instance="a", job="x"}`
    pub label: String,
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(label: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            label: label.into(),
            samples,
        }
    }
}

/// Full result set of a range query. A series is identified by its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    series: Vec<TimeSeries>,
}

impl Matrix {
    pub fn new(series: Vec<TimeSeries>) -> Self {
        Self { series }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeries> {
        self.series.iter()
    }
}

impl From<Vec<TimeSeries>> for Matrix {
    fn from(series: Vec<TimeSeries>) -> Self {
        Self::new(series)
    }
}
