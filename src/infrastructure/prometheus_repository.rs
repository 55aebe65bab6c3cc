// Prometheus HTTP API repository implementation
use crate::application::metrics_repository::{MetricsRepository, RangeQuery};
use crate::domain::metrics::{Matrix, Sample, TimeSeries};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PrometheusRepository {
    host: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<MatrixEntry>,
}

#[derive(Debug, Deserialize)]
struct MatrixEntry {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl PrometheusRepository {
    pub fn new(host: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Prometheus HTTP client")?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_query_url(&self, query: &RangeQuery) -> String {
        format!(
            "{}/api/v1/query_range?query={}&start={}&end={}&step={}s",
            self.host,
            urlencoding::encode(&query.query),
            query.start().timestamp(),
            query.time.timestamp(),
            query.step().num_seconds()
        )
    }

    async fn execute_query(&self, query: &RangeQuery) -> Result<QueryData> {
        let url = self.build_query_url(query);
        tracing::debug!("Executing range query: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to Prometheus")?;

        // Prometheus reports query errors with a JSON body on 4xx/5xx as well
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Prometheus response")?;

        let parsed = serde_json::from_str::<QueryResponse>(&body);
        let data = match parsed {
            Ok(data) => data,
            Err(_) if !status.is_success() => {
                anyhow::bail!("Prometheus query failed with status {}: {}", status, body)
            }
            Err(e) => return Err(e).context("Failed to parse Prometheus response"),
        };

        if data.status != "success" {
            anyhow::bail!(
                "Prometheus query error ({}): {}",
                data.error_type.as_deref().unwrap_or("unknown"),
                data.error.as_deref().unwrap_or("no error message")
            );
        }

        let data = data
            .data
            .context("Prometheus response has no data section")?;

        if data.result_type != "matrix" {
            anyhow::bail!(
                "Prometheus returned {} instead of a range vector",
                data.result_type
            );
        }

        Ok(data)
    }
}

/// Renders a label set the way Prometheus prints metrics:
/// `name{a="1", b="2"}`, labels sorted by name.
fn metric_label(metric: &BTreeMap<String, String>) -> String {
    let name = metric.get("__name__").map(String::as_str).unwrap_or("");
    let labels: Vec<String> = metric
        .iter()
        .filter(|(key, _)| key.as_str() != "__name__")
        .map(|(key, value)| format!("{}={:?}", key, value))
        .collect();

    if labels.is_empty() && !name.is_empty() {
        return name.to_string();
    }
    format!("{}{{{}}}", name, labels.join(", "))
}

#[async_trait]
impl MetricsRepository for PrometheusRepository {
    async fn query_range(&self, query: &RangeQuery) -> Result<Matrix> {
        let data = self.execute_query(query).await?;

        let series = data
            .result
            .into_iter()
            .map(|entry| {
                let samples = entry
                    .values
                    .into_iter()
                    .map(|(time, value)| Sample::new(time.floor() as i64, value))
                    .collect();
                TimeSeries::new(metric_label(&entry.metric), samples)
            })
            .collect::<Vec<_>>();

        tracing::debug!("Got {} series from Prometheus", series.len());
        Ok(Matrix::new(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn range_query() -> RangeQuery {
        RangeQuery::new(
            "rate(http_requests_total[5m])",
            DateTime::from_timestamp(1_700_003_600, 0).unwrap(),
            chrono::Duration::hours(1),
        )
    }

    fn repository(server: &MockServer) -> PrometheusRepository {
        PrometheusRepository::new(server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_metric_label_formatting() {
        let mut metric = BTreeMap::new();
        metric.insert("__name__".to_string(), "up".to_string());
        assert_eq!(metric_label(&metric), "up");

        metric.insert("job".to_string(), "node".to_string());
        metric.insert("instance".to_string(), "a:9100".to_string());
        assert_eq!(metric_label(&metric), r#"up{instance="a:9100", job="node"}"#);

        metric.remove("__name__");
        assert_eq!(metric_label(&metric), r#"{instance="a:9100", job="node"}"#);

        assert_eq!(metric_label(&BTreeMap::new()), "{}");
    }

    #[test]
    fn test_build_query_url() {
        let repo = PrometheusRepository::new("http://prom:9090/".to_string(), Duration::from_secs(1))
            .unwrap();

        assert_eq!(
            repo.build_query_url(&range_query()),
            "http://prom:9090/api/v1/query_range?query=rate%28http_requests_total%5B5m%5D%29&start=1700000000&end=1700003600&step=36s"
        );
    }

    #[tokio::test]
    async fn test_query_range_returns_matrix() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/query_range")
                    .query_param("query", "rate(http_requests_total[5m])")
                    .query_param("start", "1700000000")
                    .query_param("end", "1700003600")
                    .query_param("step", "36s");
                then.status(200).json_body(json!({
                    "status": "success",
                    "data": {
                        "resultType": "matrix",
                        "result": [
                            {
                                "metric": {"__name__": "up", "job": "x"},
                                "values": [[1700000000, "1"], [1700000036.5, "0.5"]]
                            },
                            {
                                "metric": {"job": "y"},
                                "values": [[1700000000, "NaN"]]
                            }
                        ]
                    }
                }));
            })
            .await;

        let matrix = repository(&server).query_range(&range_query()).await.unwrap();

        mock.assert_async().await;
        let series: Vec<&TimeSeries> = matrix.iter().collect();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, r#"up{job="x"}"#);
        assert_eq!(
            series[0].samples,
            vec![Sample::new(1_700_000_000, "1"), Sample::new(1_700_000_036, "0.5")]
        );
        assert_eq!(series[1].label, r#"{job="y"}"#);
        assert_eq!(series[1].samples[0].value, "NaN");
    }

    #[tokio::test]
    async fn test_query_error_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/query_range");
                then.status(400).json_body(json!({
                    "status": "error",
                    "errorType": "bad_data",
                    "error": "parse error at char 5"
                }));
            })
            .await;

        let err = repository(&server)
            .query_range(&range_query())
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("bad_data"), "{message}");
        assert!(message.contains("parse error at char 5"), "{message}");
    }

    #[tokio::test]
    async fn test_non_json_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/query_range");
                then.status(502).body("bad gateway");
            })
            .await;

        let err = repository(&server)
            .query_range(&range_query())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("502"));
    }

    #[tokio::test]
    async fn test_instant_vector_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/query_range");
                then.status(200).json_body(json!({
                    "status": "success",
                    "data": {"resultType": "vector", "result": []}
                }));
            })
            .await;

        let err = repository(&server)
            .query_range(&range_query())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("vector"));
    }
}
