// Command line surface
use crate::application::metrics_repository::RangeQuery;
use crate::application::plot_service::PlotRequest;
use crate::domain::error::PlotError;
use crate::domain::image::OutputFormat;
use crate::infrastructure::config::Settings;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use clap::Parser;
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "Prometheus metrics";
pub const DEFAULT_FORMAT: &str = "png";

/// Create and deliver plots from your Prometheus metrics.
///
/// Save plot to file or send it right to a Slack channel.
/// At least one of --file or --slack must be set.
#[derive(Parser, Debug)]
#[command(name = "promplot", disable_version_flag = true)]
pub struct Cli {
    /// Suppress all informational output
    #[arg(long)]
    pub silent: bool,

    /// Print binary version
    #[arg(long)]
    pub version: bool,

    /// Required. URL of Prometheus server
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Required. PromQL query
    #[arg(long, value_name = "PROMQL")]
    pub query: Option<String>,

    /// Time for query (default is now). RFC 3339, Unix seconds, or the default format of date(1)
    #[arg(long, value_name = "TIME", value_parser = parse_time)]
    pub time: Option<DateTime<Utc>>,

    /// Required. Time to look back to. Format: 5d12h34m56s
    #[arg(long, value_name = "DURATION", value_parser = parse_lookback)]
    pub range: Option<Duration>,

    /// Title of graph [default: Prometheus metrics]
    #[arg(long)]
    pub title: Option<String>,

    /// Image format: png, jpg, tiff, bmp or svg [default: png]
    #[arg(long)]
    pub format: Option<String>,

    /// File to save image to. Should have same extension as --format. Set to - to write to stdout
    #[arg(long, value_name = "PATH")]
    pub file: Option<String>,

    /// Slack API token. Set to post plot to Slack
    #[arg(long, value_name = "TOKEN")]
    pub slack: Option<String>,

    /// Required when --slack is set. Slack channel ID to post to
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Plot(#[from] PlotError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlackTarget {
    pub token: String,
    pub channel: String,
}

/// Fully validated invocation, flags merged over configuration
#[derive(Debug, Clone)]
pub struct Invocation {
    pub prometheus_url: String,
    pub request: PlotRequest,
    pub file: Option<String>,
    pub slack: Option<SlackTarget>,
}

impl Cli {
    pub fn resolve(self, settings: &Settings, now: DateTime<Utc>) -> Result<Invocation, CliError> {
        let prometheus_url = non_empty(self.url)
            .or_else(|| non_empty(settings.prometheus.url.clone()))
            .ok_or_else(|| CliError::Usage("--url is required".to_string()))?;
        let query = non_empty(self.query)
            .ok_or_else(|| CliError::Usage("--query is required".to_string()))?;
        let lookback = self
            .range
            .filter(|range| *range > Duration::zero())
            .ok_or_else(|| CliError::Usage("--range is required".to_string()))?;

        let token = non_empty(self.slack).or_else(|| non_empty(settings.slack.token.clone()));
        let channel = non_empty(self.channel).or_else(|| non_empty(settings.slack.channel.clone()));
        let slack = match (token, channel) {
            (Some(token), Some(channel)) => Some(SlackTarget { token, channel }),
            (Some(_), None) => {
                return Err(CliError::Usage(
                    "--channel is required when --slack is set".to_string(),
                ));
            }
            (None, _) => None,
        };

        let file = non_empty(self.file);
        if file.is_none() && slack.is_none() {
            return Err(CliError::Usage(
                "at least one of --file or --slack must be set".to_string(),
            ));
        }

        let format = self
            .format
            .or_else(|| settings.plot.format.clone())
            .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
            .parse::<OutputFormat>()?;
        let title = self
            .title
            .or_else(|| settings.plot.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let time = self.time.unwrap_or(now);
        if time.checked_sub_signed(lookback).is_none() {
            return Err(CliError::Usage(format!(
                "--range reaches before the earliest supported time from {}",
                time
            )));
        }

        let mut range_query = RangeQuery::new(query, time, lookback);
        range_query.points = settings.prometheus.points;

        Ok(Invocation {
            prometheus_url,
            request: PlotRequest {
                query: range_query,
                title,
                format,
            },
            file,
            slack,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn version_line() -> String {
    format!(
        "promplot {} {} {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Parses durations like `5d12h34m56s`. Units: d, h, m, s, ms; numbers may be
/// fractional.
pub fn parse_lookback(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total_ms = 0.0;
    let mut rest = input;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {:?}", input))?;
        if number_end == 0 {
            return Err(format!("invalid duration {:?}", input));
        }
        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", input))?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_ms = match &rest[..unit_end] {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            "d" => 86_400_000.0,
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, input)),
        };
        rest = &rest[unit_end..];

        total_ms += value * unit_ms;
    }

    let total_ms = total_ms.round();
    if total_ms >= i64::MAX as f64 {
        return Err(format!("duration {:?} is too long", input));
    }
    Duration::try_milliseconds(total_ms as i64)
        .ok_or_else(|| format!("duration {:?} is too long", input))
}

/// Accepts Unix seconds, RFC 3339, or `date(1)` output such as
/// `Mon Jan  2 15:04:05 UTC 2006`. The zone name of the last form is not
/// interpreted; the time is read as UTC.
pub fn parse_time(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();

    if let Ok(secs) = input.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| format!("timestamp out of range: {}", secs));
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Ok(time.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(input, "%a %b %e %H:%M:%S %Z %Y")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid time {:?}: {}", input, e))
}
