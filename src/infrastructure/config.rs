use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/promplot";
pub const ENV_PREFIX: &str = "PROMPLOT";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub prometheus: PrometheusSettings,
    #[serde(default)]
    pub slack: SlackSettings,
    #[serde(default)]
    pub plot: PlotSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PrometheusSettings {
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_points")]
    pub points: u32,
}

impl Default for PrometheusSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
            points: default_points(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SlackSettings {
    pub token: Option<String>,
    pub channel: Option<String>,
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            token: None,
            channel: None,
            api_url: default_slack_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct PlotSettings {
    pub title: Option<String>,
    pub format: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_points() -> u32 {
    crate::application::metrics_repository::DEFAULT_POINTS
}

fn default_slack_api_url() -> String {
    crate::infrastructure::slack_uploader::DEFAULT_SLACK_API_URL.to_string()
}

/// Optional `config/promplot.*` file overlaid with `PROMPLOT__SECTION__KEY`
/// environment variables
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(DEFAULT_CONFIG_PATH)
}

pub fn load_settings_from(path: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");

        let settings = load_settings_from(path.to_str().unwrap()).unwrap();

        assert_eq!(settings.prometheus.url, None);
        assert_eq!(settings.prometheus.timeout_secs, 30);
        assert_eq!(settings.prometheus.points, 100);
        assert_eq!(settings.slack.api_url, "https://slack.com/api");
        assert_eq!(settings.plot, PlotSettings::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promplot.toml");
        std::fs::write(
            &path,
            r#"
[prometheus]
url = "http://prometheus:9090"
points = 250

[slack]
channel = "C0123456"

[plot]
title = "Nightly"
format = "svg"
"#,
        )
        .unwrap();

        let settings = load_settings_from(path.with_extension("").to_str().unwrap()).unwrap();

        assert_eq!(
            settings.prometheus.url.as_deref(),
            Some("http://prometheus:9090")
        );
        assert_eq!(settings.prometheus.points, 250);
        assert_eq!(settings.prometheus.timeout_secs, 30);
        assert_eq!(settings.slack.channel.as_deref(), Some("C0123456"));
        assert_eq!(settings.slack.token, None);
        assert_eq!(settings.plot.title.as_deref(), Some("Nightly"));
        assert_eq!(settings.plot.format.as_deref(), Some("svg"));
    }
}
