// Main entry point - Dependency injection and plot pipeline setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::application::delivery::ImageSink;
use crate::application::plot_service::PlotService;
use crate::infrastructure::config::{load_settings, Settings};
use crate::infrastructure::file_sink::FileSink;
use crate::infrastructure::plotters_renderer::PlottersRenderer;
use crate::infrastructure::prometheus_repository::PrometheusRepository;
use crate::infrastructure::slack_uploader::SlackUploader;
use crate::presentation::cli::{version_line, Cli, CliError, Invocation};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", version_line());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.silent);

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("failed loading configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let invocation = match cli.resolve(&settings, Utc::now()) {
        Ok(invocation) => invocation,
        Err(CliError::Usage(message)) => {
            print_usage(&message);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(invocation, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

// Logs go to stderr so stdout stays free for `--file -`
fn init_tracing(silent: bool) {
    let filter = if silent {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage(message: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "error: {}\n", message);
    let _ = Cli::command().write_help(&mut stderr);
}

async fn run(invocation: Invocation, settings: &Settings) -> anyhow::Result<()> {
    // Create repository (infrastructure layer)
    let repository = Arc::new(PrometheusRepository::new(
        invocation.prometheus_url,
        Duration::from_secs(settings.prometheus.timeout_secs),
    )?);

    // File first so a failing upload still leaves the image on disk
    let mut sinks: Vec<Arc<dyn ImageSink>> = Vec::new();
    if let Some(path) = &invocation.file {
        sinks.push(Arc::new(FileSink::new(path)));
    }
    if let Some(slack) = invocation.slack {
        sinks.push(Arc::new(SlackUploader::new(
            settings.slack.api_url.clone(),
            slack.token,
            slack.channel,
            Duration::from_secs(settings.slack.timeout_secs),
        )?));
    }

    // Create service (application layer)
    let service = PlotService::new(repository, Arc::new(PlottersRenderer::default()), sinks);
    service.run(&invocation.request).await?;

    Ok(())
}
