// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_sink;
pub mod plotters_renderer;
pub mod prometheus_repository;
pub mod slack_uploader;
