// Application layer - Use cases and collaborator traits
pub mod chart_renderer;
pub mod delivery;
pub mod metrics_repository;
pub mod plot_service;
