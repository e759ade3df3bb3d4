use crate::config::ApiConfig;
use crate::docker::client::DockerClient;
use crate::docker::ops::ContainerOps;
use crate::store::seed::seed_from_file;
use crate::store::Repositories;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Shared application state (thread-safe)
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub repositories: Repositories,
    pub docker: Arc<dyn ContainerOps>,
}

impl AppState {
    pub fn new(config: ApiConfig, repositories: Repositories, docker: Arc<dyn ContainerOps>) -> Self {
        Self {
            config: Arc::new(config),
            repositories,
            docker,
        }
    }

    /// Connect to the Docker daemon and load the seed file, if configured.
    pub fn initialize(config: ApiConfig) -> anyhow::Result<Self> {
        info!("Initializing application state...");

        let docker = DockerClient::new(&config.docker.socket_path)
            .context("Failed to create Docker client")?;

        let repositories = Repositories::in_memory();
        if let Some(seed_file) = &config.storage.seed_file {
            seed_from_file(&repositories, seed_file)?;
        }
        if repositories.projects.is_empty() {
            info!("No projects stored yet");
        }

        info!("✓ Application state initialized successfully");
        Ok(Self::new(config, repositories, Arc::new(docker)))
    }
}
