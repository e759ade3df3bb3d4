//! Bollard-backed Docker client and its error type.

use bollard::models::ContainerSummary;
use bollard::query_parameters::ListContainersOptions;
use bollard::Docker;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Docker connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Bollard error: {0}")]
    BollardError(#[from] bollard::errors::Error),
}

/// Basic container information derived from Docker's list API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,    // Without leading slash
    pub state: String,   // "running", "paused", "exited"
}

impl From<ContainerSummary> for ContainerInfo {
    fn from(s: ContainerSummary) -> Self {
        Self {
            id: s.id.unwrap_or_default(),
            name: s.names.as_deref()
                .and_then(|n| n.first())
                .map(|n| n.trim_start_matches('/'))
                .unwrap_or("unknown")
                .to_string(),
            state: s.state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DockerClient {
    client: Docker,
}

impl DockerClient {
    /// Connect to the daemon at `socket_path`, or the platform default when empty.
    /// Bollard connects lazily, so an unreachable daemon only surfaces on the first request.
    pub fn new(socket_path: &str) -> Result<Self, DockerError> {
        let connection = if socket_path.is_empty() {
            Docker::connect_with_defaults()
                .map_err(|e| DockerError::ConnectionFailed(e.to_string()))?
        } else {
            let clean_path = socket_path.trim_start_matches("unix://");
            Docker::connect_with_socket(clean_path, 120, &bollard::API_DEFAULT_VERSION)
                .map_err(|e| DockerError::ConnectionFailed(e.to_string()))?
        };

        Ok(DockerClient { client: connection })
    }

    pub async fn list_containers(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        let options = Some(ListContainersOptions {
            all: true,
            ..Default::default()
        });
        let containers = self.client.list_containers(options).await?;
        Ok(containers.into_iter().map(|c| c.into()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_info_from_summary() {
        let summary = ContainerSummary {
            id: Some("abc123".to_string()),
            names: Some(vec!["/shop-staging-web-1".to_string()]),
            ..Default::default()
        };
        let info = ContainerInfo::from(summary);
        assert_eq!(info.id, "abc123");
        assert_eq!(info.name, "shop-staging-web-1");
        assert_eq!(info.state, "unknown");
    }

    #[test]
    fn test_container_info_without_names() {
        let info = ContainerInfo::from(ContainerSummary::default());
        assert_eq!(info.name, "unknown");
    }
}
