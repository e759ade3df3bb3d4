//! Container listing used by the live container-state lookups.
//!
//! Object-safe thanks to `Pin<Box<…>>` returns.
//! Implementations must be `Send + Sync` so one instance can be shared as `Arc<dyn ContainerOps>`.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use super::client::{ContainerInfo, DockerClient, DockerError};

/// Container state enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl From<&str> for ContainerState {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

impl ContainerState {
    /// Name of the matching `ContainerState` enum value in the GraphQL schema.
    pub fn as_graphql(self) -> &'static str {
        match self {
            ContainerState::Created => "CREATED",
            ContainerState::Running => "RUNNING",
            ContainerState::Paused => "PAUSED",
            ContainerState::Restarting => "RESTARTING",
            ContainerState::Removing => "REMOVING",
            ContainerState::Exited => "EXITED",
            ContainerState::Dead => "DEAD",
            ContainerState::Unknown => "UNKNOWN",
        }
    }
}

pub type DockerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DockerError>> + Send + 'a>>;

pub trait ContainerOps: Send + Sync {
    fn list_containers(&self) -> DockerFuture<'_, Vec<ContainerInfo>>;

    /// State of the first container, in daemon listing order, whose name starts
    /// with `name_prefix`. `None` when nothing matches.
    fn container_state<'a>(&'a self, name_prefix: &'a str) -> DockerFuture<'a, Option<ContainerState>> {
        Box::pin(async move {
            let containers = self.list_containers().await?;
            let matched = containers.into_iter().find(|c| c.name.starts_with(name_prefix));
            if let Some(c) = &matched {
                debug!(id = %c.id, name = %c.name, prefix = name_prefix, "Matched container");
            }
            Ok(matched.map(|c| ContainerState::from(c.state.as_str())))
        })
    }
}

impl ContainerOps for DockerClient {
    fn list_containers(&self) -> DockerFuture<'_, Vec<ContainerInfo>> {
        Box::pin(self.list_containers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::fake::FakeDocker;

    #[test]
    fn test_state_from_str() {
        assert_eq!(ContainerState::from("running"), ContainerState::Running);
        assert_eq!(ContainerState::from("EXITED"), ContainerState::Exited);
        assert_eq!(ContainerState::from("bogus"), ContainerState::Unknown);
        assert_eq!(ContainerState::Running.as_graphql(), "RUNNING");
    }

    #[tokio::test]
    async fn test_container_state_by_prefix() {
        let fake = FakeDocker::new();
        fake.add_container("c1", "shop-staging-db-1", "exited");
        fake.add_container("c2", "shop-staging-web-1", "running");

        let state = fake.container_state("shop-staging-web").await.unwrap();
        assert_eq!(state, Some(ContainerState::Running));

        let first = fake.container_state("shop-staging").await.unwrap();
        assert_eq!(first, Some(ContainerState::Exited));

        assert_eq!(fake.container_state("blog").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_container_state_daemon_down() {
        let fake = FakeDocker::new();
        fake.set_unreachable(true);
        let err = fake.container_state("shop").await.unwrap_err();
        assert!(matches!(err, DockerError::ConnectionFailed(_)));
    }
}
