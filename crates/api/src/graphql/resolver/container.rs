//! Live container state for instance services, delegated to the Docker daemon.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::Resolver;
use crate::docker::ops::ContainerOps;
use crate::error::ApiError;
use crate::store::Document;

pub struct ContainerStateResolverFactory {
    docker: Arc<dyn ContainerOps>,
}

impl ContainerStateResolverFactory {
    pub fn new(docker: Arc<dyn ContainerOps>) -> Self {
        Self { docker }
    }

    /// Resolver returning the `ContainerState` of the container whose name
    /// starts with the prefix derived from the parent, or `null` when there
    /// is no prefix or no such container. Daemon failures surface as
    /// `UpstreamUnavailable` on this field only.
    pub fn container_state_resolver<F>(&self, derive_name: F) -> Resolver
    where
        F: Fn(&Document) -> Option<String> + Send + Sync + 'static,
    {
        let docker = self.docker.clone();

        Resolver::new(move |parent, _args| {
            let docker = docker.clone();
            let prefix = derive_name(parent).filter(|p| !p.is_empty());

            async move {
                let Some(prefix) = prefix else {
                    return Ok(Value::Null);
                };
                match docker.container_state(&prefix).await {
                    Ok(state) => Ok(state.map_or(Value::Null, |s| Value::String(s.as_graphql().to_string()))),
                    Err(e) => {
                        warn!("Failed to get container state for prefix {}: {}", prefix, e);
                        Err(ApiError::from(e))
                    }
                }
            }
        })
    }
}
