//! In-memory stand-in for the Docker daemon.
//!
//! Provides a deterministic [`FakeDocker`] that implements [`ContainerOps`]
//! using in-memory state, plus a switch that makes the daemon look unreachable.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::client::{ContainerInfo, DockerError};
use super::ops::{ContainerOps, DockerFuture};

#[derive(Default)]
pub struct FakeDocker {
    containers: Mutex<Vec<ContainerInfo>>,
    unreachable: AtomicBool,
}

impl FakeDocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a container into the fake daemon. Listing order is insertion order.
    pub fn add_container(&self, id: &str, name: &str, state: &str) {
        self.containers.lock().push(ContainerInfo {
            id: id.to_string(),
            name: name.to_string(),
            state: state.to_string(),
        });
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

impl ContainerOps for FakeDocker {
    fn list_containers(&self) -> DockerFuture<'_, Vec<ContainerInfo>> {
        Box::pin(async move {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(DockerError::ConnectionFailed(
                    "Cannot connect to the Docker daemon".to_string(),
                ));
            }
            Ok(self.containers.lock().clone())
        })
    }
}
