//! The container runtime collaborator.
//!
//! Everything below the fleet layer (creating, starting and tearing down containers, cgroup
//! setup, OCI bundle config handling) belongs to an OCI runtime. The fleet layer consumes it through the
//! narrow [`Runtime`] trait: a handful of per-container primitives that either succeed or fail
//! with an [`Error`].
//!
//! [`CrunRuntime`] implements the trait for crun: it reads the on-disk status records directly
//! and shells out to the `crun` binary for every mutation.

mod crun;
mod error;
#[cfg(test)]
pub(crate) mod mock;
mod status;

use std::path::Path;

pub use crun::CrunRuntime;
pub use error::{Error, Result};
pub use status::{STATUS_FILE, StatusRecord, container_dir, read_status_file};

use crate::container::{ContainerID, ContainerRef, ContainerState};
use crate::signal::KillSignal;
use crate::update::{RdtUpdate, ResourceUpdateEntry};

/// Per-container primitives provided by an OCI runtime.
///
/// Every call is synchronous and blocks until the runtime answers.
pub trait Runtime {
    /// Lists the identifiers of all containers known under `state_root`.
    fn list_containers(&self, state_root: &Path) -> Result<Vec<ContainerID>>;

    /// Reads the persisted status record of a container.
    fn read_status(&self, state_root: &Path, id: &ContainerID) -> Result<StatusRecord>;

    /// Returns `true` if the container's init process is alive.
    fn is_running(&self, status: &StatusRecord) -> Result<bool>;

    /// Computes the lifecycle state of a container.
    ///
    /// The default implementation only distinguishes running from stopped.
    fn container_state(
        &self,
        _state_root: &Path,
        _id: &ContainerID,
        status: &StatusRecord,
    ) -> Result<ContainerState> {
        Ok(if self.is_running(status)? {
            ContainerState::Running
        } else {
            ContainerState::Stopped
        })
    }

    /// Sends `signal` to the container's init process, or to every process in the container
    /// when `all` is set.
    fn kill(&self, container: &ContainerRef, signal: KillSignal, all: bool) -> Result<()>;

    /// Deletes the container, killing it first if `force` is set.
    fn delete(&self, container: &ContainerRef, force: bool) -> Result<()>;

    /// Applies translated resource updates atomically.
    fn update_from_values(
        &self,
        container: &ContainerRef,
        entries: &[ResourceUpdateEntry],
    ) -> Result<()>;

    /// Applies an OCI `LinuxResources` document stored at `path`.
    fn update_from_file(&self, container: &ContainerRef, path: &Path) -> Result<()>;

    /// Updates the Intel RDT schemata of the container.
    fn update_intel_rdt(&self, container: &ContainerRef, update: &RdtUpdate) -> Result<()>;
}

impl<T: Runtime + ?Sized> Runtime for &T {
    fn list_containers(&self, state_root: &Path) -> Result<Vec<ContainerID>> {
        (**self).list_containers(state_root)
    }

    fn read_status(&self, state_root: &Path, id: &ContainerID) -> Result<StatusRecord> {
        (**self).read_status(state_root, id)
    }

    fn is_running(&self, status: &StatusRecord) -> Result<bool> {
        (**self).is_running(status)
    }

    fn container_state(
        &self,
        state_root: &Path,
        id: &ContainerID,
        status: &StatusRecord,
    ) -> Result<ContainerState> {
        (**self).container_state(state_root, id, status)
    }

    fn kill(&self, container: &ContainerRef, signal: KillSignal, all: bool) -> Result<()> {
        (**self).kill(container, signal, all)
    }

    fn delete(&self, container: &ContainerRef, force: bool) -> Result<()> {
        (**self).delete(container, force)
    }

    fn update_from_values(
        &self,
        container: &ContainerRef,
        entries: &[ResourceUpdateEntry],
    ) -> Result<()> {
        (**self).update_from_values(container, entries)
    }

    fn update_from_file(&self, container: &ContainerRef, path: &Path) -> Result<()> {
        (**self).update_from_file(container, path)
    }

    fn update_intel_rdt(&self, container: &ContainerRef, update: &RdtUpdate) -> Result<()> {
        (**self).update_intel_rdt(container, update)
    }
}
