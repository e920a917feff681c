use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::{Error, Result, Runtime, StatusRecord};
use crate::container::{ContainerID, ContainerRef};
use crate::signal::KillSignal;
use crate::update::{RdtUpdate, ResourceUpdateEntry};

/// A runtime call recorded by [`MockRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Kill(String, KillSignal, bool),
    Delete(String, bool),
    UpdateValues(String, Vec<ResourceUpdateEntry>),
    UpdateFile(String, PathBuf),
    UpdateRdt(String, RdtUpdate),
}

/// In-memory [`Runtime`] that records every mutation.
///
/// A container counts as running when its status record carries a positive pid.
#[derive(Debug, Default)]
pub(crate) struct MockRuntime {
    containers: BTreeMap<String, Option<StatusRecord>>,
    failing: HashSet<String>,
    list_error: bool,
    calls: RefCell<Vec<Call>>,
}

impl MockRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_container(mut self, id: &str, pid: i32) -> Self {
        let status = StatusRecord {
            pid,
            bundle: Some(format!("/srv/bundles/{id}")),
            rootfs: Some(format!("/srv/bundles/{id}/rootfs")),
            created: Some("2024-05-02T10:11:12Z".to_string()),
            owner: Some("root".to_string()),
            cgroup_path: Some(format!("/fleet/{id}")),
            ..Default::default()
        };
        self.containers.insert(id.to_string(), Some(status));
        self
    }

    pub(crate) fn with_status(mut self, id: &str, status: StatusRecord) -> Self {
        self.containers.insert(id.to_string(), Some(status));
        self
    }

    /// Lists `id` but fails every status read for it.
    pub(crate) fn with_unreadable(mut self, id: &str) -> Self {
        self.containers.insert(id.to_string(), None);
        self
    }

    /// Makes every mutation against `id` fail.
    pub(crate) fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub(crate) fn with_list_error(mut self) -> Self {
        self.list_error = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, container: &ContainerRef, call: Call) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.failing.contains(container.id().as_ref()) {
            return Err(Error::Other(format!("{} is wedged", container.id())));
        }
        Ok(())
    }
}

impl Runtime for MockRuntime {
    fn list_containers(&self, state_root: &Path) -> Result<Vec<ContainerID>> {
        if self.list_error {
            return Err(Error::ReadDir {
                path: state_root.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.containers
            .keys()
            .map(|id| ContainerID::new(id).map_err(|err| Error::Other(err.to_string())))
            .collect()
    }

    fn read_status(&self, _state_root: &Path, id: &ContainerID) -> Result<StatusRecord> {
        match self.containers.get(id.as_ref()) {
            Some(Some(status)) => Ok(status.clone()),
            Some(None) => Err(Error::Other(format!("status of {id} is corrupt"))),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    fn is_running(&self, status: &StatusRecord) -> Result<bool> {
        Ok(status.init_pid().is_some())
    }

    fn kill(&self, container: &ContainerRef, signal: KillSignal, all: bool) -> Result<()> {
        self.record(
            container,
            Call::Kill(container.id().to_string(), signal, all),
        )
    }

    fn delete(&self, container: &ContainerRef, force: bool) -> Result<()> {
        self.record(container, Call::Delete(container.id().to_string(), force))
    }

    fn update_from_values(
        &self,
        container: &ContainerRef,
        entries: &[ResourceUpdateEntry],
    ) -> Result<()> {
        self.record(
            container,
            Call::UpdateValues(container.id().to_string(), entries.to_vec()),
        )
    }

    fn update_from_file(&self, container: &ContainerRef, path: &Path) -> Result<()> {
        self.record(
            container,
            Call::UpdateFile(container.id().to_string(), path.to_path_buf()),
        )
    }

    fn update_intel_rdt(&self, container: &ContainerRef, update: &RdtUpdate) -> Result<()> {
        self.record(
            container,
            Call::UpdateRdt(container.id().to_string(), update.clone()),
        )
    }
}
