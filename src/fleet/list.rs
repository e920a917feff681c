use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::container::{ContainerID, ContainerState};
use crate::error::{Error, Result, ResultOkLogExt};
use crate::field::Field;
use crate::runtime::Runtime;

/// Status of a container as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    /// Init PID while the container has a live process, 0 otherwise.
    pub pid: i32,
    pub state: ContainerState,
    pub bundle: Option<String>,
    pub rootfs: Option<String>,
    pub created: Option<String>,
    pub owner: Option<String>,
}

/// One container in a listing.
///
/// `status` is unavailable for quiet listings and for containers whose status could not be
/// read; such entries serialize with their `id` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetEntry {
    pub id: ContainerID,
    pub status: Field<StatusSummary>,
}

impl Serialize for FleetEntry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        if let Field::Available(status) = &self.status {
            map.serialize_entry("pid", &status.pid)?;
            map.serialize_entry("status", &status.state)?;
            for (key, value) in [
                ("bundle", &status.bundle),
                ("rootfs", &status.rootfs),
                ("created", &status.created),
                ("owner", &status.owner),
            ] {
                if let Some(value) = value {
                    map.serialize_entry(key, value)?;
                }
            }
        }
        map.end()
    }
}

/// Lists the identifiers of every container under `state_root`.
pub(crate) fn identifiers<R: Runtime>(
    runtime: &R,
    state_root: &Path,
) -> Result<Vec<ContainerID>> {
    runtime
        .list_containers(state_root)
        .map_err(|source| Error::Enumeration {
            state_root: state_root.to_path_buf(),
            source,
        })
}

/// Lists every container under `state_root`.
///
/// With `quiet` set no status is read. Otherwise a container whose status cannot be read or
/// evaluated is still listed, without status.
///
/// # Errors
///
/// Returns [`Error::Enumeration`] if the container list itself cannot be read.
pub fn list<R: Runtime>(runtime: &R, state_root: &Path, quiet: bool) -> Result<Vec<FleetEntry>> {
    let ids = identifiers(runtime, state_root)?;
    Ok(ids
        .into_iter()
        .map(|id| {
            let status = if quiet {
                Field::Unavailable
            } else {
                summarize(runtime, state_root, &id).ok_log().into()
            };
            FleetEntry { id, status }
        })
        .collect())
}

fn summarize<R: Runtime>(
    runtime: &R,
    state_root: &Path,
    id: &ContainerID,
) -> Result<StatusSummary> {
    let status_error = |source| Error::Status {
        id: id.clone(),
        source,
    };
    let status = runtime.read_status(state_root, id).map_err(status_error)?;
    let state = runtime
        .container_state(state_root, id, &status)
        .map_err(status_error)?;

    Ok(StatusSummary {
        pid: if state.has_live_process() { status.pid } else { 0 },
        state,
        bundle: status.bundle,
        rootfs: status.rootfs,
        created: status.created,
        owner: status.owner,
    })
}
