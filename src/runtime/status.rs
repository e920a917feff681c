use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{Error, Result};
use crate::container::ContainerID;
use crate::fsutil;

/// Name of the per-container status file under `<state_root>/<id>/`.
pub const STATUS_FILE: &str = "status";

/// The runtime's persisted status record for one container.
///
/// Mirrors the JSON document crun writes to `<state_root>/<id>/status`. Unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusRecord {
    /// PID of the container's init process.
    #[serde(default)]
    pub pid: i32,
    /// Start time of `pid` in clock ticks after boot, used to detect PID reuse.
    #[serde(rename = "process-start-time", default)]
    pub process_start_time: Option<u64>,
    #[serde(rename = "cgroup-path", default)]
    pub cgroup_path: Option<String>,
    #[serde(default)]
    pub rootfs: Option<String>,
    #[serde(rename = "systemd-cgroup", default)]
    pub systemd_cgroup: bool,
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl StatusRecord {
    /// Returns the cgroup path relative to the cgroup root, if one was recorded.
    pub fn cgroup_path(&self) -> Option<&str> {
        self.cgroup_path
            .as_deref()
            .map(|p| p.trim_start_matches('/'))
            .filter(|p| !p.is_empty())
    }

    /// Returns the init PID if it is a valid process id.
    pub fn init_pid(&self) -> Option<u32> {
        u32::try_from(self.pid).ok().filter(|pid| *pid > 0)
    }
}

/// Returns the directory holding a container's runtime state.
pub fn container_dir(state_root: &Path, id: &ContainerID) -> PathBuf {
    state_root.join(id.as_ref())
}

/// Reads and decodes `<state_root>/<id>/status`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the container directory is gone, [`Error::FileOpen`] if the
/// status file cannot be opened, and [`Error::Decode`] if it is not a valid status document.
pub fn read_status_file(state_root: &Path, id: &ContainerID) -> Result<StatusRecord> {
    let dir = container_dir(state_root, id);
    let path = dir.join(STATUS_FILE);
    let reader = fsutil::open_file_reader(&path).map_err(|err| {
        if err.source.kind() == std::io::ErrorKind::NotFound && !dir.exists() {
            Error::NotFound(id.to_string())
        } else {
            Error::FileOpen(err)
        }
    })?;

    serde_json::from_reader(reader).map_err(|source| Error::Decode { path, source })
}
