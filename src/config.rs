//! Runtime configuration.
//!
//! [`Config::from_env`] is the only place that consults the process environment or the host;
//! everything below receives explicit paths and tick rates.

use std::env;
use std::path::PathBuf;

use nix::unistd::{SysconfVar, sysconf};

use crate::mountinfo;

pub const DEFAULT_STATE_ROOT: &str = "/run/crun";
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";
pub const DEFAULT_RUNTIME_BINARY: &str = "crun";
/// Clock ticks per second assumed when the host value cannot be queried.
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

pub const STATE_ROOT_ENV: &str = "OCI_FLEET_STATE_ROOT";
pub const PROC_ROOT_ENV: &str = "OCI_FLEET_PROC_ROOT";
pub const CGROUP_ROOT_ENV: &str = "OCI_FLEET_CGROUP_ROOT";
pub const RUNTIME_ENV: &str = "OCI_FLEET_RUNTIME";
pub const SYSTEMD_CGROUP_ENV: &str = "OCI_FLEET_SYSTEMD_CGROUP";

/// Locations and host parameters used by the fleet layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one subdirectory per container.
    pub state_root: PathBuf,
    pub proc_root: PathBuf,
    /// Mount point of the cgroup v2 hierarchy.
    pub cgroup_root: PathBuf,
    /// Clock ticks per second (`_SC_CLK_TCK`), used to convert `/proc/[pid]/stat` times.
    pub clock_ticks: u64,
    /// Whether containers were created with systemd-managed cgroups.
    pub systemd_cgroup: bool,
    pub runtime_binary: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_root: PathBuf::from(DEFAULT_STATE_ROOT),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            cgroup_root: PathBuf::from(DEFAULT_CGROUP_ROOT),
            clock_ticks: DEFAULT_CLOCK_TICKS,
            systemd_cgroup: false,
            runtime_binary: PathBuf::from(DEFAULT_RUNTIME_BINARY),
        }
    }
}

impl Config {
    /// Builds a configuration from the environment, falling back to host detection and
    /// defaults.
    pub fn from_env() -> Self {
        let proc_root =
            path_var(PROC_ROOT_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT));
        let cgroup_root = path_var(CGROUP_ROOT_ENV)
            .unwrap_or_else(|| detect_cgroup_root(&proc_root.join("self/mountinfo")));

        Self {
            state_root: path_var(STATE_ROOT_ENV)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_ROOT)),
            proc_root,
            cgroup_root,
            clock_ticks: host_clock_ticks(),
            systemd_cgroup: bool_var(SYSTEMD_CGROUP_ENV).unwrap_or(false),
            runtime_binary: path_var(RUNTIME_ENV)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNTIME_BINARY)),
        }
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn bool_var(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .and_then(|s| match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn detect_cgroup_root(mountinfo_path: &std::path::Path) -> PathBuf {
    match mountinfo::find_cgroup2_mount(mountinfo_path) {
        Ok(root) => root,
        Err(err) => {
            log::debug!("using default cgroup root {DEFAULT_CGROUP_ROOT}: {err}");
            PathBuf::from(DEFAULT_CGROUP_ROOT)
        }
    }
}

/// Queries `_SC_CLK_TCK`, falling back to [`DEFAULT_CLOCK_TICKS`].
pub fn host_clock_ticks() -> u64 {
    match sysconf(SysconfVar::CLK_TCK) {
        Ok(Some(ticks)) if ticks > 0 => ticks as u64,
        Ok(_) => DEFAULT_CLOCK_TICKS,
        Err(err) => {
            log::debug!("sysconf(_SC_CLK_TCK) failed: {err}");
            DEFAULT_CLOCK_TICKS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.state_root, PathBuf::from("/run/crun"));
        assert_eq!(config.clock_ticks, 100);
        assert!(!config.systemd_cgroup);
    }

    #[test]
    fn test_host_clock_ticks_is_positive() {
        assert!(host_clock_ticks() > 0);
    }

    #[test]
    fn test_detect_cgroup_root_falls_back() {
        let root = detect_cgroup_root(std::path::Path::new("/definitely/not/mountinfo"));
        assert_eq!(root, PathBuf::from(DEFAULT_CGROUP_ROOT));
    }
}
