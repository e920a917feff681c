//! Fleet-level operations over every container of a state root.
//!
//! [`Fleet`] is the entry point: it binds a [`Runtime`] to a [`Config`] and exposes listing,
//! pattern-based batch kill/delete, process sampling, cgroup telemetry and resource updates.
//! Each call reads what it needs afresh; nothing is cached between calls.

mod batch;
mod list;

pub use batch::{
    BatchOperation, BatchResult, BatchSummary, MemberOutcome, Outcome, apply_to_matching,
};
pub use list::{FleetEntry, StatusSummary, list};

use crate::cgroup::{self, TelemetrySnapshot};
use crate::config::Config;
use crate::container::{ContainerID, ContainerRef};
use crate::error::{Error, Result};
use crate::pattern::Pattern;
use crate::process::{ProcessSampler, ProcessSnapshot};
use crate::runtime::{Runtime, StatusRecord};
use crate::signal::KillSignal;
use crate::update::{self, UpdateResult, UpdateSource};

/// Fleet operations bound to a runtime and a configuration.
#[derive(Debug, Clone)]
pub struct Fleet<R> {
    runtime: R,
    config: Config,
}

impl<R: Runtime> Fleet<R> {
    pub fn new(runtime: R, config: Config) -> Self {
        Self { runtime, config }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lists every container, with status unless `quiet` is set.
    pub fn list(&self, quiet: bool) -> Result<Vec<FleetEntry>> {
        list(&self.runtime, &self.config.state_root, quiet)
    }

    /// Sends `signal` to every container whose identifier matches `pattern`.
    ///
    /// With `all` set every process of each container is signalled, not just its init process.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidPattern`] before touching any container, or with
    /// [`Error::Enumeration`]. Per-container failures are reported in the result.
    pub fn batch_kill(
        &self,
        pattern: &str,
        signal: impl Into<KillSignal>,
        all: bool,
    ) -> Result<BatchResult> {
        let signal = signal.into();
        self.batch(pattern, BatchOperation::Kill { signal, all })
    }

    /// Deletes every container whose identifier matches `pattern`.
    ///
    /// # Errors
    ///
    /// See [`Fleet::batch_kill`].
    pub fn batch_delete(&self, pattern: &str, force: bool) -> Result<BatchResult> {
        self.batch(pattern, BatchOperation::Delete { force })
    }

    fn batch(&self, pattern: &str, operation: BatchOperation) -> Result<BatchResult> {
        let pattern = Pattern::compile(pattern)?;
        apply_to_matching(
            &self.runtime,
            &pattern,
            operation,
            &self.config.state_root,
            self.config.systemd_cgroup,
        )
    }

    /// Samples every process of a running container.
    pub fn sample_processes(&self, id: &ContainerID) -> Result<Vec<ProcessSnapshot>> {
        let status = self.running_status(id)?;
        Ok(ProcessSampler::from_config(&self.config).sample(&status))
    }

    /// Reads the cgroup counters of a running container.
    pub fn collect_telemetry(&self, id: &ContainerID) -> Result<TelemetrySnapshot> {
        let status = self.running_status(id)?;
        let dir = cgroup::resolve_cgroup_dir(
            &self.config.cgroup_root,
            &self.config.proc_root,
            &status,
        )
        .ok_or_else(|| Error::CgroupNotFound { id: id.clone() })?;
        Ok(cgroup::collect(&dir))
    }

    /// Updates the resources of a container.
    ///
    /// Values are translated and applied in one runtime call; Intel RDT schemata, if present,
    /// follow in a second call. A file source is handed to the runtime untouched.
    pub fn update_resources(
        &self,
        id: &ContainerID,
        resources: &UpdateSource,
    ) -> Result<UpdateResult> {
        let container = self.container_ref(id);
        match resources {
            UpdateSource::File(path) => self
                .runtime
                .update_from_file(&container, path)
                .map_err(|source| Error::Runtime {
                    context: "failed to update resources from file",
                    source,
                })?,
            UpdateSource::Values(request) => {
                let entries = update::translate(request);
                if !entries.is_empty() {
                    self.runtime
                        .update_from_values(&container, &entries)
                        .map_err(|source| Error::Runtime {
                            context: "failed to update resources",
                            source,
                        })?;
                }
                if let Some(rdt) = request.rdt() {
                    self.runtime
                        .update_intel_rdt(&container, &rdt)
                        .map_err(|source| Error::Runtime {
                            context: "failed to update Intel RDT schemata",
                            source,
                        })?;
                }
            }
        }

        Ok(UpdateResult {
            id: id.clone(),
            updated: true,
        })
    }

    fn container_ref(&self, id: &ContainerID) -> ContainerRef {
        ContainerRef::new(
            id.clone(),
            &self.config.state_root,
            self.config.systemd_cgroup,
        )
    }

    /// Reads the status of a container, failing unless it is running.
    fn running_status(&self, id: &ContainerID) -> Result<StatusRecord> {
        let status = self
            .runtime
            .read_status(&self.config.state_root, id)
            .map_err(|source| Error::Status {
                id: id.clone(),
                source,
            })?;
        let running = self
            .runtime
            .is_running(&status)
            .map_err(|source| Error::Runtime {
                context: "failed to check whether the container is running",
                source,
            })?;
        if !running {
            return Err(Error::NotRunning { id: id.clone() });
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use nix::sys::signal::Signal;

    use super::*;
    use crate::runtime::mock::{Call, MockRuntime};
    use crate::update::{RdtUpdate, ResourceRequest, ResourceUpdateEntry};

    fn config(proc_root: &Path, cgroup_root: &Path) -> Config {
        Config {
            proc_root: proc_root.to_path_buf(),
            cgroup_root: cgroup_root.to_path_buf(),
            ..Config::default()
        }
    }

    fn fleet(runtime: MockRuntime) -> Fleet<MockRuntime> {
        Fleet::new(runtime, Config::default())
    }

    fn id(raw: &str) -> ContainerID {
        ContainerID::new(raw).unwrap()
    }

    #[test]
    fn test_invalid_pattern_touches_nothing() {
        let fleet = fleet(MockRuntime::new().with_container("web", 1).with_list_error());

        let err = fleet.batch_kill("web[", Signal::SIGKILL, false).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        let err = fleet.batch_delete("(web", true).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        assert!(fleet.runtime().calls().is_empty());
    }

    #[test]
    fn test_batch_enumeration_failure() {
        let fleet = fleet(MockRuntime::new().with_list_error());
        let err = fleet.batch_delete(".*", false).unwrap_err();
        assert!(matches!(err, Error::Enumeration { .. }));
    }

    #[test]
    fn test_batch_kill() {
        let fleet = fleet(
            MockRuntime::new()
                .with_container("web", 1)
                .with_container("db", 2),
        );
        let result = fleet.batch_kill("^db$", Signal::SIGHUP, false).unwrap();
        assert_eq!(result.succeeded(), 1);
        let result = fleet.batch_kill("^web$", KillSignal::Number(35), true).unwrap();
        assert_eq!(result.succeeded(), 1);
        assert_eq!(
            fleet.runtime().calls(),
            vec![
                Call::Kill("db".to_string(), Signal::SIGHUP.into(), false),
                Call::Kill("web".to_string(), KillSignal::Number(35), true),
            ]
        );
    }

    #[test]
    fn test_sample_requires_running() {
        let fleet = fleet(MockRuntime::new().with_container("web", 0));
        let err = fleet.sample_processes(&id("web")).unwrap_err();
        assert!(matches!(err, Error::NotRunning { .. }));

        let err = fleet.sample_processes(&id("ghost")).unwrap_err();
        assert!(matches!(err, Error::Status { .. }));
    }

    #[test]
    fn test_sample_processes() {
        let proc_root = tempfile::tempdir().unwrap();
        let cgroup_root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(cgroup_root.path().join("fleet/web")).unwrap();
        std::fs::write(cgroup_root.path().join("fleet/web/cgroup.procs"), "40\n41\n").unwrap();
        std::fs::create_dir(proc_root.path().join("40")).unwrap();
        std::fs::write(
            proc_root.path().join("40/stat"),
            "40 (my (odd) app) R 1 40 40 0 -1 0 0 0 0 0 300 200 0 0 20 0 1 0 1000 0 0\n",
        )
        .unwrap();

        let fleet = Fleet::new(
            MockRuntime::new().with_container("web", 40),
            config(proc_root.path(), cgroup_root.path()),
        );
        let snapshots = fleet.sample_processes(&id("web")).unwrap();

        assert_eq!(snapshots.len(), 2);
        let json = serde_json::to_value(&snapshots).unwrap();
        assert_eq!(json[0]["command"], "my (odd) app");
        assert_eq!(json[0]["cpuSeconds"], 5);
        assert_eq!(json[0]["startTime"], 10);
        assert_eq!(json[1]["pid"], 41);
        assert_eq!(json[1]["command"], "unknown");
        assert_eq!(json[1]["parentPid"], 0);
    }

    #[test]
    fn test_collect_telemetry() {
        let proc_root = tempfile::tempdir().unwrap();
        let cgroup_root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(cgroup_root.path().join("fleet/web")).unwrap();
        std::fs::write(cgroup_root.path().join("fleet/web/memory.current"), "4096\n").unwrap();

        let fleet = Fleet::new(
            MockRuntime::new().with_container("web", 40),
            config(proc_root.path(), cgroup_root.path()),
        );
        let json = serde_json::to_value(fleet.collect_telemetry(&id("web")).unwrap()).unwrap();
        assert_eq!(json["memoryStats"]["Memory Current"], "4096");
        assert_eq!(json["memoryStats"]["Memory Max"], "");
        assert_eq!(json["ioStats"]["IO Weight"], "");
    }

    #[test]
    fn test_collect_telemetry_without_cgroup() {
        let proc_root = tempfile::tempdir().unwrap();
        let status = StatusRecord {
            pid: 40,
            ..Default::default()
        };
        let fleet = Fleet::new(
            MockRuntime::new().with_status("web", status),
            config(proc_root.path(), proc_root.path()),
        );
        let err = fleet.collect_telemetry(&id("web")).unwrap_err();
        assert!(matches!(err, Error::CgroupNotFound { .. }));
    }

    #[test]
    fn test_update_from_values() {
        let fleet = fleet(MockRuntime::new().with_container("web", 1));
        let request: ResourceRequest = serde_json::from_value(serde_json::json!({
            "memory": 1048576,
            "l3CacheSchema": "L3:0=f"
        }))
        .unwrap();

        let result = fleet
            .update_resources(&id("web"), &UpdateSource::Values(request))
            .unwrap();

        assert!(result.updated);
        assert_eq!(
            fleet.runtime().calls(),
            vec![
                Call::UpdateValues(
                    "web".to_string(),
                    vec![ResourceUpdateEntry::new("memory", "limit", "1048576", true)]
                ),
                Call::UpdateRdt(
                    "web".to_string(),
                    RdtUpdate {
                        l3_cache_schema: Some("L3:0=f".to_string()),
                        mem_bw_schema: None,
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_update_from_file() {
        let fleet = fleet(MockRuntime::new().with_container("web", 1));
        fleet
            .update_resources(
                &id("web"),
                &UpdateSource::File(PathBuf::from("/srv/resources.json")),
            )
            .unwrap();
        assert_eq!(
            fleet.runtime().calls(),
            vec![Call::UpdateFile(
                "web".to_string(),
                PathBuf::from("/srv/resources.json")
            )]
        );
    }

    #[test]
    fn test_empty_update_makes_no_call() {
        let fleet = fleet(MockRuntime::new().with_container("web", 1));
        let result = fleet
            .update_resources(&id("web"), &UpdateSource::Values(ResourceRequest::default()))
            .unwrap();
        assert!(result.updated);
        assert!(fleet.runtime().calls().is_empty());
    }

    #[test]
    fn test_update_failure_surfaces_message() {
        let fleet = fleet(MockRuntime::new().with_container("web", 1).failing("web"));
        let request = ResourceRequest {
            pids_limit: Some(64),
            ..Default::default()
        };
        let err = fleet
            .update_resources(&id("web"), &UpdateSource::Values(request))
            .unwrap_err();
        assert!(matches!(err, Error::Runtime { .. }));
        assert!(err.to_string().contains("web is wedged"));
    }
}
