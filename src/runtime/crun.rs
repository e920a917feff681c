use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use super::status::{STATUS_FILE, container_dir, read_status_file};
use super::{Error, Result, Runtime, StatusRecord};
use crate::cgroup;
use crate::config::Config;
use crate::container::{ContainerID, ContainerRef, ContainerState};
use crate::process;
use crate::signal::KillSignal;
use crate::update::{RdtUpdate, ResourceUpdateEntry};

/// Marker file crun keeps while a container is created but not yet started.
const EXEC_FIFO: &str = "exec.fifo";

/// [`Runtime`] backed by the crun on-disk state and the `crun` binary.
///
/// Reads go straight to `<state_root>/<id>/status`, `/proc` and the cgroup filesystem.
/// Mutations run `crun --root <state_root> [--systemd-cgroup] <command> ...` and fail with the
/// command's stderr when it exits unsuccessfully.
#[derive(Debug, Clone)]
pub struct CrunRuntime {
    binary: PathBuf,
    proc_root: PathBuf,
    cgroup_root: PathBuf,
}

impl CrunRuntime {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            proc_root: PathBuf::from(crate::config::DEFAULT_PROC_ROOT),
            cgroup_root: PathBuf::from(crate::config::DEFAULT_CGROUP_ROOT),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            binary: config.runtime_binary.clone(),
            proc_root: config.proc_root.clone(),
            cgroup_root: config.cgroup_root.clone(),
        }
    }

    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    pub fn with_cgroup_root(mut self, cgroup_root: impl Into<PathBuf>) -> Self {
        self.cgroup_root = cgroup_root.into();
        self
    }

    /// Builds `crun --root <state_root> [--systemd-cgroup]` for the given container.
    fn command(&self, container: &ContainerRef) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg("--root").arg(container.state_root());
        if container.systemd_cgroup() {
            command.arg("--systemd-cgroup");
        }
        command
    }

    fn kill_command(&self, container: &ContainerRef, signal: KillSignal, all: bool) -> Command {
        let mut command = self.command(container);
        command.arg("kill");
        if all {
            command.arg("--all");
        }
        command.arg(container.id().as_ref()).arg(signal.to_arg());
        command
    }

    fn delete_command(&self, container: &ContainerRef, force: bool) -> Command {
        let mut command = self.command(container);
        command.arg("delete");
        if force {
            command.arg("--force");
        }
        command.arg(container.id().as_ref());
        command
    }

    fn update_command(&self, container: &ContainerRef, resources: &Path) -> Command {
        let mut command = self.command(container);
        command
            .arg("update")
            .arg("--resources")
            .arg(resources)
            .arg(container.id().as_ref());
        command
    }

    fn rdt_command(&self, container: &ContainerRef, update: &RdtUpdate) -> Command {
        let mut command = self.command(container);
        command.arg("update");
        if let Some(schema) = &update.l3_cache_schema {
            command.arg("--l3-cache-schema").arg(schema);
        }
        if let Some(schema) = &update.mem_bw_schema {
            command.arg("--mem-bw-schema").arg(schema);
        }
        command.arg(container.id().as_ref());
        command
    }

    fn run(&self, mut command: Command, input: Option<&[u8]>) -> Result<()> {
        let rendered = render(&command);
        log::debug!("running `{rendered}`");

        command
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;

        let mut input_error = None;
        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            match stdin.write_all(input) {
                Ok(()) => {}
                // The child may exit without reading; its exit status decides the outcome.
                Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(err) => input_error = Some(err),
            }
        }

        let output = child.wait_with_output().map_err(|source| Error::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: rendered,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        if let Some(source) = input_error {
            return Err(Error::Input {
                command: rendered,
                source,
            });
        }
        Ok(())
    }
}

impl Default for CrunRuntime {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RUNTIME_BINARY)
    }
}

impl Runtime for CrunRuntime {
    fn list_containers(&self, state_root: &Path) -> Result<Vec<ContainerID>> {
        let entries = std::fs::read_dir(state_root).map_err(|source| Error::ReadDir {
            path: state_root.to_path_buf(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::ReadDir {
                path: state_root.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                log::debug!("skipping non UTF-8 state entry {:?}", entry.path());
                continue;
            };
            if name.starts_with('.') || !entry.path().join(STATUS_FILE).is_file() {
                continue;
            }
            match ContainerID::new(name) {
                Ok(id) => ids.push(id),
                Err(err) => log::debug!("skipping state entry: {err}"),
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn read_status(&self, state_root: &Path, id: &ContainerID) -> Result<StatusRecord> {
        read_status_file(state_root, id)
    }

    fn is_running(&self, status: &StatusRecord) -> Result<bool> {
        let Some(pid) = status.init_pid() else {
            return Ok(false);
        };

        match kill(Pid::from_raw(status.pid), None) {
            Ok(()) | Err(Errno::EPERM) => {}
            Err(Errno::ESRCH) => return Ok(false),
            Err(source) => {
                return Err(Error::Probe {
                    pid: status.pid,
                    source,
                });
            }
        }

        match status.process_start_time {
            Some(expected) if expected > 0 => Ok(process::read_stat(&self.proc_root, pid)
                .map(|stat| stat.starttime == expected)
                .unwrap_or(false)),
            _ => Ok(true),
        }
    }

    fn container_state(
        &self,
        state_root: &Path,
        id: &ContainerID,
        status: &StatusRecord,
    ) -> Result<ContainerState> {
        if !self.is_running(status)? {
            return Ok(ContainerState::Stopped);
        }
        if container_dir(state_root, id).join(EXEC_FIFO).exists() {
            return Ok(ContainerState::Created);
        }
        let frozen = status
            .cgroup_path()
            .is_some_and(|path| cgroup::is_frozen(self.cgroup_root.join(path)));
        Ok(if frozen {
            ContainerState::Paused
        } else {
            ContainerState::Running
        })
    }

    fn kill(&self, container: &ContainerRef, signal: KillSignal, all: bool) -> Result<()> {
        self.run(self.kill_command(container, signal, all), None)
    }

    fn delete(&self, container: &ContainerRef, force: bool) -> Result<()> {
        self.run(self.delete_command(container, force), None)
    }

    fn update_from_values(
        &self,
        container: &ContainerRef,
        entries: &[ResourceUpdateEntry],
    ) -> Result<()> {
        let document = resources_document(entries);
        let input = serde_json::to_vec(&document).map_err(|err| Error::Other(err.to_string()))?;
        self.run(
            self.update_command(container, Path::new("/dev/stdin")),
            Some(&input),
        )
    }

    fn update_from_file(&self, container: &ContainerRef, path: &Path) -> Result<()> {
        self.run(self.update_command(container, path), None)
    }

    fn update_intel_rdt(&self, container: &ContainerRef, update: &RdtUpdate) -> Result<()> {
        self.run(self.rdt_command(container, update), None)
    }
}

/// Renders update entries as an OCI `LinuxResources` document, e.g.
/// `{"memory": {"limit": 1048576}, "cpu": {"cpus": "0-1"}}`.
fn resources_document(entries: &[ResourceUpdateEntry]) -> serde_json::Value {
    let mut document = serde_json::Map::new();
    for entry in entries {
        let value = if entry.numeric {
            entry
                .value
                .parse::<i64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::String(entry.value.clone()))
        } else {
            serde_json::Value::String(entry.value.clone())
        };

        let section = document
            .entry(entry.section.to_owned())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let serde_json::Value::Object(section) = section {
            section.insert(entry.name.to_owned(), value);
        }
    }
    serde_json::Value::Object(document)
}

fn render(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}
