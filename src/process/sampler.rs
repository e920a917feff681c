use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use super::{read_real_uid, read_stat};
use crate::cgroup;
use crate::config::Config;
use crate::field::Field;
use crate::fsutil;
use crate::runtime::StatusRecord;

/// Command name reported when a process could not be inspected.
const UNKNOWN_COMMAND: &str = "unknown";

/// A point-in-time view of one process of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub parent_pid: Field<i32>,
    /// Real UID of the process owner.
    pub uid: Field<u32>,
    pub session: Field<i32>,
    /// Controlling terminal device number.
    pub tty: Field<i32>,
    pub state: Field<String>,
    /// Start time in seconds since boot.
    pub start_time: Field<u64>,
    /// User plus system CPU time in whole seconds.
    pub cpu_seconds: Field<u64>,
    #[serde(serialize_with = "command_or_unknown")]
    pub command: Field<String>,
}

impl ProcessSnapshot {
    /// A snapshot of a process whose stat could not be read.
    fn unavailable(pid: u32) -> Self {
        Self {
            pid,
            parent_pid: Field::Unavailable,
            uid: Field::Unavailable,
            session: Field::Unavailable,
            tty: Field::Unavailable,
            state: Field::Unavailable,
            start_time: Field::Unavailable,
            cpu_seconds: Field::Unavailable,
            command: Field::Unavailable,
        }
    }
}

fn command_or_unknown<S>(command: &Field<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match command {
        Field::Available(command) => serializer.serialize_str(command),
        Field::Unavailable => serializer.serialize_str(UNKNOWN_COMMAND),
    }
}

/// Discovers the processes of a container and samples them from procfs.
#[derive(Debug, Clone)]
pub struct ProcessSampler {
    proc_root: PathBuf,
    cgroup_root: PathBuf,
    clock_ticks: u64,
}

impl ProcessSampler {
    pub fn new(
        proc_root: impl Into<PathBuf>,
        cgroup_root: impl Into<PathBuf>,
        clock_ticks: u64,
    ) -> Self {
        Self {
            proc_root: proc_root.into(),
            cgroup_root: cgroup_root.into(),
            clock_ticks: clock_ticks.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.proc_root, &config.cgroup_root, config.clock_ticks)
    }

    /// Returns the PIDs belonging to a container.
    ///
    /// Prefers the members of the container's cgroup. If the cgroup is unknown, unreadable or
    /// empty, falls back to the init process and its direct children.
    pub fn discover_pids(&self, status: &StatusRecord) -> Vec<u32> {
        if let Some(path) = status.cgroup_path() {
            let dir = self.cgroup_root.join(path);
            match cgroup::read_procs(&dir) {
                Some(pids) if !pids.is_empty() => return pids,
                _ => log::debug!(
                    "no processes listed under `{}`, falling back to the init process",
                    dir.display()
                ),
            }
        }

        let Some(pid) = status.init_pid() else {
            return Vec::new();
        };
        let mut pids = vec![pid];
        pids.extend(read_children(&self.proc_root, pid));
        pids
    }

    /// Samples a single process.
    ///
    /// A process that has exited (or whose stat cannot be parsed) still yields a snapshot,
    /// with every field unavailable.
    pub fn snapshot(&self, pid: u32) -> ProcessSnapshot {
        let Field::Available(stat) = read_stat(&self.proc_root, pid) else {
            return ProcessSnapshot::unavailable(pid);
        };

        ProcessSnapshot {
            pid,
            parent_pid: Field::Available(stat.ppid),
            uid: self.read_uid(pid),
            session: Field::Available(stat.session),
            tty: Field::Available(stat.tty_nr),
            state: Field::Available(stat.state.to_string()),
            start_time: Field::Available(stat.starttime / self.clock_ticks),
            cpu_seconds: Field::Available(stat.cpu_ticks() / self.clock_ticks),
            command: Field::Available(stat.command),
        }
    }

    /// Discovers and samples every process of a container.
    pub fn sample(&self, status: &StatusRecord) -> Vec<ProcessSnapshot> {
        self.discover_pids(status)
            .into_iter()
            .map(|pid| self.snapshot(pid))
            .collect()
    }

    fn read_uid(&self, pid: u32) -> Field<u32> {
        let path = self.proc_root.join(pid.to_string()).join("status");
        let mut reader = match fsutil::open_file_reader(&path) {
            Ok(reader) => reader,
            Err(err) => {
                log::debug!("{err}");
                return Field::Unavailable;
            }
        };
        match read_real_uid(&mut reader) {
            Ok(uid) => uid.into(),
            Err(err) => {
                log::debug!("failed to read `{}`: {}", path.display(), err);
                Field::Unavailable
            }
        }
    }
}

fn read_children(proc_root: &Path, pid: u32) -> Vec<u32> {
    let path = proc_root
        .join(pid.to_string())
        .join("task")
        .join(pid.to_string())
        .join("children");
    fsutil::read_value(path)
        .map(|children| {
            children
                .split_whitespace()
                .filter_map(|pid| pid.parse::<u32>().ok())
                .filter(|pid| *pid > 0)
                .collect()
        })
        .value_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_process(proc_root: &Path, pid: u32, stat: &str, uid: u32) {
        let dir = proc_root.join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stat"), format!("{stat}\n")).unwrap();
        std::fs::write(
            dir.join("status"),
            format!("Name:\tx\nPid:\t{pid}\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\n"),
        )
        .unwrap();
    }

    fn sampler(proc_root: &Path, cgroup_root: &Path) -> ProcessSampler {
        ProcessSampler::new(proc_root, cgroup_root, 100)
    }

    #[test]
    fn test_snapshot() {
        let proc_root = tempfile::tempdir().unwrap();
        write_process(
            proc_root.path(),
            812,
            "812 (nginx: worker) S 790 790 790 34816 -1 0 0 0 0 0 250 150 0 0 20 0 1 0 123456 0 0",
            101,
        );

        let snapshot = sampler(proc_root.path(), proc_root.path()).snapshot(812);
        assert_eq!(snapshot.parent_pid, Field::Available(790));
        assert_eq!(snapshot.uid, Field::Available(101));
        assert_eq!(snapshot.tty, Field::Available(34816));
        assert_eq!(snapshot.start_time, Field::Available(1234));
        assert_eq!(snapshot.cpu_seconds, Field::Available(4));
        assert_eq!(snapshot.command, Field::Available("nginx: worker".to_string()));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["parentPid"], 790);
        assert_eq!(json["state"], "S");
        assert_eq!(json["cpuSeconds"], 4);
    }

    #[test]
    fn test_snapshot_with_invalid_utf8_command() {
        let proc_root = tempfile::tempdir().unwrap();
        let dir = proc_root.path().join("31");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("stat"),
            b"31 (bad\xffname) R 1 31 31 0 -1 0 0 0 0 0 100 100 0 0 20 0 1 0 300 0 0\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("status"),
            b"Name:\tbad\xffname\nPid:\t31\nUid:\t1000\t1000\t1000\t1000\n",
        )
        .unwrap();

        let snapshot = sampler(proc_root.path(), proc_root.path()).snapshot(31);
        assert_eq!(snapshot.command, Field::Available("bad\u{fffd}name".to_string()));
        assert_eq!(snapshot.parent_pid, Field::Available(1));
        assert_eq!(snapshot.uid, Field::Available(1000));
        assert_eq!(snapshot.start_time, Field::Available(3));
        assert_eq!(snapshot.cpu_seconds, Field::Available(2));
    }

    #[test]
    fn test_snapshot_of_exited_process() {
        let proc_root = tempfile::tempdir().unwrap();
        let snapshot = sampler(proc_root.path(), proc_root.path()).snapshot(4242);

        assert_eq!(snapshot, ProcessSnapshot::unavailable(4242));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pid": 4242,
                "parentPid": 0,
                "uid": 0,
                "session": 0,
                "tty": 0,
                "state": "",
                "startTime": 0,
                "cpuSeconds": 0,
                "command": "unknown"
            })
        );
    }

    #[test]
    fn test_discover_from_cgroup() {
        let proc_root = tempfile::tempdir().unwrap();
        let cgroup_root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(cgroup_root.path().join("fleet/web")).unwrap();
        std::fs::write(cgroup_root.path().join("fleet/web/cgroup.procs"), "10\n11\n0\n").unwrap();

        let status = StatusRecord {
            pid: 10,
            cgroup_path: Some("/fleet/web".to_string()),
            ..Default::default()
        };
        let pids = sampler(proc_root.path(), cgroup_root.path()).discover_pids(&status);
        assert_eq!(pids, vec![10, 11]);
    }

    #[test]
    fn test_discover_falls_back_to_children() {
        let proc_root = tempfile::tempdir().unwrap();
        let cgroup_root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(proc_root.path().join("10/task/10")).unwrap();
        std::fs::write(proc_root.path().join("10/task/10/children"), "12 13 ").unwrap();
        std::fs::create_dir_all(cgroup_root.path().join("fleet/web")).unwrap();
        std::fs::write(cgroup_root.path().join("fleet/web/cgroup.procs"), "").unwrap();

        let status = StatusRecord {
            pid: 10,
            cgroup_path: Some("/fleet/web".to_string()),
            ..Default::default()
        };
        let pids = sampler(proc_root.path(), cgroup_root.path()).discover_pids(&status);
        assert_eq!(pids, vec![10, 12, 13]);
    }

    #[test]
    fn test_sample_mixes_live_and_vanished() {
        let proc_root = tempfile::tempdir().unwrap();
        let cgroup_root = tempfile::tempdir().unwrap();
        write_process(
            proc_root.path(),
            10,
            "10 (sh) S 0 10 10 0 -1 0 0 0 0 0 0 0 0 0 20 0 1 0 500 0 0",
            0,
        );
        std::fs::create_dir_all(proc_root.path().join("10/task/10")).unwrap();
        std::fs::write(proc_root.path().join("10/task/10/children"), "11").unwrap();

        let status = StatusRecord {
            pid: 10,
            ..Default::default()
        };
        let snapshots = sampler(proc_root.path(), cgroup_root.path()).sample(&status);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].command, Field::Available("sh".to_string()));
        assert_eq!(snapshots[1], ProcessSnapshot::unavailable(11));
    }

    #[test]
    fn test_no_pid_no_cgroup() {
        let root = tempfile::tempdir().unwrap();
        let pids = sampler(root.path(), root.path()).discover_pids(&StatusRecord::default());
        assert!(pids.is_empty());
    }
}
