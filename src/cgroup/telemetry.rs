//! Raw cgroup v2 counters grouped by controller.
//!
//! Each category reads a fixed list of interface files and reports their contents verbatim,
//! with one trailing newline removed. Files the kernel does not expose (controller disabled,
//! cgroup gone, older kernel) are reported as unavailable and serialize as the empty string.

use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::field::Field;
use crate::fsutil;

/// `(file, counter name)` pairs of the memory controller.
pub const MEMORY_COUNTERS: &[(&str, &str)] = &[
    ("memory.current", "Memory Current"),
    ("memory.max", "Memory Max"),
    ("memory.high", "Memory High"),
    ("memory.swap.max", "Memory Swap Max"),
    ("memory.swap.high", "Memory Swap High"),
    ("memory.swap.current", "Memory Swap Current"),
    ("memory.low", "Memory Low"),
    ("memory.min", "Memory Min"),
];

/// `(file, counter name)` pairs of the cpu and cpuset controllers.
pub const CPU_COUNTERS: &[(&str, &str)] = &[
    ("cpu.stat", "CPU Usage"),
    ("cpu.pressure", "CPU Pressure"),
    ("cpu.max", "CPU Max"),
    ("cpu.weight", "CPU Weight"),
    ("cpu.weight.nice", "CPU Weight Nice"),
    ("cpu.uclamp.min", "CPU Uclamp Min"),
    ("cpu.uclamp.max", "CPU Uclamp Max"),
    ("cpuset.cpus.effective", "Effective CPUs"),
    ("cpuset.cpus.exclusive", "Exclusive CPUs"),
    ("cpuset.cpus.partition", "Partition CPUs"),
];

/// `(file, counter name)` pairs of the io controller.
pub const IO_COUNTERS: &[(&str, &str)] = &[
    ("io.max", "IO Max"),
    ("io.pressure", "IO Pressure"),
    ("io.prio.class", "IO Priority Class"),
    ("io.stat", "IO Stat"),
    ("io.weight", "IO Weight"),
];

/// Counters of one category, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSet(Vec<(&'static str, Field<String>)>);

impl CounterSet {
    fn read(dir: &Path, table: &[(&str, &'static str)]) -> Self {
        Self(
            table
                .iter()
                .map(|&(file, name)| (name, fsutil::read_value(dir.join(file))))
                .collect(),
        )
    }

    /// Returns the counter with the given name, if it is part of this category.
    pub fn get(&self, name: &str) -> Option<&Field<String>> {
        self.0.iter().find(|(key, _)| *key == name).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Field<String>)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CounterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Memory, CPU and IO counters of one cgroup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    #[serde(rename = "memoryStats")]
    pub memory: CounterSet,
    #[serde(rename = "cpuStats")]
    pub cpu: CounterSet,
    #[serde(rename = "ioStats")]
    pub io: CounterSet,
}

/// Reads every documented counter under `cgroup_dir`.
pub fn collect(cgroup_dir: &Path) -> TelemetrySnapshot {
    log::debug!("collecting telemetry from `{}`", cgroup_dir.display());
    TelemetrySnapshot {
        memory: CounterSet::read(cgroup_dir, MEMORY_COUNTERS),
        cpu: CounterSet::read(cgroup_dir, CPU_COUNTERS),
        io: CounterSet::read(cgroup_dir, IO_COUNTERS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_reads_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.current"), "8192\n").unwrap();
        std::fs::write(dir.path().join("memory.max"), "max\n").unwrap();
        std::fs::write(
            dir.path().join("cpu.stat"),
            "usage_usec 1000\nuser_usec 600\nsystem_usec 400\n",
        )
        .unwrap();

        let snapshot = collect(dir.path());
        assert_eq!(
            snapshot.memory.get("Memory Current"),
            Some(&Field::Available("8192".to_string()))
        );
        assert_eq!(
            snapshot.memory.get("Memory Max"),
            Some(&Field::Available("max".to_string()))
        );
        assert_eq!(
            snapshot.cpu.get("CPU Usage"),
            Some(&Field::Available(
                "usage_usec 1000\nuser_usec 600\nsystem_usec 400".to_string()
            ))
        );
        assert_eq!(snapshot.io.get("IO Stat"), Some(&Field::Unavailable));
    }

    #[test]
    fn test_missing_cgroup_yields_every_key_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = collect(&dir.path().join("gone"));

        let json = serde_json::to_value(&snapshot).unwrap();
        for (key, table) in [
            ("memoryStats", MEMORY_COUNTERS),
            ("cpuStats", CPU_COUNTERS),
            ("ioStats", IO_COUNTERS),
        ] {
            let counters = json[key].as_object().unwrap();
            assert_eq!(counters.len(), table.len());
            for (_, name) in table {
                assert_eq!(counters[*name], "");
            }
        }
    }

    #[test]
    fn test_counter_order_follows_table() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = collect(dir.path());
        let names: Vec<_> = snapshot.io.iter().map(|(name, _)| name).collect();
        let expected: Vec<_> = IO_COUNTERS.iter().map(|(_, name)| *name).collect();
        assert_eq!(names, expected);
    }
}
