//! Cgroup v2 introspection for running containers.
//!
//! - [`hierarchy`] locates a container's cgroup directory and its member processes.
//! - [`telemetry`] reads the raw memory, CPU and IO counters of that directory.
//!
//! Nothing here writes to the cgroup filesystem; limits are changed through the runtime.

pub mod hierarchy;
pub mod telemetry;

pub use hierarchy::{is_frozen, read_procs, resolve_cgroup_dir};
pub use telemetry::{CounterSet, TelemetrySnapshot, collect};
