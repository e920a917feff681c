use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;
use crate::runtime::StatusRecord;

/// Reads the PIDs listed in `<dir>/cgroup.procs`.
///
/// Returns `None` if the file cannot be opened. Lines that are not positive integers are
/// skipped.
pub fn read_procs(dir: &Path) -> Option<Vec<u32>> {
    let reader = match fsutil::open_file_reader(dir.join("cgroup.procs")) {
        Ok(reader) => reader,
        Err(err) => {
            log::debug!("{err}");
            return None;
        }
    };

    let mut pids = Vec::new();
    for line in reader.lines().map_while(Result::ok) {
        if let Ok(pid) = line.trim().parse::<u32>() {
            if pid > 0 {
                pids.push(pid);
            }
        }
    }

    Some(pids)
}

/// Returns `true` if `<dir>/cgroup.events` reports the cgroup as frozen.
pub fn is_frozen(dir: impl AsRef<Path>) -> bool {
    fsutil::read_value(dir.as_ref().join("cgroup.events"))
        .map(|events| events.lines().any(|line| line.trim() == "frozen 1"))
        .unwrap_or(false)
}

/// Locates the cgroup v2 directory of a container.
///
/// Uses the cgroup path from the status record if there is one, otherwise the unified
/// hierarchy entry (`0::<path>`) of the init process in `<proc_root>/<pid>/cgroup`.
pub fn resolve_cgroup_dir(
    cgroup_root: &Path,
    proc_root: &Path,
    status: &StatusRecord,
) -> Option<PathBuf> {
    if let Some(path) = status.cgroup_path() {
        return Some(cgroup_root.join(path));
    }

    let pid = status.init_pid()?;
    let membership = fsutil::read_value(proc_root.join(pid.to_string()).join("cgroup")).ok()?;
    membership
        .lines()
        .find_map(|line| line.strip_prefix("0::"))
        .map(|path| path.trim_start_matches('/'))
        .map(|path| cgroup_root.join(path))
}
