//! Process discovery and per-process snapshots read from procfs.

mod sampler;
mod stat;
mod status;

use std::path::Path;

pub use sampler::{ProcessSampler, ProcessSnapshot};
pub use stat::{ParseError, ProcStat, StatField, parse_stat_line};
pub use status::read_real_uid;

use crate::field::Field;
use crate::fsutil;

/// Reads and parses `<proc_root>/<pid>/stat`.
///
/// Returns [`Field::Unavailable`] if the process is gone or the line is malformed.
pub fn read_stat(proc_root: &Path, pid: u32) -> Field<ProcStat> {
    let path = proc_root.join(pid.to_string()).join("stat");
    fsutil::read_bytes(&path).and_then(|line| match parse_stat_line(&line) {
        Ok(stat) => Field::Available(stat),
        Err(err) => {
            log::debug!("failed to parse `{}`: {}", path.display(), err);
            Field::Unavailable
        }
    })
}
