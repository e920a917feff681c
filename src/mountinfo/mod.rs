//! Locating the cgroup v2 hierarchy from mountinfo.

mod error;
mod parser;

use std::io::BufRead;
use std::path::{Path, PathBuf};

pub use error::{Error, Result};
pub use parser::{MountEntry, MountField, ParseError, parse_mount_line};

use crate::fsutil;

/// Finds the mount point of the cgroup v2 filesystem listed in a mountinfo file.
///
/// A mount of the hierarchy root (`/`) wins over bind mounts of subtrees; otherwise the first
/// `cgroup2` entry is used. Malformed lines are skipped.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::MissingCgroup2Mount`] if no `cgroup2` mount is listed.
/// - [`Error::NotADirectory`] if the mount point is not a directory.
///
/// # Example
///
/// ```no_run
/// use oci_fleet::mountinfo::find_cgroup2_mount;
///
/// let root = find_cgroup2_mount("/proc/self/mountinfo").unwrap();
/// println!("cgroup2 root: {}", root.display());
/// ```
pub fn find_cgroup2_mount(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let reader = fsutil::open_file_reader(path)?;
    let mount_point = find_cgroup2_mount_in(reader, path)?;

    if !mount_point.is_dir() {
        return Err(Error::NotADirectory { path: mount_point });
    }
    Ok(mount_point)
}

fn find_cgroup2_mount_in<R: BufRead>(reader: R, origin: &Path) -> Result<PathBuf> {
    let mut first = None;

    for line in reader.lines() {
        let line = line.map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?;
        let entry = match parse_mount_line(&line) {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("{}: {err}", origin.display());
                continue;
            }
        };
        if entry.fs_type != "cgroup2" {
            continue;
        }

        log::debug!(
            "found `cgroup2` mount point with root `{}`: {}",
            entry.root,
            entry.mount_point.display()
        );
        if entry.root == "/" {
            return Ok(entry.mount_point);
        }
        first.get_or_insert(entry.mount_point);
    }

    first.ok_or_else(|| Error::MissingCgroup2Mount {
        path: origin.to_path_buf(),
    })
}
