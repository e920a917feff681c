//! Parser for `/proc/[pid]/mountinfo` lines.
//!
//! See [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html).
//! Only the fields needed to locate a filesystem are kept. Paths in mountinfo escape space,
//! tab, newline and backslash as three-digit octal sequences (`\040`); they are unescaped here.

use std::path::PathBuf;

/// The parts of a mountinfo entry used to locate a filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Root of the mount within its filesystem.
    pub root: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
}

/// Named fields in a mountinfo line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountField {
    Root,
    MountPoint,
    Separator,
    FsType,
}

impl std::fmt::Display for MountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountField::Root => "root",
            MountField::MountPoint => "mount_point",
            MountField::Separator => "-",
            MountField::FsType => "fs_type",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("missing `{field}` in mountinfo line `{line}`")]
pub struct ParseError {
    pub field: MountField,
    pub line: String,
}

/// Parses a single mountinfo line.
///
/// The optional fields between the mount options and the ` - ` separator may be absent or
/// repeated; the separator is located as its own token.
pub fn parse_mount_line(line: &str) -> Result<MountEntry, ParseError> {
    let missing = |field| ParseError {
        field,
        line: line.trim_end().to_owned(),
    };

    // mount id, parent id, major:minor
    let mut tokens = line.split_whitespace().skip(3);
    let root = tokens.next().ok_or_else(|| missing(MountField::Root))?;
    let mount_point = tokens.next().ok_or_else(|| missing(MountField::MountPoint))?;
    tokens
        .find(|token| *token == "-")
        .ok_or_else(|| missing(MountField::Separator))?;
    let fs_type = tokens.next().ok_or_else(|| missing(MountField::FsType))?;

    Ok(MountEntry {
        root: unescape(root),
        mount_point: PathBuf::from(unescape(mount_point)),
        fs_type: fs_type.to_owned(),
    })
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_owned();
    }

    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if let Some(&[b'\\', a, b, c]) = bytes.get(i..i + 4) {
            let octal = [a, b, c].iter().try_fold(0u32, |acc, d| {
                (b'0'..=b'7')
                    .contains(d)
                    .then(|| acc * 8 + u32::from(d - b'0'))
            });
            if let Some(byte) = octal.and_then(|value| u8::try_from(value).ok()) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
