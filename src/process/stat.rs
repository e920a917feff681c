//! Parser for `/proc/[pid]/stat` lines.
//!
//! See [`proc_pid_stat(5)`](https://man7.org/linux/man-pages/man5/proc_pid_stat.5.html).
//! The command name (field 2) is wrapped in parentheses and may itself contain spaces and
//! parentheses, so the line is split on the *last* closing parenthesis.

use std::num::ParseIntError;

/// The subset of `/proc/[pid]/stat` used for process snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    /// Command name without the surrounding parentheses.
    pub command: String,
    pub state: char,
    pub ppid: i32,
    pub pgrp: i32,
    pub session: i32,
    /// Controlling terminal device number (0 if none).
    pub tty_nr: i32,
    /// User mode time in clock ticks.
    pub utime: u64,
    /// Kernel mode time in clock ticks.
    pub stime: u64,
    /// Time the process started after system boot, in clock ticks.
    pub starttime: u64,
}

impl ProcStat {
    /// Total CPU time consumed by the process, in clock ticks.
    pub fn cpu_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Named fields in a stat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Pid,
    Command,
    State,
    Ppid,
    Pgrp,
    Session,
    TtyNr,
    Utime,
    Stime,
    Starttime,
}

impl std::fmt::Display for StatField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StatField::Pid => "pid",
            StatField::Command => "comm",
            StatField::State => "state",
            StatField::Ppid => "ppid",
            StatField::Pgrp => "pgrp",
            StatField::Session => "session",
            StatField::TtyNr => "tty_nr",
            StatField::Utime => "utime",
            StatField::Stime => "stime",
            StatField::Starttime => "starttime",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a stat line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing `{field}` in stat line: `{line}`")]
    MissingField { field: StatField, line: String },

    #[error("invalid `{field}` value `{value}` in stat line: {source}")]
    InvalidField {
        field: StatField,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

// Offsets of the fields following the command name, 0-based from `state`.
const STATE: usize = 0;
const PPID: usize = 1;
const PGRP: usize = 2;
const SESSION: usize = 3;
const TTY_NR: usize = 4;
const UTIME: usize = 11;
const STIME: usize = 12;
const STARTTIME: usize = 19;

/// Parses a single `/proc/[pid]/stat` line.
///
/// The command name is whatever bytes the process chose; invalid UTF-8 in it is replaced with
/// U+FFFD instead of failing the parse.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] if the line is truncated or the command name is not
/// delimited by parentheses, and [`ParseError::InvalidField`] if a numeric field is malformed.
///
/// # Example
///
/// ```
/// use oci_fleet::process::parse_stat_line;
///
/// let line = "42 (my (odd) cmd) S 1 42 42 34816 42 4194560 10 0 0 0 250 50 0 0 20 0 1 0 900 0";
/// let stat = parse_stat_line(line).unwrap();
/// assert_eq!(stat.command, "my (odd) cmd");
/// assert_eq!(stat.ppid, 1);
/// assert_eq!(stat.cpu_ticks(), 300);
/// ```
pub fn parse_stat_line(line: impl AsRef<[u8]>) -> Result<ProcStat, ParseError> {
    let line = line.as_ref();
    let missing = |field| ParseError::MissingField {
        field,
        line: String::from_utf8_lossy(line).trim_end().to_owned(),
    };

    let open = line
        .iter()
        .position(|&b| b == b'(')
        .ok_or_else(|| missing(StatField::Command))?;
    let close = line
        .iter()
        .rposition(|&b| b == b')')
        .ok_or_else(|| missing(StatField::Command))?;
    if close < open {
        return Err(missing(StatField::Command));
    }

    let head = String::from_utf8_lossy(&line[..open]);
    let pid = parse_field(head.trim(), StatField::Pid)?;
    let command = String::from_utf8_lossy(&line[open + 1..close]).into_owned();
    let tail = String::from_utf8_lossy(&line[close + 1..]);
    let rest: Vec<&str> = tail.split_whitespace().collect();

    let get = |index: usize, field: StatField| rest.get(index).copied().ok_or_else(|| missing(field));

    let state = get(STATE, StatField::State)?
        .chars()
        .next()
        .ok_or_else(|| missing(StatField::State))?;

    Ok(ProcStat {
        pid,
        command,
        state,
        ppid: parse_field(get(PPID, StatField::Ppid)?, StatField::Ppid)?,
        pgrp: parse_field(get(PGRP, StatField::Pgrp)?, StatField::Pgrp)?,
        session: parse_field(get(SESSION, StatField::Session)?, StatField::Session)?,
        tty_nr: parse_field(get(TTY_NR, StatField::TtyNr)?, StatField::TtyNr)?,
        utime: parse_field(get(UTIME, StatField::Utime)?, StatField::Utime)?,
        stime: parse_field(get(STIME, StatField::Stime)?, StatField::Stime)?,
        starttime: parse_field(get(STARTTIME, StatField::Starttime)?, StatField::Starttime)?,
    })
}

fn parse_field<T>(value: &str, field: StatField) -> Result<T, ParseError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    value.parse::<T>().map_err(|source| ParseError::InvalidField {
        field,
        value: value.to_owned(),
        source,
    })
}
