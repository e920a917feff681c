use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// A validated container identifier, unique within a state root.
///
/// Identifiers double as directory names under the state root, so they must be non-empty,
/// at most [`CONTAINER_ID_MAX_LEN`] bytes long, must not contain `/` and must not be `.` or `..`.
///
/// # Examples
///
/// ```
/// # use oci_fleet::container::ContainerID;
/// let container_id = ContainerID::new("web-1").unwrap();
/// assert_eq!(container_id.as_ref(), "web-1");
/// assert!(ContainerID::new("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty, too long, or cannot be used
    /// as a single path component.
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty()
            || src.len() > CONTAINER_ID_MAX_LEN
            || src.contains('/')
            || src.contains('\0')
            || src == "."
            || src == ".."
        {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContainerID {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for ContainerID {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Parameters identifying a container for a single runtime call.
///
/// Built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    id: ContainerID,
    state_root: PathBuf,
    systemd_cgroup: bool,
}

impl ContainerRef {
    pub fn new(id: ContainerID, state_root: impl Into<PathBuf>, systemd_cgroup: bool) -> Self {
        Self {
            id,
            state_root: state_root.into(),
            systemd_cgroup,
        }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    pub fn state_root(&self) -> &Path {
        &self.state_root
    }

    pub fn systemd_cgroup(&self) -> bool {
        self.systemd_cgroup
    }
}

/// Lifecycle state of a container as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Stopped,
}

impl ContainerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Returns `true` if the container's init process is alive.
    pub fn has_live_process(self) -> bool {
        matches!(self, Self::Created | Self::Running | Self::Paused)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
