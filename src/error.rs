use std::path::PathBuf;

use crate::container::{self, ContainerID};
use crate::runtime;

/// Errors returned by fleet operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to list containers in `{state_root}`: {source}")]
    Enumeration {
        state_root: PathBuf,
        #[source]
        source: runtime::Error,
    },
    #[error("container `{id}` is not running")]
    NotRunning { id: ContainerID },
    #[error("failed to read status of container `{id}`: {source}")]
    Status {
        id: ContainerID,
        #[source]
        source: runtime::Error,
    },
    #[error("cgroup of container `{id}` not found")]
    CgroupNotFound { id: ContainerID },
    #[error("{context}: {source}")]
    Runtime {
        context: &'static str,
        #[source]
        source: runtime::Error,
    },
    #[error(transparent)]
    Container(#[from] container::Error),
    #[error("invalid resources: {0}")]
    InvalidResources(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turns a `Result` into an `Option`, logging the error.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }
}
