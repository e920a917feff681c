//! Resource update translation.
//!
//! A [`ResourceRequest`] names resource knobs by their wire field (`memory`, `cpuQuota`, ...).
//! [`translate`] turns it into [`ResourceUpdateEntry`] values addressed by OCI resource section
//! and attribute, in a fixed order. Intel RDT schemata travel separately as an [`RdtUpdate`].

mod request;
mod table;

use std::path::PathBuf;

use serde::Serialize;

use crate::container::ContainerID;
use crate::error::{Error, Result};

pub use request::ResourceRequest;
pub use table::translate;

/// A single controller attribute to set, e.g. `memory.limit = 1048576`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUpdateEntry {
    /// OCI `LinuxResources` section (`cpu`, `memory`, `blockIO`, `pids`).
    pub section: &'static str,
    pub name: &'static str,
    pub value: String,
    /// Whether `value` holds an integer.
    pub numeric: bool,
}

impl ResourceUpdateEntry {
    pub fn new(
        section: &'static str,
        name: &'static str,
        value: impl Into<String>,
        numeric: bool,
    ) -> Self {
        Self {
            section,
            name,
            value: value.into(),
            numeric,
        }
    }
}

/// Intel RDT schemata to apply to a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdtUpdate {
    pub l3_cache_schema: Option<String>,
    pub mem_bw_schema: Option<String>,
}

/// Where an update's resources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSource {
    /// Structured values, translated before they reach the runtime.
    Values(ResourceRequest),
    /// A path to an OCI `LinuxResources` JSON document, handed to the runtime as is.
    File(PathBuf),
}

impl UpdateSource {
    /// Interprets a JSON value as an update source: a string is a file path, an object holds
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResources`] for any other JSON kind.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(path) => Ok(Self::File(PathBuf::from(path))),
            value @ serde_json::Value::Object(_) => serde_json::from_value(value)
                .map(Self::Values)
                .map_err(|err| Error::InvalidResources(err.to_string())),
            other => Err(Error::InvalidResources(format!(
                "expected a file path or an object, got `{other}`"
            ))),
        }
    }
}

/// Result of a resource update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub id: ContainerID,
    pub updated: bool,
}
