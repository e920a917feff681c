use std::path::Path;

use serde::Serialize;

use super::list::identifiers;
use crate::container::{ContainerID, ContainerRef};
use crate::error::Result;
use crate::pattern::Pattern;
use crate::runtime::Runtime;
use crate::signal::KillSignal;

/// A lifecycle operation applied to every matching container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    /// `all` signals every process of the container instead of only its init process.
    Kill { signal: KillSignal, all: bool },
    Delete { force: bool },
}

/// Result of the operation on a single container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOutcome {
    pub id: ContainerID,
    pub outcome: Outcome,
}

/// Per-container outcomes of a batch operation, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub pattern: String,
    pub operation: BatchOperation,
    pub outcomes: Vec<MemberOutcome>,
}

impl BatchResult {
    /// Number of containers the operation succeeded on.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|member| member.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&ContainerID, &str)> {
        self.outcomes.iter().filter_map(|member| match &member.outcome {
            Outcome::Success => None,
            Outcome::Failure(message) => Some((&member.id, message.as_str())),
        })
    }

    pub fn summary(&self) -> BatchSummary {
        match self.operation {
            BatchOperation::Kill { signal, .. } => BatchSummary::Kill {
                pattern: self.pattern.clone(),
                signal: signal.to_string(),
                matched_count: self.succeeded(),
                success: true,
            },
            BatchOperation::Delete { force } => BatchSummary::Delete {
                pattern: self.pattern.clone(),
                deleted_count: self.succeeded(),
                force,
                success: true,
            },
        }
    }
}

/// The reported form of a [`BatchResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchSummary {
    #[serde(rename_all = "camelCase")]
    Kill {
        pattern: String,
        signal: String,
        matched_count: usize,
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    Delete {
        pattern: String,
        deleted_count: usize,
        force: bool,
        success: bool,
    },
}

/// Applies `operation` to every container under `state_root` whose identifier matches
/// `pattern`.
///
/// Every match is attempted. A failing member is logged and recorded; it never stops the
/// batch.
///
/// # Errors
///
/// Returns [`crate::Error::Enumeration`] if the container list cannot be read.
pub fn apply_to_matching<R: Runtime>(
    runtime: &R,
    pattern: &Pattern,
    operation: BatchOperation,
    state_root: &Path,
    systemd_cgroup: bool,
) -> Result<BatchResult> {
    let ids = identifiers(runtime, state_root)?;

    let mut outcomes = Vec::new();
    for id in ids.into_iter().filter(|id| pattern.matches(id.as_ref())) {
        let container = ContainerRef::new(id.clone(), state_root, systemd_cgroup);
        let result = match operation {
            BatchOperation::Kill { signal, all } => runtime.kill(&container, signal, all),
            BatchOperation::Delete { force } => runtime.delete(&container, force),
        };

        let outcome = match result {
            Ok(()) => {
                log::debug!("{operation:?} succeeded for container `{id}`");
                Outcome::Success
            }
            Err(err) => {
                log::warn!("{operation:?} failed for container `{id}`: {err}");
                Outcome::Failure(err.to_string())
            }
        };
        outcomes.push(MemberOutcome { id, outcome });
    }

    Ok(BatchResult {
        pattern: pattern.as_str().to_owned(),
        operation,
        outcomes,
    })
}
