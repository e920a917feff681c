//! Fleet control for OCI containers.
//!
//! This library sits on top of an OCI runtime (crun by default) and operates on every
//! container of a runtime state root at once: listing, pattern-based kill and delete,
//! process sampling from procfs, raw cgroup v2 telemetry, and resource updates translated from
//! a structured request.
//!
//! The runtime itself is a collaborator behind the [`runtime::Runtime`] trait; creating,
//! starting and tearing down containers is left to it.
//!
//! ```no_run
//! use oci_fleet::{Config, CrunRuntime, Fleet};
//! use nix::sys::signal::Signal;
//!
//! let config = Config::from_env();
//! let fleet = Fleet::new(CrunRuntime::from_config(&config), config);
//! let result = fleet.batch_kill("^web-", Signal::SIGTERM, false)?;
//! println!("signalled {} containers", result.succeeded());
//! # Ok::<(), oci_fleet::Error>(())
//! ```

pub mod cgroup;
pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod field;
pub mod fleet;
pub mod fsutil;
pub mod mountinfo;
pub mod pattern;
pub mod process;
pub mod runtime;
pub mod signal;
pub mod update;

pub use config::Config;
pub use container::{ContainerID, ContainerRef, ContainerState};
pub use error::{Error, Result};
pub use field::Field;
pub use fleet::Fleet;
pub use pattern::Pattern;
pub use runtime::{CrunRuntime, Runtime};
pub use signal::{KillSignal, parse_signal};
