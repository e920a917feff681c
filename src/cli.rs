//! Command-line front end.
//!
//! Every subcommand maps onto one [`Fleet`] operation and prints its result as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{Config, RUNTIME_ENV, STATE_ROOT_ENV};
use crate::container::ContainerID;
use crate::fleet::Fleet;
use crate::runtime::CrunRuntime;
use crate::signal::parse_signal;
use crate::update::UpdateSource;

#[derive(Debug, Parser)]
#[command(name = "oci-fleet")]
#[command(version, about = "Pattern-based control and telemetry for OCI containers")]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Runtime state directory
    #[arg(long, global = true, env = STATE_ROOT_ENV)]
    pub root: Option<PathBuf>,

    /// Containers use systemd-managed cgroups
    #[arg(long, global = true)]
    pub systemd_cgroup: bool,

    /// Path or name of the crun binary
    #[arg(long, global = true, env = RUNTIME_ENV)]
    pub runtime: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum SubCommand {
    /// Send a signal to every container whose id matches PATTERN
    Kill {
        /// Extended regular expression matched against container ids
        pattern: String,
        /// Signal name (KILL, SIGKILL) or number
        #[arg(default_value = "TERM")]
        signal: String,
        /// Signal every process of the container, not only its init process
        #[arg(short, long)]
        all: bool,
    },

    /// Delete every container whose id matches PATTERN
    Delete {
        /// Extended regular expression matched against container ids
        pattern: String,
        /// Kill running containers before deleting them
        #[arg(short, long)]
        force: bool,
    },

    /// List containers
    List {
        /// Only print container ids
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the processes of a running container
    Ps { id: ContainerID },

    /// Show cgroup counters of a running container
    Stats { id: ContainerID },

    /// Update the resources of a container
    Update {
        id: ContainerID,
        /// OCI LinuxResources JSON file
        #[arg(short, long, conflicts_with = "values", required_unless_present = "values")]
        resources: Option<PathBuf>,
        /// Resource values as a JSON object, e.g. '{"memory": 1048576}'
        #[arg(long)]
        values: Option<String>,
    },
}

impl Args {
    /// Builds the configuration: environment first, flags on top.
    pub fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(root) = &self.root {
            config.state_root = root.clone();
        }
        if let Some(runtime) = &self.runtime {
            config.runtime_binary = runtime.clone();
        }
        config.systemd_cgroup |= self.systemd_cgroup;
        config
    }
}

/// Runs the command described by `args`.
///
/// # Errors
///
/// Returns the error of the underlying fleet operation, or a JSON error for malformed
/// `--values`.
pub fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config();
    log::debug!("{config:?}");
    let fleet = Fleet::new(CrunRuntime::from_config(&config), config);

    match args.command {
        SubCommand::Kill {
            pattern,
            signal,
            all,
        } => {
            let result = fleet.batch_kill(&pattern, parse_signal(&signal), all)?;
            print_json(&result.summary())
        }
        SubCommand::Delete { pattern, force } => {
            let result = fleet.batch_delete(&pattern, force)?;
            print_json(&result.summary())
        }
        SubCommand::List { quiet } => print_json(&fleet.list(quiet)?),
        SubCommand::Ps { id } => print_json(&fleet.sample_processes(&id)?),
        SubCommand::Stats { id } => print_json(&fleet.collect_telemetry(&id)?),
        SubCommand::Update {
            id,
            resources,
            values,
        } => {
            let source = match (resources, values) {
                (Some(path), _) => UpdateSource::File(path),
                (None, Some(values)) => {
                    UpdateSource::from_json(serde_json::from_str(&values)?)?
                }
                (None, None) => return Err("either --resources or --values is required".into()),
            };
            print_json(&fleet.update_resources(&id, &source)?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
