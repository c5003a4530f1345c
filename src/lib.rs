//! Container Scope: resolves the kernel identity of running containers.
//!
//! For a container started or stopped by an OCI runtime this library determines the init pid,
//! cgroup v1/v2 paths, cgroup id and mount namespace id, and keeps them in a [`registry`] that
//! kernel event tracers use to attribute events to containers.
//!
//! Inputs:
//!
//! - OCI hook invocations, carrying the runtime state as JSON on stdin ([`oci`]).
//! - Orchestrator container ids (`docker://`, `cri-o://`, `containerd://`), resolved to a pid
//!   through the runtime's CRI socket or the docker CLI ([`identity`], [`runtime`]).
//!
//! Host lookups go through `/proc/<pid>/cgroup`, `/proc/<pid>/ns/mnt` and
//! `name_to_handle_at(2)` on the cgroup filesystem ([`cgroup`], [`namespace`]).
use std::io::Read;

use crate::container::Pid;
use crate::error::ResultOkLogExt;
use crate::registry::{HostInspector, ProcInspector, Registry};

pub mod cgroup;
pub mod config;
pub mod container;
pub mod error;
pub mod grpc;
pub mod identity;
pub mod namespace;
pub mod oci;
pub mod procfs;
pub mod registry;
pub mod runtime;

pub mod cri {
    pub mod runtime {
        pub mod v1 {
            tonic::include_proto!("runtime.v1");
        }
    }
}

const USAGE: &str = "\
usage: container-scope <command>

commands:
  start            resolve the container in the OCI state read from stdin and print its entry
  stop             validate the OCI state read from stdin and print its container id
  pid <id>         resolve the pid of <runtime>://<id>
  inspect <pid>    print cgroup and mount namespace of <pid>

Each invocation uses its own registry, which is gone when the process exits.
Embed `container_scope::registry::Registry` to keep entries across hook calls.";

#[derive(Debug, serde::Serialize)]
struct Inspection {
    pid: Pid,
    cgroup: Option<cgroup::CgroupInfo>,
    namespace: Option<namespace::NamespaceInfo>,
}

/// Runs the command given on the command line.
///
/// Configuration is read from the environment, see [`config`].
///
/// The registry lives only as long as one invocation, so `start` reports the entry it would
/// insert and `stop` only validates its payload. A long-lived host embeds
/// [`Registry`](registry::Registry) instead.
///
/// # Errors
///
/// Returns an error for invalid configuration or arguments, and whenever the command itself
/// fails, so that the process exits with a non-zero status (which fails the hook).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    log::debug!("Configuration: {:?}", config);

    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or(USAGE)?;
    match command.as_str() {
        "start" => {
            let registry = Registry::new(&config);
            let entry = registry
                .on_start(&read_stdin()?)
                .await
                .inspect_err(|err| log::error!("start hook failed ({}): {}", err.kind(), err))?;
            println!("{}", serde_json::to_string(entry.as_ref())?);
        }
        "stop" => {
            let id = registry::stop_target(&read_stdin()?)
                .inspect_err(|err| log::error!("stop hook failed ({}): {}", err.kind(), err))?;
            println!("{id}");
        }
        "pid" => {
            let id = args.next().ok_or(USAGE)?;
            let pid = identity::Resolver::new(&config.runtime)
                .resolve_pid(&id)
                .await?;
            println!("{pid}");
        }
        "inspect" => {
            let pid = Pid::new(args.next().ok_or(USAGE)?.parse::<i64>()?)?;
            let inspector = ProcInspector::new(config.proc_root, config.cgroup_roots);
            let inspection = Inspection {
                pid,
                cgroup: inspector.cgroup(pid).ok_log(),
                namespace: inspector.mount_namespace(pid).ok_log(),
            };
            println!("{}", serde_json::to_string_pretty(&inspection)?);
        }
        other => return Err(format!("unknown command `{other}`\n{USAGE}").into()),
    }

    Ok(())
}

fn read_stdin() -> std::io::Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(4096);
    std::io::stdin().read_to_end(&mut payload)?;
    Ok(payload)
}
