//! Runtime status clients: fetch the pid of a container from the runtime that manages it.
//!
//! - containerd and CRI-O are asked over their CRI socket (`ContainerStatus`, verbose).
//! - Docker is asked through the `docker inspect` CLI.
//!
//! Every call is bounded by [`RuntimeConfig::timeout`].
use std::path::PathBuf;
use std::time::Duration;

mod cri;
mod docker;
mod error;

pub use cri::{CriClient, pid_from_containerd_info, pid_from_crio_info};
pub use docker::{DockerClient, pid_from_inspect_output};
pub use error::{Error, Result};

use crate::container::{ContainerID, Pid, Runtime};

pub const CONTAINERD_DEFAULT_SOCKET_PATH: &str = "/run/containerd/containerd.sock";
pub const CRIO_DEFAULT_SOCKET_PATH: &str = "/run/crio/crio.sock";
/// Socket of the legacy dockershim. Docker containers are resolved via the CLI instead.
pub const DOCKER_SHIM_DEFAULT_SOCKET_PATH: &str = "/var/run/dockershim.sock";
pub const DEFAULT_HOST_ROOT: &str = "/host";
pub const DEFAULT_DOCKER_BINARY: &str = "docker";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Where and how to reach each runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub containerd_socket: PathBuf,
    pub crio_socket: PathBuf,
    pub docker_binary: PathBuf,
    /// Root to `chroot` into before running the docker CLI; `/` runs it directly.
    pub host_root: PathBuf,
    /// Bound on dialing plus the status call (or the CLI run).
    pub timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            containerd_socket: PathBuf::from(CONTAINERD_DEFAULT_SOCKET_PATH),
            crio_socket: PathBuf::from(CRIO_DEFAULT_SOCKET_PATH),
            docker_binary: PathBuf::from(DEFAULT_DOCKER_BINARY),
            host_root: PathBuf::from(DEFAULT_HOST_ROOT),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The status client for one runtime.
#[derive(Debug, Clone, Copy)]
pub enum RuntimeClient<'a> {
    Docker(&'a DockerClient),
    CriO(&'a CriClient),
    Containerd(&'a CriClient),
}

impl RuntimeClient<'_> {
    /// Fetches the pid of the container's init process.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] whose kind is `RuntimeUnavailable`, `MalformedResponse` or
    /// `InvalidPid`.
    pub async fn fetch_pid(&self, id: &ContainerID) -> Result<Pid> {
        match self {
            RuntimeClient::Docker(client) => client.fetch_pid(id).await,
            RuntimeClient::CriO(client) => pid_from_crio_info(&client.container_info(id).await?),
            RuntimeClient::Containerd(client) => {
                pid_from_containerd_info(&client.container_info(id).await?)
            }
        }
    }
}

/// One configured client per supported runtime.
#[derive(Debug, Clone)]
pub struct RuntimeClients {
    docker: DockerClient,
    crio: CriClient,
    containerd: CriClient,
}

impl RuntimeClients {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            docker: DockerClient::new(
                config.docker_binary.clone(),
                config.host_root.clone(),
                config.timeout,
            ),
            crio: CriClient::new(Runtime::CriO, config.crio_socket.clone(), config.timeout),
            containerd: CriClient::new(
                Runtime::Containerd,
                config.containerd_socket.clone(),
                config.timeout,
            ),
        }
    }

    pub fn client(&self, runtime: Runtime) -> RuntimeClient<'_> {
        match runtime {
            Runtime::Docker => RuntimeClient::Docker(&self.docker),
            Runtime::CriO => RuntimeClient::CriO(&self.crio),
            Runtime::Containerd => RuntimeClient::Containerd(&self.containerd),
        }
    }
}
