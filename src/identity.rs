//! Container identity resolution: `<runtime>://<id>` to pid.
use std::str::FromStr;

use crate::container::{self, Pid, RuntimeContainerID};
use crate::error::ErrorKind;
use crate::runtime::{self, RuntimeClients, RuntimeConfig};

/// Either the id could not be dispatched, or the runtime's own error, passed through as is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    ContainerID(#[from] container::Error),
    #[error(transparent)]
    Runtime(#[from] runtime::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ContainerID(err) => err.kind(),
            Error::Runtime(err) => err.kind(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    clients: RuntimeClients,
}

impl Resolver {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            clients: RuntimeClients::new(config),
        }
    }

    /// Resolves the pid of a prefixed container id such as `containerd://<id>`.
    ///
    /// # Errors
    ///
    /// Fails with kind `UnknownRuntime` before contacting anything if the prefix is not
    /// recognised; otherwise with the runtime client's error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use container_scope::{identity::Resolver, runtime::RuntimeConfig, error::ErrorKind};
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let resolver = Resolver::new(&RuntimeConfig::default());
    /// let err = resolver.resolve_pid("ftp://x").await.unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::UnknownRuntime);
    /// # });
    /// ```
    pub async fn resolve_pid(&self, container_id: &str) -> Result<Pid, Error> {
        let id = RuntimeContainerID::from_str(container_id)?;
        self.resolve(&id).await
    }

    pub async fn resolve(&self, id: &RuntimeContainerID) -> Result<Pid, Error> {
        log::debug!("resolving pid of `{}`", id);
        let pid = self.clients.client(id.runtime()).fetch_pid(id.id()).await?;
        log::debug!("`{}` has pid {}", id, pid);
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn unreachable_config(dir: &std::path::Path) -> RuntimeConfig {
        RuntimeConfig {
            containerd_socket: dir.join("containerd.sock"),
            crio_socket: dir.join("crio.sock"),
            docker_binary: PathBuf::from("/definitely/not/docker"),
            host_root: PathBuf::from("/"),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_unknown_runtime_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(&unreachable_config(tmp.path()));

        for id in ["ftp://x", "x", "podman://x"] {
            let err = resolver.resolve_pid(id).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnknownRuntime, "{id}");
        }
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dispatches_to_each_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(&unreachable_config(tmp.path()));

        for id in ["docker://abc", "cri-o://abc", "containerd://abc"] {
            let err = resolver.resolve_pid(id).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable, "{id}");
        }
    }

    #[tokio::test]
    async fn test_crio_error_names_its_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(&unreachable_config(tmp.path()));

        let err = resolver.resolve_pid("cri-o://abc").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(runtime::Error::Dial {
                runtime: container::Runtime::CriO,
                ..
            })
        ));
    }
}
