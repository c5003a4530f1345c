//! Configuration from environment variables.
//!
//! | Variable                 | Default                            |
//! |--------------------------|------------------------------------|
//! | `CONTAINERD_SOCKET_PATH` | `/run/containerd/containerd.sock`  |
//! | `CRIO_SOCKET_PATH`       | `/run/crio/crio.sock`              |
//! | `DOCKER_BINARY`          | `docker`                           |
//! | `HOST_ROOT`              | `/host`                            |
//! | `PROC_ROOT`              | `/proc`                            |
//! | `CGROUP_UNIFIED_ROOT`    | `/sys/fs/cgroup/unified`           |
//! | `CGROUP_DEFAULT_ROOT`    | `/sys/fs/cgroup`                   |
//! | `RUNTIME_TIMEOUT_MS`     | `2000`                             |
//! | `DEFAULT_RUNTIME`        | unset (`docker`, `cri-o`, `containerd`) |
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cgroup::CgroupRoots;
use crate::container::Runtime;
use crate::runtime::RuntimeConfig;

pub const DEFAULT_PROC_ROOT: &str = "/proc";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value {value:?} for environment variable `{var}`: {reason}")]
    InvalidValue {
        var: &'static str,
        value: OsString,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub proc_root: PathBuf,
    pub cgroup_roots: CgroupRoots,
    /// Runtime assumed for unprefixed hook ids whose pid has to be resolved.
    pub default_runtime: Option<Runtime>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            cgroup_roots: CgroupRoots::default(),
            default_runtime: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|var| std::env::var_os(var))
    }

    fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Result<Self, Error> {
        let defaults = Config::default();
        let path = |name: &str, default: PathBuf| var(name).map(PathBuf::from).unwrap_or(default);

        let timeout = match var("RUNTIME_TIMEOUT_MS") {
            Some(value) => parse_timeout(value)?,
            None => defaults.runtime.timeout,
        };
        let default_runtime = var("DEFAULT_RUNTIME")
            .map(|value| {
                value
                    .to_str()
                    .and_then(|s| Runtime::from_str(s).ok())
                    .ok_or(Error::InvalidValue {
                        var: "DEFAULT_RUNTIME",
                        value: value.clone(),
                        reason: "expected one of `docker`, `cri-o`, `containerd`",
                    })
            })
            .transpose()?;

        Ok(Config {
            runtime: RuntimeConfig {
                containerd_socket: path(
                    "CONTAINERD_SOCKET_PATH",
                    defaults.runtime.containerd_socket,
                ),
                crio_socket: path("CRIO_SOCKET_PATH", defaults.runtime.crio_socket),
                docker_binary: path("DOCKER_BINARY", defaults.runtime.docker_binary),
                host_root: path("HOST_ROOT", defaults.runtime.host_root),
                timeout,
            },
            proc_root: path("PROC_ROOT", defaults.proc_root),
            cgroup_roots: CgroupRoots {
                unified: path("CGROUP_UNIFIED_ROOT", defaults.cgroup_roots.unified),
                default: path("CGROUP_DEFAULT_ROOT", defaults.cgroup_roots.default),
            },
            default_runtime,
        })
    }
}

fn parse_timeout(value: OsString) -> Result<Duration, Error> {
    let millis = value.to_str().and_then(|s| s.trim().parse::<u64>().ok());
    match millis {
        Some(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(Error::InvalidValue {
            var: "RUNTIME_TIMEOUT_MS",
            value,
            reason: "expected a positive number of milliseconds",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> Result<Config, Error> {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.runtime.containerd_socket,
            PathBuf::from("/run/containerd/containerd.sock")
        );
        assert_eq!(config.runtime.crio_socket, PathBuf::from("/run/crio/crio.sock"));
        assert_eq!(config.runtime.timeout, Duration::from_secs(2));
        assert_eq!(config.default_runtime, None);
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("CRIO_SOCKET_PATH", "/var/run/crio/crio.sock"),
            ("HOST_ROOT", "/"),
            ("PROC_ROOT", "/host/proc"),
            ("CGROUP_DEFAULT_ROOT", "/host/sys/fs/cgroup"),
            ("RUNTIME_TIMEOUT_MS", "500"),
            ("DEFAULT_RUNTIME", "cri-o"),
        ])
        .unwrap();
        assert_eq!(config.runtime.crio_socket, PathBuf::from("/var/run/crio/crio.sock"));
        assert_eq!(config.runtime.host_root, PathBuf::from("/"));
        assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(
            config.cgroup_roots.default,
            PathBuf::from("/host/sys/fs/cgroup")
        );
        assert_eq!(
            config.cgroup_roots.unified,
            PathBuf::from("/sys/fs/cgroup/unified")
        );
        assert_eq!(config.runtime.timeout, Duration::from_millis(500));
        assert_eq!(config.default_runtime, Some(Runtime::CriO));
    }

    #[test]
    fn test_invalid_values() {
        for (var, value) in [
            ("RUNTIME_TIMEOUT_MS", "soon"),
            ("RUNTIME_TIMEOUT_MS", "0"),
            ("DEFAULT_RUNTIME", "podman"),
        ] {
            let err = from_map(&[(var, value)]).unwrap_err();
            match err {
                Error::InvalidValue { var: got, .. } => assert_eq!(got, var),
            }
        }
    }
}
