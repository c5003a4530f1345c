use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::container::{ContainerID, Pid, Runtime};
use crate::cri::runtime::v1::ContainerStatusRequest;
use crate::cri::runtime::v1::runtime_service_client::RuntimeServiceClient;

use super::{Error, Result};

/// Client for the CRI `RuntimeService` of a runtime listening on a Unix socket.
#[derive(Debug, Clone)]
pub struct CriClient {
    runtime: Runtime,
    socket_path: PathBuf,
    timeout: Duration,
}

impl CriClient {
    pub fn new(runtime: Runtime, socket_path: PathBuf, timeout: Duration) -> Self {
        Self {
            runtime,
            socket_path,
            timeout,
        }
    }

    /// Issues a verbose `ContainerStatus` call and returns the response's `info` map.
    ///
    /// A fresh connection is dialed per call; hooks run once per container event.
    pub async fn container_info(&self, id: &ContainerID) -> Result<HashMap<String, String>> {
        let channel = crate::grpc::channel_for_unix_socket(&self.socket_path, self.timeout)
            .await
            .map_err(|source| Error::Dial {
                runtime: self.runtime,
                source,
            })?;
        let mut client = RuntimeServiceClient::new(channel);

        let request = ContainerStatusRequest {
            container_id: id.as_str().to_owned(),
            verbose: true,
        };
        let response = tokio::time::timeout(self.timeout, client.container_status(request))
            .await
            .map_err(|_| Error::Timeout {
                runtime: self.runtime,
                id: id.clone(),
                timeout: self.timeout,
            })?
            .map_err(|status| Error::Rpc {
                runtime: self.runtime,
                id: id.clone(),
                source: Box::new(status),
            })?
            .into_inner();

        if let Some(status) = &response.status {
            log::debug!(
                "{}: container `{}` is {:?}",
                self.runtime,
                id,
                status.state()
            );
        }

        Ok(response.info)
    }
}

/// CRI-O reports the pid as a decimal string under `info["pid"]`.
pub fn pid_from_crio_info(info: &HashMap<String, String>) -> Result<Pid> {
    let runtime = Runtime::CriO;
    let raw = info
        .get("pid")
        .ok_or(Error::MissingField {
            runtime,
            field: "pid",
        })?;
    let pid = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidField {
            runtime,
            field: "pid",
            value: raw.clone(),
        })?;

    Pid::new(pid).map_err(|_| Error::InvalidPid { runtime, pid })
}

#[derive(Debug, serde::Deserialize)]
struct ContainerdInfo {
    #[serde(alias = "Pid")]
    pid: Option<i64>,
}

/// containerd reports a JSON document under `info["info"]` whose `pid` field holds the pid.
pub fn pid_from_containerd_info(info: &HashMap<String, String>) -> Result<Pid> {
    let runtime = Runtime::Containerd;
    let raw = info.get("info").ok_or(Error::MissingField {
        runtime,
        field: "info",
    })?;
    let decoded: ContainerdInfo =
        serde_json::from_str(raw).map_err(|source| Error::Decode {
            runtime,
            field: "info",
            source,
        })?;
    let pid = decoded.pid.ok_or(Error::MissingField {
        runtime,
        field: "info.pid",
    })?;

    Pid::new(pid).map_err(|_| Error::InvalidPid { runtime, pid })
}
