use std::process::ExitStatus;
use std::time::Duration;

use crate::container::{ContainerID, Runtime};
use crate::error::ErrorKind;
use crate::grpc::DialError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{runtime}: {source}")]
    Dial {
        runtime: Runtime,
        #[source]
        source: DialError,
    },
    #[error("{runtime}: ContainerStatus for `{id}` timed out after {timeout:?}")]
    Timeout {
        runtime: Runtime,
        id: ContainerID,
        timeout: Duration,
    },
    #[error("{runtime}: ContainerStatus for `{id}` failed: {source}")]
    Rpc {
        runtime: Runtime,
        id: ContainerID,
        #[source]
        source: Box<tonic::Status>,
    },
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{runtime}: response does not contain `{field}`")]
    MissingField {
        runtime: Runtime,
        field: &'static str,
    },
    #[error("{runtime}: invalid value {value:?} for `{field}`")]
    InvalidField {
        runtime: Runtime,
        field: &'static str,
        value: String,
    },
    #[error("{runtime}: failed to decode `{field}`: {source}")]
    Decode {
        runtime: Runtime,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("docker: expected exactly one inspect result, got {0}")]
    InspectCount(usize),
    #[error("{runtime}: invalid pid {pid}")]
    InvalidPid { runtime: Runtime, pid: i64 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Dial { .. }
            | Error::Timeout { .. }
            | Error::Rpc { .. }
            | Error::Spawn { .. }
            | Error::CommandTimeout { .. }
            | Error::CommandFailed { .. } => ErrorKind::RuntimeUnavailable,
            Error::MissingField { .. }
            | Error::InvalidField { .. }
            | Error::Decode { .. }
            | Error::InspectCount(_) => ErrorKind::MalformedResponse,
            Error::InvalidPid { .. } => ErrorKind::InvalidPid,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
