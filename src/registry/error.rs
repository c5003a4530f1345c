use crate::container::{self, ContainerID, Pid};
use crate::error::ErrorKind;
use crate::{cgroup, identity, namespace, oci};

use super::Lookup;

/// Terminal error of a hook invocation or lookup.
///
/// [`Error::kind`] reports the class of the error that caused it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid hook payload: {0}")]
    State(#[from] oci::Error),
    #[error("invalid hook payload: {0}")]
    ContainerID(#[from] container::Error),
    #[error("failed to resolve pid of container `{id}`: {source}")]
    Pid {
        id: ContainerID,
        #[source]
        source: identity::Error,
    },
    #[error("failed to resolve cgroup of container `{id}` (pid {pid}): {source}")]
    Cgroup {
        id: ContainerID,
        pid: Pid,
        #[source]
        source: cgroup::Error,
    },
    #[error("failed to resolve mount namespace of container `{id}` (pid {pid}): {source}")]
    Namespace {
        id: ContainerID,
        pid: Pid,
        #[source]
        source: namespace::Error,
    },
    #[error("no container with {0}")]
    NotFound(Lookup),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::State(err) => err.kind(),
            Error::ContainerID(err) => err.kind(),
            Error::Pid { source, .. } => source.kind(),
            Error::Cgroup { source, .. } => source.kind(),
            Error::Namespace { source, .. } => source.kind(),
            Error::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
