use crate::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container id: {0:?}")]
    InvalidContainerID(String),
    #[error("unknown container runtime: {0}")]
    UnknownRuntime(String),
    #[error("invalid pid: {0}")]
    InvalidPid(i64),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidContainerID(_) => ErrorKind::InvalidContainerID,
            Error::UnknownRuntime(_) => ErrorKind::UnknownRuntime,
            Error::InvalidPid(_) => ErrorKind::InvalidPid,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
