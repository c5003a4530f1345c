use std::path::PathBuf;

use crate::error::ErrorKind;
use crate::procfs::ProcFileError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    ProcFile(#[from] ProcFileError),
    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot find cgroup path in `{path}`")]
    NoCgroup { path: PathBuf },
    #[error("cannot access cgroup `{path}` under any of {roots:?}")]
    NotAccessible { path: String, roots: Vec<PathBuf> },
    #[error("cgroup path `{path}` contains a NUL byte")]
    InvalidPath { path: PathBuf },
    #[error("name_to_handle_at on `{path}` failed: {source}")]
    HandleLookup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected file handle size {size} for `{path}`")]
    UnexpectedHandleSize { path: PathBuf, size: u32 },
    #[error("cgroup id lookup on `{path}` returned 0")]
    ZeroCgroupID { path: PathBuf },
    #[error("cgroup id lookup is not supported on this platform")]
    UnsupportedPlatform,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ProcFile(_) | Error::ReadLine { .. } => ErrorKind::NotFound,
            Error::NoCgroup { .. } => ErrorKind::NoCgroup,
            Error::NotAccessible { .. } => ErrorKind::NotAccessible,
            Error::InvalidPath { .. }
            | Error::HandleLookup { .. }
            | Error::UnexpectedHandleSize { .. }
            | Error::ZeroCgroupID { .. } => ErrorKind::LookupFailed,
            Error::UnsupportedPlatform => ErrorKind::UnsupportedPlatform,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
