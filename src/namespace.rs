//! Mount namespace resolution.
use std::path::{Path, PathBuf};

use crate::container::Pid;
use crate::error::ErrorKind;
use crate::procfs;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to stat `{path}`: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("inode numbers are not available on this platform")]
    UnsupportedPlatform,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Stat { .. } => ErrorKind::NotFound,
            Error::UnsupportedPlatform => ErrorKind::UnsupportedPlatform,
        }
    }
}

/// Mount namespace of a container's init process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct NamespaceInfo {
    /// Inode number of `/proc/<pid>/ns/mnt`.
    pub mount_ns_id: u64,
}

/// Returns the inode number of `<proc_root>/<pid>/ns/mnt`, which identifies the process' mount
/// namespace.
pub fn resolve_mount_namespace(proc_root: &Path, pid: Pid) -> Result<NamespaceInfo, Error> {
    let path = procfs::pid_path(proc_root, pid, "ns/mnt");
    // `metadata` follows the `mnt:[<inode>]` link into nsfs.
    let metadata = std::fs::metadata(&path).map_err(|source| Error::Stat { path, source })?;
    Ok(NamespaceInfo {
        mount_ns_id: inode(&metadata)?,
    })
}

#[cfg(unix)]
fn inode(metadata: &std::fs::Metadata) -> Result<u64, Error> {
    use std::os::unix::fs::MetadataExt;
    Ok(metadata.ino())
}

#[cfg(not(unix))]
fn inode(_metadata: &std::fs::Metadata) -> Result<u64, Error> {
    Err(Error::UnsupportedPlatform)
}
