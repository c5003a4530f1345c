use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::container::Pid;

/// Error that occurs when opening a per-process proc file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open `{path}` of pid {pid}: {source}")]
pub struct ProcFileError {
    pub pid: Pid,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Returns `<proc_root>/<pid>/<name>`.
pub fn pid_path(proc_root: &Path, pid: Pid, name: impl AsRef<Path>) -> PathBuf {
    proc_root.join(pid.to_string()).join(name)
}

/// Opens `<proc_root>/<pid>/<name>` and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`ProcFileError`] if the file cannot be opened, typically because the process has
/// already exited.
///
/// # Example
/// ```no_run
/// # use container_scope::{container::Pid, procfs};
/// let reader = procfs::open_pid_file("/proc".as_ref(), Pid::new(1).unwrap(), "cgroup")?;
/// # Ok::<(), procfs::ProcFileError>(())
/// ```
pub fn open_pid_file(
    proc_root: &Path,
    pid: Pid,
    name: impl AsRef<Path>,
) -> Result<BufReader<File>, ProcFileError> {
    let path = pid_path(proc_root, pid, name);
    let file = File::open(&path).map_err(|source| ProcFileError { pid, path, source })?;
    Ok(BufReader::new(file))
}
