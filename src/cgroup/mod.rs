//! Cgroup resolution for container processes.
//!
//! Resolves, for a pid, the cgroup v1 (named systemd hierarchy) and v2 (unified hierarchy)
//! paths from `/proc/<pid>/cgroup`, prefixes the v2 path with the host's cgroup mount root and
//! obtains the 64-bit cgroup id the kernel assigns to that directory.
//!
//! `/proc/<pid>/cgroup` format: `<hierarchy-id>:<controller-list>:<cgroup-path>`
//!
//! - v1: arbitrary hierarchy id, comma-separated controllers (`name=systemd` for the named
//!   systemd hierarchy), path relative to that hierarchy's root.
//! - v2: hierarchy id `0`, empty controller list, path relative to the unified root.
//!
//! # Platform Requirements
//!
//! - Linux. The cgroup id lookup uses `name_to_handle_at(2)` and only works on cgroup v2.
//! - Read access to `/proc/<pid>` and the cgroup mount.
use std::path::{Path, PathBuf};

mod error;
mod id;
mod mount;
mod paths;

pub use error::{Error, Result};
pub use id::resolve_cgroup_id;
pub use mount::{CgroupRoots, DEFAULT_CGROUP_ROOT, DEFAULT_UNIFIED_ROOT};
pub use paths::{CgroupPaths, resolve_cgroup_paths};

use crate::container::Pid;

/// Cgroup membership of a container's init process.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CgroupInfo {
    /// Path in the v1 named systemd hierarchy, empty for the root or if absent.
    pub path_v1: String,
    /// Path in the v2 unified hierarchy, empty for the root or if absent.
    pub path_v2: String,
    /// `path_v2` under the cgroup mount root. Empty if `path_v2` is empty.
    pub qualified_path: PathBuf,
    /// Kernel id of the v2 cgroup. 0 if `path_v2` is empty.
    pub cgroup_id: u64,
}

/// Resolves paths, qualified path and cgroup id of `pid`.
///
/// Processes without a v2 path (v1-only hosts) get an empty qualified path and cgroup id 0;
/// when a v2 path exists, qualifying it and looking up its id must both succeed.
///
/// # Errors
///
/// Any error of [`resolve_cgroup_paths`], [`CgroupRoots::qualify`] and [`resolve_cgroup_id`].
pub fn resolve(proc_root: &Path, roots: &CgroupRoots, pid: Pid) -> Result<CgroupInfo> {
    let paths = resolve_cgroup_paths(proc_root, pid)?;
    log::debug!(
        "pid {}: cgroup v1 path {:?}, v2 path {:?}",
        pid,
        paths.v1,
        paths.v2
    );

    if paths.v2.is_empty() {
        return Ok(CgroupInfo {
            path_v1: paths.v1,
            ..Default::default()
        });
    }

    let qualified_path = roots.qualify(&paths.v2)?;
    let cgroup_id = resolve_cgroup_id(&qualified_path)?;

    Ok(CgroupInfo {
        path_v1: paths.v1,
        path_v2: paths.v2,
        qualified_path,
        cgroup_id,
    })
}

/// First cgroup2 mount point listed in `/proc/self/mountinfo`, for tests that need real cgroups.
#[cfg(test)]
pub(crate) fn find_cgroup2_mount() -> Option<PathBuf> {
    let mountinfo = std::fs::read_to_string("/proc/self/mountinfo").ok()?;
    mountinfo.lines().find_map(|line| {
        let (mount, fs) = line.split_once(" - ")?;
        if fs.split(' ').next()? != "cgroup2" {
            return None;
        }
        mount.split(' ').nth(4).map(PathBuf::from)
    })
}
