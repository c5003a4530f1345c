use std::path::PathBuf;

use crate::cgroup::{self, CgroupInfo, CgroupRoots};
use crate::container::Pid;
use crate::namespace::{self, NamespaceInfo};

/// Host-side lookups the registry performs for a freshly started container.
///
/// Implementations must be free of shared mutable state; the registry calls them outside its
/// lock and concurrently for different pids.
pub trait HostInspector {
    fn cgroup(&self, pid: Pid) -> Result<CgroupInfo, cgroup::Error>;

    fn mount_namespace(&self, pid: Pid) -> Result<NamespaceInfo, namespace::Error>;
}

/// [`HostInspector`] backed by procfs and the cgroup filesystem.
#[derive(Debug, Clone)]
pub struct ProcInspector {
    proc_root: PathBuf,
    cgroup_roots: CgroupRoots,
}

impl ProcInspector {
    pub fn new(proc_root: PathBuf, cgroup_roots: CgroupRoots) -> Self {
        Self {
            proc_root,
            cgroup_roots,
        }
    }
}

impl HostInspector for ProcInspector {
    fn cgroup(&self, pid: Pid) -> Result<CgroupInfo, cgroup::Error> {
        cgroup::resolve(&self.proc_root, &self.cgroup_roots, pid)
    }

    fn mount_namespace(&self, pid: Pid) -> Result<NamespaceInfo, namespace::Error> {
        namespace::resolve_mount_namespace(&self.proc_root, pid)
    }
}
