use std::fmt;
use std::time::SystemTime;

use crate::cgroup::CgroupInfo;
use crate::container::{ContainerID, Pid};
use crate::namespace::NamespaceInfo;

/// A live container as tracked by the [`super::Registry`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerEntry {
    pub id: ContainerID,
    pub pid: Pid,
    pub cgroup: CgroupInfo,
    pub namespace: NamespaceInfo,
    pub created_at: SystemTime,
}

/// Keys under which registry entries can be looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    ContainerID(ContainerID),
    Pid(Pid),
    CgroupID(u64),
    MountNsID(u64),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::ContainerID(id) => write!(f, "container id `{id}`"),
            Lookup::Pid(pid) => write!(f, "pid {pid}"),
            Lookup::CgroupID(id) => write!(f, "cgroup id {id}"),
            Lookup::MountNsID(id) => write!(f, "mount namespace id {id}"),
        }
    }
}
