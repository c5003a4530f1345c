use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use crate::container::{ContainerID, Pid};

use super::ContainerEntry;

/// Primary id-keyed table plus its secondary indexes.
///
/// Every index value names a container present in `containers`.
#[derive(Debug, Default)]
pub(super) struct Tables {
    pub(super) containers: HashMap<ContainerID, Arc<ContainerEntry>>,
    pub(super) by_pid: HashMap<Pid, ContainerID>,
    pub(super) by_cgroup_id: HashMap<u64, ContainerID>,
    pub(super) by_mount_ns_id: HashMap<u64, ContainerID>,
}

impl Tables {
    /// Inserts `entry`, replacing and returning any entry with the same id.
    pub(super) fn insert(&mut self, entry: Arc<ContainerEntry>) -> Option<Arc<ContainerEntry>> {
        let previous = self.remove(entry.id.as_str());

        index(&mut self.by_pid, entry.pid, &entry.id, "pid");
        // 0 means "no v2 cgroup".
        if entry.cgroup.cgroup_id != 0 {
            index(
                &mut self.by_cgroup_id,
                entry.cgroup.cgroup_id,
                &entry.id,
                "cgroup id",
            );
        }
        index(
            &mut self.by_mount_ns_id,
            entry.namespace.mount_ns_id,
            &entry.id,
            "mount namespace id",
        );
        self.containers.insert(entry.id.clone(), entry);

        previous
    }

    /// Removes the entry with `id` and every index key still pointing at it.
    pub(super) fn remove(&mut self, id: &str) -> Option<Arc<ContainerEntry>> {
        let entry = self.containers.remove(id)?;

        unindex(&mut self.by_pid, &entry.pid, &entry.id);
        unindex(&mut self.by_cgroup_id, &entry.cgroup.cgroup_id, &entry.id);
        unindex(
            &mut self.by_mount_ns_id,
            &entry.namespace.mount_ns_id,
            &entry.id,
        );

        Some(entry)
    }

    pub(super) fn resolve<K: Hash + Eq>(
        &self,
        index: &HashMap<K, ContainerID>,
        key: &K,
    ) -> Option<Arc<ContainerEntry>> {
        index
            .get(key)
            .and_then(|id| self.containers.get(id))
            .cloned()
    }
}

fn index<K>(index: &mut HashMap<K, ContainerID>, key: K, id: &ContainerID, name: &str)
where
    K: Hash + Eq + Copy + Display,
{
    if let Some(previous) = index.insert(key, id.clone()) {
        if previous != *id {
            // Happens on pid reuse when a stop hook was lost.
            log::warn!("{name} {key} moved from container `{previous}` to `{id}`");
        }
    }
}

fn unindex<K: Hash + Eq>(index: &mut HashMap<K, ContainerID>, key: &K, id: &ContainerID) {
    if index.get(key) == Some(id) {
        index.remove(key);
    }
}
