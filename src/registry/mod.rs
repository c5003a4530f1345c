//! The live set of containers, driven by OCI `prestart`/`poststop` hooks.
//!
//! Per container id an entry is either absent or active: a start hook resolves pid, cgroup and
//! mount namespace and inserts (or replaces) the entry, a stop hook removes it. Entries are
//! indexed by container id, pid, cgroup id and mount namespace id.
//!
//! The primary table and all indexes sit behind one [`RwLock`], so readers never observe an
//! index pointing at a removed or half-inserted entry. Resolution happens before the lock is
//! taken; a failed resolution leaves the registry untouched.
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

mod entry;
mod error;
mod inspector;
mod tables;

pub use entry::{ContainerEntry, Lookup};
pub use error::{Error, Result};
pub use inspector::{HostInspector, ProcInspector};

use crate::config::Config;
use crate::container::{ContainerID, Pid, Runtime, RuntimeContainerID};
use crate::identity::{self, Resolver};
use crate::oci;
use tables::Tables;

/// Container id named by a stop hook `payload`. The pid is not required.
///
/// # Errors
///
/// Fails if the payload is not a usable OCI state or its id is invalid.
pub fn stop_target(payload: &[u8]) -> Result<ContainerID> {
    let state = oci::parse_state(payload)?;
    Ok(ContainerID::new(&state.id)?)
}

#[derive(Debug)]
pub struct Registry<I = ProcInspector> {
    inspector: I,
    resolver: Resolver,
    default_runtime: Option<Runtime>,
    tables: RwLock<Tables>,
}

impl Registry<ProcInspector> {
    pub fn new(config: &Config) -> Self {
        Self::with_inspector(
            ProcInspector::new(config.proc_root.clone(), config.cgroup_roots.clone()),
            Resolver::new(&config.runtime),
            config.default_runtime,
        )
    }
}

impl<I: HostInspector> Registry<I> {
    pub fn with_inspector(inspector: I, resolver: Resolver, default_runtime: Option<Runtime>) -> Self {
        Self {
            inspector,
            resolver,
            default_runtime,
            tables: RwLock::default(),
        }
    }

    /// Handles a container start hook with the OCI state `payload`.
    ///
    /// The pid is taken from the payload if positive, otherwise resolved from the runtime. On
    /// success the new entry replaces any entry with the same id.
    ///
    /// # Errors
    ///
    /// Fails without touching the registry if the payload cannot be parsed or any of pid,
    /// cgroup and mount namespace cannot be resolved.
    pub async fn on_start(&self, payload: &[u8]) -> Result<Arc<ContainerEntry>> {
        let state = oci::parse_state(payload)?;
        let id = ContainerID::new(&state.id)?;

        let pid = match Pid::new(state.pid) {
            Ok(pid) => pid,
            Err(_) => self.resolve_pid(&id).await?,
        };
        log::debug!("starting container `{}` with pid {}", id, pid);

        let cgroup = self.inspector.cgroup(pid).map_err(|source| Error::Cgroup {
            id: id.clone(),
            pid,
            source,
        })?;
        let namespace = self
            .inspector
            .mount_namespace(pid)
            .map_err(|source| Error::Namespace {
                id: id.clone(),
                pid,
                source,
            })?;

        let entry = Arc::new(ContainerEntry {
            id,
            pid,
            cgroup,
            namespace,
            created_at: SystemTime::now(),
        });

        let previous = self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Arc::clone(&entry));
        match previous {
            Some(previous) => log::info!(
                "replaced container `{}` (pid {} -> {})",
                entry.id,
                previous.pid,
                entry.pid
            ),
            None => log::info!(
                "added container `{}` (pid {}, cgroup id {}, mount ns {})",
                entry.id,
                entry.pid,
                entry.cgroup.cgroup_id,
                entry.namespace.mount_ns_id
            ),
        }

        Ok(entry)
    }

    /// Handles a container stop hook with the OCI state `payload`.
    ///
    /// Only the container id of the payload is used. Returns the removed entry; stopping an
    /// unknown container is a no-op and returns `None`.
    pub fn on_stop(&self, payload: &[u8]) -> Result<Option<Arc<ContainerEntry>>> {
        let id = stop_target(payload)?;

        let removed = self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id.as_str());
        match &removed {
            Some(entry) => log::info!("removed container `{}` (pid {})", entry.id, entry.pid),
            None => log::debug!("stop for untracked container `{}`", id),
        }

        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no live entry matches `key`.
    pub fn lookup(&self, key: &Lookup) -> Result<Arc<ContainerEntry>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let entry = match key {
            Lookup::ContainerID(id) => tables.containers.get(id).cloned(),
            Lookup::Pid(pid) => tables.resolve(&tables.by_pid, pid),
            Lookup::CgroupID(cgroup_id) => tables.resolve(&tables.by_cgroup_id, cgroup_id),
            Lookup::MountNsID(ns_id) => tables.resolve(&tables.by_mount_ns_id, ns_id),
        };

        entry.ok_or_else(|| Error::NotFound(key.clone()))
    }

    pub fn by_container_id(&self, id: &ContainerID) -> Option<Arc<ContainerEntry>> {
        self.lookup(&Lookup::ContainerID(id.clone())).ok()
    }

    pub fn by_pid(&self, pid: Pid) -> Option<Arc<ContainerEntry>> {
        self.lookup(&Lookup::Pid(pid)).ok()
    }

    pub fn by_cgroup_id(&self, cgroup_id: u64) -> Option<Arc<ContainerEntry>> {
        self.lookup(&Lookup::CgroupID(cgroup_id)).ok()
    }

    pub fn by_mount_ns_id(&self, mount_ns_id: u64) -> Option<Arc<ContainerEntry>> {
        self.lookup(&Lookup::MountNsID(mount_ns_id)).ok()
    }

    /// Snapshot of all live entries, ordered by container id.
    pub fn entries(&self) -> Vec<Arc<ContainerEntry>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = tables.containers.values().cloned().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .containers
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hook ids are usually runtime-native; a prefixed id is used as is, a bare one is qualified
    /// with the configured default runtime.
    async fn resolve_pid(&self, id: &ContainerID) -> Result<Pid> {
        let runtime_id = match (RuntimeContainerID::from_str(id.as_str()), self.default_runtime) {
            (Ok(runtime_id), _) => Ok(runtime_id),
            (Err(_), Some(runtime)) => Ok(RuntimeContainerID::new(runtime, id.clone())),
            (Err(err), None) => Err(identity::Error::ContainerID(err)),
        };

        let pid = match runtime_id {
            Ok(runtime_id) => self.resolver.resolve(&runtime_id).await,
            Err(err) => Err(err),
        };
        pid.map_err(|source| Error::Pid {
            id: id.clone(),
            source,
        })
    }
}
