use std::path::{Path, PathBuf};

use super::{Error, Result};

pub const DEFAULT_UNIFIED_ROOT: &str = "/sys/fs/cgroup/unified";
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Mount roots under which cgroup paths from `/proc/<pid>/cgroup` are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgroupRoots {
    /// The cgroup v2 mount of hybrid hosts. Tried first.
    pub unified: PathBuf,
    /// The cgroup mount of unified-only hosts.
    pub default: PathBuf,
}

impl Default for CgroupRoots {
    fn default() -> Self {
        Self {
            unified: PathBuf::from(DEFAULT_UNIFIED_ROOT),
            default: PathBuf::from(DEFAULT_CGROUP_ROOT),
        }
    }
}

impl CgroupRoots {
    /// Prefixes a cgroup path with the first mount root under which it exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAccessible`] if the path exists under neither root.
    pub fn qualify(&self, path: &str) -> Result<PathBuf> {
        // A `/`-prefixed path would replace the root in `Path::join`.
        let relative = path.trim_start_matches('/');
        for root in [&self.unified, &self.default] {
            let candidate = join_root(root, relative);
            // Only a definite "does not exist" falls through; a permission error still means
            // the cgroup is there.
            if candidate.try_exists().unwrap_or(true) {
                log::trace!("qualified cgroup `{}` as `{}`", path, candidate.display());
                return Ok(candidate);
            }
        }

        Err(Error::NotAccessible {
            path: path.to_owned(),
            roots: vec![self.unified.clone(), self.default.clone()],
        })
    }
}

fn join_root(root: &Path, relative: &str) -> PathBuf {
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}
