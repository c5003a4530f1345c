use std::path::Path;

use super::{Error, Result};

/// Size of the kernfs file handle, which is the 64-bit cgroup id.
const CGROUP_HANDLE_BYTES: u32 = 8;

/// `struct file_handle` with room for exactly one 8 byte handle.
#[cfg(target_os = "linux")]
#[repr(C)]
struct CgroupFileHandle {
    handle_bytes: libc::c_uint,
    handle_type: libc::c_int,
    cgroup_id: u64,
}

/// Returns the kernel id of the cgroup v2 directory at `path`.
///
/// The id is what `bpf_get_current_cgroup_id()` reports for tasks in that cgroup.
///
/// # Errors
///
/// - [`Error::HandleLookup`] if `name_to_handle_at(2)` fails, e.g. because `path` does not exist
///   or is not on a filesystem with 8 byte handles.
/// - [`Error::UnexpectedHandleSize`] if the kernel reports a handle size other than 8 bytes.
/// - [`Error::ZeroCgroupID`] if the handle encodes id 0.
#[cfg(target_os = "linux")]
pub fn resolve_cgroup_id(path: &Path) -> Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::InvalidPath {
        path: path.to_path_buf(),
    })?;
    let mut handle = CgroupFileHandle {
        handle_bytes: CGROUP_HANDLE_BYTES,
        handle_type: 0,
        cgroup_id: 0,
    };
    let mut mount_id: libc::c_int = 0;

    // SAFETY: `c_path` is NUL-terminated and outlives the call. `handle` is a `file_handle`
    // header followed by `handle_bytes` bytes of storage, and `mount_id` is a valid `int`.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_name_to_handle_at,
            libc::AT_FDCWD,
            c_path.as_ptr(),
            &mut handle as *mut CgroupFileHandle,
            &mut mount_id as *mut libc::c_int,
            0 as libc::c_int,
        )
    };
    if ret != 0 {
        return Err(Error::HandleLookup {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    if handle.handle_bytes != CGROUP_HANDLE_BYTES {
        return Err(Error::UnexpectedHandleSize {
            path: path.to_path_buf(),
            size: handle.handle_bytes,
        });
    }

    if handle.cgroup_id == 0 {
        return Err(Error::ZeroCgroupID {
            path: path.to_path_buf(),
        });
    }

    log::trace!(
        "cgroup `{}` has id {} (handle type {}, mount id {})",
        path.display(),
        handle.cgroup_id,
        handle.handle_type,
        mount_id
    );
    Ok(handle.cgroup_id)
}

#[cfg(not(target_os = "linux"))]
pub fn resolve_cgroup_id(_path: &Path) -> Result<u64> {
    Err(Error::UnsupportedPlatform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_cgroup_id(&tmp.path().join("does-not-exist")).unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::ErrorKind::LookupFailed | crate::error::ErrorKind::UnsupportedPlatform
        ));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_nul_byte_in_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/sys/fs/cgroup/a\0b"));
        let err = resolve_cgroup_id(path).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_cgroup2_root_id_is_its_inode() {
        use std::os::unix::fs::MetadataExt;

        let Some(mount) = crate::cgroup::find_cgroup2_mount() else {
            return;
        };
        let id = resolve_cgroup_id(&mount).unwrap();
        assert_ne!(id, 0);
        // kernfs hands out the node id as inode number.
        assert_eq!(id, std::fs::metadata(&mount).unwrap().ino());
    }
}
