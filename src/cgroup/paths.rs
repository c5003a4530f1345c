use std::io::BufRead;
use std::path::Path;

use crate::container::Pid;
use crate::procfs;

use super::{Error, Result};

/// Controller list of the named systemd hierarchy on cgroup v1 hosts.
const SYSTEMD_V1_CONTROLLERS: &str = "name=systemd";

/// Cgroup paths of a process relative to the cgroup mount root.
///
/// A root cgroup is stored as an empty string, never `/`. At least one of both paths is
/// non-empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CgroupPaths {
    pub v1: String,
    pub v2: String,
}

/// Reads `<proc_root>/<pid>/cgroup` and extracts the v1 systemd and the v2 unified cgroup path.
///
/// # Errors
///
/// - [`Error::ProcFile`] / [`Error::ReadLine`] if the file cannot be opened or read.
/// - [`Error::NoCgroup`] if neither a v1 systemd nor a v2 line names a non-root cgroup.
pub fn resolve_cgroup_paths(proc_root: &Path, pid: Pid) -> Result<CgroupPaths> {
    let reader = procfs::open_pid_file(proc_root, pid, "cgroup")?;
    parse_cgroup_paths_from_reader(reader, &procfs::pid_path(proc_root, pid, "cgroup"))
}

fn parse_cgroup_paths_from_reader<R: BufRead>(mut reader: R, origin: &Path) -> Result<CgroupPaths> {
    let mut paths = CgroupPaths::default();
    let mut line = String::with_capacity(256);

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        match parse_cgroup_line(&line) {
            Some(cgl) if cgl.hierarchy_id == "0" && cgl.controllers.is_empty() => {
                paths.v2 = normalize(cgl.cgroup_path);
            }
            Some(cgl) if cgl.controllers == SYSTEMD_V1_CONTROLLERS => {
                paths.v1 = normalize(cgl.cgroup_path);
            }
            Some(_) => {}
            None => log::debug!("skipping malformed line in `{}`: {:?}", origin.display(), line),
        }
        line.clear();
    }

    if paths.v1.is_empty() && paths.v2.is_empty() {
        return Err(Error::NoCgroup {
            path: origin.to_path_buf(),
        });
    }

    Ok(paths)
}

/// One `<hierarchy-id>:<controller-list>:<cgroup-path>` line of `/proc/<pid>/cgroup`.
struct CgroupLine<'a> {
    hierarchy_id: &'a str,
    controllers: &'a str,
    cgroup_path: &'a str,
}

fn parse_cgroup_line(line: &str) -> Option<CgroupLine<'_>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    // The path itself may contain `:`, so only the first two separators count.
    let mut it = line.splitn(3, ':');
    Some(CgroupLine {
        hierarchy_id: it.next()?,
        controllers: it.next()?,
        cgroup_path: it.next()?,
    })
}

fn normalize(path: &str) -> String {
    if path == "/" {
        String::new()
    } else {
        path.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(contents: &str) -> Result<CgroupPaths> {
        parse_cgroup_paths_from_reader(Cursor::new(contents.as_bytes()), Path::new("/dummy"))
    }

    #[test]
    fn test_unified_only() {
        let paths = parse("0::/kubepods.slice/cri-containerd-abc.scope\n").unwrap();
        assert_eq!(paths.v1, "");
        assert_eq!(paths.v2, "/kubepods.slice/cri-containerd-abc.scope");
    }

    #[test]
    fn test_hybrid_hierarchy() {
        let input = "\
12:memory:/docker/abc
11:cpu,cpuacct:/docker/abc
1:name=systemd:/docker/abc
0::/docker/abc
";
        let paths = parse(input).unwrap();
        assert_eq!(paths.v1, "/docker/abc");
        assert_eq!(paths.v2, "/docker/abc");
    }

    #[test]
    fn test_systemd_hierarchy_with_other_id() {
        let paths = parse("13:name=systemd:/system.slice/crio-abc.scope\n").unwrap();
        assert_eq!(paths.v1, "/system.slice/crio-abc.scope");
        assert_eq!(paths.v2, "");
    }

    #[test]
    fn test_root_is_normalized_to_empty() {
        let paths = parse("1:name=systemd:/\n0::/docker/abc\n").unwrap();
        assert_eq!(paths.v1, "");
        assert_eq!(paths.v2, "/docker/abc");

        let paths = parse("1:name=systemd:/docker/abc\n0::/\n").unwrap();
        assert_eq!(paths.v1, "/docker/abc");
        assert_eq!(paths.v2, "");
    }

    #[test]
    fn test_last_line_without_newline() {
        let paths = parse("0::/user.slice").unwrap();
        assert_eq!(paths.v2, "/user.slice");
    }

    #[test]
    fn test_no_marker_is_no_cgroup() {
        let err = parse("4:memory:/docker/abc\n3:cpu:/docker/abc\n").unwrap_err();
        assert!(matches!(err, Error::NoCgroup { .. }));
    }

    #[test]
    fn test_only_root_cgroups_is_no_cgroup() {
        let err = parse("1:name=systemd:/\n0::/\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NoCgroup);
    }

    #[test]
    fn test_path_with_colon() {
        let paths = parse("0::/system.slice/a:b.scope\n").unwrap();
        assert_eq!(paths.v2, "/system.slice/a:b.scope");
    }

    #[test]
    fn test_resolve_from_fake_proc() {
        let proc_root = tempfile::tempdir().unwrap();
        std::fs::create_dir(proc_root.path().join("1234")).unwrap();
        std::fs::write(proc_root.path().join("1234/cgroup"), "0::/docker/abc\n").unwrap();

        let paths = resolve_cgroup_paths(proc_root.path(), Pid::new(1234).unwrap()).unwrap();
        assert_eq!(paths.v2, "/docker/abc");
    }

    #[test]
    fn test_resolve_missing_pid_is_not_found() {
        let proc_root = tempfile::tempdir().unwrap();
        let err = resolve_cgroup_paths(proc_root.path(), Pid::new(1234).unwrap()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }
}
