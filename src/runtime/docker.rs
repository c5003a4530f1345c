use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::container::{ContainerID, Pid, Runtime};

use super::{Error, Result};

/// Resolves Docker containers through `docker inspect`, run inside the host root.
#[derive(Debug, Clone)]
pub struct DockerClient {
    binary: PathBuf,
    host_root: PathBuf,
    timeout: Duration,
}

impl DockerClient {
    pub fn new(binary: PathBuf, host_root: PathBuf, timeout: Duration) -> Self {
        Self {
            binary,
            host_root,
            timeout,
        }
    }

    fn inspect_command(&self, id: &ContainerID) -> Command {
        let mut cmd = if self.host_root == Path::new("/") {
            Command::new(&self.binary)
        } else {
            let mut cmd = Command::new("chroot");
            cmd.arg(&self.host_root).arg(&self.binary);
            cmd
        };
        cmd.arg("inspect")
            .arg(id.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    pub async fn fetch_pid(&self, id: &ContainerID) -> Result<Pid> {
        let mut cmd = self.inspect_command(id);
        let command = format!("{:?}", cmd.as_std());
        log::debug!("running {command}");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::CommandTimeout {
                command: command.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        pid_from_inspect_output(&output.stdout)
    }
}

#[derive(Debug, serde::Deserialize)]
struct DockerInspect {
    #[serde(rename = "State")]
    state: DockerState,
}

#[derive(Debug, serde::Deserialize)]
struct DockerState {
    #[serde(rename = "Pid")]
    pid: Option<i64>,
}

/// Extracts `[0].State.Pid` from `docker inspect` output.
pub fn pid_from_inspect_output(stdout: &[u8]) -> Result<Pid> {
    let runtime = Runtime::Docker;
    let inspect: Vec<DockerInspect> =
        serde_json::from_slice(stdout).map_err(|source| Error::Decode {
            runtime,
            field: "inspect",
            source,
        })?;
    let [container] = inspect.as_slice() else {
        return Err(Error::InspectCount(inspect.len()));
    };
    let pid = container.state.pid.ok_or(Error::MissingField {
        runtime,
        field: "State.Pid",
    })?;

    Pid::new(pid).map_err(|_| Error::InvalidPid { runtime, pid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::os::unix::fs::PermissionsExt;

    /// Writes an executable shell script standing in for the docker CLI.
    fn fake_docker(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("docker");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_inspect_output() {
        let out = br#"[{"Id":"abc","State":{"Status":"running","Running":true,"Pid":1357}}]"#;
        assert_eq!(pid_from_inspect_output(out).unwrap().as_raw(), 1357);
    }

    #[test]
    fn test_inspect_output_errors() {
        let err = pid_from_inspect_output(b"[]").unwrap_err();
        assert!(matches!(err, Error::InspectCount(0)));

        let two = br#"[{"State":{"Pid":1}},{"State":{"Pid":2}}]"#;
        assert!(matches!(
            pid_from_inspect_output(two).unwrap_err(),
            Error::InspectCount(2)
        ));

        let err = pid_from_inspect_output(b"Error: No such object").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        let err = pid_from_inspect_output(br#"[{"State":{}}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        // Stopped containers report pid 0.
        let err = pid_from_inspect_output(br#"[{"State":{"Pid":0}}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPid);
    }

    #[test]
    fn test_inspect_command_chroots_into_host_root() {
        let client = DockerClient::new(
            PathBuf::from("docker"),
            PathBuf::from("/host"),
            Duration::from_secs(1),
        );
        let cmd = client.inspect_command(&ContainerID::new("abc").unwrap());
        let cmd = cmd.as_std();
        assert_eq!(cmd.get_program(), "chroot");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["/host", "docker", "inspect", "abc"]);
    }

    #[test]
    fn test_inspect_command_without_host_root() {
        let client = DockerClient::new(
            PathBuf::from("docker"),
            PathBuf::from("/"),
            Duration::from_secs(1),
        );
        let cmd = client.inspect_command(&ContainerID::new("abc").unwrap());
        let cmd = cmd.as_std();
        assert_eq!(cmd.get_program(), "docker");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["inspect", "abc"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_runtime_unavailable() {
        let client = DockerClient::new(
            PathBuf::from("/definitely/not/a/docker/binary"),
            PathBuf::from("/"),
            Duration::from_secs(2),
        );
        let err = client
            .fetch_pid(&ContainerID::new("abc").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    }

    #[tokio::test]
    async fn test_fetch_pid_from_cli() {
        let tmp = tempfile::tempdir().unwrap();
        let binary = fake_docker(
            tmp.path(),
            r#"[ "$1" = inspect ] && [ "$2" = abc ] || exit 1
echo '[{"Id":"abc","State":{"Status":"running","Pid":4242}}]'"#,
        );
        let client = DockerClient::new(binary, PathBuf::from("/"), Duration::from_secs(5));

        let pid = client
            .fetch_pid(&ContainerID::new("abc").unwrap())
            .await
            .unwrap();
        assert_eq!(pid.as_raw(), 4242);
    }

    #[tokio::test]
    async fn test_failing_cli_is_runtime_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let binary = fake_docker(tmp.path(), "echo 'Error: No such object: abc' >&2\nexit 1");
        let client = DockerClient::new(binary, PathBuf::from("/"), Duration::from_secs(5));

        let err = client
            .fetch_pid(&ContainerID::new("abc").unwrap())
            .await
            .unwrap_err();
        match &err {
            Error::CommandFailed { stderr, .. } => assert_eq!(stderr, "Error: No such object: abc"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    }

    #[tokio::test]
    async fn test_hanging_cli_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let binary = fake_docker(tmp.path(), "exec sleep 30");
        let timeout = Duration::from_millis(300);
        let client = DockerClient::new(binary, PathBuf::from("/"), timeout);

        let started = std::time::Instant::now();
        let err = client
            .fetch_pid(&ContainerID::new("abc").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandTimeout { .. }));
        assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
        assert!(started.elapsed() < timeout * 5, "took {:?}", started.elapsed());
    }
}
