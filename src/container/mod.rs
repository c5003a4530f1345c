use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Separator between the runtime tag and the runtime-specific id, e.g. `containerd://<id>`.
const RUNTIME_SEPARATOR: &str = "://";

/// A validated, opaque container identifier.
///
/// This is the id a runtime hands to OCI hooks (runtime-native, without prefix) and the key of
/// the container registry. A prefixed id of the form `<runtime>://<id>` is represented by
/// [`RuntimeContainerID`] instead.
///
/// # Examples
///
/// ```
/// # use container_scope::container::ContainerID;
/// let id = ContainerID::new("3726184226f5d3147c25fdeab5b60097e378e8a720503a5e19ecfdf29f869860").unwrap();
/// assert_eq!(id.as_str(), "3726184226f5d3147c25fdeab5b60097e378e8a720503a5e19ecfdf29f869860");
/// assert!(ContainerID::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the id is empty or its length exceeds
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContainerID {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for ContainerID {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Process id of a container's init process in the host pid namespace.
///
/// Always positive; zero and negative values are rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct Pid(u32);

impl Pid {
    /// # Errors
    ///
    /// Returns [`Error::InvalidPid`] if `raw` is not in `1..=u32::MAX`.
    pub fn new(raw: i64) -> Result<Self> {
        match u32::try_from(raw) {
            Ok(pid) if pid > 0 => Ok(Self(pid)),
            _ => Err(Error::InvalidPid(raw)),
        }
    }

    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container runtimes whose ids can be resolved to a pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    Docker,
    CriO,
    Containerd,
}

impl Runtime {
    pub const ALL: [Runtime; 3] = [Runtime::Docker, Runtime::CriO, Runtime::Containerd];

    /// The tag used in front of `://` in orchestrator container ids.
    pub fn prefix(&self) -> &'static str {
        match self {
            Runtime::Docker => "docker",
            Runtime::CriO => "cri-o",
            Runtime::Containerd => "containerd",
        }
    }
}

impl FromStr for Runtime {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Runtime::ALL
            .into_iter()
            .find(|runtime| runtime.prefix() == s)
            .ok_or_else(|| Error::UnknownRuntime(s.to_owned()))
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A container id qualified with the runtime that manages it, e.g. `cri-o://<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeContainerID {
    runtime: Runtime,
    id: ContainerID,
}

impl RuntimeContainerID {
    pub fn new(runtime: Runtime, id: ContainerID) -> Self {
        Self { runtime, id }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    /// The runtime-specific id, without prefix.
    pub fn id(&self) -> &ContainerID {
        &self.id
    }
}

impl FromStr for RuntimeContainerID {
    type Err = Error;

    /// Parses `<runtime>://<id>`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownRuntime`] if the prefix is missing or names no supported runtime.
    /// - [`Error::InvalidContainerID`] if the suffix is not a valid [`ContainerID`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (prefix, id) = s
            .split_once(RUNTIME_SEPARATOR)
            .ok_or_else(|| Error::UnknownRuntime(s.to_owned()))?;
        let runtime = Runtime::from_str(prefix).map_err(|_| Error::UnknownRuntime(s.to_owned()))?;

        Ok(Self {
            runtime,
            id: ContainerID::new(id)?,
        })
    }
}

impl fmt::Display for RuntimeContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.runtime, RUNTIME_SEPARATOR, self.id)
    }
}
