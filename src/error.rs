use std::fmt;

/// Failure classes shared by every resolver in this crate.
///
/// Each module keeps its own detailed error type; `kind()` on those errors maps them onto
/// this closed set so hook callers can branch on the class without matching on every
/// module's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The container id carries no recognised `<runtime>://` prefix.
    UnknownRuntime,
    /// The runtime socket or CLI could not be reached, or did not answer in time.
    RuntimeUnavailable,
    /// The runtime answered, but the expected fields were absent or unparseable.
    MalformedResponse,
    /// A pid of zero or less was resolved.
    InvalidPid,
    /// The OCI state payload could not be decoded, even after recovery.
    UnparseableState,
    /// A process, proc file, or registry entry does not exist.
    NotFound,
    /// The process' cgroup file names neither a v1 nor a v2 cgroup.
    NoCgroup,
    /// No cgroup mount root contains the requested cgroup path.
    NotAccessible,
    /// The cgroup id file-handle lookup failed.
    LookupFailed,
    /// The host does not expose the metadata needed for a lookup.
    UnsupportedPlatform,
    /// The container id is empty or too long.
    InvalidContainerID,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnknownRuntime => "unknown runtime",
            ErrorKind::RuntimeUnavailable => "runtime unavailable",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::InvalidPid => "invalid pid",
            ErrorKind::UnparseableState => "unparseable state",
            ErrorKind::NotFound => "not found",
            ErrorKind::NoCgroup => "no cgroup",
            ErrorKind::NotAccessible => "not accessible",
            ErrorKind::LookupFailed => "lookup failed",
            ErrorKind::UnsupportedPlatform => "unsupported platform",
            ErrorKind::InvalidContainerID => "invalid container id",
        };
        f.write_str(name)
    }
}

pub trait ResultOkLogExt<T, E> {
    /// Converts the result into an `Option`, logging the error (if any) at error level.
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                let mut msg = err.to_string();
                let mut source = err.source();
                while let Some(cause) = source {
                    msg.push_str(": ");
                    msg.push_str(&cause.to_string());
                    source = cause.source();
                }
                log::error!("{msg}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_ok_log_passes_through_ok() {
        let res: Result<u32, Outer> = Ok(7);
        assert_eq!(res.ok_log(), Some(7));
    }

    #[test]
    fn test_ok_log_swallows_err() {
        let res: Result<u32, Outer> = Err(Outer(std::io::Error::other("inner")));
        assert_eq!(res.ok_log(), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::UnknownRuntime.to_string(), "unknown runtime");
        assert_eq!(ErrorKind::LookupFailed.to_string(), "lookup failed");
    }
}
