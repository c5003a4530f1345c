use crate::error::ErrorKind;

/// The OCI state payload could not be decoded.
///
/// Both variants carry the original decode error and the raw payload for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot parse OCI state: {source}\n{payload}")]
    Unparseable {
        #[source]
        source: serde_json::Error,
        payload: String,
    },
    #[error("cannot parse OCI state: {source} (retry without annotations: {retry})\n{payload}")]
    RecoveryFailed {
        #[source]
        source: serde_json::Error,
        retry: serde_json::Error,
        payload: String,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::UnparseableState
    }

    pub fn payload(&self) -> &str {
        match self {
            Error::Unparseable { payload, .. } | Error::RecoveryFailed { payload, .. } => payload,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
