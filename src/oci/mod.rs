//! Parsing of the OCI runtime state that runtimes pass to hooks on stdin.
//!
//! See <https://github.com/opencontainers/runtime-spec/blob/main/runtime.md#state>.
//!
//! Some runc versions emit an `annotations` member that is not valid JSON. When strict decoding
//! fails, everything from the last `,"annotations":` on is dropped, the object is closed again
//! and decoding is retried once. Whether current runtimes still emit such payloads has not been
//! re-checked; the workaround stays until it has.
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

mod error;

pub use error::{Error, Result};

static ANNOTATIONS_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^(.*),"annotations":.*$"#).expect("annotations pattern is valid")
});

/// The state of a container as reported by an OCI runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct State {
    #[serde(rename = "ociVersion", default)]
    pub oci_version: String,
    pub id: String,
    #[serde(default)]
    pub status: String,
    /// Host pid of the container's init process. 0 if absent, e.g. in `poststop` hooks.
    #[serde(default)]
    pub pid: i64,
    #[serde(default)]
    pub bundle: String,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Decodes an OCI state payload, recovering from a broken trailing `annotations` member.
///
/// # Errors
///
/// - [`Error::Unparseable`] if strict decoding fails and the payload has no `"annotations":`
///   member to trim.
/// - [`Error::RecoveryFailed`] if decoding also fails after trimming.
///
/// # Examples
///
/// ```
/// # use container_scope::oci;
/// let state = oci::parse_state(br#"{"id":"abc","pid":123}"#).unwrap();
/// assert_eq!((state.id.as_str(), state.pid), ("abc", 123));
/// ```
pub fn parse_state(raw: &[u8]) -> Result<State> {
    let source = match serde_json::from_slice::<State>(raw) {
        Ok(state) => return Ok(state),
        Err(err) => err,
    };

    let payload = String::from_utf8_lossy(raw);
    let prefix = ANNOTATIONS_SUFFIX
        .captures(&payload)
        .and_then(|captures| captures.get(1))
        .map(|prefix| prefix.as_str().to_owned());
    let Some(prefix) = prefix else {
        return Err(Error::Unparseable {
            source,
            payload: payload.into_owned(),
        });
    };

    log::warn!(
        "invalid OCI state ({}), retrying without annotations",
        source
    );
    let trimmed = format!("{prefix}}}");
    serde_json::from_str::<State>(&trimmed).map_err(|retry| Error::RecoveryFailed {
        source,
        retry,
        payload: payload.into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_minimal_state() {
        let state = parse_state(br#"{"id":"abc","pid":123}"#).unwrap();
        assert_eq!(state.id, "abc");
        assert_eq!(state.pid, 123);
    }

    #[test]
    fn test_full_state() {
        let raw = br#"{
            "ociVersion": "1.0.2",
            "id": "oci-container1",
            "status": "running",
            "pid": 4422,
            "bundle": "/containers/redis",
            "annotations": {"myKey": "myValue"}
        }"#;
        let state = parse_state(raw).unwrap();
        assert_eq!(state.oci_version, "1.0.2");
        assert_eq!(state.id, "oci-container1");
        assert_eq!(state.status, "running");
        assert_eq!(state.pid, 4422);
        assert_eq!(state.bundle, "/containers/redis");
        assert_eq!(state.annotations["myKey"], "myValue");
    }

    #[test]
    fn test_stop_state_without_pid() {
        let state = parse_state(br#"{"ociVersion":"1.0.2","id":"abc","status":"stopped"}"#).unwrap();
        assert_eq!(state.id, "abc");
        assert_eq!(state.pid, 0);
    }

    #[test]
    fn test_recovers_from_broken_annotations() {
        let prefix = r#"{"ociVersion":"1.0.1-dev","id":"abc","status":"running","pid":123,"bundle":"/run/b""#;
        let broken = format!(r#"{prefix},"annotations":{{"io.kubernetes.cri-o.Labels":{{"a":}}"#);

        let recovered = parse_state(broken.as_bytes()).unwrap();
        let strict = parse_state(format!("{prefix}}}").as_bytes()).unwrap();
        assert_eq!(recovered, strict);
        assert_eq!((recovered.id.as_str(), recovered.pid), ("abc", 123));
        assert!(recovered.annotations.is_empty());
    }

    #[test]
    fn test_recovery_spans_lines() {
        let broken = "{\"id\":\"abc\",\n\"pid\":7,\"annotations\":{\n\"k\": nope\n}}";
        let state = parse_state(broken.as_bytes()).unwrap();
        assert_eq!((state.id.as_str(), state.pid), ("abc", 7));
    }

    #[test]
    fn test_invalid_without_annotations_is_unparseable() {
        let err = parse_state(br#"{"id":"abc","pid":}"#).unwrap_err();
        assert!(matches!(err, Error::Unparseable { .. }));
        assert_eq!(err.kind(), ErrorKind::UnparseableState);
        assert_eq!(err.payload(), r#"{"id":"abc","pid":}"#);
    }

    #[test]
    fn test_broken_prefix_fails_recovery() {
        let err = parse_state(br#"{"id":"abc","pid":,"annotations":{}}"#).unwrap_err();
        assert!(matches!(err, Error::RecoveryFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::UnparseableState);
    }

    #[test]
    fn test_missing_id_is_unparseable() {
        let err = parse_state(br#"{"pid":1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparseableState);
    }
}
