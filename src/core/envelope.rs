//! core::envelope
//!
//! The provenance wrapper written around every persisted payload.
//!
//! # Wire Format
//!
//! ```json
//! {"version":"0.1.0","commit":"unknown","uid":"1000","user":"alice","time":"2024-03-01T10:00:00Z","payload":{}}
//! ```
//!
//! The writer is identified by the real uid of the process; `user` is the
//! account name for that uid, falling back to the login environment when
//! the account database has no entry.
//!
//! Metadata is informational. Decoding requires only `payload`; unknown
//! top-level fields are ignored so newer writers stay readable.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::types::UtcTimestamp;

/// Build identifier baked in at compile time, if the builder provided one.
pub const BUILD_COMMIT: Option<&str> = option_env!("COFFER_BUILD_COMMIT");

/// Environment variables consulted, in order, when the account name for the
/// uid cannot be resolved.
const USER_VARS: [&str; 3] = ["USER", "LOGNAME", "USERNAME"];

/// Who wrote a document, with what build, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub version: String,
    pub commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub time: UtcTimestamp,
}

impl Provenance {
    /// Collect provenance for a write happening now.
    ///
    /// The acting user is looked up best-effort and left out when it cannot
    /// be resolved or when `record_user` is false.
    pub fn current(record_user: bool) -> Self {
        let (uid, user) = if record_user {
            current_user()
        } else {
            (None, None)
        };
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: BUILD_COMMIT.unwrap_or("unknown").to_string(),
            uid,
            user,
            time: UtcTimestamp::now(),
        }
    }
}

/// The real uid of this process and its account name.
#[cfg(unix)]
fn current_user() -> (Option<String>, Option<String>) {
    use nix::unistd::{Uid, User};

    let uid = Uid::current();
    let name = match User::from_uid(uid) {
        Ok(Some(user)) => Some(user.name),
        Ok(None) => user_from_env(),
        Err(err) => {
            tracing::debug!(%uid, error = %err, "account lookup failed");
            user_from_env()
        }
    };
    (Some(uid.to_string()), name)
}

#[cfg(not(unix))]
fn current_user() -> (Option<String>, Option<String>) {
    (None, user_from_env())
}

fn user_from_env() -> Option<String> {
    USER_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
}

/// A document as written to disk.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T> {
    #[serde(flatten)]
    pub provenance: Provenance,
    pub payload: &'a T,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn wrap(payload: &'a T, record_user: bool) -> Self {
        Self {
            provenance: Provenance::current(record_user),
            payload,
        }
    }
}

/// Decoding view that keeps only the payload.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub(crate) struct PayloadOnly<T> {
    pub payload: T,
}

/// Metadata recorded in a stored document.
///
/// Every field is optional: absent or malformed metadata reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordedProvenance {
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub commit: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub time: Option<UtcTimestamp>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_owned)))
}

fn lenient_time<'de, D>(deserializer: D) -> Result<Option<UtcTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.and_then(|s| UtcTimestamp::parse(&s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn envelope_fields_are_top_level() {
        let payload = json!({"students": ["u1"]});
        let envelope = Envelope::wrap(&payload, false);
        let value: Value = serde_json::to_value(&envelope).expect("serialize");

        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert!(value["commit"].is_string());
        assert!(value["time"].is_string());
        assert_eq!(value["payload"], payload);
        assert!(value.get("uid").is_none());
        assert!(value.get("user").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn writer_is_identified_by_real_uid() {
        let provenance = Provenance::current(true);
        let uid = nix::unistd::Uid::current();
        assert_eq!(provenance.uid, Some(uid.to_string()));

        let value: Value = serde_json::to_value(Envelope::wrap(&json!({}), true)).expect("serialize");
        assert_eq!(value["uid"], uid.to_string());
    }

    #[test]
    fn payload_decode_ignores_unknown_fields() {
        let raw = r#"{"version":"9.9","future":true,"payload":[1,2,3]}"#;
        let doc: PayloadOnly<Vec<u32>> = serde_json::from_str(raw).expect("decode");
        assert_eq!(doc.payload, vec![1, 2, 3]);
    }

    #[test]
    fn payload_is_required() {
        let raw = r#"{"version":"0.1.0","commit":"abc"}"#;
        let result: Result<PayloadOnly<Value>, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn recorded_provenance_tolerates_bad_metadata() {
        let raw = r#"{"version":7,"commit":"abc","uid":0,"time":"not a time","payload":null}"#;
        let meta: RecordedProvenance = serde_json::from_str(raw).expect("decode");
        assert_eq!(meta.version, None);
        assert_eq!(meta.uid, None);
        assert_eq!(meta.commit.as_deref(), Some("abc"));
        assert_eq!(meta.user, None);
        assert_eq!(meta.time, None);
    }

    #[test]
    fn recorded_provenance_reads_written_metadata() {
        let payload = json!(null);
        let envelope = Envelope::wrap(&payload, false);
        let raw = serde_json::to_string(&envelope).expect("serialize");

        let meta: RecordedProvenance = serde_json::from_str(&raw).expect("decode");
        assert_eq!(meta.version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(meta.time, Some(envelope.provenance.time));
    }
}
