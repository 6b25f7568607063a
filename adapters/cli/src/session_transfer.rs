#![allow(clippy::missing_errors_doc)]

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use geocache_core::{KeyValueStore, StoreError, StoreWrite, CACHES_KEY, COINS_KEY, POLYLINE_KEY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "geocache";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "geocache:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Raw session records captured for clipboard transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionSnapshot {
    /// Serialized cache snapshot list, if one was saved.
    pub(crate) caches: Option<String>,
    /// Serialized collected coin list, if one was saved.
    pub(crate) coins: Option<String>,
    /// Serialized trail, if one was saved.
    pub(crate) polyline: Option<String>,
}

impl SessionSnapshot {
    /// Captures the session records currently held by `store`.
    pub(crate) fn capture(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        Ok(Self {
            caches: store.get(CACHES_KEY)?,
            coins: store.get(COINS_KEY)?,
            polyline: store.get(POLYLINE_KEY)?,
        })
    }

    /// Replaces the session records held by `store` with this snapshot.
    pub(crate) fn install(self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let batch = [
            (CACHES_KEY, self.caches),
            (COINS_KEY, self.coins),
            (POLYLINE_KEY, self.polyline),
        ]
        .into_iter()
        .map(|(key, value)| match value {
            Some(value) => StoreWrite::Set {
                key: key.to_owned(),
                value,
            },
            None => StoreWrite::Remove {
                key: key.to_owned(),
            },
        })
        .collect();
        store.write(batch)
    }

    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("session snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}{FIELD_DELIMITER}{encoded}")
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SessionTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SessionTransferError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let domain = parts.next().ok_or(SessionTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(SessionTransferError::MissingVersion)?;
        let payload = parts.next().ok_or(SessionTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(SessionTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SessionTransferError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Errors that can occur while decoding session transfer strings.
#[derive(Debug, Error)]
pub(crate) enum SessionTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("session payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("session string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("session string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include the payload segment.
    #[error("session string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("session prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("session version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode session payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse session payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocache_storage::MemoryStore;

    #[test]
    fn encoded_snapshot_carries_header_and_decodes() {
        let snapshot = SessionSnapshot {
            caches: Some(r#"[{"key":"0.1","value":"{\"i\":0,\"j\":1,\"numCoins\":2}"}]"#.to_owned()),
            coins: Some(r#"[{"i":0,"j":1,"serial":2}]"#.to_owned()),
            polyline: None,
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:")));
        assert!(!encoded.contains('\n'));

        let decoded = SessionSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        assert!(matches!(
            SessionSnapshot::decode("treasure:v1:abc"),
            Err(SessionTransferError::InvalidPrefix(prefix)) if prefix == "treasure"
        ));
        assert!(matches!(
            SessionSnapshot::decode("geocache:v9:abc"),
            Err(SessionTransferError::UnsupportedVersion(version)) if version == "v9"
        ));
        assert!(matches!(
            SessionSnapshot::decode("geocache:v1"),
            Err(SessionTransferError::MissingPayload)
        ));
        assert!(matches!(
            SessionSnapshot::decode("   "),
            Err(SessionTransferError::EmptyPayload)
        ));
        assert!(matches!(
            SessionSnapshot::decode("geocache:v1:!!!"),
            Err(SessionTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn install_replaces_and_removes_records() {
        let mut store = MemoryStore::new();
        store
            .write(vec![StoreWrite::Set {
                key: POLYLINE_KEY.to_owned(),
                value: "[]".to_owned(),
            }])
            .expect("seed");

        SessionSnapshot {
            caches: None,
            coins: Some("[]".to_owned()),
            polyline: None,
        }
        .install(&mut store)
        .expect("install");

        assert_eq!(
            SessionSnapshot::capture(&store).expect("capture"),
            SessionSnapshot {
                caches: None,
                coins: Some("[]".to_owned()),
                polyline: None,
            }
        );
    }
}
