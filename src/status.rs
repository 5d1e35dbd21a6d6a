//! Server status model.
//!
//! The remote pushes the full server status as a `status` frame. The
//! connection hands the decoded object to a [`StatusModel`] and forwards the
//! returned [`ServerStatus`] snapshot to `status` observers. Snapshots are
//! immutable; a model keeps whatever history it needs on its own side.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// ServerStatus
// ============================================================================

/// Immutable snapshot of the remote server's state.
///
/// Known keys are typed; everything else lands in [`extra`](Self::extra).
/// A known key whose value has an unexpected shape (`"players": -1`, a port
/// sent as a string) reads as `None` instead of rejecting the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Server id.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// Display name.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Public address.
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
    /// Message of the day.
    #[serde(default, deserialize_with = "lenient")]
    pub motd: Option<String>,
    /// Numeric status code.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<i64>,
    /// Status class, e.g. `online`, `offline`, `loading`.
    #[serde(default, deserialize_with = "lenient")]
    pub class: Option<String>,
    /// Human readable status label.
    #[serde(default, deserialize_with = "lenient")]
    pub label: Option<String>,
    /// Host name.
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,
    /// Port.
    #[serde(default, deserialize_with = "lenient")]
    pub port: Option<u16>,
    /// Server software name.
    #[serde(default, deserialize_with = "lenient")]
    pub software: Option<String>,
    /// Software version.
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<String>,
    /// Players online.
    #[serde(default, deserialize_with = "lenient")]
    pub players: Option<u32>,
    /// Player slots.
    #[serde(default, rename = "slots", deserialize_with = "lenient")]
    pub max_players: Option<u32>,
    /// Allocated RAM in MB.
    #[serde(default, deserialize_with = "lenient")]
    pub ram: Option<u64>,
    /// Maximum RAM in MB.
    #[serde(default, rename = "maxram", deserialize_with = "lenient")]
    pub max_ram: Option<u64>,
    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerStatus {
    /// Builds a snapshot from a decoded status object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] if `raw` is not an object.
    pub fn from_value(raw: &Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(Error::status(format!("expected object, got {raw}")));
        }
        serde_json::from_value(raw.clone()).map_err(|e| Error::status(e.to_string()))
    }

    /// Returns `true` when the status class is `online`.
    #[inline]
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.class.as_deref() == Some("online")
    }
}

/// Reads a typed key, mapping a mistyped value to `None`.
fn lenient<'de, D, T>(deserializer: D) -> StdResult<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| T::deserialize(v).ok()))
}

// ============================================================================
// StatusModel
// ============================================================================

/// External record of remote resource state.
///
/// The connection calls [`apply_status_update`](Self::apply_status_update)
/// once per `status` frame, from the socket task.
pub trait StatusModel: Send {
    /// Applies a decoded status object and returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// An error drops the update; no `status` event is emitted.
    fn apply_status_update(&mut self, raw: &Value) -> Result<ServerStatus>;
}

// ============================================================================
// StatusRecord
// ============================================================================

/// Default [`StatusModel`]: keeps the latest snapshot.
///
/// Every update replaces the previous snapshot wholesale; keys absent from
/// the update become `None`. Once handed to a connection the record itself
/// is out of reach; read the same snapshot through
/// [`Connection::status`](crate::Connection::status).
#[derive(Debug, Clone, Default)]
pub struct StatusRecord {
    latest: Option<ServerStatus>,
}

impl StatusRecord {
    /// Creates an empty record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest snapshot, if any update has been applied.
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&ServerStatus> {
        self.latest.as_ref()
    }
}

impl StatusModel for StatusRecord {
    fn apply_status_update(&mut self, raw: &Value) -> Result<ServerStatus> {
        let snapshot = ServerStatus::from_value(raw)?;
        self.latest = Some(snapshot.clone());
        Ok(snapshot)
    }
}

// ============================================================================
// Tests
// ============================================================================
