//! Key-value record store and typed collection access.
//!
//! The store holds whole collections under fixed keys. Loading is tolerant:
//! an absent or unparsable payload yields an empty collection and a malformed
//! element is dropped on its own. Saving always overwrites the full
//! collection, so concurrent writers resolve last-writer-wins per key.

pub mod memory;
pub mod parse;
pub mod sqlite;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persisted key for guest requests.
pub const REQUESTS_KEY: &str = "hotellyx_requests";
/// Persisted key for rooms.
pub const ROOMS_KEY: &str = "hotellyx_rooms";
/// Persisted key for the service catalog.
pub const SERVICES_KEY: &str = "hotellyx_services";
/// Persisted key for per-service view counters.
pub const SERVICE_VIEWS_KEY: &str = "hotellyx_service_views";

/// Raw get/set by key. No transactions span keys.
pub trait RecordStore {
    /// Read the serialized value for `key`, or `None` if never written.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the serialized value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// A record type persisted as a JSON array under [`Record::KEY`].
pub trait Record: Serialize + Sized {
    const KEY: &'static str;

    /// Shape-check and convert one stored element. `None` drops it.
    ///
    /// `now` fills timestamps that legacy records never carried.
    fn from_value(value: &Value, now: DateTime<Utc>) -> Option<Self>;
}

/// Parse a serialized collection, dropping malformed elements.
///
/// A payload that is not valid JSON, or not a JSON array, yields nothing.
#[must_use]
pub fn parse_collection<T: Record>(raw: &str, now: DateTime<Utc>) -> Vec<T> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(key = T::KEY, error = %err, "stored collection is not valid JSON, ignoring");
            return Vec::new();
        }
    };

    let Value::Array(items) = parsed else {
        warn!(key = T::KEY, "stored collection is not a list, ignoring");
        return Vec::new();
    };

    let total = items.len();
    let records: Vec<T> = items
        .iter()
        .filter_map(|item| T::from_value(item, now))
        .collect();

    if records.len() < total {
        warn!(
            key = T::KEY,
            dropped = total - records.len(),
            "dropped malformed records"
        );
    }

    records
}

/// Load a whole collection. Read failures degrade to an empty collection.
pub fn load<T, S>(store: &S, now: DateTime<Utc>) -> Vec<T>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    match store.get(T::KEY) {
        Ok(Some(raw)) => {
            let records = parse_collection(&raw, now);
            debug!(key = T::KEY, count = records.len(), "loaded collection");
            records
        }
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(key = T::KEY, error = %err, "record store read failed, treating as empty");
            Vec::new()
        }
    }
}

/// Serialize and overwrite a whole collection.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn save<T, S>(store: &S, records: &[T]) -> Result<(), StoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    let raw = serde_json::to_string(records).map_err(|source| StoreError::Serialize {
        key: T::KEY.to_string(),
        source,
    })?;
    store.set(T::KEY, &raw)?;
    debug!(key = T::KEY, count = records.len(), "saved collection");
    Ok(())
}

/// Load per-service view counters. Unreadable payloads yield no counters.
pub fn load_views<S: RecordStore + ?Sized>(store: &S) -> BTreeMap<String, u64> {
    match store.get(SERVICE_VIEWS_KEY) {
        Ok(Some(raw)) => parse::service_views(&raw),
        Ok(None) => BTreeMap::new(),
        Err(err) => {
            warn!(key = SERVICE_VIEWS_KEY, error = %err, "record store read failed, treating as empty");
            BTreeMap::new()
        }
    }
}

/// Overwrite per-service view counters.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn save_views<S: RecordStore + ?Sized>(
    store: &S,
    views: &BTreeMap<String, u64>,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(views).map_err(|source| StoreError::Serialize {
        key: SERVICE_VIEWS_KEY.to_string(),
        source,
    })?;
    store.set(SERVICE_VIEWS_KEY, &raw)
}
