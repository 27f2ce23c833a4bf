//! Persistence seam
//!
//! The core never talks to a storage technology directly. Callers hand it a
//! [`SettingsStore`]; writes go through a [`WriteBatcher`] that coalesces
//! bursts of updates and flushes whatever is pending when it is dropped.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::TimestampMs;

/// Storage keys used by the extension.
pub mod keys {
    pub const SCHEDULES: &str = "schedules";
    pub const QUICK_BLOCK: &str = "quickBlockSession";
    pub const LOCK_MODE: &str = "lockModeState";
}

/// Window in which consecutive writes are coalesced.
pub const DEBOUNCE_MS: u64 = 100;

/// Error type for typed store access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type SubscriptionId = u64;

/// Callback fired with the key and new value after a change.
pub type ChangeListener = Box<dyn FnMut(&str, &Value)>;

/// Key-value store with change notification.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Read and decode `key`; `Ok(None)` if it was never written.
pub fn load<T: DeserializeOwned, S: SettingsStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Decode { key: key.to_string(), source }),
    }
}

/// Encode and write `value` under `key`.
pub fn save<T: Serialize, S: SettingsStore + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = encode(key, value)?;
    store.set(key, value);
    Ok(())
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode { key: key.to_string(), source })
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store; listeners fire only when a value actually changes.
#[derive(Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
    listeners: Vec<(SubscriptionId, ChangeListener)>,
    next_id: SubscriptionId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        if self.values.get(key) == Some(&value) {
            return;
        }
        self.values.insert(key.to_string(), value.clone());
        for (_, listener) in self.listeners.iter_mut() {
            listener(key, &value);
        }
    }

    fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }
}

// =============================================================================
// WriteBatcher
// =============================================================================

/// Debounced writer in front of a store.
///
/// Writes are queued and reach the store once `debounce_ms` has passed since
/// the most recent queued write (`poll`), on an explicit `flush`, or when the
/// batcher is dropped. Later writes to the same key replace earlier ones.
pub struct WriteBatcher<'a, S: SettingsStore + ?Sized> {
    store: &'a mut S,
    pending: BTreeMap<String, Value>,
    last_queued_at: Option<TimestampMs>,
    debounce_ms: u64,
}

impl<'a, S: SettingsStore + ?Sized> WriteBatcher<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self::with_debounce(store, DEBOUNCE_MS)
    }

    pub fn with_debounce(store: &'a mut S, debounce_ms: u64) -> Self {
        Self {
            store,
            pending: BTreeMap::new(),
            last_queued_at: None,
            debounce_ms,
        }
    }

    /// Queue a typed value.
    pub fn queue<T: Serialize>(&mut self, key: &str, value: &T, now: TimestampMs) -> Result<(), StoreError> {
        let value = encode(key, value)?;
        self.queue_value(key, value, now);
        Ok(())
    }

    pub fn queue_value(&mut self, key: &str, value: Value, now: TimestampMs) {
        self.pending.insert(key.to_string(), value);
        self.last_queued_at = Some(now);
    }

    /// Read through the pending writes to the store.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.pending.get(key).cloned().or_else(|| self.store.get(key))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Flush if the debounce window has elapsed. Returns the number of keys written.
    pub fn poll(&mut self, now: TimestampMs) -> usize {
        match self.last_queued_at {
            Some(last) if now.saturating_sub(last) >= self.debounce_ms as i64 => self.flush(),
            _ => 0,
        }
    }

    /// Write everything pending now. Returns the number of keys written.
    pub fn flush(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (key, value) in pending {
            self.store.set(&key, value);
        }
        self.last_queued_at = None;
        if count > 0 {
            log::debug!("flushed {count} pending settings writes");
        }
        count
    }
}

impl<S: SettingsStore + ?Sized> Drop for WriteBatcher<'_, S> {
    fn drop(&mut self) {
        self.flush();
    }
}
