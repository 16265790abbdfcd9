//! In-memory slot storage.

use std::collections::BTreeSet;
use std::sync::Arc;

use certvault_common::{DomainName, Owner, SlotKey};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::trace;

use super::SlotStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct MemorySlot {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

/// Volatile slot storage with the same read semantics as [`super::FsSlotStore`].
///
/// Each insert replaces the whole entry, so readers observe either the old or
/// the new content. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<DashMap<SlotKey, MemorySlot>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl SlotStore for MemorySlotStore {
    fn write(&self, slot: &SlotKey, bytes: &[u8]) -> StoreResult<()> {
        self.slots.insert(
            slot.clone(),
            MemorySlot {
                bytes: bytes.to_vec(),
                modified: Utc::now(),
            },
        );
        trace!(slot = %slot, size = bytes.len(), "Stored slot in memory");
        Ok(())
    }

    fn read(&self, slot: &SlotKey) -> StoreResult<Vec<u8>> {
        let entry = self
            .slots
            .get(slot)
            .ok_or_else(|| StoreError::NotFound { slot: slot.clone() })?;
        if entry.bytes.is_empty() {
            return Err(StoreError::corrupt(slot, "zero-length content"));
        }
        Ok(entry.bytes.clone())
    }

    fn exists(&self, slot: &SlotKey) -> bool {
        self.slots.contains_key(slot)
    }

    fn modified(&self, slot: &SlotKey) -> Option<DateTime<Utc>> {
        self.slots.get(slot).map(|entry| entry.modified)
    }

    fn list_domains(&self) -> StoreResult<Vec<DomainName>> {
        let domains: BTreeSet<DomainName> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.key().owner() {
                Owner::Domain(domain) => Some(domain.clone()),
                Owner::Account => None,
            })
            .collect();
        Ok(domains.into_iter().collect())
    }
}
