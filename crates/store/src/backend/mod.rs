//! Storage backends.
//!
//! A backend maps a [`SlotKey`] to bytes. Each slot is its own unit of
//! atomicity: a write is either fully visible or not visible at all.

mod fs;
mod memory;

pub use fs::{FsSlotStore, StagedWrite, STAGING_PREFIX};
pub use memory::MemorySlotStore;

use certvault_common::{DomainName, SlotKey};
use chrono::{DateTime, Utc};

use crate::error::StoreResult;

/// Slot storage trait for the repository.
pub trait SlotStore: Send + Sync {
    /// Replace the slot's content, all or nothing.
    fn write(&self, slot: &SlotKey, bytes: &[u8]) -> StoreResult<()>;

    /// Read the slot's content.
    ///
    /// Missing slots are `NotFound`, zero-length content is `Corrupt`.
    fn read(&self, slot: &SlotKey) -> StoreResult<Vec<u8>>;

    /// Whether the slot holds committed content. Never fails.
    fn exists(&self, slot: &SlotKey) -> bool;

    /// Time of the last commit, if the slot exists.
    fn modified(&self, slot: &SlotKey) -> Option<DateTime<Utc>>;

    /// Domains with at least one slot, sorted.
    fn list_domains(&self) -> StoreResult<Vec<DomainName>>;
}
