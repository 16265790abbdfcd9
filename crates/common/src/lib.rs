//! Shared identifier types for certvault.

pub mod ids;

pub use ids::{DomainName, EntityKind, IdError, Owner, SlotKey, MAX_DOMAIN_LEN, MAX_LABEL_LEN};
