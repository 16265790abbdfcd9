//! Certvault Store
//!
//! Crash-consistent storage for the material an ACME client produces: the
//! account key pair, and per domain a key pair, the CSR distinguished name and
//! the issued certificate.
//!
//! # Guarantees
//!
//! - **Atomic slots**: every write is staged and published with a single
//!   rename; an interrupted write leaves the previous content or nothing.
//! - **Owner-only keys**: key files are `0600` from the moment they exist.
//! - **Corruption is loud**: empty or undecodable content is reported as
//!   [`StoreError::Corrupt`], never returned partially.
//! - **No aliasing**: the account slot has its own namespace and domain
//!   names are normalized before use.
//!
//! # Example
//!
//! ```no_run
//! use certvault_config::StorageConfig;
//! use certvault_store::{KeyAlgorithm, KeyPair, Repository};
//!
//! # fn example(public_der: Vec<u8>, private_der: Vec<u8>) -> Result<(), certvault_store::StoreError> {
//! let repository = Repository::open(&StorageConfig::at("/var/lib/certvault"))?;
//!
//! if !repository.has_account_key_pair() {
//!     let key_pair = KeyPair::new(KeyAlgorithm::Ec, public_der, private_der);
//!     repository.store_account_key_pair(&key_pair)?;
//! }
//! let account_key = repository.load_account_key_pair()?;
//! # let _ = account_key;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod error;
pub mod model;
pub mod repository;

pub use backend::{FsSlotStore, MemorySlotStore, SlotStore, StagedWrite};
pub use certvault_common::{DomainName, EntityKind, Owner, SlotKey};
pub use error::{DecodeError, StoreError, StoreResult};
pub use model::{
    Certificate, CertificateRequest, CertificateResponse, DistinguishedName, KeyAlgorithm, KeyPair,
};
pub use repository::{DomainReport, Repository};
